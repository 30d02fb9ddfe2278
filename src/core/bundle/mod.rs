//! Native bundle generator.
//!
//! Fetches the canonical sheets, validates every row, and writes the dataset
//! documents plus the version descriptor. Output is deterministic: the same
//! CSV input produces byte-identical files, and the descriptor is only
//! rewritten when the content hash changes.

pub mod cards;
pub mod descriptor;
pub mod fetch;
mod fields;
pub mod programs;

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::io;

pub use descriptor::VersionDescriptor;

pub const SCHEMA_VERSION: u32 = 2;

pub const CARDS_FILE: &str = "cards.json";
pub const PROGRAMS_FILE: &str = "programs.json";
pub const PROGRAM_QUARTERS_FILE: &str = "program_quarters.json";
pub const VERSION_FILE: &str = "cards_version.json";

/// Source sheet URLs for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sources {
    pub cards: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_quarters: Option<String>,
}

impl Sources {
    /// Legacy single-sheet source: cards only.
    pub fn combined(url: impl Into<String>) -> Self {
        Self {
            cards: url.into(),
            programs: None,
            program_quarters: None,
        }
    }

    pub fn split(
        cards: impl Into<String>,
        programs: impl Into<String>,
        program_quarters: impl Into<String>,
    ) -> Self {
        Self {
            cards: cards.into(),
            programs: Some(programs.into()),
            program_quarters: Some(program_quarters.into()),
        }
    }

    /// Arguments of the generator CLI contract for these sources.
    pub fn generator_args(&self, out_dir: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if self.programs.is_none() && self.program_quarters.is_none() {
            args.extend(["--csv-url".to_string(), self.cards.clone()]);
        } else {
            args.extend(["--cards-csv-url".to_string(), self.cards.clone()]);
        }
        if let Some(url) = &self.programs {
            args.extend(["--programs-csv-url".to_string(), url.clone()]);
        }
        if let Some(url) = &self.program_quarters {
            args.extend(["--program-quarters-csv-url".to_string(), url.clone()]);
        }
        args.extend([
            "--out-dir".to_string(),
            out_dir.to_string_lossy().into_owned(),
        ]);
        args
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub out_dir: String,
    pub files: Vec<String>,
    pub version: String,
    pub descriptor_changed: bool,
    pub cards_count: usize,
    pub programs_count: usize,
    pub program_quarters_count: usize,
    pub conditions_count: usize,
}

/// Run the full fetch → validate → write → version sequence.
///
/// Every sheet is fetched and validated before the first file is written, so a
/// bad programs sheet never leaves a fresh `cards.json` next to stale siblings.
pub fn generate(sources: &Sources, out_dir: &Path) -> Result<GenerateReport> {
    let today = Utc::now().date_naive();

    log_status!("generate", "Fetching cards sheet");
    let cards = cards::parse_cards(&fetch::fetch_csv_text(&sources.cards)?, today)?;

    let programs = match &sources.programs {
        Some(url) => {
            log_status!("generate", "Fetching programs sheet");
            Some(programs::parse_programs(&fetch::fetch_csv_text(url)?)?)
        }
        None => None,
    };

    let program_quarters = match &sources.program_quarters {
        Some(url) => {
            log_status!("generate", "Fetching program_quarters sheet");
            Some(programs::parse_program_quarters(&fetch::fetch_csv_text(url)?)?)
        }
        None => None,
    };

    io::ensure_dir(out_dir, "create output directory")?;

    let cards_count = cards.len();
    let conditions_count = cards.iter().filter(|c| !c.conditions.is_empty()).count();
    let programs_count = programs.as_ref().map_or(0, Vec::len);
    let program_quarters_count = program_quarters.as_ref().map_or(0, Vec::len);

    let mut bundle: Vec<PathBuf> = Vec::new();

    let path = out_dir.join(CARDS_FILE);
    write_json(&path, &cards::build_document(cards))?;
    bundle.push(path);

    if let Some(programs) = programs {
        let path = out_dir.join(PROGRAMS_FILE);
        write_json(&path, &programs::build_programs_document(programs))?;
        bundle.push(path);
    }

    if let Some(entries) = program_quarters {
        let path = out_dir.join(PROGRAM_QUARTERS_FILE);
        write_json(&path, &programs::build_program_quarters_document(entries))?;
        bundle.push(path);
    }

    for path in &bundle {
        log_status!("generate", "Wrote {}", path.display());
    }

    let version = descriptor::compute_version(&bundle)?;
    let version_path = out_dir.join(VERSION_FILE);
    let descriptor_changed =
        descriptor::read_version(&version_path).as_deref() != Some(version.as_str());

    let bundle_files: Vec<String> = bundle
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();

    if descriptor_changed {
        let descriptor = VersionDescriptor {
            schema_version: SCHEMA_VERSION,
            version: version.clone(),
            generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            cards_count,
            programs_count,
            program_quarters_count,
            conditions_count: Some(conditions_count),
            bundle_files: bundle_files.clone(),
        };
        write_json(&version_path, &descriptor)?;
        log_status!("generate", "Wrote {} (version={})", version_path.display(), version);
    } else {
        log_status!("generate", "{} unchanged (version={})", VERSION_FILE, version);
    }

    let mut files = bundle_files;
    files.push(VERSION_FILE.to_string());

    Ok(GenerateReport {
        out_dir: out_dir.to_string_lossy().into_owned(),
        files,
        version,
        descriptor_changed,
        cards_count,
        programs_count,
        program_quarters_count,
        conditions_count,
    })
}

/// Pretty JSON, two-space indent, trailing newline.
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(data).map_err(|e| {
        Error::internal_json(e.to_string(), Some(format!("serialize {}", path.display())))
    })?;
    content.push('\n');
    io::write_file_atomic(path, &content, "write bundle file")
}
