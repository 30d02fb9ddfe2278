use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bundle::{self, Sources};
use crate::environment::Environment;
use crate::error::{Error, Result};

pub const VARIANT_VAR: &str = "PUBLISH_VARIANT";
pub const REPO_DIR_VAR: &str = "PUBLISH_REPO_DIR";
pub const OUT_DIR_VAR: &str = "PUBLISH_OUT_DIR";
pub const ENV_FILE_VAR: &str = "PUBLISH_ENV_FILE";
pub const MARKERS_VAR: &str = "PUBLISH_MARKERS";
pub const GENERATOR_CMD_VAR: &str = "GENERATOR_CMD";

pub const CARDS_URL_VAR: &str = "CARDS_CSV_URL";
pub const PROGRAMS_URL_VAR: &str = "PROGRAMS_CSV_URL";
pub const PROGRAM_QUARTERS_URL_VAR: &str = "PROGRAM_QUARTERS_CSV_URL";
pub const COMBINED_URL_VAR: &str = "CSV_URL";

pub const DEFAULT_ENV_FILE: &str = ".env.local";
pub const DEFAULT_MARKERS: &str = "cards.json:conditions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Three sheets: cards, programs, program quarters.
    #[default]
    Split,
    /// One legacy sheet producing cards only.
    Combined,
}

impl Variant {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(str::to_ascii_lowercase).as_deref() {
            None | Some("split") => Ok(Variant::Split),
            Some("combined") => Ok(Variant::Combined),
            Some(other) => Err(Error::config_invalid_value(
                VARIANT_VAR,
                Some(other.to_string()),
                "expected 'split' or 'combined'",
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Split => "split",
            Variant::Combined => "combined",
        }
    }

    /// Files that must exist after generation, in bundle order.
    pub fn required_files(&self) -> &'static [&'static str] {
        match self {
            Variant::Split => &[
                bundle::CARDS_FILE,
                bundle::PROGRAMS_FILE,
                bundle::PROGRAM_QUARTERS_FILE,
                bundle::VERSION_FILE,
            ],
            Variant::Combined => &[bundle::CARDS_FILE, bundle::VERSION_FILE],
        }
    }
}

/// A soft content check: `file` should mention the JSON key `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerCheck {
    pub file: String,
    pub field: String,
}

/// Parse `file:field[,file:field...]`. Unset means the default list, an
/// empty value disables marker checks.
pub fn parse_markers(raw: Option<&str>) -> Result<Vec<MarkerCheck>> {
    let raw = raw.unwrap_or(DEFAULT_MARKERS);

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<MarkerCheck> {
            let (file, field) = entry
                .split_once(':')
                .map(|(f, k)| (f.trim(), k.trim()))
                .filter(|(f, k)| !f.is_empty() && !k.is_empty())
                .ok_or_else(|| {
                    Error::config_invalid_value(
                        MARKERS_VAR,
                        Some(raw.to_string()),
                        format!("'{}' is not of the form file:field", entry),
                    )
                })?;
            Ok(MarkerCheck {
                file: file.to_string(),
                field: field.to_string(),
            })
        })
        .collect()
}

/// Everything the publisher needs that is fixed before the run starts.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub repo_dir: PathBuf,
    /// Output directory, as given (relative paths are relative to `repo_dir`).
    pub out_dir: PathBuf,
    pub env_file: PathBuf,
    pub generator_cmd: Option<String>,
    pub env: Environment,
}

impl PublishSettings {
    pub fn from_environment(env: Environment, cwd: &Path) -> Self {
        let repo_dir = match env.get(REPO_DIR_VAR) {
            Some(dir) => cwd.join(expand(dir)),
            None => cwd.to_path_buf(),
        };
        let out_dir = env
            .get(OUT_DIR_VAR)
            .map(expand)
            .unwrap_or_else(|| PathBuf::from("."));
        let env_file = match env.get(ENV_FILE_VAR) {
            Some(file) => repo_dir.join(expand(file)),
            None => repo_dir.join(DEFAULT_ENV_FILE),
        };
        let generator_cmd = env.get(GENERATOR_CMD_VAR).map(String::from);

        Self {
            repo_dir,
            out_dir,
            env_file,
            generator_cmd,
            env,
        }
    }

    /// Output directory resolved against the working copy.
    pub fn out_path(&self) -> PathBuf {
        self.repo_dir.join(&self.out_dir)
    }

    /// Bundle file paths relative to the working copy, for staging.
    pub fn bundle_paths(&self, variant: Variant) -> Vec<PathBuf> {
        variant
            .required_files()
            .iter()
            .map(|name| self.out_dir.join(name))
            .collect()
    }
}

/// Configuration resolved after the latch and the sync.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub variant: Variant,
    pub sources: Sources,
    pub markers: Vec<MarkerCheck>,
}

/// Merge the local env file under the snapshot and resolve sources.
///
/// Every URL the variant needs is checked before returning, so the generator
/// is never started with a partial source set.
pub fn load(settings: &PublishSettings) -> Result<PublishConfig> {
    let env = settings.env.with_file_defaults(&settings.env_file)?;
    let env_file = Some(settings.env_file.to_string_lossy().into_owned());

    let variant = Variant::parse(env.get(VARIANT_VAR))?;
    let require = |key: &str| -> Result<String> {
        env.get(key)
            .map(String::from)
            .ok_or_else(|| Error::config_missing_key(key, env_file.clone()))
    };

    let sources = match variant {
        Variant::Split => Sources::split(
            require(CARDS_URL_VAR)?,
            require(PROGRAMS_URL_VAR)?,
            require(PROGRAM_QUARTERS_URL_VAR)?,
        ),
        Variant::Combined => Sources::combined(require(COMBINED_URL_VAR)?),
    };

    let markers = parse_markers(env.get_raw(MARKERS_VAR))?;

    Ok(PublishConfig {
        variant,
        sources,
        markers,
    })
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
