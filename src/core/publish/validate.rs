use std::path::Path;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

use super::config::{MarkerCheck, Variant};

#[derive(Debug, Clone, Serialize)]
pub struct BundleCheck {
    pub out_dir: String,
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Every required file must exist; marker checks only warn.
pub fn check_bundle(out_dir: &Path, variant: Variant, markers: &[MarkerCheck]) -> Result<BundleCheck> {
    let missing: Vec<String> = variant
        .required_files()
        .iter()
        .filter(|name| !out_dir.join(name).is_file())
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(Error::bundle_incomplete(
            out_dir.to_string_lossy(),
            missing,
        ));
    }

    let warnings = markers
        .iter()
        .filter_map(|marker| marker_warning(out_dir, marker))
        .collect();

    Ok(BundleCheck {
        out_dir: out_dir.to_string_lossy().into_owned(),
        files: variant
            .required_files()
            .iter()
            .map(|name| name.to_string())
            .collect(),
        warnings,
    })
}

fn marker_warning(out_dir: &Path, marker: &MarkerCheck) -> Option<String> {
    let path = out_dir.join(&marker.file);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            return Some(format!(
                "{} could not be read for the '{}' check: {}",
                marker.file, marker.field, e
            ))
        }
    };

    let pattern = format!(r#""{}"\s*:"#, regex::escape(&marker.field));
    let present = Regex::new(&pattern)
        .map(|re| re.is_match(&content))
        .unwrap_or(false);

    (!present).then(|| format!("{} has no '{}' field", marker.file, marker.field))
}
