//! The version descriptor (`cards_version.json`).
//!
//! The version is a content hash over the dataset files, so the descriptor
//! changes exactly when the data does. The mobile client polls only this file.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub schema_version: u32,
    pub version: String,
    pub generated_at: String,
    pub cards_count: usize,
    pub programs_count: usize,
    pub program_quarters_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_count: Option<usize>,
    pub bundle_files: Vec<String>,
}

/// `sha256:` + the first 12 hex digits of the hash over `paths`, in order,
/// each file followed by a newline separator.
pub fn compute_version(paths: &[PathBuf]) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    for path in paths {
        let mut file = File::open(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("hash {}", path.display())))
        })?;
        loop {
            let n = file.read(&mut buf).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("hash {}", path.display())))
            })?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        hasher.update(b"\n");
    }

    let digest = format!("{:x}", hasher.finalize());
    Ok(format!("sha256:{}", &digest[..12]))
}

/// The `version` field of an existing descriptor, if it can be read at all.
pub fn read_version(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value.get("version")?.as_str().map(String::from)
}
