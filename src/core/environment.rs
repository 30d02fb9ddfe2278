//! Environment snapshot.
//!
//! The publish pipeline never calls `std::env::var` mid-run. `main` captures
//! the process environment once into an [`Environment`], and every stage reads
//! from that value. The optional local env file is merged on top with
//! [`Environment::with_file_defaults`]; values already present win.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::utils::io;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Non-empty, trimmed value of a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Raw value, including the empty string when the variable is set but blank.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Fill unset variables from a `KEY=VALUE` file. A variable the process
    /// sets, even to an empty string, is kept.
    ///
    /// A missing file leaves the snapshot unchanged.
    pub fn with_file_defaults(&self, path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(self.clone());
        }

        let content = io::read_file(path, "read local env file")?;
        let mut merged = self.clone();
        for (key, value) in parse_env_file(&content) {
            merged.vars.entry(key).or_insert(value);
        }
        Ok(merged)
    }
}

/// Parse `KEY=VALUE` lines, shell-export style.
///
/// Blank lines and `#` comments are skipped, a leading `export ` is dropped,
/// and one layer of matching quotes around the value is removed.
pub fn parse_env_file(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
