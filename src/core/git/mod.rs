mod operations;

pub use operations::*;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::command::{self, Finished};

/// Version-control operations the publish pipeline needs.
///
/// Paths are relative to the working copy root.
pub trait Vcs {
    /// Rebase the working copy onto its upstream.
    fn sync(&self) -> Result<()>;
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;
    /// Whether the index differs from `HEAD` for any of `paths`.
    fn has_staged_changes(&self, paths: &[PathBuf]) -> Result<bool>;
    /// Commit exactly `paths`; returns the new commit SHA.
    fn commit(&self, message: &str, paths: &[PathBuf]) -> Result<String>;
    fn push(&self) -> Result<()>;
}

fn execute_git(path: &Path, args: &[&str]) -> Result<Finished> {
    let context = format!("git {}", args.first().copied().unwrap_or_default());
    command::capture_in(path, "git", args, &context)
}

fn path_args(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}
