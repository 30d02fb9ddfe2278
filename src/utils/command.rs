//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Exit status and captured streams of a finished command.
#[derive(Debug, Clone)]
pub struct Finished {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Finished {
    fn from_output(output: &Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: error_text(output),
        }
    }
}

/// Run a command in a directory and capture its result without judging it.
///
/// Only a failure to spawn the process is an error; a non-zero exit is
/// reported through [`Finished::success`] so callers can map it to their own
/// error kind.
pub fn capture_in(dir: &Path, program: &str, args: &[&str], context: &str) -> Result<Finished> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| {
            Error::internal_io(
                format!("Failed to run {}: {}", context, e),
                Some(context.to_string()),
            )
        })?;

    Ok(Finished::from_output(&output))
}

/// Run a command in a specific directory.
///
/// Returns trimmed stdout if the command succeeds.
/// Returns an error with stderr (or stdout fallback) if it fails.
pub fn run_in(dir: &Path, program: &str, args: &[&str], context: &str) -> Result<String> {
    let finished = capture_in(dir, program, args, context)?;

    if !finished.success {
        return Err(Error::internal_io(
            format!("{} failed: {}", context, finished.stderr),
            Some(context.to_string()),
        ));
    }

    Ok(finished.stdout)
}

/// Run a command in a directory, returning None on failure instead of error.
///
/// Useful when command failure is expected/acceptable (e.g., probing for a repo).
pub fn run_in_optional(dir: &Path, program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_in_succeeds_with_valid_command() {
        let result = run_in(Path::new("/tmp"), "echo", &["cards.json"], "echo test");
        assert_eq!(result.unwrap(), "cards.json");
    }

    #[test]
    fn run_in_fails_with_invalid_command() {
        let result = run_in(Path::new("/tmp"), "nonexistent_command_xyz", &[], "test");
        assert!(result.is_err());
    }

    #[test]
    fn capture_in_reports_non_zero_exit() {
        let finished = capture_in(Path::new("/tmp"), "sh", &["-c", "echo nope >&2; exit 3"], "sh")
            .unwrap();
        assert!(!finished.success);
        assert_eq!(finished.exit_code, Some(3));
        assert_eq!(finished.stderr, "nope");
    }

    #[test]
    fn run_in_optional_returns_none_on_failure() {
        let result = run_in_optional(Path::new("/tmp"), "false", &[]);
        assert!(result.is_none());
    }

    #[test]
    fn error_text_prefers_stderr() {
        let output = Output {
            status: std::process::ExitStatus::default(),
            stdout: b"stdout content".to_vec(),
            stderr: b"stderr content".to_vec(),
        };
        assert_eq!(error_text(&output), "stderr content");
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = Output {
            status: std::process::ExitStatus::default(),
            stdout: b"stdout content".to_vec(),
            stderr: b"".to_vec(),
        };
        assert_eq!(error_text(&output), "stdout content");
    }
}
