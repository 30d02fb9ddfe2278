use std::path::{Path, PathBuf};

use crate::bundle::{self, Sources};
use crate::error::{Error, Result};
use crate::utils::{command, shell};

/// Produces the bundle files in `out_dir` from the configured sources.
pub trait Generator {
    fn generate(&self, sources: &Sources, out_dir: &Path) -> Result<()>;
}

/// The in-process generator from the `bundle` module.
///
/// Fetch and row validation errors surface as generation failures, the same
/// kind an external generator's non-zero exit produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeGenerator;

impl Generator for NativeGenerator {
    fn generate(&self, sources: &Sources, out_dir: &Path) -> Result<()> {
        bundle::generate(sources, out_dir).map(|_| ()).map_err(|err| {
            let mut failure = Error::bundle_generation_failed(
                "native",
                None,
                format!("{} ({})", err.message, err.code.as_str()),
            );
            failure.hints.extend(err.hints);
            failure
        })
    }
}

/// Any command honoring the generator CLI contract, run through `sh -c`.
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    command: String,
    work_dir: PathBuf,
}

impl ExternalGenerator {
    pub fn new(command: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn command_line(&self, sources: &Sources, out_dir: &Path) -> String {
        shell::command_line(&self.command, &sources.generator_args(out_dir))
    }
}

impl Generator for ExternalGenerator {
    fn generate(&self, sources: &Sources, out_dir: &Path) -> Result<()> {
        let line = self.command_line(sources, out_dir);
        let out = command::capture_in(&self.work_dir, "sh", &["-c", &line], "run generator")?;
        if !out.success {
            return Err(Error::bundle_generation_failed(
                &self.command,
                out.exit_code,
                out.stderr,
            ));
        }
        Ok(())
    }
}
