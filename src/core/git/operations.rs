use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::command;

use super::{execute_git, path_args, Vcs};

/// A git working copy driven through the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current HEAD commit SHA.
    pub fn head_commit(&self) -> Result<String> {
        command::run_in(&self.path, "git", &["rev-parse", "HEAD"], "get HEAD commit")
    }
}

impl Vcs for GitRepo {
    fn sync(&self) -> Result<()> {
        let out = execute_git(&self.path, &["pull", "--rebase"])?;
        if !out.success {
            return Err(Error::git_sync_failed(out.exit_code, out.stderr));
        }
        Ok(())
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let files = path_args(paths);
        let mut args = vec!["add", "--"];
        args.extend(files.iter().map(String::as_str));

        let out = execute_git(&self.path, &args)?;
        if !out.success {
            return Err(Error::git_command_failed(
                "git add",
                out.exit_code,
                out.stderr,
            ));
        }
        Ok(())
    }

    fn has_staged_changes(&self, paths: &[PathBuf]) -> Result<bool> {
        let files = path_args(paths);
        let mut args = vec!["diff", "--cached", "--quiet", "--"];
        args.extend(files.iter().map(String::as_str));

        // --quiet: 0 = no difference, 1 = difference, anything else = failure
        let out = execute_git(&self.path, &args)?;
        match out.exit_code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(Error::git_command_failed("git diff --cached", code, out.stderr)),
        }
    }

    fn commit(&self, message: &str, paths: &[PathBuf]) -> Result<String> {
        let files = path_args(paths);
        let mut args = vec!["commit", "-m", message, "--"];
        args.extend(files.iter().map(String::as_str));

        let out = execute_git(&self.path, &args)?;
        if !out.success {
            return Err(Error::publish_failed("git commit", out.exit_code, out.stderr));
        }

        self.head_commit()
    }

    fn push(&self) -> Result<()> {
        let out = execute_git(&self.path, &["push"])?;
        if !out.success {
            return Err(Error::publish_failed("git push", out.exit_code, out.stderr));
        }
        Ok(())
    }
}
