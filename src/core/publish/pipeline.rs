use crate::bundle;
use crate::error::Result;
use crate::git::{GitRepo, Vcs};

use super::config::{self, PublishSettings};
use super::generator::{ExternalGenerator, Generator, NativeGenerator};
use super::latch;
use super::message;
use super::types::{PublishCommit, PublishRun, PublishStage, PublishStatus};
use super::validate;

/// Guarded regenerate-and-publish of the data bundle.
pub struct Publisher {
    settings: PublishSettings,
    vcs: Box<dyn Vcs>,
    generator: Box<dyn Generator>,
}

impl Publisher {
    pub fn new(settings: PublishSettings, vcs: Box<dyn Vcs>, generator: Box<dyn Generator>) -> Self {
        Self {
            settings,
            vcs,
            generator,
        }
    }

    /// Git in the configured working copy; `GENERATOR_CMD` if set, otherwise
    /// the native generator.
    pub fn from_settings(settings: PublishSettings) -> Self {
        let vcs = Box::new(GitRepo::new(&settings.repo_dir));
        let generator: Box<dyn Generator> = match &settings.generator_cmd {
            Some(cmd) => Box::new(ExternalGenerator::new(cmd, &settings.repo_dir)),
            None => Box::new(NativeGenerator),
        };
        Self::new(settings, vcs, generator)
    }

    /// Run every stage in order. The first failure ends the run; nothing is
    /// rolled back.
    pub fn run(&self) -> Result<PublishRun> {
        latch::check(&self.settings.env)?;

        let mut stages = Vec::new();

        enter(&mut stages, PublishStage::Syncing);
        self.vcs.sync()?;

        let config = config::load(&self.settings)?;
        enter(&mut stages, PublishStage::ConfigLoaded);
        log_status!("publish", "Variant: {}", config.variant.as_str());

        enter(&mut stages, PublishStage::Generating);
        let out_path = self.settings.out_path();
        self.generator.generate(&config.sources, &out_path)?;

        let check = validate::check_bundle(&out_path, config.variant, &config.markers)?;
        for warning in &check.warnings {
            eprintln!("[publish] Warning: {}", warning);
        }
        enter(&mut stages, PublishStage::Validated);

        let paths = self.settings.bundle_paths(config.variant);
        let files: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        self.vcs.stage(&paths)?;
        enter(&mut stages, PublishStage::Staged);

        if !self.vcs.has_staged_changes(&paths)? {
            enter(&mut stages, PublishStage::NoChange);
            return Ok(PublishRun {
                status: PublishStatus::NoChanges,
                stages,
                files,
                commit: None,
                warnings: check.warnings,
            });
        }

        let message = message::commit_message(&out_path.join(bundle::VERSION_FILE));
        let sha = self.vcs.commit(&message, &paths)?;
        enter(&mut stages, PublishStage::Committed);
        log_status!("publish", "Commit {}: {}", sha, message);

        self.vcs.push()?;
        enter(&mut stages, PublishStage::Pushed);

        Ok(PublishRun {
            status: PublishStatus::Published,
            stages,
            files,
            commit: Some(PublishCommit { sha, message }),
            warnings: check.warnings,
        })
    }
}

fn enter(stages: &mut Vec<PublishStage>, stage: PublishStage) {
    log_status!("publish", "{}", stage.as_str());
    stages.push(stage);
}
