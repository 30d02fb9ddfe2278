use clap::Args;
use cardbundle::environment::Environment;
use cardbundle::publish::{PublishRun, PublishSettings, Publisher};

use crate::commands::{CmdResult, GlobalArgs};

/// Takes no flags: the run is controlled entirely by the environment.
#[derive(Args)]
pub struct PublishArgs {}

pub fn run(_args: PublishArgs, _global: &GlobalArgs) -> CmdResult<PublishRun> {
    let cwd = std::env::current_dir().map_err(|e| {
        cardbundle::Error::internal_io(e.to_string(), Some("read current directory".to_string()))
    })?;
    let settings = PublishSettings::from_environment(Environment::from_process(), &cwd);

    let run = Publisher::from_settings(settings).run()?;
    Ok((run, 0))
}
