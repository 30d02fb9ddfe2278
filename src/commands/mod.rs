pub type CmdResult<T> = cardbundle::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod generate;
pub mod publish;
pub mod verify;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (cardbundle::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Publish(args) => dispatch!(args, global, publish),
        crate::Commands::Generate(args) => dispatch!(args, global, generate),
        crate::Commands::Verify(args) => dispatch!(args, global, verify),
    }
}
