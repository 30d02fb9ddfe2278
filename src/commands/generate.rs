use std::path::PathBuf;

use clap::Args;
use cardbundle::bundle::{self, GenerateReport, Sources};

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct GenerateArgs {
    /// Published CSV URL (or file path) of the cards sheet
    #[arg(long, visible_alias = "csv-url", value_name = "URL")]
    pub cards_csv_url: String,

    /// Published CSV URL of the programs sheet
    #[arg(long, value_name = "URL")]
    pub programs_csv_url: Option<String>,

    /// Published CSV URL of the program_quarters sheet
    #[arg(long, value_name = "URL")]
    pub program_quarters_csv_url: Option<String>,

    /// Directory receiving the bundle files
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

pub fn run(args: GenerateArgs, _global: &GlobalArgs) -> CmdResult<GenerateReport> {
    let sources = Sources {
        cards: args.cards_csv_url,
        programs: args.programs_csv_url,
        program_quarters: args.program_quarters_csv_url,
    };

    let report = bundle::generate(&sources, &args.out_dir)?;
    Ok((report, 0))
}
