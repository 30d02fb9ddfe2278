use std::path::PathBuf;

use clap::Args;
use cardbundle::publish::{self, config, BundleCheck, Variant};
use cardbundle::{Error, Result};

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct VerifyArgs {
    /// Directory holding the bundle files
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Bundle layout: split or combined
    #[arg(long, default_value = "split")]
    pub variant: String,

    /// Marker checks as file:field pairs, comma-separated (empty disables)
    #[arg(long, value_name = "LIST")]
    pub markers: Option<String>,
}

pub fn run(args: VerifyArgs, _global: &GlobalArgs) -> CmdResult<BundleCheck> {
    let variant = parse_variant(&args.variant)?;
    let markers = config::parse_markers(args.markers.as_deref())?;

    let check = publish::check_bundle(&args.out_dir, variant, &markers)?;
    for warning in &check.warnings {
        eprintln!("[verify] Warning: {}", warning);
    }
    Ok((check, 0))
}

/// `--variant` is a command-line argument here, not configuration.
fn parse_variant(raw: &str) -> Result<Variant> {
    Variant::parse(Some(raw)).map_err(|_| {
        Error::validation_invalid_argument(
            "variant",
            format!("Unknown variant '{}' (expected split or combined)", raw),
        )
    })
}
