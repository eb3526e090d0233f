use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

#[derive(Args, Debug, Clone)]
#[command(about = "List footprint names present in a KiCad PCB file")]
pub struct FootprintsArgs {
    /// KiCad PCB file to scan
    #[arg(value_name = "PCB", value_hint = clap::ValueHint::FilePath)]
    pub pcb: PathBuf,
}

pub fn execute(args: FootprintsArgs) -> Result<()> {
    let names = padplace_kicad::discover_footprints(&args.pcb)?;

    if names.is_empty() {
        println!("No footprints found in {}.", args.pcb.display());
        return Ok(());
    }

    println!("Found {} unique footprint type(s):", names.len());
    for name in names {
        println!("  - {name}");
    }
    Ok(())
}
