//! Guided interactive session: the prompt-driven front end over the same
//! extract/remap/rewrite calls the `update` subcommand makes.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use inquire::{Confirm, CustomType, Select, Text};

use crate::extract;
use crate::update::{self, PageStyle, PlaceParams};

#[derive(Args, Debug, Clone)]
#[command(about = "Guided interactive session")]
pub struct WizardArgs {
    /// Element spec TOML file (defaults to the built-in electrode metadata)
    #[arg(long, value_name = "FILE")]
    pub spec: Option<PathBuf>,
}

pub fn execute(args: WizardArgs) -> Result<()> {
    println!("{}", "padplace — KiCad PCB updater from DXF".bold());

    let specs = extract::load_specs(args.spec.as_deref())?;

    let dxf = prompt_existing_file("Path to the DXF drawing:")?;
    let pcb = prompt_existing_file("Path to the KiCad PCB file:")?;

    println!("Extracting circular elements from {} ...", dxf.display());
    let table = padplace_dxf::extract_points(&dxf, &specs, true)?;
    if table.is_empty() {
        println!("No circular elements found. Nothing to do.");
        return Ok(());
    }
    extract::print_point_table(&table);

    let label = Select::new("Element type to place:", table.labels()).prompt()?;

    let footprint = match specs.get(&label).and_then(|s| s.footprint.clone()) {
        Some(name) => name,
        None => prompt_fallback_footprint(&pcb, &label)?,
    };

    let strategy = {
        const NONE: &str = "none";
        let mut options: Vec<&str> = padplace_points::remap::Strategy::ALL
            .iter()
            .map(|s| s.name())
            .collect();
        options.push(NONE);
        let choice = Select::new("Remapping strategy:", options).prompt()?;
        (choice != NONE).then(|| choice.to_string())
    };

    let page = Select::new(
        "Sheet style:",
        vec![PageStyle::A4, PageStyle::A3, PageStyle::A2],
    )
    .with_starting_cursor(2)
    .prompt()?;
    let offset_x = CustomType::<f64>::new("X offset (mm):")
        .with_default(0.0)
        .prompt()?;
    let offset_y = CustomType::<f64>::new("Y offset (mm):")
        .with_default(0.0)
        .prompt()?;
    let flip_y = Confirm::new("Flip Y coordinates?")
        .with_default(false)
        .prompt()?;

    println!(
        "Placing {} {} footprint(s) as {}",
        table.label_count(&label),
        label,
        footprint
    );

    update::place(
        table,
        &PlaceParams {
            pcb,
            label,
            footprint,
            strategy,
            map: None,
            page: Some(page),
            offset: (offset_x, offset_y),
            flip_y,
        },
    )?;

    println!("Open the file in the KiCad PCB editor to verify the changes.");
    Ok(())
}

fn prompt_existing_file(message: &str) -> Result<PathBuf> {
    loop {
        let input = Text::new(message).prompt()?;
        let path = PathBuf::from(input.trim());
        if path.is_file() {
            return Ok(path);
        }
        println!("{} {} is not a readable file", "!".yellow(), path.display());
    }
}

/// The chosen label has no configured footprint (auto-detected radius, or a
/// spec without one): scan the PCB for the names actually present and let
/// the user pick or type one.
fn prompt_fallback_footprint(pcb: &std::path::Path, label: &str) -> Result<String> {
    const MANUAL: &str = "<type a name manually>";

    println!("No footprint metadata for {label:?}; scanning the PCB for footprint names.");
    let mut options = padplace_kicad::discover_footprints(pcb)?;

    if options.is_empty() {
        println!("No footprint declarations found in {}.", pcb.display());
        return Ok(Text::new("KiCad footprint name:").prompt()?);
    }

    options.push(MANUAL.to_string());
    let choice = Select::new("Footprint to update:", options).prompt()?;
    if choice == MANUAL {
        Ok(Text::new("KiCad footprint name:").prompt()?)
    } else {
        Ok(choice)
    }
}
