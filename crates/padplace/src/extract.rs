use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;

use padplace_points::{ElementTable, PointTable};

#[derive(Args, Debug, Clone)]
#[command(about = "Extract classified circle coordinates from a DXF drawing")]
pub struct ExtractArgs {
    /// DXF drawing to scan
    #[arg(value_name = "DXF", value_hint = clap::ValueHint::FilePath)]
    pub dxf: PathBuf,

    /// Element spec TOML file (defaults to the built-in electrode metadata)
    #[arg(long, value_name = "FILE")]
    pub spec: Option<PathBuf>,

    /// Keep the drawing's y axis instead of flipping it into KiCad's
    #[arg(long)]
    pub no_flip: bool,

    /// Export one CSV file per label into this directory
    #[arg(long, value_name = "DIR")]
    pub csv: Option<PathBuf>,
}

pub fn execute(args: ExtractArgs) -> Result<()> {
    let specs = load_specs(args.spec.as_deref())?;
    let table = padplace_dxf::extract_points(&args.dxf, &specs, !args.no_flip)?;

    if table.is_empty() {
        println!("No circular elements found in {}.", args.dxf.display());
        return Ok(());
    }

    print_point_table(&table);

    if let Some(dir) = &args.csv {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let written = table.export_csv(dir)?;
        println!("Exported {} CSV file(s) to {}", written.len(), dir.display());
    }

    Ok(())
}

pub fn load_specs(path: Option<&Path>) -> Result<ElementTable> {
    match path {
        Some(p) => ElementTable::load(p)
            .with_context(|| format!("failed to load element spec {}", p.display())),
        None => Ok(ElementTable::builtin()),
    }
}

pub fn print_point_table(table: &PointTable) {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL_CONDENSED);
    out.set_header(vec!["Label", "Channel", "X", "Y", "R"]);

    for label in table.labels() {
        for p in table.rows().iter().filter(|p| p.label == label) {
            out.add_row(vec![
                p.label.clone(),
                p.channel.to_string(),
                p.x.to_string(),
                p.y.to_string(),
                p.r.to_string(),
            ]);
        }
    }

    println!("{out}");
    for label in table.labels() {
        println!("  {}: {} element(s)", label, table.label_count(&label));
    }
}
