use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use padplace_points::{remap, PointTable};

/// Sheet styles the PCB template was drawn on. The style's sheet center is
/// added to the user offset so drawing-origin coordinates land on the sheet.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStyle {
    A4,
    A3,
    A2,
}

impl PageStyle {
    pub fn origin(self) -> (f64, f64) {
        match self {
            PageStyle::A4 => (148.5, 105.0),
            PageStyle::A3 => (210.0, 148.5),
            PageStyle::A2 => (297.0, 210.0),
        }
    }
}

impl fmt::Display for PageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStyle::A4 => write!(f, "A4"),
            PageStyle::A3 => write!(f, "A3"),
            PageStyle::A2 => write!(f, "A2"),
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(about = "Run the whole extract-remap-rewrite pipeline non-interactively")]
pub struct UpdateArgs {
    /// DXF drawing with the element coordinates
    #[arg(long, value_name = "FILE")]
    pub dxf: PathBuf,

    /// KiCad PCB file whose footprints get moved
    #[arg(long, value_name = "FILE")]
    pub pcb: PathBuf,

    /// Element label to place
    #[arg(long)]
    pub label: String,

    /// Remapping strategy (forearm-pattern, 8-by-8, 8-by-8_swap)
    #[arg(long, conflicts_with = "map")]
    pub strategy: Option<String>,

    /// Channel remap file with one `old:new` pair per line
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Sheet style whose center is added to the offset
    #[arg(long, value_enum)]
    pub page: Option<PageStyle>,

    /// X offset in mm
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset_x: f64,

    /// Y offset in mm
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset_y: f64,

    /// Negate y after remapping and offsetting
    #[arg(long)]
    pub flip_y: bool,

    /// Keep the drawing's y axis at extraction instead of flipping it
    #[arg(long)]
    pub no_flip: bool,

    /// Footprint name override (defaults to the label's spec entry)
    #[arg(long)]
    pub footprint: Option<String>,

    /// Element spec TOML file (defaults to the built-in electrode metadata)
    #[arg(long, value_name = "FILE")]
    pub spec: Option<PathBuf>,
}

/// Everything `place` needs once extraction has already happened. Shared
/// between the non-interactive path and the wizard.
#[derive(Debug, Clone)]
pub struct PlaceParams {
    pub pcb: PathBuf,
    pub label: String,
    pub footprint: String,
    pub strategy: Option<String>,
    pub map: Option<PathBuf>,
    pub page: Option<PageStyle>,
    pub offset: (f64, f64),
    pub flip_y: bool,
}

pub fn execute(args: UpdateArgs) -> Result<()> {
    let specs = crate::extract::load_specs(args.spec.as_deref())?;
    let table = padplace_dxf::extract_points(&args.dxf, &specs, !args.no_flip)?;

    if table.is_empty() {
        println!("No circular elements found in {}.", args.dxf.display());
        return Ok(());
    }
    if table.label_count(&args.label) == 0 {
        bail!(
            "label {:?} not present in the drawing (found: {})",
            args.label,
            table.labels().join(", ")
        );
    }

    let footprint = match args.footprint {
        Some(name) => name,
        None => match specs.get(&args.label).and_then(|s| s.footprint.clone()) {
            Some(name) => name,
            None => bail!(
                "no footprint configured for label {:?}; pass --footprint or add it to the spec",
                args.label
            ),
        },
    };

    place(
        table,
        &PlaceParams {
            pcb: args.pcb,
            label: args.label,
            footprint,
            strategy: args.strategy,
            map: args.map,
            page: args.page,
            offset: (args.offset_x, args.offset_y),
            flip_y: args.flip_y,
        },
    )
}

/// Remap, transform and rewrite: the back half of the pipeline.
pub fn place(mut table: PointTable, params: &PlaceParams) -> Result<()> {
    if let Some(map_path) = &params.map {
        let map = remap::parse_remap_file(map_path)?;
        remap::apply_remap_map(&mut table, &params.label, &map);
    } else if let Some(name) = &params.strategy {
        remap::apply_named(&mut table, &params.label, name);
    }

    let (mut dx, mut dy) = params.offset;
    if let Some(page) = params.page {
        let origin = page.origin();
        dx += origin.0;
        dy += origin.1;
    }
    remap::translate(&mut table, &params.label, dx, dy, params.flip_y);

    for p in table.rows().iter().filter(|p| p.label == params.label) {
        log::debug!("placing channel {} at ({}, {})", p.channel, p.x, p.y);
    }

    let report =
        padplace_kicad::update_footprints(&params.pcb, &table, &params.label, &params.footprint)?;

    match &report.output {
        Some(path) => {
            println!(
                "{} Updated {} of {} footprint(s); wrote {}",
                "✓".green(),
                report.updated,
                report.expected,
                path.display()
            );
        }
        None => {
            println!(
                "Footprint {:?} not found in {}; no file written.",
                params.footprint,
                params.pcb.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxf::entities::{Circle, Entity, EntityType};
    use dxf::Drawing;
    use padplace_points::ElementTable;
    use std::path::Path;

    fn write_dxf(path: &Path, circles: &[(f64, f64, f64)]) {
        let mut drawing = Drawing::new();
        for &(x, y, r) in circles {
            let mut circle = Circle::default();
            circle.center = dxf::Point::new(x, y, 0.0);
            circle.radius = r;
            drawing.add_entity(Entity::new(EntityType::Circle(circle)));
        }
        drawing.save_file(path).unwrap();
    }

    fn write_pcb(path: &Path, footprint: &str, refs: &[&str]) {
        let mut text = String::from("(kicad_pcb\n");
        for reference in refs {
            text.push_str(&format!(
                "\t(footprint \"{footprint}\"\n\
                 \t\t(at 0 0)\n\
                 \t\t(property \"Reference\" \"{reference}\"\n\
                 \t\t)\n\
                 \t)\n"
            ));
        }
        text.push_str(")\n");
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn pipeline_places_electrodes_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let dxf = dir.path().join("array.dxf");
        let pcb = dir.path().join("board.kicad_pcb");
        write_dxf(&dxf, &[(0.0, 0.0, 1.5), (1.0, -1.0, 1.5), (2.0, -2.0, 1.5)]);
        write_pcb(
            &pcb,
            "CustomComponents:1625-5-57-15_D3.18mm_disk",
            &["U1", "U2", "U3"],
        );

        let specs = ElementTable::builtin();
        let table = padplace_dxf::extract_points(&dxf, &specs, true).unwrap();
        assert_eq!(table.label_count("3mm-electrode"), 3);

        place(
            table,
            &PlaceParams {
                pcb: pcb.clone(),
                label: "3mm-electrode".to_string(),
                footprint: "CustomComponents:1625-5-57-15_D3.18mm_disk".to_string(),
                strategy: Some("forearm-pattern".to_string()),
                map: None,
                page: None,
                offset: (10.0, 5.0),
                flip_y: false,
            },
        )
        .unwrap();

        let output =
            std::fs::read_to_string(dir.path().join("board_updated.kicad_pcb")).unwrap();
        // Extraction flips y, forearm keeps x order, offset is (10, 5).
        assert!(output.contains("\t\t(at 10 5)\n"));
        assert!(output.contains("\t\t(at 11 6)\n"));
        assert!(output.contains("\t\t(at 12 7)\n"));
    }

    #[test]
    fn page_origin_adds_to_offset() {
        let dir = tempfile::tempdir().unwrap();
        let dxf = dir.path().join("one.dxf");
        let pcb = dir.path().join("one.kicad_pcb");
        write_dxf(&dxf, &[(1.0, 0.0, 1.5)]);
        write_pcb(&pcb, "X:Y", &["U1"]);

        let table =
            padplace_dxf::extract_points(&dxf, &ElementTable::builtin(), false).unwrap();
        place(
            table,
            &PlaceParams {
                pcb,
                label: "3mm-electrode".to_string(),
                footprint: "X:Y".to_string(),
                strategy: None,
                map: None,
                page: Some(PageStyle::A4),
                offset: (0.5, 0.0),
                flip_y: false,
            },
        )
        .unwrap();

        let output = std::fs::read_to_string(dir.path().join("one_updated.kicad_pcb")).unwrap();
        assert!(output.contains("\t\t(at 150 105)\n"));
    }
}
