//! DXF circle extraction.
//!
//! Scans a drawing's entities for circles, rounds their geometry, and
//! classifies each against an [`ElementTable`] to produce a labeled
//! [`PointTable`] with per-label channel numbers.

use std::path::Path;

use dxf::entities::EntityType;
use dxf::Drawing;

use padplace_points::{Detection, ElementTable, PointTable};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read drawing {path}: {source}")]
    Drawing {
        path: String,
        source: dxf::DxfError,
    },
}

/// Extract every circular entity from the drawing at `path`.
///
/// Centers are rounded to 2 decimals and radii to 1 decimal before
/// classification; `flip_y` negates the y coordinate at extraction time
/// (DXF and KiCad disagree on the y axis direction, so this defaults to on
/// in the CLI). Exact duplicate detections collapse to one row and channels
/// are numbered 1..N per label in drawing order.
///
/// A drawing without circles yields an empty table, not an error.
pub fn extract_points(
    path: &Path,
    specs: &ElementTable,
    flip_y: bool,
) -> Result<PointTable, ExtractError> {
    let drawing = Drawing::load_file(path).map_err(|source| ExtractError::Drawing {
        path: path.display().to_string(),
        source,
    })?;
    Ok(points_from_drawing(&drawing, specs, flip_y))
}

/// Classify the circles of an already-loaded drawing.
pub fn points_from_drawing(drawing: &Drawing, specs: &ElementTable, flip_y: bool) -> PointTable {
    let mut detections = Vec::new();

    for entity in drawing.entities() {
        let EntityType::Circle(circle) = &entity.specific else {
            continue;
        };
        let x = round2(circle.center.x);
        let y = if flip_y {
            round2(-circle.center.y)
        } else {
            round2(circle.center.y)
        };
        let r = round1(circle.radius);

        let classification = specs.classify(r);
        for other in &classification.also_matching {
            log::warn!(
                "circle at ({x}, {y}) with radius {r} also matches spec {other:?}; \
                 keeping first match {:?}",
                classification.label
            );
        }
        detections.push(Detection {
            x,
            y,
            r,
            label: classification.label,
        });
    }

    if detections.is_empty() {
        log::info!("no circular entities found in drawing");
    }
    PointTable::from_detections(detections)
}

fn round2(v: f64) -> f64 {
    normalize((v * 100.0).round() / 100.0)
}

fn round1(v: f64) -> f64 {
    normalize((v * 10.0).round() / 10.0)
}

// Collapse -0.0 so flipped origins format as plain 0.
fn normalize(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}
