//! Core data model for the padplace pipeline: the point table produced by
//! the DXF extractor, consumed by the remapper and the PCB rewriter.
//!
//! A [`PointTable`] is an ordered collection of rows, one per detected
//! circular entity. Rows carry a label (from element classification) and a
//! per-label channel number assigned in first-seen order after dedup.

pub mod remap;
pub mod spec;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use spec::{ElementSpec, ElementTable, EntityKind};

/// Errors from the point-table layer.
#[derive(Debug, thiserror::Error)]
pub enum PointsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse element spec: {0}")]
    SpecToml(#[from] toml::de::Error),

    #[error("Invalid remap entry on line {line}: {text:?} (expected `old:new`)")]
    RemapLine { line: usize, text: String },
}

/// A detected circular entity before channel assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub label: String,
}

/// One row of the point table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub label: String,
    pub channel: u32,
}

/// Ordered table of classified points.
///
/// Channel numbers within one label always form a contiguous 1-based
/// sequence in extraction order; remapping permutes the coordinate
/// assignment but never the row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointTable {
    rows: Vec<Point>,
}

impl PointTable {
    /// Build a table from raw detections: drop exact duplicate
    /// `(x, y, r, label)` rows (keeping the first occurrence), then assign
    /// channel numbers 1..N per label in detection order.
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        let mut rows: Vec<Point> = Vec::with_capacity(detections.len());

        for d in detections {
            let duplicate = rows
                .iter()
                .any(|p| p.x == d.x && p.y == d.y && p.r == d.r && p.label == d.label);
            if duplicate {
                log::debug!(
                    "dropping duplicate detection ({}, {}, r={}) for label {}",
                    d.x,
                    d.y,
                    d.r,
                    d.label
                );
                continue;
            }
            let channel = rows.iter().filter(|p| p.label == d.label).count() as u32 + 1;
            rows.push(Point {
                x: d.x,
                y: d.y,
                r: d.r,
                label: d.label,
                channel,
            });
        }

        PointTable { rows }
    }

    pub fn rows(&self) -> &[Point] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Point] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for p in &self.rows {
            if !labels.iter().any(|l| l == &p.label) {
                labels.push(p.label.clone());
            }
        }
        labels
    }

    /// Number of rows carrying the given label.
    pub fn label_count(&self, label: &str) -> usize {
        self.rows.iter().filter(|p| p.label == label).count()
    }

    /// Look up one row by label and channel number.
    pub fn find(&self, label: &str, channel: u32) -> Option<&Point> {
        self.rows
            .iter()
            .find(|p| p.label == label && p.channel == channel)
    }

    /// Export one CSV file per label into `dir`, named
    /// `<label>_coordinates.csv`, columns `x,y,r,label,channel`.
    ///
    /// Returns the written paths.
    pub fn export_csv(&self, dir: &Path) -> Result<Vec<PathBuf>, PointsError> {
        let mut written = Vec::new();
        for label in self.labels() {
            let path = dir.join(format!("{label}_coordinates.csv"));
            let mut writer = csv::Writer::from_path(&path)?;
            for point in self.rows.iter().filter(|p| p.label == label) {
                writer.serialize(point)?;
            }
            writer.flush()?;
            log::info!("exported {} coordinates to {}", label, path.display());
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f64, y: f64, r: f64, label: &str) -> Detection {
        Detection {
            x,
            y,
            r,
            label: label.to_string(),
        }
    }

    #[test]
    fn channels_are_contiguous_per_label() {
        let table = PointTable::from_detections(vec![
            det(0.0, 0.0, 1.5, "e"),
            det(1.0, 1.0, 1.5, "e"),
            det(5.0, 5.0, 3.0, "m"),
            det(2.0, 2.0, 1.5, "e"),
        ]);

        let channels: Vec<u32> = table
            .rows()
            .iter()
            .filter(|p| p.label == "e")
            .map(|p| p.channel)
            .collect();
        assert_eq!(channels, vec![1, 2, 3]);
        assert_eq!(table.find("m", 1).map(|p| (p.x, p.y)), Some((5.0, 5.0)));
    }

    #[test]
    fn duplicates_are_dropped_before_numbering() {
        let table = PointTable::from_detections(vec![
            det(0.0, 0.0, 1.5, "e"),
            det(0.0, 0.0, 1.5, "e"),
            det(1.0, 1.0, 1.5, "e"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.find("e", 2).map(|p| p.x), Some(1.0));
    }

    #[test]
    fn same_coordinates_different_label_are_kept() {
        let table = PointTable::from_detections(vec![
            det(0.0, 0.0, 1.5, "e"),
            det(0.0, 0.0, 1.5, "m3"),
        ]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn labels_in_first_seen_order() {
        let table = PointTable::from_detections(vec![
            det(0.0, 0.0, 1.5, "b"),
            det(1.0, 0.0, 3.0, "a"),
            det(2.0, 0.0, 1.5, "b"),
        ]);
        assert_eq!(table.labels(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn csv_export_writes_one_file_per_label() {
        let dir = tempfile::tempdir().unwrap();
        let table = PointTable::from_detections(vec![
            det(0.0, 0.5, 1.5, "e"),
            det(1.0, 1.5, 1.5, "e"),
            det(5.0, 5.0, 3.0, "m"),
        ]);

        let written = table.export_csv(dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let e_csv = std::fs::read_to_string(dir.path().join("e_coordinates.csv")).unwrap();
        let mut lines = e_csv.lines();
        assert_eq!(lines.next(), Some("x,y,r,label,channel"));
        assert_eq!(lines.next(), Some("0.0,0.5,1.5,e,1"));
        assert_eq!(lines.next(), Some("1.0,1.5,1.5,e,2"));
    }
}
