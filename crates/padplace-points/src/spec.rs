//! Element specification table: maps a label to the radius (and source
//! entity kind) that identifies it in the drawing, plus the KiCad footprint
//! its channels are placed with.

use std::path::Path;

use serde::Deserialize;

use crate::PointsError;

/// Absolute tolerance when matching a detected radius against a spec.
pub const RADIUS_TOLERANCE: f64 = 0.1;

/// Kind of drawing entity an element is detected from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    #[default]
    Circle,
}

/// One named element type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElementSpec {
    pub radius: f64,
    #[serde(default)]
    pub entity: EntityKind,
    /// Library-qualified KiCad footprint name, if known.
    #[serde(default)]
    pub footprint: Option<String>,
}

/// Outcome of classifying a detected radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// Labels of later specs that also matched within tolerance. The first
    /// match wins; these are reported so overlapping radius bands do not go
    /// unnoticed.
    pub also_matching: Vec<String>,
}

/// Ordered table of element specs. Insertion order is match order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementTable {
    entries: Vec<(String, ElementSpec)>,
}

#[derive(Debug, Deserialize)]
struct SpecFile {
    element: Vec<SpecFileEntry>,
}

#[derive(Debug, Deserialize)]
struct SpecFileEntry {
    label: String,
    radius: f64,
    #[serde(default)]
    entity: EntityKind,
    #[serde(default)]
    footprint: Option<String>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in element metadata for the electrode-array boards this
    /// tool was written for.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(
            "3mm-electrode",
            ElementSpec {
                radius: 1.5,
                entity: EntityKind::Circle,
                footprint: Some("CustomComponents:1625-5-57-15_D3.18mm_disk".to_string()),
            },
        );
        table.insert(
            "6mm-electrode",
            ElementSpec {
                radius: 3.0,
                entity: EntityKind::Circle,
                footprint: Some(
                    "CustomComponents:2036-3-57-15_D5.99mm_6.25mmPad_6.3mmMask".to_string(),
                ),
            },
        );
        table.insert(
            "m3-mount",
            ElementSpec {
                radius: 1.5,
                entity: EntityKind::Circle,
                footprint: Some("MountingHole:MountingHole_3.2mm_M3_DIN965_Pad".to_string()),
            },
        );
        table.insert(
            "pcb-m3-mount",
            ElementSpec {
                radius: 2.0,
                entity: EntityKind::Circle,
                footprint: Some("MountingHole:MountingHole_3.2mm_M3_DIN965_Pad".to_string()),
            },
        );
        table
    }

    /// Parse a spec table from TOML text. The format is an ordered array of
    /// `[[element]]` tables so that match precedence is explicit:
    ///
    /// ```toml
    /// [[element]]
    /// label = "3mm-electrode"
    /// radius = 1.5
    /// footprint = "CustomComponents:1625-5-57-15_D3.18mm_disk"
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, PointsError> {
        let file: SpecFile = toml::from_str(text)?;
        let mut table = Self::new();
        for entry in file.element {
            table.insert(
                &entry.label,
                ElementSpec {
                    radius: entry.radius,
                    entity: entry.entity,
                    footprint: entry.footprint,
                },
            );
        }
        Ok(table)
    }

    /// Load a spec table from a TOML file.
    pub fn load(path: &Path) -> Result<Self, PointsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Append a spec. Replaces an existing entry with the same label,
    /// keeping its position.
    pub fn insert(&mut self, label: &str, spec: ElementSpec) {
        if let Some(entry) = self.entries.iter_mut().find(|(l, _)| l == label) {
            entry.1 = spec;
        } else {
            self.entries.push((label.to_string(), spec));
        }
    }

    pub fn get(&self, label: &str) -> Option<&ElementSpec> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| s)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify a detected radius: first spec within [`RADIUS_TOLERANCE`]
    /// wins; with no match the label is synthesized as `radius_<r>`.
    pub fn classify(&self, r: f64) -> Classification {
        let mut matches = self
            .entries
            .iter()
            .filter(|(_, spec)| (spec.radius - r).abs() <= RADIUS_TOLERANCE)
            .map(|(label, _)| label.clone());

        match matches.next() {
            Some(label) => Classification {
                label,
                also_matching: matches.collect(),
            },
            None => Classification {
                label: format!("radius_{r:.1}"),
                also_matching: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins_and_overlap_is_reported() {
        let table = ElementTable::builtin();
        // 1.5 matches both 3mm-electrode and m3-mount; table order decides.
        let c = table.classify(1.5);
        assert_eq!(c.label, "3mm-electrode");
        assert_eq!(c.also_matching, vec!["m3-mount".to_string()]);
    }

    #[test]
    fn tolerance_is_absolute() {
        let table = ElementTable::builtin();
        assert_eq!(table.classify(3.1).label, "6mm-electrode");
        assert_eq!(table.classify(2.9).label, "6mm-electrode");
        assert_eq!(table.classify(3.2).label, "radius_3.2");
    }

    #[test]
    fn unmatched_radius_gets_synthetic_label() {
        let table = ElementTable::builtin();
        let c = table.classify(7.0);
        assert_eq!(c.label, "radius_7.0");
        assert!(c.also_matching.is_empty());
    }

    #[test]
    fn toml_spec_preserves_order() {
        let text = r#"
            [[element]]
            label = "mount"
            radius = 1.5
            footprint = "MountingHole:MountingHole_3.2mm_M3_DIN965_Pad"

            [[element]]
            label = "electrode"
            radius = 1.5
        "#;
        let table = ElementTable::from_toml_str(text).unwrap();
        assert_eq!(
            table.labels().collect::<Vec<_>>(),
            vec!["mount", "electrode"]
        );
        // mount is listed first, so it wins the overlapping band.
        assert_eq!(table.classify(1.5).label, "mount");
        assert_eq!(table.get("electrode").unwrap().footprint, None);
        assert_eq!(table.get("mount").unwrap().entity, EntityKind::Circle);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut table = ElementTable::new();
        table.insert(
            "e",
            ElementSpec {
                radius: 1.5,
                entity: EntityKind::Circle,
                footprint: None,
            },
        );
        table.insert(
            "m",
            ElementSpec {
                radius: 3.0,
                entity: EntityKind::Circle,
                footprint: None,
            },
        );
        table.insert(
            "e",
            ElementSpec {
                radius: 2.0,
                entity: EntityKind::Circle,
                footprint: None,
            },
        );
        assert_eq!(table.labels().collect::<Vec<_>>(), vec!["e", "m"]);
        assert_eq!(table.get("e").unwrap().radius, 2.0);
    }
}
