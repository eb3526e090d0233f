//! Line-oriented `.kicad_pcb` footprint coordinate rewriter.
//!
//! This is deliberately not a PCB parser. The scanner keys on three textual
//! patterns only — the footprint opening declaration, the block's `(at x y)`
//! coordinate line, and the `(property "Reference" "...")` line — and leaves
//! every other byte of the file untouched. A structural change to KiCad's
//! output format would break the matching silently; that fragility is a
//! known property of the format-preserving approach, inherited from the
//! workflow this tool automates.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;

use padplace_points::PointTable;

/// Suffix inserted before the extension of the rewritten file.
pub const UPDATED_SUFFIX: &str = "_updated";

#[derive(Debug, thiserror::Error)]
pub enum KicadError {
    #[error("failed to read PCB file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write PCB file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Result of a rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Footprint blocks whose coordinate line was replaced.
    pub updated: usize,
    /// Rows supplied for placement.
    pub expected: usize,
    /// Path the rewritten file was written to; `None` when no block matched
    /// the footprint name and nothing was written.
    pub output: Option<PathBuf>,
}

/// Per-block scanner state. A block is committed (and the state reset to
/// `Seeking`) once both the coordinate line and the reference designator
/// have been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Looking for the next `(footprint "<name>"` declaration.
    Seeking,
    /// Inside a matched block, awaiting the first `(at ` coordinate line.
    AwaitCoords,
    /// Coordinate line recorded, awaiting the Reference property.
    AwaitReference { coords_line: usize },
}

/// Rewrite the coordinates of every `footprint`-named block whose reference
/// designator number has a matching channel in the label's rows.
///
/// The patched content goes to a sibling file with an [`UPDATED_SUFFIX`]
/// name; the input is never modified. Blocks without a table match are left
/// byte-identical. Scanning stops early once as many blocks were updated as
/// rows were supplied.
pub fn update_footprints(
    pcb_path: &Path,
    table: &PointTable,
    label: &str,
    footprint: &str,
) -> Result<UpdateReport, KicadError> {
    let content = std::fs::read_to_string(pcb_path).map_err(|source| KicadError::Read {
        path: pcb_path.to_path_buf(),
        source,
    })?;

    let mut coords: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    for p in table.rows().iter().filter(|p| p.label == label) {
        coords.insert(p.channel, (p.x, p.y));
    }
    let expected = coords.len();
    if expected == 0 {
        log::warn!("no rows carry label {label:?}; nothing to place");
        return Ok(UpdateReport {
            updated: 0,
            expected: 0,
            output: None,
        });
    }

    let reference_re = Regex::new(r#"\(property "Reference" "([^"]+)""#).unwrap();
    let opening = format!("(footprint \"{footprint}\"");

    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    let mut state = ScanState::Seeking;
    let mut updated = 0usize;
    let mut blocks_seen = 0usize;

    for i in 0..lines.len() {
        if updated >= expected {
            break;
        }
        let line = lines[i].clone();
        let is_property = line.contains("property");

        if line.contains(&opening) && !is_property {
            log::debug!("footprint {footprint} opens at line {}", i + 1);
            blocks_seen += 1;
            state = ScanState::AwaitCoords;
            continue;
        }

        match state {
            ScanState::Seeking => {}
            ScanState::AwaitCoords => {
                if line.contains("(at ") && !is_property {
                    state = ScanState::AwaitReference { coords_line: i };
                }
            }
            ScanState::AwaitReference { coords_line } => {
                let Some(caps) = reference_re.captures(&line) else {
                    continue;
                };
                let designator = &caps[1];
                match split_designator(designator) {
                    Some((prefix, channel)) => {
                        if let Some(&(x, y)) = coords.get(&channel) {
                            let terminator = line_terminator(&lines[coords_line]);
                            lines[coords_line] = format!("\t\t(at {x} {y}){terminator}");
                            updated += 1;
                            log::debug!(
                                "updated {prefix}{channel} coordinates to ({x}, {y}) at line {}",
                                coords_line + 1
                            );
                        } else {
                            log::debug!("no table row for channel {channel} ({designator})");
                        }
                    }
                    None => {
                        log::warn!("could not split reference designator {designator:?}");
                    }
                }
                state = ScanState::Seeking;
            }
        }
    }

    if blocks_seen == 0 {
        log::warn!("footprint {footprint:?} not found in {}; nothing written", pcb_path.display());
        return Ok(UpdateReport {
            updated: 0,
            expected,
            output: None,
        });
    }

    let output = updated_path(pcb_path);
    std::fs::write(&output, lines.concat()).map_err(|source| KicadError::Write {
        path: output.clone(),
        source,
    })?;

    if updated < expected {
        log::warn!(
            "only updated {updated} of {expected} footprints; \
             some blocks may be missing or their references unmatched"
        );
    }
    log::info!("updated {updated} footprints, wrote {}", output.display());

    Ok(UpdateReport {
        updated,
        expected,
        output: Some(output),
    })
}

/// Sibling path with the [`UPDATED_SUFFIX`] inserted before the extension.
pub fn updated_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{UPDATED_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{UPDATED_SUFFIX}"),
    };
    path.with_file_name(name)
}

/// Split a reference designator into its letter prefix and integer suffix,
/// e.g. `"U12"` into `("U", 12)`. The integer is the channel key.
pub fn split_designator(designator: &str) -> Option<(&str, u32)> {
    let re = Regex::new(r"^([A-Za-z]+)(\d+)").unwrap();
    let caps = re.captures(designator)?;
    let channel = caps.get(2)?.as_str().parse().ok()?;
    Some((caps.get(1)?.as_str(), channel))
}

/// Scan a PCB file for every distinct footprint name, sorted. Used by the
/// interactive fallback when the chosen label has no configured footprint.
pub fn discover_footprints(pcb_path: &Path) -> Result<Vec<String>, KicadError> {
    let content = std::fs::read_to_string(pcb_path).map_err(|source| KicadError::Read {
        path: pcb_path.to_path_buf(),
        source,
    })?;
    Ok(footprint_names(&content))
}

fn footprint_names(content: &str) -> Vec<String> {
    let re = Regex::new(r#"^\s*\(footprint\s+"([^"]+)""#).unwrap();
    let mut names: Vec<String> = content
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| caps[1].to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

fn line_terminator(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
