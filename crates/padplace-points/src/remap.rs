//! Channel remapping: named strategies that reassign the channel-to-
//! coordinate association for one label's rows, plus the file-based
//! `old:new` remap variant and the final offset/flip transform.
//!
//! Strategies exist to match electrical cable routing order to physical
//! layout order. They permute coordinates across channels; they never add,
//! drop or relabel rows.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::{Point, PointTable, PointsError};

/// Channel-range swaps applied by the 8-by-8 strategies, in order:
/// `(start1, end1, start2, end2)`, both ends inclusive. Each swap exchanges
/// coordinates position-wise between the two ranges. Order matters: later
/// swaps see the results of earlier ones.
pub const SWAP_PAIRS: [(u32, u32, u32, u32); 10] = [
    (9, 16, 17, 24),
    (17, 24, 33, 40),
    (49, 56, 25, 32),
    (65, 72, 33, 40),
    (81, 88, 41, 48),
    (97, 104, 49, 56),
    (113, 120, 57, 64),
    (97, 104, 73, 80),
    (113, 120, 89, 96),
    (113, 120, 105, 112),
];

/// Named remapping strategies. Closed set; unknown names are rejected by
/// [`Strategy::parse`] and treated as a no-op by [`apply_named`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Sort rows by (x ascending, y descending) and renumber 1..N.
    ForearmPattern,
    /// Forearm ordering, then the fixed [`SWAP_PAIRS`] range swaps.
    EightByEight,
    /// `8-by-8`, then block [1..64] swapped with [65..128] wholesale.
    EightByEightSwap,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::ForearmPattern,
        Strategy::EightByEight,
        Strategy::EightByEightSwap,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "forearm-pattern" => Some(Strategy::ForearmPattern),
            "8-by-8" => Some(Strategy::EightByEight),
            "8-by-8_swap" => Some(Strategy::EightByEightSwap),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::ForearmPattern => "forearm-pattern",
            Strategy::EightByEight => "8-by-8",
            Strategy::EightByEightSwap => "8-by-8_swap",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Apply a strategy to the rows carrying `label`. Rows of other labels are
/// untouched.
pub fn apply_strategy(table: &mut PointTable, label: &str, strategy: Strategy) {
    match strategy {
        Strategy::ForearmPattern => {
            renumber_sorted(table, label);
        }
        Strategy::EightByEight => {
            renumber_sorted(table, label);
            force_tail_channels(table, label);
            for pair in SWAP_PAIRS {
                swap_channel_ranges(table, label, pair);
            }
        }
        Strategy::EightByEightSwap => {
            apply_strategy(table, label, Strategy::EightByEight);
            swap_channel_ranges(table, label, (1, 64, 65, 128));
        }
    }
}

/// Look up a strategy by name and apply it. Unknown names leave the table
/// unchanged and emit a diagnostic.
pub fn apply_named(table: &mut PointTable, label: &str, name: &str) {
    match Strategy::parse(name) {
        Some(strategy) => apply_strategy(table, label, strategy),
        None => log::warn!("unknown remapping strategy {name:?}; table left unchanged"),
    }
}

/// Translate the selected label's coordinates by `(dx, dy)`, then negate y
/// if `flip_y` is set. Applied after remapping, never before.
pub fn translate(table: &mut PointTable, label: &str, dx: f64, dy: f64, flip_y: bool) {
    for p in table.rows_mut().iter_mut().filter(|p| p.label == label) {
        p.x += dx;
        p.y += dy;
        if flip_y {
            p.y = -p.y;
        }
    }
}

/// Parse remap text: one `old:new` channel pair per line, blank lines and
/// `#` comments ignored.
pub fn parse_remap_str(text: &str) -> Result<BTreeMap<u32, u32>, PointsError> {
    let mut map = BTreeMap::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let invalid = || PointsError::RemapLine {
            line: i + 1,
            text: raw.to_string(),
        };
        let (old, new) = line.split_once(':').ok_or_else(invalid)?;
        let old: u32 = old.trim().parse().map_err(|_| invalid())?;
        let new: u32 = new.trim().parse().map_err(|_| invalid())?;
        map.insert(old, new);
    }
    Ok(map)
}

/// Parse a remap file, see [`parse_remap_str`].
pub fn parse_remap_file(path: &Path) -> Result<BTreeMap<u32, u32>, PointsError> {
    let text = std::fs::read_to_string(path)?;
    parse_remap_str(&text)
}

/// Apply an explicit old→new channel map to one label: the coordinates of
/// each old channel are written onto the row currently numbered with the new
/// channel (all reads happen before any write), then the label's channels
/// are renumbered 1..N in table order.
pub fn apply_remap_map(table: &mut PointTable, label: &str, map: &BTreeMap<u32, u32>) {
    let mut moves: Vec<(u32, (f64, f64, f64))> = Vec::new();
    for (&old, &new) in map {
        match table.find(label, old) {
            Some(p) => moves.push((new, (p.x, p.y, p.r))),
            None => log::warn!("remap source channel {old} not present for label {label}"),
        }
    }

    for (new, (x, y, r)) in moves {
        if let Some(p) = table
            .rows_mut()
            .iter_mut()
            .find(|p| p.label == label && p.channel == new)
        {
            p.x = x;
            p.y = y;
            p.r = r;
        }
    }

    let mut next = 0;
    for p in table.rows_mut().iter_mut().filter(|p| p.label == label) {
        next += 1;
        p.channel = next;
    }
}

/// Indices of the label's rows sorted by (x ascending, y descending).
fn sorted_label_indices(table: &PointTable, label: &str) -> Vec<usize> {
    let rows = table.rows();
    let mut indices: Vec<usize> = (0..rows.len()).filter(|&i| rows[i].label == label).collect();
    indices.sort_by(|&a, &b| {
        rows[a]
            .x
            .total_cmp(&rows[b].x)
            .then(rows[b].y.total_cmp(&rows[a].y))
    });
    indices
}

fn renumber_sorted(table: &mut PointTable, label: &str) {
    let indices = sorted_label_indices(table, label);
    let rows = table.rows_mut();
    for (n, &i) in indices.iter().enumerate() {
        rows[i].channel = n as u32 + 1;
    }
}

/// With 129 or more rows the first and last rows by sorted position carry
/// the amplifier's fixed reference channels 129/130 and must not take part
/// in the 8-by-8 swaps.
fn force_tail_channels(table: &mut PointTable, label: &str) {
    let indices = sorted_label_indices(table, label);
    if indices.len() < 129 {
        return;
    }
    let (first, last) = (indices[0], indices[indices.len() - 1]);
    let rows = table.rows_mut();
    rows[first].channel = 129;
    rows[last].channel = 130;
}

fn swap_channel_ranges(table: &mut PointTable, label: &str, pair: (u32, u32, u32, u32)) {
    let (start1, end1, start2, end2) = pair;
    let range1 = channel_range_indices(table, label, start1, end1);
    let range2 = channel_range_indices(table, label, start2, end2);
    if range1.len() != range2.len() {
        log::warn!(
            "channel ranges {start1}-{end1} and {start2}-{end2} differ in length ({} vs {}); \
             swapping position-wise over the shorter range",
            range1.len(),
            range2.len()
        );
    }
    let rows = table.rows_mut();
    for (&i, &j) in range1.iter().zip(range2.iter()) {
        swap_coords(rows, i, j);
    }
}

/// Indices of the label's rows whose channel lies in [start, end], in
/// channel order.
fn channel_range_indices(table: &PointTable, label: &str, start: u32, end: u32) -> Vec<usize> {
    let rows = table.rows();
    let mut indices: Vec<usize> = (0..rows.len())
        .filter(|&i| rows[i].label == label && rows[i].channel >= start && rows[i].channel <= end)
        .collect();
    indices.sort_by_key(|&i| rows[i].channel);
    indices
}

fn swap_coords(rows: &mut [Point], i: usize, j: usize) {
    let (x, y, r) = (rows[i].x, rows[i].y, rows[i].r);
    rows[i].x = rows[j].x;
    rows[i].y = rows[j].y;
    rows[i].r = rows[j].r;
    rows[j].x = x;
    rows[j].y = y;
    rows[j].r = r;
}
