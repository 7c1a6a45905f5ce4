//! Shared-edge construction for regular lattices
//!
//! Box and hex builders describe each cell as a ring of integer corner keys.
//! A segment is created the first time an edge key is seen and reused by the
//! neighbour that meets it again, so adjacent cells reference the very same
//! segment and vertices match exactly without any stitching tolerance.

use glam::DVec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::Cell;
use crate::geometry::{Segment, SegmentId};
use crate::region::Region;

use super::jitter::CornerJitter;
use super::RawGrid;

/// Integer lattice coordinate of a cell corner
pub type CornerKey = (i64, i64);

/// A cell as described by a lattice builder
#[derive(Debug, Clone)]
pub struct LatticeCell {
    pub row: usize,
    pub column: usize,
    pub center: DVec2,
    pub corners: Vec<CornerKey>,
}

#[inline]
fn edge_key(a: CornerKey, b: CornerKey) -> (CornerKey, CornerKey) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Turn lattice cells into cells with shared segments
///
/// `to_point` maps a corner key into normalized space. Edges used by a single
/// cell become border segments; their corners are never jittered so the grid
/// outline stays intact.
pub fn build_lattice(
    lattice: &[LatticeCell],
    to_point: impl Fn(CornerKey) -> DVec2,
    jitter: Option<CornerJitter>,
) -> RawGrid {
    let mut usage: FxHashMap<(CornerKey, CornerKey), u32> = FxHashMap::default();
    for cell in lattice {
        let n = cell.corners.len();
        for i in 0..n {
            *usage
                .entry(edge_key(cell.corners[i], cell.corners[(i + 1) % n]))
                .or_insert(0) += 1;
        }
    }

    let border_corners: FxHashSet<CornerKey> = usage
        .iter()
        .filter(|(_, &count)| count == 1)
        .flat_map(|(&(a, b), _)| [a, b])
        .collect();

    let mut points: FxHashMap<CornerKey, DVec2> = FxHashMap::default();
    let mut corner_point = |key: CornerKey| -> DVec2 {
        *points.entry(key).or_insert_with(|| {
            let base = to_point(key);
            match jitter {
                Some(j) if !border_corners.contains(&key) => j.apply(base),
                _ => base,
            }
        })
    };

    let mut segments: Vec<Segment> = Vec::new();
    let mut edge_ids: FxHashMap<(CornerKey, CornerKey), SegmentId> = FxHashMap::default();
    let mut cells = Vec::with_capacity(lattice.len());

    for (index, lc) in lattice.iter().enumerate() {
        let n = lc.corners.len();
        let ring: Vec<DVec2> = lc.corners.iter().map(|&k| corner_point(k)).collect();
        let ids: Vec<SegmentId> = (0..n)
            .map(|i| {
                let a = lc.corners[i];
                let b = lc.corners[(i + 1) % n];
                let key = edge_key(a, b);
                *edge_ids.entry(key).or_insert_with(|| {
                    let border = usage.get(&key).copied() == Some(1);
                    segments.push(Segment::new(ring[i], ring[(i + 1) % n], border));
                    segments.len() - 1
                })
            })
            .collect();
        cells.push(Cell::new(
            index,
            lc.row,
            lc.column,
            lc.center,
            Region::new(ring, ids),
        ));
    }

    RawGrid {
        cells,
        segments,
        voronoi: None,
    }
}
