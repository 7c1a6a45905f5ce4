//! Frontier classification and territory polygon assembly
//!
//! Every segment of the grid gets exactly one [`Frontier`] record. A side of
//! a segment is *active* when its cell is visible, assigned, and its territory
//! is visible; only active sides take part in ownership.

use glam::DVec2;
use log::trace;

use crate::cell::Cell;
use crate::geometry::{Connector, Contour, Polygon, Segment, SegmentId, MIN_VERTEX_DISTANCE};
use crate::graph::segment_owners;
use crate::region::Region;

use super::Territory;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ownership of one boundary segment
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierStatus {
    /// Both sides belong to the same territory; not drawn
    Interior,
    /// Exactly one side is active, or a border segment of an active cell
    Owned(usize),
    /// Two different territories meet here (lower index first)
    Disputed(usize, usize),
    /// Every side is an invisible cell or lies in a hidden territory
    Hidden,
    /// No side is assigned to a territory
    Neutral,
}

/// Classification record of one segment
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontier {
    pub segment: SegmentId,
    /// Cells on either side, in claim order
    pub cells: [Option<usize>; 2],
    pub border: bool,
    pub status: FrontierStatus,
}

impl Frontier {
    /// Resolved owner; `None` for disputed, interior, hidden and neutral segments
    pub fn territory_index(&self) -> Option<usize> {
        match self.status {
            FrontierStatus::Owned(t) => Some(t),
            _ => None,
        }
    }

    /// Both disputing territories, if any
    pub fn disputing(&self) -> Option<(usize, usize)> {
        match self.status {
            FrontierStatus::Disputed(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Whether the segment is drawn as part of territory `t`'s outline
    pub fn bounds_territory(&self, t: usize) -> bool {
        match self.status {
            FrontierStatus::Owned(o) => o == t,
            FrontierStatus::Disputed(a, b) => a == t || b == t,
            _ => false,
        }
    }
}

/// Whether a side shows: its cell is visible and so is its territory, if any
#[inline]
fn shown(cell: &Cell, territories: &[Territory]) -> bool {
    cell.effectively_visible()
        && cell
            .territory_index
            .and_then(|t| territories.get(t))
            .map_or(true, |t| t.visible)
}

#[inline]
fn active(cell: &Cell, territories: &[Territory]) -> Option<usize> {
    if shown(cell, territories) {
        cell.territory_index
    } else {
        None
    }
}

/// Classify every segment and refresh territory neighbour sets
///
/// Hidden territories behave like invisible cells: their sides never own or
/// dispute a segment, and they gain no neighbours.
pub fn classify_segments(
    cells: &[Cell],
    segments: &[Segment],
    territories: &mut [Territory],
) -> Vec<Frontier> {
    for t in territories.iter_mut() {
        t.neighbours.clear();
    }
    let owners = segment_owners(cells, segments.len());

    owners
        .iter()
        .enumerate()
        .map(|(segment, sides)| {
            let border = segments[segment].border;
            let status = match *sides {
                [None, _] => FrontierStatus::Neutral,
                [Some(a), None] => {
                    let cell = &cells[a];
                    match active(cell, territories) {
                        Some(t) => FrontierStatus::Owned(t),
                        None if !shown(cell, territories) => FrontierStatus::Hidden,
                        None => FrontierStatus::Neutral,
                    }
                }
                [Some(a), Some(b)] => {
                    let (ca, cb) = (&cells[a], &cells[b]);
                    if !shown(ca, territories) && !shown(cb, territories) {
                        FrontierStatus::Hidden
                    } else {
                        match (active(ca, territories), active(cb, territories)) {
                            (None, None) => FrontierStatus::Neutral,
                            (Some(t), None) | (None, Some(t)) => FrontierStatus::Owned(t),
                            (Some(x), Some(y)) if x == y => FrontierStatus::Interior,
                            (Some(x), Some(y)) => {
                                if let Some(tx) = territories.get_mut(x) {
                                    tx.neighbours.insert(y);
                                }
                                if let Some(ty) = territories.get_mut(y) {
                                    ty.neighbours.insert(x);
                                }
                                FrontierStatus::Disputed(x.min(y), x.max(y))
                            }
                        }
                    }
                }
            };
            Frontier {
                segment,
                cells: *sides,
                border,
                status,
            }
        })
        .collect()
}

/// Segments forming the outline of territory `t`
pub fn territory_segments(frontiers: &[Frontier], t: usize) -> impl Iterator<Item = SegmentId> + '_ {
    frontiers
        .iter()
        .filter(move |f| f.bounds_territory(t))
        .map(|f| f.segment)
}

/// Assemble the regions of territory `t`
///
/// Outline segments are stitched into rings. Rings are sorted by area and a
/// ring inside an odd number of larger rings is dropped: it traces the inner
/// edge of a ring-shaped territory, which is only subtracted when internal
/// territories are enabled. The order of `previous` is kept for regions whose
/// centroid still falls inside the old region.
pub fn build_regions(
    frontiers: &[Frontier],
    segments: &[Segment],
    t: usize,
    previous: &[Region],
) -> Vec<Region> {
    let mut connector = Connector::new();
    for id in territory_segments(frontiers, t) {
        connector.add_segment(&segments[id]);
    }

    let mut contours: Vec<Contour> = connector
        .stitch()
        .into_iter()
        .filter(|c| c.len() >= 3)
        .collect();
    contours.sort_by(|a, b| b.area().total_cmp(&a.area()));

    let mut kept: Vec<Contour> = Vec::with_capacity(contours.len());
    for (i, contour) in contours.iter().enumerate() {
        let depth = contours[..i]
            .iter()
            .filter(|outer| outer.contains_contour(contour, MIN_VERTEX_DISTANCE))
            .count();
        if depth % 2 == 0 {
            let mut c = contour.clone();
            c.make_ccw();
            kept.push(c);
        } else {
            trace!("territory {}: dropped nested contour of area {:.3e}", t, contour.area());
        }
    }

    let mut regions: Vec<Option<Region>> = kept
        .into_iter()
        .map(|c| Some(Region::from_polygon(Polygon::new(c))))
        .collect();

    let mut ordered = Vec::with_capacity(regions.len());
    for old in previous {
        let matched = regions.iter().position(|r| {
            r.as_ref()
                .map_or(false, |r| old.polygon.outer().map_or(false, |o| o.contains(r.centroid())))
        });
        if let Some(i) = matched {
            if let Some(region) = regions[i].take() {
                ordered.push(region);
            }
        }
    }
    ordered.extend(regions.into_iter().flatten());
    ordered
}

/// Scaled copy of every region of a territory, for renderers
pub fn update_scaled_regions(territory: &mut Territory, origin: DVec2, scale: DVec2) {
    for region in &mut territory.regions {
        region.update_scaled(origin, scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate_box, RawGrid};
    use crate::graph::build_neighbours;

    fn grid(rows: usize, columns: usize) -> RawGrid {
        let mut raw = generate_box(rows, columns, 1, 0.0);
        build_neighbours(&mut raw.cells, &mut raw.segments);
        raw
    }

    fn assign(raw: &mut RawGrid, owners: &[Option<usize>]) -> Vec<Territory> {
        let count = owners.iter().flatten().max().map_or(0, |m| m + 1);
        let mut territories: Vec<Territory> = (0..count).map(Territory::new).collect();
        for (cell, &owner) in raw.cells.iter_mut().zip(owners) {
            cell.territory_index = owner;
            if let Some(t) = owner {
                territories[t].cells.push(cell.index);
            }
        }
        territories
    }

    #[test]
    fn test_two_territories_dispute_middle() {
        let mut raw = grid(1, 2);
        let mut territories = assign(&mut raw, &[Some(0), Some(1)]);
        let frontiers = classify_segments(&raw.cells, &raw.segments, &mut territories);
        assert_eq!(frontiers.len(), 7);
        let disputed: Vec<_> = frontiers.iter().filter_map(|f| f.disputing()).collect();
        assert_eq!(disputed, vec![(0, 1)]);
        assert!(territories[0].neighbours.contains(&1));
        assert!(territories[1].neighbours.contains(&0));
        assert_eq!(frontiers.iter().filter(|f| f.territory_index() == Some(0)).count(), 3);
    }

    #[test]
    fn test_interior_neutral_hidden() {
        let mut raw = grid(1, 4);
        raw.cells[3].visible = false;
        let mut territories = assign(&mut raw, &[Some(0), Some(0), None, None]);
        let frontiers = classify_segments(&raw.cells, &raw.segments, &mut territories);
        let status_between = |a: usize, b: usize| {
            frontiers
                .iter()
                .find(|f| f.cells == [Some(a), Some(b)])
                .map(|f| f.status)
        };
        assert_eq!(status_between(0, 1), Some(FrontierStatus::Interior));
        assert_eq!(status_between(1, 2), Some(FrontierStatus::Owned(0)));
        assert_eq!(status_between(2, 3), Some(FrontierStatus::Neutral));
        // Border of the invisible cell
        let hidden = frontiers
            .iter()
            .filter(|f| f.border && f.cells[0] == Some(3))
            .all(|f| f.status == FrontierStatus::Hidden);
        assert!(hidden);
    }

    #[test]
    fn test_hidden_territory_yields_to_neighbour() {
        let mut raw = grid(1, 2);
        let mut territories = assign(&mut raw, &[Some(0), Some(1)]);
        territories[1].visible = false;
        let frontiers = classify_segments(&raw.cells, &raw.segments, &mut territories);
        let shared = frontiers
            .iter()
            .find(|f| f.cells == [Some(0), Some(1)])
            .map(|f| f.status);
        assert_eq!(shared, Some(FrontierStatus::Owned(0)));
        assert!(territories[0].neighbours.is_empty());
        assert!(territories[1].neighbours.is_empty());
        let right_border = frontiers
            .iter()
            .filter(|f| f.border && f.cells[0] == Some(1))
            .all(|f| f.status == FrontierStatus::Hidden);
        assert!(right_border);
        assert_eq!(territory_segments(&frontiers, 1).count(), 0);
    }

    #[test]
    fn test_regions_single_square() {
        let mut raw = grid(3, 3);
        let mut territories = assign(&mut raw, &[Some(0); 9]);
        let frontiers = classify_segments(&raw.cells, &raw.segments, &mut territories);
        let regions = build_regions(&frontiers, &raw.segments, 0, &[]);
        assert_eq!(regions.len(), 1);
        assert!((regions[0].area - 1.0).abs() < 1e-12);
        assert!(regions[0].polygon.outer().is_some_and(Contour::is_ccw));
    }

    #[test]
    fn test_split_territory_has_two_regions() {
        let mut raw = grid(1, 3);
        let mut territories = assign(&mut raw, &[Some(0), Some(1), Some(0)]);
        let frontiers = classify_segments(&raw.cells, &raw.segments, &mut territories);
        let regions = build_regions(&frontiers, &raw.segments, 0, &[]);
        assert_eq!(regions.len(), 2);

        // Prior order is kept: right piece first
        let reordered = vec![regions[1].clone(), regions[0].clone()];
        let again = build_regions(&frontiers, &raw.segments, 0, &reordered);
        assert_eq!(again[0].centroid(), reordered[0].centroid());
    }

    #[test]
    fn test_ring_territory_drops_inner_contour() {
        let mut raw = grid(3, 3);
        let mut owners = [Some(0); 9];
        owners[4] = Some(1);
        let mut territories = assign(&mut raw, &owners);
        let frontiers = classify_segments(&raw.cells, &raw.segments, &mut territories);
        let regions = build_regions(&frontiers, &raw.segments, 0, &[]);
        assert_eq!(regions.len(), 1);
        assert!((regions[0].area - 1.0).abs() < 1e-12);
        let inner = build_regions(&frontiers, &raw.segments, 1, &[]);
        assert_eq!(inner.len(), 1);
        assert!((inner[0].area - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_diagonal_touch_splits() {
        let mut raw = grid(2, 2);
        let mut territories = assign(&mut raw, &[Some(0), Some(1), Some(1), Some(0)]);
        let frontiers = classify_segments(&raw.cells, &raw.segments, &mut territories);
        let regions = build_regions(&frontiers, &raw.segments, 0, &[]);
        assert_eq!(regions.len(), 2);
        for r in &regions {
            assert!((r.area - 0.25).abs() < 1e-12);
        }
    }
}
