//! Cell adjacency, grid metrics and clearance
//!
//! Neighbours are derived from shared segments: the first cell to touch a
//! segment claims it, the second becomes a neighbour of the first. Border
//! segments never produce neighbours.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::cell::Cell;
use crate::config::Topology;
use crate::generation::offset_distance;
use crate::geometry::Segment;

/// Rebuild every cell's neighbour list from the segment arena
///
/// Resets segment claims first, so it can be called again after cells change.
pub fn build_neighbours(cells: &mut [Cell], segments: &mut [Segment]) {
    for seg in segments.iter_mut() {
        seg.cell_index = None;
    }
    for cell in cells.iter_mut() {
        cell.neighbours.clear();
    }

    let n = cells.len() as u64;
    let mut seen: FxHashSet<u64> = FxHashSet::default();
    for index in 0..cells.len() {
        for k in 0..cells[index].region.segments.len() {
            let seg = &mut segments[cells[index].region.segments[k]];
            if seg.border {
                continue;
            }
            let other = match seg.cell_index {
                None => {
                    seg.cell_index = Some(index);
                    continue;
                }
                Some(other) if other == index => continue,
                Some(other) => other,
            };
            let (a, b) = (index.min(other) as u64, index.max(other) as u64);
            if seen.insert(a * n + b) {
                cells[index].neighbours.push(other);
                cells[other].neighbours.push(index);
            }
        }
    }
}

/// Both cells touching each segment, in claim order
///
/// Border segments have at most one owner.
pub fn segment_owners(cells: &[Cell], segment_count: usize) -> Vec<[Option<usize>; 2]> {
    let mut owners = vec![[None, None]; segment_count];
    for cell in cells {
        for &id in &cell.region.segments {
            let slot = &mut owners[id];
            if slot[0].is_none() {
                slot[0] = Some(cell.index);
            } else if slot[0] != Some(cell.index) && slot[1].is_none() {
                slot[1] = Some(cell.index);
            }
        }
    }
    owners
}

/// Map `(row, column)` to cell index for regular topologies
pub fn lattice_lookup(cells: &[Cell], rows: usize, columns: usize) -> Vec<Option<usize>> {
    let mut lookup = vec![None; rows * columns];
    for cell in cells {
        if cell.row < rows && cell.column < columns {
            lookup[cell.row * columns + cell.column] = Some(cell.index);
        }
    }
    lookup
}

/// Lattice distance between two cells of a regular grid
///
/// Manhattan distance on box grids, hex distance on hexagonal grids and
/// `None` on irregular grids, which have no lattice.
pub fn lattice_distance(topology: Topology, even_layout: bool, a: &Cell, b: &Cell) -> Option<usize> {
    match topology {
        Topology::Box => Some(a.row.abs_diff(b.row) + a.column.abs_diff(b.column)),
        Topology::FlatHex => Some(offset_distance(
            (a.row, a.column),
            (b.row, b.column),
            even_layout,
        )),
        Topology::PointyHex => Some(offset_distance(
            (a.column, a.row),
            (b.column, b.row),
            even_layout,
        )),
        Topology::Irregular => None,
    }
}

/// Breadth-first hop count from `start`, bounded by `max_hops`
pub fn hop_distances(cells: &[Cell], start: usize, max_hops: Option<usize>) -> Vec<Option<usize>> {
    let mut dist = vec![None; cells.len()];
    if start >= cells.len() {
        return dist;
    }
    dist[start] = Some(0);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        let d = dist[current].unwrap_or(0);
        if max_hops.is_some_and(|max| d >= max) {
            continue;
        }
        for &n in &cells[current].neighbours {
            if dist[n].is_none() {
                dist[n] = Some(d + 1);
                queue.push_back(n);
            }
        }
    }
    dist
}

/// Cells reachable within `hops` steps, including `center`
pub fn cells_within_hops(cells: &[Cell], center: usize, hops: usize) -> Vec<usize> {
    hop_distances(cells, center, Some(hops))
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.map(|_| i))
        .collect()
}

#[inline]
fn is_blocked(cell: &Cell, mask: u32) -> bool {
    !cell.can_cross || cell.group & mask == 0
}

/// Fill every cell's `clearance` for the given group mask
///
/// On regular grids a square ring is grown around each open cell until it
/// meets a cell that is impassable or outside `mask`; the ring radius at
/// that point is the clearance. Blocked cells get 0 and cells with no
/// obstacle anywhere get `max(rows, columns)`. Irregular grids have no
/// lattice, so the hop distance to the nearest blocked cell is used instead.
/// Values saturate at 255.
pub fn compute_clearance(cells: &mut [Cell], topology: Topology, rows: usize, columns: usize, mask: u32) {
    if topology.is_regular() {
        compute_lattice_clearance(cells, rows, columns, mask);
    } else {
        compute_graph_clearance(cells, mask);
    }
}

fn compute_lattice_clearance(cells: &mut [Cell], rows: usize, columns: usize, mask: u32) {
    let lookup = lattice_lookup(cells, rows, columns);
    let blocked_at = |r: i64, c: i64| -> bool {
        if r < 0 || c < 0 || r >= rows as i64 || c >= columns as i64 {
            return false;
        }
        lookup[r as usize * columns + c as usize]
            .map(|i| is_blocked(&cells[i], mask))
            .unwrap_or(false)
    };
    let limit = rows.max(columns);

    let values: Vec<u8> = cells
        .iter()
        .map(|cell| {
            if is_blocked(cell, mask) {
                return 0;
            }
            let (row, col) = (cell.row as i64, cell.column as i64);
            let mut clearance = limit;
            'rings: for r in 1..=limit as i64 {
                for d in -r..=r {
                    if blocked_at(row - r, col + d)
                        || blocked_at(row + r, col + d)
                        || blocked_at(row + d, col - r)
                        || blocked_at(row + d, col + r)
                    {
                        clearance = r as usize;
                        break 'rings;
                    }
                }
            }
            clearance.min(u8::MAX as usize) as u8
        })
        .collect();

    for (cell, value) in cells.iter_mut().zip(values) {
        cell.clearance = value;
    }
}

fn compute_graph_clearance(cells: &mut [Cell], mask: u32) {
    let mut dist: Vec<Option<usize>> = vec![None; cells.len()];
    let mut queue = VecDeque::new();
    for (i, cell) in cells.iter().enumerate() {
        if is_blocked(cell, mask) {
            dist[i] = Some(0);
            queue.push_back(i);
        }
    }
    while let Some(current) = queue.pop_front() {
        let d = dist[current].unwrap_or(0);
        for &n in &cells[current].neighbours {
            if dist[n].is_none() {
                dist[n] = Some(d + 1);
                queue.push_back(n);
            }
        }
    }
    for (cell, d) in cells.iter_mut().zip(dist) {
        cell.clearance = d.unwrap_or(usize::MAX).min(u8::MAX as usize) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate_box, generate_flat_hex, generate_pointy_hex, RawGrid};

    fn linked(mut raw: RawGrid) -> RawGrid {
        build_neighbours(&mut raw.cells, &mut raw.segments);
        raw
    }

    #[test]
    fn test_box_neighbours() {
        let raw = linked(generate_box(3, 3, 1, 0.0));
        let mut centre: Vec<usize> = raw.cells[4].neighbours.to_vec();
        centre.sort();
        assert_eq!(centre, vec![1, 3, 5, 7]);
        assert_eq!(raw.cells[0].neighbour_count(), 2);
    }

    #[test]
    fn test_neighbours_symmetric_and_loop_free() {
        for raw in [
            linked(generate_box(4, 5, 1, 0.3)),
            linked(generate_flat_hex(4, 5, false, 1, 0.0)),
            linked(generate_pointy_hex(5, 4, true, 1, 0.0)),
        ] {
            for cell in &raw.cells {
                assert!(!cell.is_neighbour_of(cell.index));
                for &n in &cell.neighbours {
                    assert!(raw.cells[n].is_neighbour_of(cell.index));
                }
            }
        }
    }

    #[test]
    fn test_rebuild_is_stable() {
        let mut raw = linked(generate_flat_hex(3, 3, false, 1, 0.0));
        let first: Vec<_> = raw.cells.iter().map(|c| c.neighbours.clone()).collect();
        build_neighbours(&mut raw.cells, &mut raw.segments);
        let second: Vec<_> = raw.cells.iter().map(|c| c.neighbours.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hex_neighbour_distance_is_one() {
        let raw = linked(generate_flat_hex(5, 5, false, 1, 0.0));
        for cell in &raw.cells {
            for &n in &cell.neighbours {
                assert_eq!(
                    lattice_distance(Topology::FlatHex, false, cell, &raw.cells[n]),
                    Some(1)
                );
            }
        }
        let raw = linked(generate_pointy_hex(5, 5, true, 1, 0.0));
        for cell in &raw.cells {
            for &n in &cell.neighbours {
                assert_eq!(
                    lattice_distance(Topology::PointyHex, true, cell, &raw.cells[n]),
                    Some(1)
                );
            }
        }
    }

    #[test]
    fn test_cells_within_hops() {
        let raw = linked(generate_box(5, 5, 1, 0.0));
        assert_eq!(cells_within_hops(&raw.cells, 12, 0), vec![12]);
        assert_eq!(cells_within_hops(&raw.cells, 12, 1).len(), 5);
        assert_eq!(cells_within_hops(&raw.cells, 12, 2).len(), 13);
        assert!(cells_within_hops(&raw.cells, 99, 2).is_empty());
    }

    #[test]
    fn test_segment_owners() {
        let raw = generate_box(1, 2, 1, 0.0);
        let owners = segment_owners(&raw.cells, raw.segments.len());
        let shared: Vec<_> = owners.iter().filter(|o| o[1].is_some()).collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(*shared[0], [Some(0), Some(1)]);
    }

    #[test]
    fn test_clearance_single_obstacle() {
        let mut raw = linked(generate_box(9, 9, 1, 0.0));
        raw.cells[4 * 9 + 4].can_cross = false;
        compute_clearance(&mut raw.cells, Topology::Box, 9, 9, u32::MAX);
        assert_eq!(raw.cells[40].clearance, 0);
        // Along row 4 towards the obstacle
        let row: Vec<u8> = (0..=4).map(|c| raw.cells[4 * 9 + c].clearance).collect();
        assert_eq!(row, vec![4, 3, 2, 1, 0]);
        for w in row.windows(2) {
            assert!(w[0] > w[1]);
        }
        // Diagonal neighbour is one ring away
        assert_eq!(raw.cells[3 * 9 + 3].clearance, 1);
    }

    #[test]
    fn test_clearance_without_obstacles() {
        let mut raw = linked(generate_box(3, 5, 1, 0.0));
        compute_clearance(&mut raw.cells, Topology::Box, 3, 5, u32::MAX);
        assert!(raw.cells.iter().all(|c| c.clearance == 5));
    }

    #[test]
    fn test_clearance_respects_group_mask() {
        let mut raw = linked(generate_box(1, 4, 1, 0.0));
        raw.cells[3].group = 2;
        compute_clearance(&mut raw.cells, Topology::Box, 1, 4, 1);
        let values: Vec<u8> = raw.cells.iter().map(|c| c.clearance).collect();
        assert_eq!(values, vec![3, 2, 1, 0]);
        compute_clearance(&mut raw.cells, Topology::Box, 1, 4, 3);
        assert!(raw.cells.iter().all(|c| c.clearance == 4));
    }

    #[test]
    fn test_graph_clearance() {
        let mut raw = linked(generate_box(1, 4, 1, 0.0));
        raw.cells[0].can_cross = false;
        compute_clearance(&mut raw.cells, Topology::Irregular, 0, 0, u32::MAX);
        let values: Vec<u8> = raw.cells.iter().map(|c| c.clearance).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }
}
