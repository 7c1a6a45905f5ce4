//! Hexagonal lattices in offset coordinates
//!
//! Corners live on an integer lattice: along the staggered axis a hexagon is
//! four quarter-widths wide and neighbouring centres are three apart; across
//! it a hexagon is two half-heights tall. Pushed columns (flat-top) or rows
//! (pointy-top) are offset by one half-height.

use glam::DVec2;

use super::jitter::CornerJitter;
use super::lattice::{build_lattice, CornerKey, LatticeCell};
use super::RawGrid;

/// Corner offsets of a flat-top hexagon in (quarter-width, half-height) units, counter-clockwise
const FLAT_CORNERS: [(i64, i64); 6] = [(2, 0), (1, 1), (-1, 1), (-2, 0), (-1, -1), (1, -1)];

#[inline]
fn is_pushed(line: usize, even_layout: bool) -> bool {
    (line % 2 == 0) == even_layout
}

/// Flat-top hexagons; columns staggered vertically
pub fn generate_flat_hex(
    rows: usize,
    columns: usize,
    even_layout: bool,
    seed: u32,
    corner_jitter: f64,
) -> RawGrid {
    let (rows, columns) = (rows.max(1), columns.max(1));
    let x_units = (3 * columns + 1) as f64;
    let y_units = (2 * rows + 1) as f64;
    let to_point =
        |(kx, ky): CornerKey| DVec2::new(-0.5 + kx as f64 / x_units, -0.5 + ky as f64 / y_units);

    let mut lattice = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        for column in 0..columns {
            let cx = 2 + 3 * column as i64;
            let cy = 1 + 2 * row as i64 + is_pushed(column, even_layout) as i64;
            lattice.push(LatticeCell {
                row,
                column,
                center: to_point((cx, cy)),
                corners: FLAT_CORNERS.iter().map(|&(dx, dy)| (cx + dx, cy + dy)).collect(),
            });
        }
    }

    let cell_size = DVec2::new(4.0 / x_units, 2.0 / y_units);
    build_lattice(
        &lattice,
        to_point,
        CornerJitter::new(seed, corner_jitter, cell_size),
    )
}

/// Pointy-top hexagons; rows staggered horizontally
///
/// Same lattice as [`generate_flat_hex`] with the axes swapped.
pub fn generate_pointy_hex(
    rows: usize,
    columns: usize,
    even_layout: bool,
    seed: u32,
    corner_jitter: f64,
) -> RawGrid {
    let (rows, columns) = (rows.max(1), columns.max(1));
    let x_units = (2 * columns + 1) as f64;
    let y_units = (3 * rows + 1) as f64;
    let to_point =
        |(kx, ky): CornerKey| DVec2::new(-0.5 + kx as f64 / x_units, -0.5 + ky as f64 / y_units);

    let mut lattice = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        for column in 0..columns {
            let cx = 1 + 2 * column as i64 + is_pushed(row, even_layout) as i64;
            let cy = 2 + 3 * row as i64;
            lattice.push(LatticeCell {
                row,
                column,
                center: to_point((cx, cy)),
                corners: FLAT_CORNERS.iter().map(|&(dy, dx)| (cx + dx, cy + dy)).collect(),
            });
        }
    }

    let cell_size = DVec2::new(2.0 / x_units, 4.0 / y_units);
    build_lattice(
        &lattice,
        to_point,
        CornerJitter::new(seed, corner_jitter, cell_size),
    )
}

/// Factors that map a normalized offset on a hex grid back to regular
/// hexagon proportions
///
/// Lattice units are quarter-widths and half-heights of the hexagon; a
/// regular hexagon of unit size is `1/2` by `√3/2` of those.
pub fn hex_proportions(pointy: bool, rows: usize, columns: usize) -> DVec2 {
    let half_root3 = 3f64.sqrt() * 0.5;
    let (rows, columns) = (rows.max(1) as f64, columns.max(1) as f64);
    if pointy {
        DVec2::new((2.0 * columns + 1.0) * half_root3, (3.0 * rows + 1.0) * 0.5)
    } else {
        DVec2::new((3.0 * columns + 1.0) * 0.5, (2.0 * rows + 1.0) * half_root3)
    }
}

/// Hex distance between two offset coordinates of the same layout
///
/// Works for both orientations: pointy-top callers pass `(column, row)` swapped.
pub fn offset_distance(a: (usize, usize), b: (usize, usize), even_layout: bool) -> usize {
    // Convert (line along stagger axis, position across) to doubled coordinates:
    // doubled_y = 2 * row + pushed, x = column. Adjacent cells differ by
    // (±1, ±1) or (0, ±2).
    let doubled = |(row, column): (usize, usize)| {
        (
            column as i64,
            2 * row as i64 + is_pushed(column, even_layout) as i64,
        )
    };
    let (ax, ay) = doubled(a);
    let (bx, by) = doubled(b);
    let dx = (ax - bx).abs();
    let dy = (ay - by).abs();
    (dx + (dy - dx).max(0) / 2) as usize
}
