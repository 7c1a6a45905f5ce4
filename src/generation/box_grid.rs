//! Rectangular lattice

use glam::DVec2;

use super::jitter::CornerJitter;
use super::lattice::{build_lattice, LatticeCell};
use super::RawGrid;

/// Build a `rows × columns` box grid spanning `[-0.5, 0.5]²`
///
/// Cells are indexed row-major from the bottom-left corner. Corner `(i, j)`
/// of the lattice sits at `(-0.5 + i / columns, -0.5 + j / rows)`.
pub fn generate_box(rows: usize, columns: usize, seed: u32, corner_jitter: f64) -> RawGrid {
    let (rows, columns) = (rows.max(1), columns.max(1));
    let cell_size = DVec2::new(1.0 / columns as f64, 1.0 / rows as f64);

    let mut lattice = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        for column in 0..columns {
            let (i, j) = (column as i64, row as i64);
            lattice.push(LatticeCell {
                row,
                column,
                center: DVec2::new(
                    -0.5 + (column as f64 + 0.5) * cell_size.x,
                    -0.5 + (row as f64 + 0.5) * cell_size.y,
                ),
                corners: vec![(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)],
            });
        }
    }

    let to_point = |(i, j): (i64, i64)| {
        DVec2::new(
            -0.5 + i as f64 / columns as f64,
            -0.5 + j as f64 / rows as f64,
        )
    };
    build_lattice(
        &lattice,
        to_point,
        CornerJitter::new(seed, corner_jitter, cell_size),
    )
}
