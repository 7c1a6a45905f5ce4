//! Lloyd's Relaxation for uniform site distribution
//!
//! Lloyd's Relaxation iteratively improves the uniformity of the sites by
//! moving each site to the centroid of its clipped Voronoi cell.

use glam::DVec2;
use log::debug;
use std::time::Instant;

use super::voronoi::{compute_cells, VoronoiCellGeometry};

/// Options for Lloyd's relaxation algorithm
#[derive(Debug, Clone, Copy)]
pub struct LloydOptions {
    /// Maximum number of iterations to run
    pub max_iterations: usize,
    /// Convergence threshold - stop when max displacement < this value
    /// times the average site spacing. Set to 0.0 to disable early termination
    pub convergence_threshold: f64,
}

impl Default for LloydOptions {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            convergence_threshold: 0.0,
        }
    }
}

/// Apply Lloyd's Relaxation with a fixed number of iterations
pub fn lloyd_relaxation(sites: Vec<DVec2>, iterations: usize) -> Vec<DVec2> {
    let options = LloydOptions {
        max_iterations: iterations,
        ..Default::default()
    };
    lloyd_relaxation_with_options(sites, options).0
}

/// Apply Lloyd's Relaxation with custom options
///
/// Returns the relaxed sites together with the Voronoi cells of those sites,
/// so the caller does not need to clip them a second time.
///
/// Cells that collapse to nothing keep their site where it was.
pub fn lloyd_relaxation_with_options(
    mut sites: Vec<DVec2>,
    options: LloydOptions,
) -> (Vec<DVec2>, Vec<VoronoiCellGeometry>) {
    let total_start = Instant::now();
    let spacing = 1.0 / (sites.len().max(1) as f64).sqrt();
    let threshold = options.convergence_threshold * spacing;

    debug!(
        "lloyd: {} sites, max {} iterations, threshold {:.2e}",
        sites.len(),
        options.max_iterations,
        threshold
    );

    let mut cells = compute_cells(&sites);
    let mut iterations_run = 0;
    let mut converged = false;

    for iteration in 0..options.max_iterations {
        let iter_start = Instant::now();
        let mut max_displacement: f64 = 0.0;

        for (site, cell) in sites.iter_mut().zip(cells.iter()) {
            if cell.is_empty() {
                continue;
            }
            let target = cell.centroid();
            max_displacement = max_displacement.max(site.distance(target));
            *site = target;
        }
        cells = compute_cells(&sites);
        iterations_run = iteration + 1;

        debug!(
            "lloyd: iteration {} took {:?}, max displacement {:.2e}",
            iterations_run,
            iter_start.elapsed(),
            max_displacement
        );

        if threshold > 0.0 && max_displacement < threshold {
            converged = true;
            break;
        }
    }

    debug!(
        "lloyd: finished {} of {} iterations, converged={}, total={:?}",
        iterations_run,
        options.max_iterations,
        converged,
        total_start.elapsed()
    );

    (sites, cells)
}
