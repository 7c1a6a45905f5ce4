//! Grid topology generation
//!
//! Builds the cells of a grid in normalized `[-0.5, 0.5]²` space from a
//! [`GridConfig`]: box and hex lattices with optional corner jitter, or a
//! relaxed Voronoi tessellation. Curvature subdivision, degenerate-cell
//! removal and the world-space mapping are applied to every topology.

mod baked;
mod box_grid;
mod hex_grid;
mod jitter;
mod lattice;
mod lloyd;
mod sites;
mod voronoi;

pub use baked::{BakedCell, BakedVoronoi};
pub use box_grid::generate_box;
pub use hex_grid::{generate_flat_hex, generate_pointy_hex, hex_proportions, offset_distance};
pub use jitter::{jitter_offset, splitmix64, CornerJitter};
pub use lloyd::{lloyd_relaxation, lloyd_relaxation_with_options, LloydOptions};
pub use sites::{dedup_sites, generate_sites};
pub use voronoi::{build_cells, compute_cells, VoronoiCellGeometry};

use glam::DVec2;
use log::debug;
use std::time::Instant;

use crate::cell::Cell;
use crate::config::{GridConfig, Topology};
use crate::error::Result;
use crate::geometry::{Segment, SegmentId, MIN_VERTEX_DISTANCE};
use crate::region::Region;

/// Sub-segments per edge when curvature is enabled
pub const CURVATURE_DIVISIONS: usize = 5;

/// Cells and the shared segment arena produced by a builder
///
/// Every region's `segments` index into `segments`. `voronoi` holds the
/// clipped cell geometry of irregular grids, which is what gets baked.
#[derive(Debug, Clone, Default)]
pub struct RawGrid {
    pub cells: Vec<Cell>,
    pub segments: Vec<Segment>,
    pub voronoi: Option<Vec<VoronoiCellGeometry>>,
}

/// Generate the cells of a grid from configuration
///
/// Neighbour lists are left empty; see [`crate::graph::build_neighbours`].
///
/// # Example
///
/// ```rust
/// use territory_grid::*;
/// use territory_grid::generation::generate_grid;
///
/// let config = GridConfigBuilder::new().rows(3).columns(4).build();
/// let raw = generate_grid(&config);
/// assert_eq!(raw.cells.len(), 12);
/// ```
pub fn generate_grid(config: &GridConfig) -> RawGrid {
    let start = Instant::now();
    let raw = match config.topology {
        Topology::Box => generate_box(config.rows, config.columns, config.seed, config.corner_jitter),
        Topology::FlatHex => generate_flat_hex(
            config.rows,
            config.columns,
            config.even_layout,
            config.seed,
            config.corner_jitter,
        ),
        Topology::PointyHex => generate_pointy_hex(
            config.rows,
            config.columns,
            config.even_layout,
            config.seed,
            config.corner_jitter,
        ),
        Topology::Irregular => generate_irregular(config),
    };
    let raw = finish(raw, config);
    debug!(
        "generated {} grid: {} cells, {} segments in {:?}",
        config.topology.name(),
        raw.cells.len(),
        raw.segments.len(),
        start.elapsed()
    );
    raw
}

/// Rebuild an irregular grid from baked Voronoi data, skipping relaxation
pub fn generate_from_baked(config: &GridConfig, baked: &BakedVoronoi) -> Result<RawGrid> {
    let geometry = baked.to_geometry()?;
    let raw = finish(build_cells(&geometry), config);
    debug!(
        "rebuilt baked grid: {} cells, {} segments",
        raw.cells.len(),
        raw.segments.len()
    );
    Ok(raw)
}

fn generate_irregular(config: &GridConfig) -> RawGrid {
    let sites = match &config.sites {
        Some(sites) => dedup_sites(sites, MIN_VERTEX_DISTANCE),
        None => generate_sites(config.cell_count, config.seed),
    };
    let options = LloydOptions {
        max_iterations: config.relaxation,
        convergence_threshold: config.relaxation_convergence,
    };
    let (_, geometry) = lloyd_relaxation_with_options(sites, options);
    build_cells(&geometry)
}

fn finish(mut raw: RawGrid, config: &GridConfig) -> RawGrid {
    if config.curvature > 0.0 {
        apply_curvature(&mut raw, config.curvature);
    }
    drop_degenerate(&mut raw);
    for cell in &mut raw.cells {
        cell.scaled_center = config.to_world(cell.center);
        cell.region.update_scaled(config.origin, config.scale);
    }
    raw
}

/// Replace every interior segment by a bowed polyline
///
/// Border segments stay straight so the grid outline is unchanged. Both cells
/// sharing a segment walk the same sub-segments, in opposite directions.
fn apply_curvature(raw: &mut RawGrid, curvature: f64) {
    let mut segments: Vec<Segment> = Vec::with_capacity(raw.segments.len() * CURVATURE_DIVISIONS);
    let pieces: Vec<Vec<SegmentId>> = raw
        .segments
        .iter()
        .map(|seg| {
            let divisions = if seg.border { 1 } else { CURVATURE_DIVISIONS };
            seg.subdivide(divisions, curvature)
                .into_iter()
                .map(|s| {
                    segments.push(s);
                    segments.len() - 1
                })
                .collect()
        })
        .collect();

    for cell in &mut raw.cells {
        let old_points = cell.region.points().to_vec();
        let n = old_points.len();
        if n != cell.region.segments.len() {
            continue;
        }
        let mut points: Vec<DVec2> = Vec::with_capacity(n * CURVATURE_DIVISIONS);
        let mut ids: Vec<SegmentId> = Vec::with_capacity(n * CURVATURE_DIVISIONS);
        for (i, &old_id) in cell.region.segments.iter().enumerate() {
            let from = old_points[i];
            let old = &raw.segments[old_id];
            let forward = old.start.distance_squared(from) <= old.end.distance_squared(from);
            let chain = &pieces[old_id];
            if forward {
                for &id in chain {
                    points.push(segments[id].start);
                    ids.push(id);
                }
            } else {
                for &id in chain.iter().rev() {
                    points.push(segments[id].end);
                    ids.push(id);
                }
            }
        }
        cell.region = Region::new(points, ids);
    }
    raw.segments = segments;
}

/// Drop cells with invalid regions, renumber, and compact the segment arena
///
/// A shared segment that lost one of its cells becomes a border segment.
fn drop_degenerate(raw: &mut RawGrid) {
    let before = raw.cells.len();
    raw.cells.retain(|c| c.region.is_valid());
    let dropped = before - raw.cells.len();
    if dropped == 0 {
        return;
    }
    debug!("dropped {} degenerate cells", dropped);

    for (index, cell) in raw.cells.iter_mut().enumerate() {
        cell.index = index;
    }

    let mut usage = vec![0u32; raw.segments.len()];
    for cell in &raw.cells {
        for &id in &cell.region.segments {
            usage[id] += 1;
        }
    }
    let mut remap: Vec<Option<SegmentId>> = vec![None; raw.segments.len()];
    let mut segments = Vec::with_capacity(raw.segments.len());
    for (old, seg) in raw.segments.iter().enumerate() {
        if usage[old] == 0 {
            continue;
        }
        let mut seg = seg.clone();
        if usage[old] == 1 {
            seg.border = true;
        }
        remap[old] = Some(segments.len());
        segments.push(seg);
    }
    for cell in &mut raw.cells {
        for id in &mut cell.region.segments {
            if let Some(new) = remap[*id] {
                *id = new;
            }
        }
    }
    raw.segments = segments;
}
