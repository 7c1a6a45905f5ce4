//! CellGrid main structure

use glam::DVec2;
use log::{debug, warn};
use std::collections::BTreeSet;

use crate::cell::{Cell, CellSide};
use crate::config::{GridConfig, TerritoryConfig, TerritoryConfigBuilder, Topology};
use crate::entity::Entity;
use crate::error::{GridError, Result};
use crate::generation::{generate_from_baked, generate_grid, BakedVoronoi, RawGrid, VoronoiCellGeometry};
use crate::geometry::{Rect, Segment, SegmentId, MIN_VERTEX_DISTANCE};
use crate::graph::{
    build_neighbours, cells_within_hops, compute_clearance, hop_distances, lattice_distance,
    lattice_lookup, segment_owners,
};
use crate::pathfinding::{CellSearch, CustomCost, LatticeInfo, PathFinder, PathOptions, PathResult};
use crate::territory::{
    build_regions, classify_segments, enclosed_holes, partition, territory_segments,
    update_scaled_regions, Frontier, Territory,
};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// Regeneration passes one `apply_changes` call runs before deferring
const MAX_REGENERATION_PASSES: usize = 8;

/// A generated grid with its territories, frontiers and search state
///
/// # Examples
///
/// ```
/// use territory_grid::*;
///
/// let config = GridConfigBuilder::new()
///     .topology(Topology::FlatHex)
///     .rows(10)
///     .columns(10)
///     .build();
/// let territories = TerritoryConfigBuilder::new().count(3).seed(7).build();
///
/// let mut grid = CellGrid::with_territories(config, territories);
/// assert_eq!(grid.cell_count(), 100);
/// assert_eq!(grid.territories().len(), 3);
///
/// let path = grid.find_path(0, 99, &PathOptions::default()).unwrap();
/// assert!(path.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct CellGrid {
    config: GridConfig,
    territory_config: TerritoryConfig,

    cells: Vec<Cell>,
    segments: Vec<Segment>,
    territories: Vec<Territory>,
    frontiers: Vec<Frontier>,

    /// `(row, column)` → cell index for regular topologies
    lattice: Vec<Option<usize>>,

    /// Clipped Voronoi cells of an irregular grid, kept for baking
    voronoi: Option<Vec<VoronoiCellGeometry>>,

    /// Source of a grid rebuilt from baked data
    baked: Option<BakedVoronoi>,

    /// Group mask the current `clearance` values were computed for
    clearance_mask: Option<u32>,

    path_finder: PathFinder,

    #[cfg(feature = "spatial-index")]
    spatial_index: Option<SpatialIndex>,

    applying_changes: bool,
    pending_regeneration: bool,
}

impl CellGrid {
    /// Generate a grid without territories
    pub fn new(config: GridConfig) -> Self {
        Self::with_territories(config, TerritoryConfigBuilder::new().count(0).build())
    }

    /// Generate a grid and partition it into territories
    ///
    /// # Arguments
    ///
    /// * `config` - Topology, size, seed and world frame; normalized first
    /// * `territory_config` - Territory count, seeding and growth tuning
    ///
    /// # Performance
    ///
    /// Lattice topologies are linear in the cell count. Irregular grids pay
    /// one Delaunay triangulation per Lloyd iteration, O(n log n) each.
    pub fn with_territories(config: GridConfig, territory_config: TerritoryConfig) -> Self {
        let mut grid = Self::empty(config, territory_config);
        grid.regenerate();
        grid
    }

    /// Rebuild an irregular grid from baked Voronoi data
    ///
    /// Relaxation and clipping are skipped; the grid keeps rebuilding from
    /// the baked data until [`CellGrid::set_config`] replaces the configuration.
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidBakedData`] when the sites, polygons and edge tags
    /// disagree in length, hold non-finite coordinates or name a neighbour
    /// that does not name them back.
    pub fn from_baked(
        config: GridConfig,
        baked: BakedVoronoi,
        territory_config: TerritoryConfig,
    ) -> Result<Self> {
        baked.validate()?;
        let config = GridConfig {
            topology: Topology::Irregular,
            ..config
        };
        let mut grid = Self::empty(config, territory_config);
        grid.baked = Some(baked);
        grid.regenerate();
        Ok(grid)
    }

    fn empty(config: GridConfig, territory_config: TerritoryConfig) -> Self {
        Self {
            config: config.normalized(),
            territory_config: territory_config.normalized(),
            cells: Vec::new(),
            segments: Vec::new(),
            territories: Vec::new(),
            frontiers: Vec::new(),
            lattice: Vec::new(),
            voronoi: None,
            baked: None,
            clearance_mask: None,
            path_finder: PathFinder::new(),
            #[cfg(feature = "spatial-index")]
            spatial_index: None,
            applying_changes: false,
            pending_regeneration: false,
        }
    }

    // ------------------------------------------------------------------
    // Regeneration

    /// Regenerate cells, territories and frontiers from the current configuration
    pub fn regenerate(&mut self) {
        self.request_regeneration();
    }

    /// Ask for a full regeneration
    ///
    /// Runs immediately unless a regeneration is already in progress, in
    /// which case it is deferred to the end of that pass.
    pub fn request_regeneration(&mut self) {
        self.pending_regeneration = true;
        if !self.applying_changes {
            self.apply_changes();
        }
    }

    /// Whether a regeneration has been requested but not run yet
    #[inline]
    pub fn has_pending_changes(&self) -> bool {
        self.pending_regeneration
    }

    /// Run pending regenerations; returns the number of passes
    pub fn apply_changes(&mut self) -> usize {
        self.apply_changes_with(|_| {})
    }

    /// Run pending regenerations, calling `on_applied` after each pass
    ///
    /// The callback may request another regeneration; it runs as a further
    /// pass of this call instead of recursing. A nested `apply_changes*` call
    /// only marks the grid pending.
    pub fn apply_changes_with(&mut self, mut on_applied: impl FnMut(&mut CellGrid)) -> usize {
        if self.applying_changes {
            self.pending_regeneration = true;
            return 0;
        }
        self.applying_changes = true;
        let mut passes = 0;
        while self.pending_regeneration && passes < MAX_REGENERATION_PASSES {
            self.pending_regeneration = false;
            self.rebuild();
            passes += 1;
            on_applied(self);
        }
        if self.pending_regeneration {
            warn!(
                "regeneration still pending after {} passes, deferring to the next call",
                passes
            );
        }
        self.applying_changes = false;
        passes
    }

    /// Replace the grid configuration and regenerate
    ///
    /// The configuration is normalized first, see [`GridConfig::normalized`].
    /// Any baked Voronoi data is dropped.
    pub fn set_config(&mut self, config: GridConfig) {
        self.config = config.normalized();
        self.baked = None;
        self.request_regeneration();
    }

    /// Replace the territory configuration and repartition the existing cells
    pub fn set_territory_config(&mut self, territory_config: TerritoryConfig) {
        self.territory_config = territory_config.normalized();
        self.create_territories();
    }

    fn rebuild(&mut self) {
        let raw = match &self.baked {
            Some(baked) => match generate_from_baked(&self.config, baked) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("baked data rejected ({}), generating from configuration", err);
                    generate_grid(&self.config)
                }
            },
            None => generate_grid(&self.config),
        };
        let RawGrid {
            cells,
            segments,
            voronoi,
        } = raw;
        self.cells = cells;
        self.segments = segments;
        self.voronoi = voronoi;

        build_neighbours(&mut self.cells, &mut self.segments);
        self.lattice = if self.config.topology.is_regular() {
            lattice_lookup(&self.cells, self.config.rows, self.config.columns)
        } else {
            Vec::new()
        };
        self.clearance_mask = None;

        #[cfg(feature = "spatial-index")]
        {
            let centers: Vec<DVec2> = self.cells.iter().map(|c| c.scaled_center).collect();
            self.spatial_index = SpatialIndex::new(&centers);
        }

        self.create_territories();
    }

    /// Repartition cells into territories and rebuild every territory outline
    pub fn create_territories(&mut self) {
        self.territories = partition(
            &mut self.cells,
            self.config.topology,
            self.config.even_layout,
            &self.territory_config,
        );
        self.redraw_territories();
    }

    /// Reclassify frontiers and rebuild the regions of dirty territories
    ///
    /// Returns the indices of the territories whose regions were rebuilt.
    pub fn redraw_territories(&mut self) -> Vec<usize> {
        self.frontiers = classify_segments(&self.cells, &self.segments, &mut self.territories);
        let owners = self
            .territory_config
            .internal_territories
            .then(|| segment_owners(&self.cells, self.segments.len()));

        let mut changed = Vec::new();
        for t in 0..self.territories.len() {
            if !self.territories[t].is_dirty() {
                continue;
            }
            let previous = std::mem::take(&mut self.territories[t].regions);
            let mut regions = build_regions(&self.frontiers, &self.segments, t, &previous);
            if let Some(owners) = &owners {
                for hole in enclosed_holes(&self.cells, &self.segments, owners, t) {
                    let host = regions.iter_mut().find(|r| {
                        r.polygon
                            .outer()
                            .is_some_and(|o| o.contains_contour(&hole, MIN_VERTEX_DISTANCE))
                    });
                    if let Some(region) = host {
                        region.add_hole(hole);
                    }
                }
            }

            let territory = &mut self.territories[t];
            territory.regions = regions;
            territory.update_center(&self.cells);
            update_scaled_regions(territory, self.config.origin, self.config.scale);
            territory.set_dirty(false);
            changed.push(t);
        }
        debug!(
            "redrew {} of {} territories",
            changed.len(),
            self.territories.len()
        );
        changed
    }

    // ------------------------------------------------------------------
    // Accessors

    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[inline]
    pub fn territory_config(&self) -> &TerritoryConfig {
        &self.territory_config
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get a cell by index, `None` when out of range
    #[inline]
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    #[inline]
    pub fn territory(&self, index: usize) -> Option<&Territory> {
        self.territories.get(index)
    }

    /// Mutable territory access for attributes and the visible flag
    pub fn territory_mut(&mut self, index: usize) -> Option<&mut Territory> {
        self.territories.get_mut(index)
    }

    /// One record per segment, in segment order
    #[inline]
    pub fn frontiers(&self) -> &[Frontier] {
        &self.frontiers
    }

    /// Neighbour indices of a cell, empty when out of range
    pub fn neighbours(&self, index: usize) -> &[usize] {
        self.cells
            .get(index)
            .map(|c| c.neighbours.as_slice())
            .unwrap_or(&[])
    }

    /// World-space rectangle covered by the grid
    pub fn bounds(&self) -> Rect {
        let half = self.config.scale * 0.5;
        Rect::new(self.config.origin - half, self.config.origin + half)
    }

    /// Snapshot of the Voronoi diagram, `None` for regular topologies
    pub fn bake(&self) -> Option<BakedVoronoi> {
        self.voronoi.as_deref().map(BakedVoronoi::from_geometry)
    }

    // ------------------------------------------------------------------
    // Cell queries

    fn check_cell(&self, index: usize) -> Result<&Cell> {
        self.cells.get(index).ok_or(GridError::CellNotFound(index))
    }

    fn check_territory(&self, index: usize) -> Result<&Territory> {
        self.territories
            .get(index)
            .ok_or(GridError::TerritoryNotFound(index))
    }

    /// Cell whose polygon contains a world-space point
    ///
    /// The nearest centre is tried first, then its neighbours, then every cell.
    ///
    /// # Returns
    ///
    /// `None` when the point lies outside the grid bounds or in no cell.
    ///
    /// # Performance
    ///
    /// O(log n) through the kd-tree with the `spatial-index` feature (default);
    /// a linear scan without it or when the nearest centre's cell misses.
    pub fn cell_at_position(&self, world: DVec2) -> Option<usize> {
        let local = self.config.to_local(world);
        let limit = 0.5 + MIN_VERTEX_DISTANCE;
        if local.x.abs() > limit || local.y.abs() > limit {
            return None;
        }

        #[cfg(feature = "spatial-index")]
        if let Some(index) = &self.spatial_index {
            let nearest = index.find_nearest(world);
            if let Some(cell) = self.cells.get(nearest) {
                if cell.region.contains(local) {
                    return Some(nearest);
                }
                if let Some(&n) = cell
                    .neighbours
                    .iter()
                    .find(|&&n| self.cells[n].region.contains(local))
                {
                    return Some(n);
                }
            }
        }

        self.cells
            .iter()
            .position(|c| c.region.contains(local))
    }

    /// Cell at a lattice position of a regular grid
    pub fn cell_at(&self, row: usize, column: usize) -> Option<usize> {
        if row >= self.config.rows || column >= self.config.columns {
            return None;
        }
        self.lattice
            .get(row * self.config.columns + column)
            .copied()
            .flatten()
    }

    /// Cells within `hops` neighbour steps of `center`, including it
    ///
    /// Returns an empty list when `center` is out of range. Cells are listed
    /// in breadth-first order.
    pub fn cells_within_hops(&self, center: usize, hops: usize) -> Vec<usize> {
        cells_within_hops(&self.cells, center, hops)
    }

    /// Side of cell `a` that faces cell `b`
    ///
    /// Box grids compare row and column, hex grids compare centres in
    /// hexagon proportions, irregular grids compare raw centres.
    ///
    /// # Errors
    ///
    /// [`GridError::CellNotFound`] when either index is out of range.
    pub fn cell_side_towards(&self, a: usize, b: usize) -> Result<CellSide> {
        let (ca, cb) = (self.check_cell(a)?, self.check_cell(b)?);
        Ok(ca.side_facing(cb, self.config.topology, self.config.rows, self.config.columns))
    }

    /// Lattice distance on regular grids, hop count on irregular grids
    ///
    /// `None` when `b` cannot be reached from `a` on an irregular grid.
    ///
    /// # Errors
    ///
    /// [`GridError::CellNotFound`] when either index is out of range.
    pub fn grid_distance(&self, a: usize, b: usize) -> Result<Option<usize>> {
        let (ca, cb) = (self.check_cell(a)?, self.check_cell(b)?);
        Ok(
            match lattice_distance(self.config.topology, self.config.even_layout, ca, cb) {
                Some(d) => Some(d),
                None => hop_distances(&self.cells, a, None)[b],
            },
        )
    }

    // ------------------------------------------------------------------
    // Territory queries and edits

    /// Territory owning the cell under a world-space point
    pub fn territory_at_position(&self, world: DVec2) -> Option<usize> {
        self.cell_at_position(world)
            .and_then(|c| self.cells[c].territory_index)
    }

    pub fn territory_neighbours(&self, territory: usize) -> Result<&BTreeSet<usize>> {
        Ok(&self.check_territory(territory)?.neighbours)
    }

    /// Segments outlining a territory, disputed ones included
    pub fn territory_frontier_segments(&self, territory: usize) -> Result<Vec<SegmentId>> {
        self.check_territory(territory)?;
        Ok(territory_segments(&self.frontiers, territory).collect())
    }

    /// Move a cell to another territory (or none)
    ///
    /// Both affected territories are marked dirty; call
    /// [`CellGrid::redraw_territories`] to rebuild their outlines.
    pub fn set_cell_territory(&mut self, cell: usize, territory: Option<usize>) -> Result<()> {
        let old = self.check_cell(cell)?.territory_index;
        if let Some(t) = territory {
            self.check_territory(t)?;
        }
        if old == territory {
            return Ok(());
        }
        if let Some(o) = old {
            let owner = &mut self.territories[o];
            owner.cells.retain(|&c| c != cell);
            owner.set_dirty(true);
        }
        if let Some(t) = territory {
            let owner = &mut self.territories[t];
            owner.cells.push(cell);
            owner.set_dirty(true);
        }
        self.cells[cell].territory_index = territory;
        Ok(())
    }

    /// Show or hide a whole territory
    ///
    /// A hidden territory neither owns nor disputes any segment, so its
    /// neighbours take over the shared frontier. The territory and every
    /// territory touching it are marked dirty; call
    /// [`CellGrid::redraw_territories`] to rebuild their outlines.
    ///
    /// # Errors
    ///
    /// [`GridError::TerritoryNotFound`] when `territory` is out of range.
    pub fn set_territory_visible(&mut self, territory: usize, visible: bool) -> Result<()> {
        if self.check_territory(territory)?.visible == visible {
            return Ok(());
        }
        self.territories[territory].visible = visible;
        let members = self.territories[territory].cells.clone();
        for cell in members {
            self.touch_territories_around(cell);
        }
        Ok(())
    }

    /// Mark the territories of a cell and its neighbours dirty
    fn touch_territories_around(&mut self, cell: usize) {
        let around = std::iter::once(cell).chain(self.cells[cell].neighbours.iter().copied());
        let owners: Vec<usize> = around
            .filter_map(|c| self.cells[c].territory_index)
            .collect();
        for t in owners {
            if let Some(territory) = self.territories.get_mut(t) {
                territory.set_dirty(true);
            }
        }
    }

    // ------------------------------------------------------------------
    // Cell edits

    pub fn set_cell_can_cross(&mut self, cell: usize, can_cross: bool) -> Result<()> {
        self.check_cell(cell)?;
        self.cells[cell].can_cross = can_cross;
        self.clearance_mask = None;
        Ok(())
    }

    pub fn set_cell_group(&mut self, cell: usize, group: u32) -> Result<()> {
        self.check_cell(cell)?;
        self.cells[cell].group = group;
        self.clearance_mask = None;
        Ok(())
    }

    /// Set the cost of entering a cell through one side
    pub fn set_cell_cross_cost(&mut self, cell: usize, side: CellSide, cost: f32) -> Result<()> {
        self.check_cell(cell)?;
        self.cells[cell].set_side_cost(side, cost);
        Ok(())
    }

    /// Set all eight side costs at once
    ///
    /// # Arguments
    ///
    /// * `cell` - Cell index
    /// * `costs` - One cost per [`CellSide`], in [`CellSide::ALL`] order
    ///
    /// # Errors
    ///
    /// [`GridError::CellNotFound`] for a bad index,
    /// [`GridError::DimensionMismatch`] unless `costs` holds exactly eight values.
    pub fn set_cell_cross_costs(&mut self, cell: usize, costs: &[f32]) -> Result<()> {
        self.check_cell(cell)?;
        let costs: [f32; CellSide::COUNT] =
            costs.try_into().map_err(|_| GridError::DimensionMismatch {
                expected: CellSide::COUNT,
                actual: costs.len(),
            })?;
        self.cells[cell].cross_cost = Some(costs);
        Ok(())
    }

    pub fn set_cell_visible(&mut self, cell: usize, visible: bool) -> Result<()> {
        self.check_cell(cell)?;
        self.cells[cell].visible = visible;
        self.touch_territories_around(cell);
        Ok(())
    }

    pub fn set_cell_visible_by_rules(&mut self, cell: usize, visible: bool) -> Result<()> {
        self.check_cell(cell)?;
        self.cells[cell].visible_by_rules = visible;
        self.touch_territories_around(cell);
        Ok(())
    }

    pub fn set_cell_visible_always(&mut self, cell: usize, visible: bool) -> Result<()> {
        self.check_cell(cell)?;
        self.cells[cell].visible_always = visible;
        self.touch_territories_around(cell);
        Ok(())
    }

    /// Attach a free-form attribute to a cell
    pub fn set_cell_attribute(&mut self, cell: usize, key: &str, value: &str) -> Result<()> {
        self.check_cell(cell)?;
        self.cells[cell]
            .attributes_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Clearance and pathfinding

    /// Compute clearance for `mask` unless the cached values already match
    ///
    /// # Performance
    ///
    /// O(cells × clearance²) on box grids. Cached per mask and dropped by any
    /// change to passability or groups.
    pub fn compute_clearance(&mut self, mask: u32) {
        if self.clearance_mask == Some(mask) {
            return;
        }
        compute_clearance(
            &mut self.cells,
            self.config.topology,
            self.config.rows,
            self.config.columns,
            mask,
        );
        self.clearance_mask = Some(mask);
    }

    /// Cheapest path between two cells
    ///
    /// # Arguments
    ///
    /// * `start` - Cell the path leaves from; not part of the result
    /// * `end` - Goal cell, the last entry of the result
    /// * `options` - Filters, heuristic and search limits
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no path exists within the limits of `options`.
    ///
    /// # Errors
    ///
    /// [`GridError::CellNotFound`] when `start` or `end` is out of range.
    ///
    /// # Performance
    ///
    /// The node arena is reused across queries; clearance is recomputed only
    /// when `min_clearance` is set and the cached mask differs.
    pub fn find_path(
        &mut self,
        start: usize,
        end: usize,
        options: &PathOptions,
    ) -> Result<Option<PathResult>> {
        self.find_path_with_cost(start, end, options, None)
    }

    /// [`CellGrid::find_path`] with an extra per-move cost
    pub fn find_path_with_cost(
        &mut self,
        start: usize,
        end: usize,
        options: &PathOptions,
        custom: Option<CustomCost>,
    ) -> Result<Option<PathResult>> {
        self.check_cell(start)?;
        self.check_cell(end)?;
        if options.min_clearance > 0 {
            self.compute_clearance(options.group_mask);
        }

        let space = CellSearch::new(
            &self.cells,
            self.config.topology,
            lattice_info(&self.config, &self.lattice),
            options,
            custom,
        );
        Ok(self.path_finder.search(&space, start, end, options.limits()))
    }

    /// Search view of this grid for the given options
    pub fn search_space<'a>(
        &'a self,
        options: &'a PathOptions,
        custom: Option<CustomCost<'a>>,
    ) -> CellSearch<'a> {
        CellSearch::new(
            &self.cells,
            self.config.topology,
            lattice_info(&self.config, &self.lattice),
            options,
            custom,
        )
    }
}

fn lattice_info<'a>(config: &GridConfig, lookup: &'a [Option<usize>]) -> Option<LatticeInfo<'a>> {
    config.topology.is_regular().then_some(LatticeInfo {
        rows: config.rows,
        columns: config.columns,
        lookup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfigBuilder;
    use crate::territory::FrontierStatus;

    fn box_grid(rows: usize, columns: usize) -> CellGrid {
        CellGrid::new(GridConfigBuilder::new().rows(rows).columns(columns).build())
    }

    #[test]
    fn test_grid_generation() {
        let grid = box_grid(4, 6);
        assert_eq!(grid.cell_count(), 24);
        assert!(grid.territories().is_empty());
        assert_eq!(grid.frontiers().len(), grid.segments().len());
        assert!(grid.cell(24).is_none());
        assert_eq!(grid.neighbours(0).len(), 2);
        assert!(grid.neighbours(999).is_empty());
    }

    #[test]
    fn test_cell_at() {
        let grid = box_grid(4, 6);
        assert_eq!(grid.cell_at(2, 3), Some(15));
        assert_eq!(grid.cell_at(4, 0), None);
    }

    #[test]
    fn test_cell_at_position() {
        let config = GridConfigBuilder::new()
            .rows(4)
            .columns(4)
            .origin(DVec2::new(10.0, 10.0))
            .scale(DVec2::splat(8.0))
            .build();
        let grid = CellGrid::new(config);
        assert_eq!(grid.cell_at_position(DVec2::new(7.0, 7.0)), Some(0));
        assert_eq!(grid.cell_at_position(DVec2::new(13.0, 13.0)), Some(15));
        assert_eq!(grid.cell_at_position(DVec2::new(100.0, 0.0)), None);
    }

    #[test]
    fn test_cell_at_position_irregular() {
        let config = GridConfigBuilder::new()
            .topology(Topology::Irregular)
            .cell_count(200)
            .seed(5)
            .build();
        let grid = CellGrid::new(config);
        for cell in grid.cells() {
            assert_eq!(grid.cell_at_position(cell.scaled_center), Some(cell.index));
        }
    }

    #[test]
    fn test_grid_distance() {
        let grid = box_grid(5, 5);
        assert_eq!(grid.grid_distance(0, 24), Ok(Some(8)));
        assert_eq!(grid.grid_distance(0, 25), Err(GridError::CellNotFound(25)));

        let irregular = CellGrid::new(
            GridConfigBuilder::new()
                .topology(Topology::Irregular)
                .cell_count(50)
                .build(),
        );
        let n = irregular.neighbours(0)[0];
        assert_eq!(irregular.grid_distance(0, n), Ok(Some(1)));
    }

    #[test]
    fn test_cell_side_towards() {
        let grid = box_grid(3, 3);
        assert_eq!(grid.cell_side_towards(4, 5), Ok(CellSide::Right));
        assert_eq!(grid.cell_side_towards(4, 1), Ok(CellSide::Bottom));
        assert!(grid.cell_side_towards(4, 9).is_err());

        let wide = box_grid(3, 10);
        assert_eq!(wide.cell_side_towards(0, 11), Ok(CellSide::TopRight));
        assert_eq!(wide.cell_side_towards(11, 0), Ok(CellSide::BottomLeft));
        assert_eq!(wide.cell_side_towards(0, 10), Ok(CellSide::Top));
    }

    #[test]
    fn test_find_path_errors_and_trivial() {
        let mut grid = box_grid(10, 10);
        let options = PathOptions::default();
        assert_eq!(
            grid.find_path(0, 100, &options),
            Err(GridError::CellNotFound(100))
        );
        let path = grid.find_path(5, 5, &options).unwrap().unwrap();
        assert!(path.is_empty());
        assert_eq!(path.cost, 0.0);
        let path = grid.find_path(0, 99, &options).unwrap().unwrap();
        assert_eq!(path.cost, 18.0);
    }

    #[test]
    fn test_find_path_min_clearance() {
        let mut grid = box_grid(5, 5);
        grid.set_cell_can_cross(12, false).unwrap();
        let options = PathOptions {
            min_clearance: 2,
            ..Default::default()
        };
        // Only the outer ring keeps two cells between itself and the centre
        let path = grid.find_path(0, 24, &options).unwrap().unwrap();
        assert_eq!(path.cost, 8.0);
        assert!(path.cells.iter().all(|&c| {
            let cell = &grid.cells()[c];
            cell.row == 0 || cell.row == 4 || cell.column == 0 || cell.column == 4
        }));
        assert_eq!(grid.cell(6).map(|c| c.clearance), Some(1));
        assert_eq!(grid.cell(0).map(|c| c.clearance), Some(2));

        let options = PathOptions {
            min_clearance: 3,
            ..Default::default()
        };
        assert_eq!(grid.find_path(0, 24, &options), Ok(None));
    }

    #[test]
    fn test_clearance_cache_invalidated() {
        let mut grid = box_grid(3, 3);
        grid.compute_clearance(u32::MAX);
        assert_eq!(grid.cell(0).map(|c| c.clearance), Some(3));
        grid.set_cell_can_cross(4, false).unwrap();
        grid.compute_clearance(u32::MAX);
        assert_eq!(grid.cell(0).map(|c| c.clearance), Some(1));
    }

    #[test]
    fn test_set_cell_cross_costs() {
        let mut grid = box_grid(2, 2);
        assert_eq!(
            grid.set_cell_cross_costs(0, &[1.0; 3]),
            Err(GridError::DimensionMismatch {
                expected: 8,
                actual: 3
            })
        );
        grid.set_cell_cross_costs(1, &[4.0; 8]).unwrap();
        let path = grid.find_path(0, 1, &PathOptions::default()).unwrap().unwrap();
        assert_eq!(path.cost, 4.0);
        grid.set_cell_cross_cost(1, CellSide::Left, 2.0).unwrap();
        let path = grid.find_path(0, 1, &PathOptions::default()).unwrap().unwrap();
        assert_eq!(path.cost, 2.0);
    }

    #[test]
    fn test_custom_cost() {
        let mut grid = box_grid(1, 4);
        let toll = |_: usize, _: usize| 1.0;
        let path = grid
            .find_path_with_cost(0, 3, &PathOptions::default(), Some(&toll))
            .unwrap()
            .unwrap();
        assert_eq!(path.cost, 6.0);
    }

    #[test]
    fn test_territories_created() {
        let config = GridConfigBuilder::new().rows(8).columns(8).build();
        let grid = CellGrid::with_territories(
            config,
            TerritoryConfigBuilder::new().count(3).seed(4).build(),
        );
        assert_eq!(grid.territories().len(), 3);
        let total: f64 = grid.territories().iter().map(Territory::area).sum();
        assert!((total - 1.0).abs() < 1e-9);
        for t in grid.territories() {
            assert!(!t.is_dirty());
            assert!(!t.regions.is_empty());
            for &n in &t.neighbours {
                assert!(grid.territory_neighbours(n).unwrap().contains(&t.index));
            }
        }
        assert!(grid.territory_neighbours(3).is_err());
    }

    #[test]
    fn test_set_cell_territory_and_redraw() {
        let config = GridConfigBuilder::new().rows(3).columns(3).build();
        let mut grid = CellGrid::with_territories(
            config,
            TerritoryConfigBuilder::new().count(1).user_seeds(vec![0]).build(),
        );
        assert_eq!(grid.territory(0).map(Territory::cell_count), Some(9));

        grid.set_cell_territory(4, None).unwrap();
        assert!(grid.territory(0).is_some_and(|t| t.is_dirty()));
        assert_eq!(grid.redraw_territories(), vec![0]);
        assert!(grid.redraw_territories().is_empty());
        assert_eq!(grid.territory(0).map(Territory::cell_count), Some(8));
        // Without internal territories the pocket is not subtracted
        assert!((grid.territory(0).map_or(0.0, Territory::area) - 1.0).abs() < 1e-9);

        assert_eq!(
            grid.set_cell_territory(4, Some(5)),
            Err(GridError::TerritoryNotFound(5))
        );
        assert_eq!(
            grid.set_cell_territory(40, None),
            Err(GridError::CellNotFound(40))
        );
    }

    #[test]
    fn test_internal_territory_hole() {
        let config = GridConfigBuilder::new().rows(3).columns(3).build();
        let mut grid = CellGrid::with_territories(
            config,
            TerritoryConfigBuilder::new()
                .count(1)
                .user_seeds(vec![0])
                .internal_territories(true)
                .build(),
        );
        grid.set_cell_territory(4, None).unwrap();
        grid.redraw_territories();
        let territory = grid.territory(0).unwrap();
        assert_eq!(territory.regions.len(), 1);
        assert_eq!(territory.regions[0].polygon.holes().len(), 1);
        assert!((territory.area() - 8.0 / 9.0).abs() < 1e-9);
        assert!(!territory.contains(DVec2::ZERO));
        assert_eq!(grid.territory_at_position(DVec2::ZERO), None);
        assert_eq!(grid.territory_at_position(DVec2::new(-0.4, -0.4)), Some(0));
    }

    #[test]
    fn test_visibility_marks_dirty() {
        let config = GridConfigBuilder::new().rows(1).columns(3).build();
        let mut grid = CellGrid::with_territories(
            config,
            TerritoryConfigBuilder::new().count(1).user_seeds(vec![0]).build(),
        );
        grid.set_cell_visible(2, false).unwrap();
        assert_eq!(grid.redraw_territories(), vec![0]);
        let hidden = grid
            .frontiers()
            .iter()
            .filter(|f| f.status == FrontierStatus::Hidden)
            .count();
        assert_eq!(hidden, 3);
        assert!((grid.territory(0).map_or(0.0, Territory::area) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_territory_frontier_goes_to_neighbour() {
        let config = GridConfigBuilder::new().rows(1).columns(2).build();
        let mut grid = CellGrid::with_territories(
            config,
            TerritoryConfigBuilder::new().count(2).user_seeds(vec![0, 1]).build(),
        );
        assert_eq!(grid.territory_neighbours(0).map(|n| n.len()), Ok(1));

        grid.set_territory_visible(1, false).unwrap();
        assert!(grid.territory(0).is_some_and(|t| t.is_dirty()));
        assert_eq!(grid.redraw_territories(), vec![0, 1]);
        let shared = grid
            .frontiers()
            .iter()
            .find(|f| f.cells == [Some(0), Some(1)])
            .map(|f| f.status);
        assert_eq!(shared, Some(FrontierStatus::Owned(0)));
        assert!(grid.territory_neighbours(0).unwrap().is_empty());
        assert!(grid.territory_neighbours(1).unwrap().is_empty());
        assert!(grid.territory(1).is_some_and(|t| t.regions.is_empty()));
        assert!((grid.territory(0).map_or(0.0, Territory::area) - 0.5).abs() < 1e-9);

        assert_eq!(
            grid.set_territory_visible(2, true),
            Err(GridError::TerritoryNotFound(2))
        );
    }

    #[test]
    fn test_territory_frontier_segments() {
        let config = GridConfigBuilder::new().rows(1).columns(2).build();
        let grid = CellGrid::with_territories(
            config,
            TerritoryConfigBuilder::new().count(2).user_seeds(vec![0, 1]).build(),
        );
        assert_eq!(grid.territory_frontier_segments(0).unwrap().len(), 4);
        assert_eq!(grid.territory_frontier_segments(1).unwrap().len(), 4);
        assert!(grid.territory_frontier_segments(2).is_err());
    }

    #[test]
    fn test_idempotent_regeneration() {
        let config = GridConfigBuilder::new()
            .topology(Topology::PointyHex)
            .rows(6)
            .columns(7)
            .corner_jitter(0.3)
            .curvature(0.05)
            .build();
        let mut grid = CellGrid::with_territories(
            config,
            TerritoryConfigBuilder::new().count(4).organic(0.5).build(),
        );
        let owners: Vec<_> = grid.cells().iter().map(|c| c.territory_index).collect();
        let frontiers = grid.frontiers().to_vec();
        grid.regenerate();
        let again: Vec<_> = grid.cells().iter().map(|c| c.territory_index).collect();
        assert_eq!(owners, again);
        assert_eq!(frontiers, grid.frontiers());
    }

    #[test]
    fn test_nested_regeneration_is_deferred() {
        let mut grid = box_grid(2, 2);
        assert!(!grid.has_pending_changes());
        assert_eq!(grid.apply_changes(), 0);

        grid.pending_regeneration = true;
        let mut calls = 0;
        let passes = grid.apply_changes_with(|g| {
            calls += 1;
            if calls == 1 {
                g.request_regeneration();
                assert!(g.has_pending_changes());
                assert_eq!(g.apply_changes(), 0);
            }
        });
        assert_eq!(passes, 2);
        assert_eq!(calls, 2);
        assert!(!grid.has_pending_changes());
        assert_eq!(grid.cell_count(), 4);
    }

    #[test]
    fn test_endless_requests_are_bounded() {
        let mut grid = box_grid(2, 2);
        grid.pending_regeneration = true;
        let passes = grid.apply_changes_with(|g| g.request_regeneration());
        assert_eq!(passes, MAX_REGENERATION_PASSES);
        assert!(grid.has_pending_changes());
    }

    #[test]
    fn test_bake_and_reload() {
        let config = GridConfigBuilder::new()
            .topology(Topology::Irregular)
            .cell_count(60)
            .seed(3)
            .build();
        let grid = CellGrid::new(config.clone());
        let baked = grid.bake().unwrap();
        assert!(box_grid(2, 2).bake().is_none());

        let reloaded = CellGrid::from_baked(config, baked.clone(), TerritoryConfig::default()).unwrap();
        assert_eq!(reloaded.cell_count(), grid.cell_count());
        for (a, b) in grid.cells().iter().zip(reloaded.cells()) {
            assert_eq!(a.neighbours, b.neighbours);
            assert_eq!(a.region.points(), b.region.points());
        }

        let mut broken = baked;
        broken.cells.pop();
        assert!(matches!(
            CellGrid::from_baked(GridConfig::default(), broken, TerritoryConfig::default()),
            Err(GridError::InvalidBakedData(_))
        ));
    }

    #[test]
    fn test_set_config_regenerates() {
        let mut grid = box_grid(2, 2);
        grid.set_config(GridConfigBuilder::new().rows(3).columns(3).build());
        assert_eq!(grid.cell_count(), 9);
        grid.set_territory_config(TerritoryConfigBuilder::new().count(2).build());
        assert_eq!(grid.territories().len(), 2);
    }

    #[test]
    fn test_struct_literal_config_is_normalized() {
        let mut grid = CellGrid::new(GridConfig {
            rows: 0,
            columns: 4,
            ..Default::default()
        });
        assert_eq!(grid.config().rows, 1);
        assert_eq!(grid.cell_count(), 4);
        let path = grid.find_path(0, 3, &PathOptions::default()).unwrap().unwrap();
        assert_eq!(path.cost, 3.0);

        grid.set_config(GridConfig {
            columns: 0,
            rows: 2,
            ..Default::default()
        });
        assert_eq!(grid.config().columns, 1);
        assert_eq!(grid.cell_count(), 2);
        assert_eq!(grid.cell_at(1, 0), Some(1));
    }

    #[test]
    fn test_cell_attribute() {
        let mut grid = box_grid(2, 2);
        grid.set_cell_attribute(1, "terrain", "forest").unwrap();
        assert_eq!(grid.cell(1).and_then(|c| c.attribute("terrain")), Some("forest"));
        assert!(grid.set_cell_attribute(9, "x", "y").is_err());
    }
}
