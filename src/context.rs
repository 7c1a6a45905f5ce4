//! Several independently generated grids joined by bridges
//!
//! A [`GridContext`] owns its grids; there is no process-wide registry. Paths
//! run over `(grid, cell)` pairs: inside a grid they follow the same moves
//! as [`CellGrid::find_path`], and a bridge links two cells (usually in
//! different grids) with a fixed cost in both directions.

use glam::DVec2;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::error::{GridError, Result};
use crate::grid::CellGrid;
use crate::pathfinding::{CellSearch, PathFinder, PathOptions, SearchSpace};

/// A `(grid index, cell index)` pair
pub type GridCell = (usize, usize);

/// Two-way link between cells of (usually different) grids
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bridge {
    pub a: GridCell,
    pub b: GridCell,
    pub cost: f64,
}

/// A path across grids: steps after the start up to and including the end
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossGridPath {
    pub steps: Vec<GridCell>,
    pub cost: f64,
}

impl CrossGridPath {
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Owner of several grids and the bridges between them
///
/// # Examples
///
/// ```
/// use territory_grid::*;
///
/// let mut context = GridContext::new();
/// let west = context.add_grid(CellGrid::new(
///     GridConfigBuilder::new().rows(4).columns(4).scale(DVec2::splat(4.0)).build(),
/// ));
/// let east = context.add_grid(CellGrid::new(
///     GridConfigBuilder::new()
///         .rows(4)
///         .columns(4)
///         .origin(DVec2::new(10.0, 0.0))
///         .scale(DVec2::splat(4.0))
///         .build(),
/// ));
///
/// context
///     .add_bridge(DVec2::new(1.5, 0.5), DVec2::new(8.5, 0.5), 2.0)
///     .unwrap();
/// let path = context
///     .find_path((west, 0), (east, 15), &PathOptions::default())
///     .unwrap()
///     .unwrap();
/// assert_eq!(path.steps.last(), Some(&(east, 15)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GridContext {
    grids: Vec<CellGrid>,
    bridges: Vec<Bridge>,
    path_finder: PathFinder,
}

impl GridContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a grid; returns its index
    pub fn add_grid(&mut self, grid: CellGrid) -> usize {
        self.grids.push(grid);
        self.grids.len() - 1
    }

    #[inline]
    pub fn grids(&self) -> &[CellGrid] {
        &self.grids
    }

    #[inline]
    pub fn grid(&self, index: usize) -> Option<&CellGrid> {
        self.grids.get(index)
    }

    /// Mutable grid access
    ///
    /// Bridges keep their cell indices; a bridge whose cell no longer exists
    /// after a regeneration is ignored by searches.
    #[inline]
    pub fn grid_mut(&mut self, index: usize) -> Option<&mut CellGrid> {
        self.grids.get_mut(index)
    }

    #[inline]
    pub fn bridges(&self) -> &[Bridge] {
        &self.bridges
    }

    pub fn clear_bridges(&mut self) {
        self.bridges.clear();
    }

    /// First grid with a cell under a world-space point
    pub fn locate(&self, world: DVec2) -> Option<GridCell> {
        self.grids
            .iter()
            .enumerate()
            .find_map(|(g, grid)| grid.cell_at_position(world).map(|c| (g, c)))
    }

    /// Bridge the cells under two world-space points; returns the bridge index
    ///
    /// # Arguments
    ///
    /// * `a`, `b` - World points, each resolved with [`GridContext::locate`]
    /// * `cost` - Cost of crossing the bridge in either direction
    ///
    /// # Errors
    ///
    /// [`GridError::PointOutsideGrid`] when a point falls in no grid's cells.
    pub fn add_bridge(&mut self, a: DVec2, b: DVec2, cost: f64) -> Result<usize> {
        let outside = |p: DVec2| GridError::PointOutsideGrid { x: p.x, y: p.y };
        let from = self.locate(a).ok_or_else(|| outside(a))?;
        let to = self.locate(b).ok_or_else(|| outside(b))?;
        self.add_bridge_between(from, to, cost)
    }

    /// Bridge two known cells; returns the bridge index
    pub fn add_bridge_between(&mut self, a: GridCell, b: GridCell, cost: f64) -> Result<usize> {
        self.check(a)?;
        self.check(b)?;
        let cost = if cost.is_finite() && cost >= 0.0 {
            cost
        } else {
            warn!("bridge cost {} is not usable, using 0", cost);
            0.0
        };
        self.bridges.push(Bridge { a, b, cost });
        debug!("bridge {:?} <-> {:?} cost {}", a, b, cost);
        Ok(self.bridges.len() - 1)
    }

    fn check(&self, (grid, cell): GridCell) -> Result<()> {
        let g = self.grids.get(grid).ok_or(GridError::GridNotFound(grid))?;
        if cell >= g.cell_count() {
            return Err(GridError::CellNotFound(cell));
        }
        Ok(())
    }

    /// Cheapest path between cells of any two grids
    ///
    /// # Returns
    ///
    /// The steps after `start`, each as `(grid, cell)`, and the total cost.
    /// `Ok(None)` when no path exists within the limits of `options`.
    ///
    /// # Errors
    ///
    /// [`GridError::GridNotFound`] or [`GridError::CellNotFound`] for an
    /// endpoint that does not exist.
    ///
    /// # Performance
    ///
    /// Every grid is flattened into one node range, so the arena grows with
    /// the total cell count of the context. Bridges cost one hash lookup per
    /// expanded node.
    pub fn find_path(
        &mut self,
        start: GridCell,
        end: GridCell,
        options: &PathOptions,
    ) -> Result<Option<CrossGridPath>> {
        self.check(start)?;
        self.check(end)?;
        if options.min_clearance > 0 {
            for grid in &mut self.grids {
                grid.compute_clearance(options.group_mask);
            }
        }

        let space = LinkedSearch::new(&self.grids, &self.bridges, options);
        let found = self
            .path_finder
            .search(&space, space.node(start), space.node(end), options.limits());
        Ok(found.map(|path| CrossGridPath {
            steps: path.cells.iter().map(|&n| space.split(n)).collect(),
            cost: path.cost,
        }))
    }
}

/// All grids of a context flattened into one node range
struct LinkedSearch<'a> {
    /// First node of each grid, then the total node count
    offsets: Vec<usize>,
    spaces: Vec<CellSearch<'a>>,
    links: FxHashMap<usize, Vec<(usize, f64)>>,
    /// Grids with a bridge anchor; in-grid estimates are not lower bounds there
    bridged: Vec<bool>,
}

impl<'a> LinkedSearch<'a> {
    fn new(grids: &'a [CellGrid], bridges: &[Bridge], options: &'a PathOptions) -> Self {
        let mut offsets = Vec::with_capacity(grids.len() + 1);
        let mut total = 0;
        for grid in grids {
            offsets.push(total);
            total += grid.cell_count();
        }
        offsets.push(total);

        let spaces: Vec<CellSearch<'a>> = grids
            .iter()
            .map(|grid| grid.search_space(options, None))
            .collect();

        let mut search = Self {
            offsets,
            spaces,
            links: FxHashMap::default(),
            bridged: vec![false; grids.len()],
        };
        for bridge in bridges {
            let usable = |(g, c): GridCell| c < grids[g].cell_count();
            if !usable(bridge.a) || !usable(bridge.b) {
                continue;
            }
            search.link(bridge.a, bridge.b, bridge.cost);
            search.link(bridge.b, bridge.a, bridge.cost);
        }
        search
    }

    fn link(&mut self, from: GridCell, to: GridCell, cost: f64) {
        self.bridged[from.0] = true;
        if !self.spaces[to.0].passable(to.1) {
            return;
        }
        let (from, to) = (self.node(from), self.node(to));
        self.links.entry(from).or_default().push((to, cost));
    }

    #[inline]
    fn node(&self, (grid, cell): GridCell) -> usize {
        self.offsets[grid] + cell
    }

    fn split(&self, node: usize) -> GridCell {
        let grid = self.offsets.partition_point(|&o| o <= node) - 1;
        (grid, node - self.offsets[grid])
    }
}

impl SearchSpace for LinkedSearch<'_> {
    fn node_count(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    fn expand(&self, node: usize, out: &mut Vec<(usize, f64)>) {
        let (grid, cell) = self.split(node);
        let base = self.offsets[grid];
        let first = out.len();
        self.spaces[grid].expand(cell, out);
        for entry in &mut out[first..] {
            entry.0 += base;
        }
        if let Some(links) = self.links.get(&node) {
            out.extend_from_slice(links);
        }
    }

    fn heuristic(&self, node: usize, goal: usize) -> f64 {
        let (grid, cell) = self.split(node);
        let (goal_grid, goal_cell) = self.split(goal);
        if grid == goal_grid && !self.bridged[grid] {
            self.spaces[grid].heuristic(cell, goal_cell)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfigBuilder;

    /// Two 4×4 box grids of unit cells, 10 units apart
    fn twin_grids() -> GridContext {
        let mut context = GridContext::new();
        for x in [0.0, 10.0] {
            context.add_grid(CellGrid::new(
                GridConfigBuilder::new()
                    .rows(4)
                    .columns(4)
                    .origin(DVec2::new(x, 0.0))
                    .scale(DVec2::splat(4.0))
                    .build(),
            ));
        }
        context
    }

    #[test]
    fn test_locate() {
        let context = twin_grids();
        assert_eq!(context.locate(DVec2::new(-1.5, -1.5)), Some((0, 0)));
        assert_eq!(context.locate(DVec2::new(11.5, 1.5)), Some((1, 15)));
        assert_eq!(context.locate(DVec2::new(5.0, 0.0)), None);
    }

    #[test]
    fn test_add_bridge_errors() {
        let mut context = twin_grids();
        assert_eq!(
            context.add_bridge(DVec2::new(5.0, 0.0), DVec2::new(8.5, -0.5), 1.0),
            Err(GridError::PointOutsideGrid { x: 5.0, y: 0.0 })
        );
        assert_eq!(
            context.add_bridge_between((0, 0), (2, 0), 1.0),
            Err(GridError::GridNotFound(2))
        );
        assert_eq!(
            context.add_bridge_between((0, 16), (1, 0), 1.0),
            Err(GridError::CellNotFound(16))
        );
        assert!(context.bridges().is_empty());
    }

    #[test]
    fn test_no_bridge_no_path() {
        let mut context = twin_grids();
        let found = context.find_path((0, 4), (1, 7), &PathOptions::default());
        assert_eq!(found, Ok(None));
    }

    #[test]
    fn test_path_across_bridge() {
        let mut context = twin_grids();
        let index = context
            .add_bridge(DVec2::new(1.5, -0.5), DVec2::new(8.5, -0.5), 2.0)
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(context.bridges()[0].a, (0, 7));
        assert_eq!(context.bridges()[0].b, (1, 4));

        let path = context
            .find_path((0, 4), (1, 7), &PathOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(path.cost, 8.0);
        assert_eq!(
            path.steps,
            vec![(0, 5), (0, 6), (0, 7), (1, 4), (1, 5), (1, 6), (1, 7)]
        );

        let back = context
            .find_path((1, 7), (0, 4), &PathOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(back.cost, 8.0);
        assert_eq!(back.steps.last(), Some(&(0, 4)));
    }

    #[test]
    fn test_blocked_bridge_end() {
        let mut context = twin_grids();
        context.add_bridge_between((0, 7), (1, 4), 2.0).unwrap();
        if let Some(grid) = context.grid_mut(1) {
            grid.set_cell_can_cross(4, false).unwrap();
        }
        let found = context.find_path((0, 4), (1, 7), &PathOptions::default());
        assert_eq!(found, Ok(None));
    }

    #[test]
    fn test_bridge_shortcut_in_one_grid() {
        let mut context = GridContext::new();
        context.add_grid(CellGrid::new(
            GridConfigBuilder::new().rows(1).columns(10).build(),
        ));
        context.add_bridge_between((0, 0), (0, 9), 1.0).unwrap();
        let path = context
            .find_path((0, 0), (0, 9), &PathOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(path.steps, vec![(0, 9)]);
        assert_eq!(path.cost, 1.0);
    }

    #[test]
    fn test_same_grid_matches_grid_search() {
        let mut context = twin_grids();
        let direct = context
            .grid_mut(0)
            .map(|g| g.find_path(0, 15, &PathOptions::default()));
        let through = context.find_path((0, 0), (0, 15), &PathOptions::default());
        let direct = direct.unwrap().unwrap().unwrap();
        let through = through.unwrap().unwrap();
        assert_eq!(direct.cost, through.cost);
        assert_eq!(through.len(), direct.len());
    }

    #[test]
    fn test_unusable_cost_clamped() {
        let mut context = twin_grids();
        context.add_bridge_between((0, 0), (1, 0), f64::NAN).unwrap();
        context.add_bridge_between((0, 1), (1, 1), -3.0).unwrap();
        assert!(context.bridges().iter().all(|b| b.cost == 0.0));
    }

    #[test]
    fn test_third_grid_offsets() {
        let mut context = twin_grids();
        let single = CellGrid::new(GridConfigBuilder::new().rows(1).columns(1).build());
        assert_eq!(context.add_grid(single), 2);
        context.add_bridge_between((0, 15), (2, 0), 1.0).unwrap();
        context.add_bridge_between((2, 0), (1, 0), 1.0).unwrap();
        let path = context
            .find_path((0, 15), (1, 0), &PathOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(path.steps, vec![(2, 0), (1, 0)]);
        assert_eq!(path.cost, 2.0);
    }
}
