//! Search space over the cells of one grid

use crate::cell::Cell;
use crate::config::Topology;

use super::{CustomCost, PathOptions, SearchSpace};

const AXIS_MOVES: [(i64, i64); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const DIAGONAL_MOVES: [(i64, i64); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Row/column layout of a box grid
#[derive(Debug, Clone, Copy)]
pub struct LatticeInfo<'a> {
    pub rows: usize,
    pub columns: usize,
    /// `(row, column)` → cell index, row-major
    pub lookup: &'a [Option<usize>],
}

/// A* view of one grid under a set of [`PathOptions`]
///
/// Entering a cell costs that cell's cross cost on the side facing the cell
/// being left, plus the custom cost if one is given.
pub struct CellSearch<'a> {
    cells: &'a [Cell],
    topology: Topology,
    /// `(rows, columns)` of a regular grid, for picking the entry side
    dimensions: Option<(usize, usize)>,
    lattice: Option<LatticeInfo<'a>>,
    /// `log2(columns)` when the lattice is dense and columns is a power of two
    shift: Option<u32>,
    options: &'a PathOptions,
    custom: Option<CustomCost<'a>>,
    /// Widest neighbour centre spacing; off-lattice heuristics count hops of this length
    unit: f64,
}

impl<'a> CellSearch<'a> {
    /// Lattice stepping is only used for box grids; other topologies walk
    /// neighbour lists and use `lattice` for its dimensions alone
    pub fn new(
        cells: &'a [Cell],
        topology: Topology,
        lattice: Option<LatticeInfo<'a>>,
        options: &'a PathOptions,
        custom: Option<CustomCost<'a>>,
    ) -> Self {
        let dimensions = lattice
            .filter(|_| topology.is_regular())
            .map(|l| (l.rows, l.columns));
        let lattice = lattice.filter(|_| topology == Topology::Box);
        let shift = lattice.and_then(|l| {
            (l.columns.is_power_of_two() && cells.len() == l.rows * l.columns)
                .then(|| l.columns.trailing_zeros())
        });
        let unit = if lattice.is_some() {
            1.0
        } else {
            max_spacing(cells)
        };
        Self {
            cells,
            topology,
            dimensions,
            lattice,
            shift,
            options,
            custom,
            unit,
        }
    }

    /// Whether a path may enter `index` under the current options
    pub fn passable(&self, index: usize) -> bool {
        let cell = &self.cells[index];
        let o = self.options;
        cell.can_cross
            && (o.min_clearance == 0 || cell.clearance >= o.min_clearance)
            && o.group_match.matches(cell.group, o.group_mask)
            && (o.include_invisible || cell.effectively_visible())
    }

    /// Cost of entering `to` from `from`, `None` when blocked
    pub fn step_cost(&self, from: usize, to: usize, diagonal: bool) -> Option<f64> {
        let target = &self.cells[to];
        let source = &self.cells[from];
        let side = match self.dimensions {
            Some((rows, columns)) => target.side_facing(source, self.topology, rows, columns),
            None => target.side_towards(source),
        };
        let mut cost = target.side_cost(side);
        if diagonal {
            cost *= self.options.diagonal_cost;
        }
        if let Some(custom) = self.custom {
            let extra = custom(from, to);
            if !extra.is_finite() || extra < 0.0 {
                return None;
            }
            cost += extra;
        }
        (cost.is_finite() && cost >= 0.0).then_some(cost)
    }

    fn index_at(&self, lattice: &LatticeInfo, row: i64, column: i64) -> Option<usize> {
        if row < 0 || column < 0 || row >= lattice.rows as i64 || column >= lattice.columns as i64 {
            return None;
        }
        let (row, column) = (row as usize, column as usize);
        match self.shift {
            Some(shift) => Some((row << shift) | column),
            None => lattice.lookup[row * lattice.columns + column],
        }
    }

    fn expand_lattice(&self, lattice: &LatticeInfo, node: usize, out: &mut Vec<(usize, f64)>) {
        let cell = &self.cells[node];
        let (row, column) = (cell.row as i64, cell.column as i64);
        let diagonals: &[(i64, i64)] = if self.options.diagonals {
            &DIAGONAL_MOVES
        } else {
            &[]
        };
        let moves = AXIS_MOVES
            .iter()
            .map(|&m| (m, false))
            .chain(diagonals.iter().map(|&m| (m, true)));
        for ((dr, dc), diagonal) in moves {
            let Some(next) = self.index_at(lattice, row + dr, column + dc) else {
                continue;
            };
            if !self.passable(next) {
                continue;
            }
            if let Some(cost) = self.step_cost(node, next, diagonal) {
                out.push((next, cost));
            }
        }
    }
}

fn max_spacing(cells: &[Cell]) -> f64 {
    let max = cells
        .iter()
        .flat_map(|c| c.neighbours.iter().map(move |&n| (c, n)))
        .filter_map(|(c, n)| cells.get(n).map(|other| c.center.distance(other.center)))
        .fold(0.0, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

impl SearchSpace for CellSearch<'_> {
    fn node_count(&self) -> usize {
        self.cells.len()
    }

    fn expand(&self, node: usize, out: &mut Vec<(usize, f64)>) {
        if let Some(lattice) = &self.lattice {
            self.expand_lattice(lattice, node, out);
            return;
        }
        for &next in &self.cells[node].neighbours {
            if !self.passable(next) {
                continue;
            }
            if let Some(cost) = self.step_cost(node, next, false) {
                out.push((next, cost));
            }
        }
    }

    fn heuristic(&self, node: usize, goal: usize) -> f64 {
        let (a, b) = (&self.cells[node], &self.cells[goal]);
        let (dx, dy) = if self.lattice.is_some() {
            (
                a.column as f64 - b.column as f64,
                a.row as f64 - b.row as f64,
            )
        } else {
            let d = (a.center - b.center) / self.unit;
            (d.x, d.y)
        };
        self.options.formula.estimate(dx, dy) * self.options.heuristic_estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellSide;
    use crate::generation::{generate_box, generate_flat_hex, RawGrid};
    use crate::graph::{build_neighbours, lattice_lookup};
    use crate::pathfinding::{GroupMatch, HeuristicFormula, PathFinder, PathResult};

    fn linked(mut raw: RawGrid) -> Vec<Cell> {
        build_neighbours(&mut raw.cells, &mut raw.segments);
        raw.cells
    }

    fn find(
        cells: &[Cell],
        rows: usize,
        columns: usize,
        options: &PathOptions,
        start: usize,
        end: usize,
    ) -> Option<PathResult> {
        let lookup = lattice_lookup(cells, rows, columns);
        let lattice = LatticeInfo {
            rows,
            columns,
            lookup: &lookup,
        };
        let space = CellSearch::new(cells, Topology::Box, Some(lattice), options, None);
        PathFinder::new().search(&space, start, end, options.limits())
    }

    #[test]
    fn test_manhattan_cost() {
        let cells = linked(generate_box(10, 10, 1, 0.0));
        let path = find(&cells, 10, 10, &PathOptions::default(), 0, 99).unwrap();
        assert_eq!(path.cost, 18.0);
        assert_eq!(path.len(), 18);
        assert_eq!(path.cells.last(), Some(&99));
    }

    #[test]
    fn test_diagonals() {
        let cells = linked(generate_box(8, 8, 1, 0.0));
        let options = PathOptions {
            diagonals: true,
            diagonal_cost: 1.5,
            formula: HeuristicFormula::MaxDxDy,
            ..Default::default()
        };
        let path = find(&cells, 8, 8, &options, 0, 63).unwrap();
        assert_eq!(path.len(), 7);
        assert!((path.cost - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_power_of_two_lattice() {
        let cells = linked(generate_box(3, 5, 1, 0.0));
        let path = find(&cells, 3, 5, &PathOptions::default(), 0, 14).unwrap();
        assert_eq!(path.cost, 6.0);
    }

    #[test]
    fn test_walled_start() {
        let mut cells = linked(generate_box(10, 10, 1, 0.0));
        for n in cells[0].neighbours.clone() {
            cells[n].can_cross = false;
        }
        assert!(find(&cells, 10, 10, &PathOptions::default(), 0, 99).is_none());
    }

    #[test]
    fn test_side_cost_detour() {
        let mut cells = linked(generate_box(1, 3, 1, 0.0));
        // Entering cell 1 from the left is expensive
        cells[1].set_side_cost(CellSide::Left, 10.0);
        let path = find(&cells, 1, 3, &PathOptions::default(), 0, 2).unwrap();
        assert_eq!(path.cost, 11.0);
        let back = find(&cells, 1, 3, &PathOptions::default(), 2, 0).unwrap();
        assert_eq!(back.cost, 2.0);
    }

    #[test]
    fn test_diagonal_entry_on_wide_grid() {
        // 3 rows by 10 columns: cells are far wider than tall in normalized space
        let mut cells = linked(generate_box(3, 10, 1, 0.0));
        cells[11].set_side_cost(CellSide::Bottom, 10.0);
        cells[11].set_side_cost(CellSide::Left, 10.0);
        let options = PathOptions {
            diagonals: true,
            diagonal_cost: 1.0,
            ..Default::default()
        };
        let path = find(&cells, 3, 10, &options, 0, 11).unwrap();
        assert_eq!(path.cells, vec![11]);
        assert_eq!(path.cost, 1.0);
    }

    #[test]
    fn test_custom_cost_blocks() {
        let cells = linked(generate_box(3, 3, 1, 0.0));
        let lookup = lattice_lookup(&cells, 3, 3);
        let options = PathOptions::default();
        let block_centre = |_from: usize, to: usize| if to == 4 { f64::INFINITY } else { 0.5 };
        let space = CellSearch::new(
            &cells,
            Topology::Box,
            Some(LatticeInfo {
                rows: 3,
                columns: 3,
                lookup: &lookup,
            }),
            &options,
            Some(&block_centre),
        );
        let path = PathFinder::new().search(&space, 3, 5, options.limits()).unwrap();
        assert!(!path.cells.contains(&4));
        assert_eq!(path.cost, 6.0);
    }

    #[test]
    fn test_group_and_visibility_filters() {
        let mut cells = linked(generate_box(1, 3, 1, 0.0));
        cells[1].group = 0b10;
        let options = PathOptions {
            group_mask: 0b01,
            ..Default::default()
        };
        assert!(find(&cells, 1, 3, &options, 0, 2).is_none());
        let options = PathOptions {
            group_mask: 0b11,
            group_match: GroupMatch::Bitmask,
            ..Default::default()
        };
        assert!(find(&cells, 1, 3, &options, 0, 2).is_some());

        cells[1].visible = false;
        assert!(find(&cells, 1, 3, &options, 0, 2).is_none());
        let options = PathOptions {
            include_invisible: true,
            ..options
        };
        assert!(find(&cells, 1, 3, &options, 0, 2).is_some());
    }

    #[test]
    fn test_min_clearance() {
        let mut cells = linked(generate_box(1, 3, 1, 0.0));
        cells[1].clearance = 1;
        cells[2].clearance = 3;
        let options = PathOptions {
            min_clearance: 2,
            ..Default::default()
        };
        assert!(find(&cells, 1, 3, &options, 0, 2).is_none());
    }

    #[test]
    fn test_hex_neighbour_walk() {
        let cells = linked(generate_flat_hex(6, 6, false, 1, 0.0));
        let options = PathOptions {
            formula: HeuristicFormula::Euclidean,
            ..Default::default()
        };
        let space = CellSearch::new(&cells, Topology::FlatHex, None, &options, None);
        let path = PathFinder::new().search(&space, 0, 35, options.limits()).unwrap();
        let hops = crate::graph::lattice_distance(Topology::FlatHex, false, &cells[0], &cells[35]);
        assert_eq!(Some(path.len()), hops);
        assert_eq!(path.cost, path.len() as f64);
    }
}
