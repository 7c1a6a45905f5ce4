//! Shortest paths over the cell graph
//!
//! One A* core ([`PathFinder`]) runs over any [`SearchSpace`]. [`CellSearch`]
//! adapts a single grid: box grids expand by row/column arithmetic (with
//! optional diagonals), hexagonal and irregular grids walk neighbour lists.
//! Cross-grid search lives in [`crate::context`].

mod astar;
mod search;

pub use astar::{PathFinder, SearchLimits, SearchSpace};
pub use search::{CellSearch, LatticeInfo};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distance estimate used to order the open list
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeuristicFormula {
    #[default]
    Manhattan,
    MaxDxDy,
    DiagonalShortcut,
    Euclidean,
    EuclideanNoSqrt,
}

impl HeuristicFormula {
    /// Estimate for axis distances `dx`, `dy` in lattice units
    pub fn estimate(self, dx: f64, dy: f64) -> f64 {
        let (dx, dy) = (dx.abs(), dy.abs());
        match self {
            HeuristicFormula::Manhattan => dx + dy,
            HeuristicFormula::MaxDxDy => dx.max(dy),
            HeuristicFormula::DiagonalShortcut => {
                let diagonal = dx.min(dy);
                let straight = dx + dy;
                std::f64::consts::SQRT_2 * diagonal + (straight - 2.0 * diagonal)
            }
            HeuristicFormula::Euclidean => (dx * dx + dy * dy).sqrt(),
            HeuristicFormula::EuclideanNoSqrt => dx * dx + dy * dy,
        }
    }
}

/// How a cell's group is compared against the search mask
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMatch {
    /// `group & mask != 0`
    #[default]
    Bitmask,
    /// `group == mask`
    Exact,
}

impl GroupMatch {
    #[inline]
    pub fn matches(self, group: u32, mask: u32) -> bool {
        match self {
            GroupMatch::Bitmask => group & mask != 0,
            GroupMatch::Exact => group == mask,
        }
    }
}

/// Parameters of a path query
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathOptions {
    pub formula: HeuristicFormula,

    /// Multiplier applied to the heuristic
    pub heuristic_estimate: f64,

    /// Allow diagonal moves on box grids
    pub diagonals: bool,

    /// Cost multiplier of a diagonal move
    pub diagonal_cost: f64,

    /// Longest path in steps, 0 = unbounded
    pub max_steps: usize,

    /// Highest accumulated cost, 0 = unbounded
    pub max_search_cost: f64,

    pub group_mask: u32,
    pub group_match: GroupMatch,

    /// Skip cells whose clearance is below this, 0 disables the check
    pub min_clearance: u8,

    /// Let the path cross invisible cells
    pub include_invisible: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            formula: HeuristicFormula::Manhattan,
            heuristic_estimate: 1.0,
            diagonals: false,
            diagonal_cost: std::f64::consts::SQRT_2,
            max_steps: 0,
            max_search_cost: 0.0,
            group_mask: u32::MAX,
            group_match: GroupMatch::Bitmask,
            min_clearance: 0,
            include_invisible: false,
        }
    }
}

impl PathOptions {
    pub(crate) fn limits(&self) -> SearchLimits {
        SearchLimits {
            max_steps: self.max_steps,
            max_search_cost: self.max_search_cost,
        }
    }
}

/// A found path: cells after the start up to and including the end
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathResult {
    pub cells: Vec<usize>,
    pub cost: f64,
}

impl PathResult {
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Extra cost of moving `from` → `to`; a non-finite or negative value blocks the move
pub type CustomCost<'a> = &'a dyn Fn(usize, usize) -> f64;
