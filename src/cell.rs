//! Grid cell structure
//!
//! Represents a single cell of a grid with its geometry, adjacency and the
//! per-cell attributes that territory growth and pathfinding read.

use glam::DVec2;
use smallvec::SmallVec;
use std::f64::consts::FRAC_PI_4;

use crate::config::Topology;
use crate::entity::{Attributes, Entity};
use crate::generation::hex_proportions;
use crate::region::Region;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Neighbour list storage; box and hex cells never spill to the heap
pub type Neighbours = SmallVec<[usize; 8]>;

/// One of eight compass sides of a cell, used to index per-side crossing costs
///
/// Box cells use the four axis sides, hexagons use six of the eight, and
/// irregular cells map each neighbour to the side closest to its direction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellSide {
    Right = 0,
    TopRight = 1,
    Top = 2,
    TopLeft = 3,
    Left = 4,
    BottomLeft = 5,
    Bottom = 6,
    BottomRight = 7,
}

impl CellSide {
    pub const COUNT: usize = 8;

    pub const ALL: [CellSide; 8] = [
        CellSide::Right,
        CellSide::TopRight,
        CellSide::Top,
        CellSide::TopLeft,
        CellSide::Left,
        CellSide::BottomLeft,
        CellSide::Bottom,
        CellSide::BottomRight,
    ];

    #[inline]
    pub fn as_index(self) -> usize {
        self as usize
    }

    /// Side whose 45° sector contains `direction`
    pub fn from_direction(direction: DVec2) -> CellSide {
        let angle = direction.y.atan2(direction.x);
        let sector = (angle / FRAC_PI_4).round() as i64;
        CellSide::ALL[sector.rem_euclid(8) as usize]
    }

    /// The side facing the opposite way
    pub fn opposite(self) -> CellSide {
        CellSide::ALL[(self.as_index() + 4) % 8]
    }
}

/// A single polygonal grid cell
///
/// Cells are created once per generation pass. `territory_index`,
/// `can_cross`, `cross_cost`, `group` and the visibility flags may change
/// afterwards; everything else is replaced wholesale on regeneration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Cell {
    /// Dense index (0 to cell_count-1), stable for a given configuration
    pub index: usize,

    /// Row in the lattice; always 0 for irregular grids
    pub row: usize,

    /// Column in the lattice; always 0 for irregular grids
    pub column: usize,

    /// Centre in normalized grid space
    pub center: DVec2,

    /// Centre in world space
    pub scaled_center: DVec2,

    pub region: Region,

    /// Indices of cells sharing at least one boundary segment
    pub neighbours: Neighbours,

    /// Owning territory, `None` while unassigned
    pub territory_index: Option<usize>,

    /// Bitmask matched against a search's group mask
    pub group: u32,

    /// Blocks pathfinding when false
    pub can_cross: bool,

    /// Extra cost to enter this cell through each side
    pub cross_cost: Option<[f32; CellSide::COUNT]>,

    /// Open-square radius around the cell, see [`crate::graph::compute_clearance`]
    pub clearance: u8,

    pub visible: bool,
    pub visible_by_rules: bool,
    pub visible_always: bool,

    pub dirty: bool,
    pub attributes: Attributes,
}

impl Cell {
    /// Create a new cell
    ///
    /// This is typically called during grid generation, not by user code.
    pub fn new(index: usize, row: usize, column: usize, center: DVec2, region: Region) -> Self {
        Self {
            index,
            row,
            column,
            center,
            scaled_center: center,
            region,
            neighbours: Neighbours::new(),
            territory_index: None,
            group: 1,
            can_cross: true,
            cross_cost: None,
            clearance: 0,
            visible: true,
            visible_by_rules: true,
            visible_always: false,
            dirty: false,
            attributes: Attributes::default(),
        }
    }

    /// `(visible AND visible_by_rules) OR visible_always`
    #[inline]
    pub fn effectively_visible(&self) -> bool {
        (self.visible && self.visible_by_rules) || self.visible_always
    }

    #[inline]
    pub fn neighbour_count(&self) -> usize {
        self.neighbours.len()
    }

    #[inline]
    pub fn is_neighbour_of(&self, other: usize) -> bool {
        self.neighbours.contains(&other)
    }

    /// Crossing cost for entering through `side`, 1 when no costs are set
    #[inline]
    pub fn side_cost(&self, side: CellSide) -> f64 {
        self.cross_cost
            .map(|costs| costs[side.as_index()] as f64)
            .unwrap_or(1.0)
    }

    /// Set the cost of entering through one side
    pub fn set_side_cost(&mut self, side: CellSide, cost: f32) {
        let costs = self.cross_cost.get_or_insert([1.0; CellSide::COUNT]);
        costs[side.as_index()] = cost;
    }

    /// Set the same entry cost on every side
    pub fn set_cross_cost(&mut self, cost: f32) {
        self.cross_cost = Some([cost; CellSide::COUNT]);
    }

    /// Side of this cell that faces `other`, by the direction between centres
    pub fn side_towards(&self, other: &Cell) -> CellSide {
        CellSide::from_direction(other.center - self.center)
    }

    /// Side of this cell that faces `other` on a `rows × columns` grid
    ///
    /// Box cells compare lattice coordinates, so a diagonal neighbour is
    /// always a diagonal side whatever the grid's aspect. Hex centres are
    /// measured in regular hexagon proportions, undoing the stretch of the
    /// normalized square. Irregular cells fall back to [`Cell::side_towards`].
    pub fn side_facing(&self, other: &Cell, topology: Topology, rows: usize, columns: usize) -> CellSide {
        match topology {
            Topology::Box => CellSide::from_direction(DVec2::new(
                other.column as f64 - self.column as f64,
                other.row as f64 - self.row as f64,
            )),
            t if t.is_hexagonal() => {
                let units = hex_proportions(t == Topology::PointyHex, rows, columns);
                CellSide::from_direction((other.center - self.center) * units)
            }
            _ => self.side_towards(other),
        }
    }
}

impl Entity for Cell {
    fn is_visible(&self) -> bool {
        self.effectively_visible()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn scaled_center(&self) -> DVec2 {
        self.scaled_center
    }
}
