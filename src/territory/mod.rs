//! Territories: contiguous groups of cells and their boundary geometry
//!
//! [`partition`] assigns cells to territories by seeded region growing.
//! [`classify_segments`] tags every boundary segment with its ownership and
//! [`build_regions`] stitches each territory's frontier into polygons.

mod enclave;
mod frontier;
mod partition;

pub use enclave::enclosed_holes;
pub use frontier::{
    build_regions, classify_segments, territory_segments, update_scaled_regions, Frontier,
    FrontierStatus,
};
pub use partition::partition;

use glam::DVec2;
use std::collections::BTreeSet;

use crate::cell::Cell;
use crate::entity::{Attributes, Entity};
use crate::region::Region;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A group of cells owned by one party
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Territory {
    pub index: usize,

    /// Cells owned by this territory; a cell belongs to at most one territory
    pub cells: Vec<usize>,

    /// One region per connected piece
    pub regions: Vec<Region>,

    /// Territories sharing a disputed frontier with this one
    pub neighbours: BTreeSet<usize>,

    /// Seed cell the territory grew from
    pub origin: Option<usize>,

    /// Mean of the owned cell centres
    pub center: DVec2,
    pub scaled_center: DVec2,

    pub visible: bool,
    pub dirty: bool,
    pub attributes: Attributes,
}

impl Territory {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            visible: true,
            dirty: true,
            ..Default::default()
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total area of all regions, holes excluded
    pub fn area(&self) -> f64 {
        self.regions.iter().map(|r| r.area).sum()
    }

    /// Whether any region contains the normalized point
    pub fn contains(&self, p: DVec2) -> bool {
        self.regions.iter().any(|r| r.contains(p))
    }

    /// Recompute `center` and `scaled_center` from the owned cells
    pub fn update_center(&mut self, cells: &[Cell]) {
        if self.cells.is_empty() {
            return;
        }
        let inv = 1.0 / self.cells.len() as f64;
        let (center, scaled) = self
            .cells
            .iter()
            .filter_map(|&i| cells.get(i))
            .fold((DVec2::ZERO, DVec2::ZERO), |(c, s), cell| {
                (c + cell.center, s + cell.scaled_center)
            });
        self.center = center * inv;
        self.scaled_center = scaled * inv;
    }
}

impl Entity for Territory {
    fn is_visible(&self) -> bool {
        self.visible
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::generate_box;

    #[test]
    fn test_new_territory() {
        let t = Territory::new(3);
        assert_eq!(t.index, 3);
        assert!(t.is_visible());
        assert!(t.is_dirty());
        assert!(t.is_empty());
        assert_eq!(t.area(), 0.0);
    }

    #[test]
    fn test_update_center() {
        let raw = generate_box(2, 2, 1, 0.0);
        let mut t = Territory::new(0);
        t.cells = vec![0, 1];
        t.update_center(&raw.cells);
        assert_eq!(t.center, DVec2::new(0.0, -0.25));
    }

    #[test]
    fn test_attributes() {
        let mut t = Territory::new(0);
        t.attributes_mut().insert("name".into(), "North".into());
        assert_eq!(t.attribute("name"), Some("North"));
        assert_eq!(t.attribute("missing"), None);
    }
}
