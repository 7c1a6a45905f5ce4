//! Spatial indexing for fast position-to-cell lookups
//!
//! This module is only available with the `spatial-index` feature.

use glam::DVec2;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// Wrapper around KD-tree for nearest-centre queries
///
/// The nearest cell centre is a strong first guess for the cell containing a
/// point; [`CellGrid::cell_at_position`](crate::CellGrid::cell_at_position)
/// confirms it against the cell polygon before trusting it.
///
/// # Performance
///
/// - Construction: O(n log n)
/// - Query: O(log n)
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
    len: usize,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex").field("len", &self.len).finish()
    }
}

impl SpatialIndex {
    /// Build spatial index from cell centres
    ///
    /// # Example
    ///
    /// ```
    /// use territory_grid::*;
    /// use glam::DVec2;
    ///
    /// let centers = vec![
    ///     DVec2::new(1.0, 0.0),
    ///     DVec2::new(0.0, 1.0),
    ///     DVec2::new(-1.0, 0.0),
    /// ];
    ///
    /// let index = SpatialIndex::new(&centers).unwrap();
    /// assert_eq!(index.find_nearest(DVec2::new(0.9, 0.1)), 0);
    /// ```
    ///
    /// Returns `None` for an empty slice.
    pub fn new(centers: &[DVec2]) -> Option<Self> {
        if centers.is_empty() {
            return None;
        }
        let points: Vec<[f64; 2]> = centers.iter().map(|c| [c.x, c.y]).collect();
        Some(Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            len: points.len(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the centre closest to `position`
    pub fn find_nearest(&self, position: DVec2) -> usize {
        let query = [position.x, position.y];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        result.item
    }
}
