//! Boundary segments shared between cells

use glam::DVec2;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a segment in a grid's segment arena
pub type SegmentId = usize;

/// A straight boundary edge
///
/// Segments live in one arena per grid and are referenced by id from every
/// region that touches them, so two adjacent cells share the exact same
/// segment. `cell_index` records which cell claimed the segment first while
/// the neighbour graph is built.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: DVec2,
    pub end: DVec2,
    /// True when the segment lies on the outer grid boundary
    pub border: bool,
    /// First cell that claimed this segment during neighbour derivation
    pub cell_index: Option<usize>,
}

impl Segment {
    pub fn new(start: DVec2, end: DVec2, border: bool) -> Self {
        Self {
            start,
            end,
            border,
            cell_index: None,
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    #[inline]
    pub fn midpoint(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }

    /// Points of the curved polyline from `start` to `end` (both included)
    ///
    /// Interior points are pushed along the left normal of the segment by
    /// `curvature * length * sin(πt)`. With `divisions < 2` or zero curvature
    /// the segment is returned unchanged.
    pub fn curve_points(&self, divisions: usize, curvature: f64) -> Vec<DVec2> {
        if divisions < 2 || curvature == 0.0 {
            return vec![self.start, self.end];
        }
        let delta = self.end - self.start;
        let length = delta.length();
        if length == 0.0 {
            return vec![self.start, self.end];
        }
        let normal = delta.perp() / length;
        let bulge = curvature * length;

        let mut points = Vec::with_capacity(divisions + 1);
        points.push(self.start);
        for i in 1..divisions {
            let t = i as f64 / divisions as f64;
            let offset = normal * (bulge * (PI * t).sin());
            points.push(self.start.lerp(self.end, t) + offset);
        }
        points.push(self.end);
        points
    }

    /// Split into `divisions` sub-segments bowed by `curvature`
    ///
    /// Sub-segments keep the border flag and start unclaimed.
    pub fn subdivide(&self, divisions: usize, curvature: f64) -> Vec<Segment> {
        self.curve_points(divisions, curvature)
            .windows(2)
            .map(|w| Segment::new(w[0], w[1], self.border))
            .collect()
    }
}
