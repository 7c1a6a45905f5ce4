//! Region: the boundary geometry owned by a cell or a territory

use glam::DVec2;

use crate::geometry::{Contour, Polygon, Rect, SegmentId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Regions smaller than this are considered degenerate
pub const MIN_REGION_AREA: f64 = 1e-12;

/// Polygon plus the boundary segments it was built from
///
/// For a cell region the outer contour is counter-clockwise and
/// `segments[i]` joins `points[i]` to `points[i + 1]` (in either direction).
/// Territory regions carry no segment ids; their frontier is tracked by the
/// grid. `bounds` and `area` are cached at construction and refreshed by
/// [`Region::refresh`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    pub polygon: Polygon,
    pub segments: Vec<SegmentId>,
    /// Outer contour mapped into world coordinates
    pub scaled_points: Vec<DVec2>,
    pub bounds: Rect,
    pub area: f64,
}

impl Region {
    /// Build a cell region from a ring and its edge segments
    ///
    /// Clockwise input is reversed (segments included) so the stored ring
    /// is always counter-clockwise.
    pub fn new(mut points: Vec<DVec2>, mut segments: Vec<SegmentId>) -> Self {
        let contour = Contour::new(points.clone());
        if contour.signed_area() < 0.0 {
            let n = points.len();
            points.reverse();
            if segments.len() == n && n > 0 {
                let old = segments.clone();
                for (i, seg) in segments.iter_mut().enumerate() {
                    *seg = old[(2 * n - 2 - i) % n];
                }
            }
        }
        let mut region = Self {
            polygon: Polygon::new(Contour::new(points)),
            segments,
            ..Default::default()
        };
        region.refresh();
        region
    }

    /// Build a territory region from a polygon
    pub fn from_polygon(polygon: Polygon) -> Self {
        let mut region = Self {
            polygon,
            ..Default::default()
        };
        region.refresh();
        region
    }

    /// Recompute cached bounds and area
    pub fn refresh(&mut self) {
        self.bounds = self.polygon.bounds();
        self.area = self.polygon.area();
    }

    /// Outer ring points
    pub fn points(&self) -> &[DVec2] {
        self.polygon
            .outer()
            .map(|c| c.points.as_slice())
            .unwrap_or(&[])
    }

    /// At least three points and a non-vanishing area
    pub fn is_valid(&self) -> bool {
        self.points().len() >= 3 && self.area > MIN_REGION_AREA
    }

    pub fn centroid(&self) -> DVec2 {
        self.polygon
            .outer()
            .map(Contour::centroid)
            .unwrap_or(DVec2::ZERO)
    }

    /// Bounding-rect reject, then polygon containment (holes excluded)
    pub fn contains(&self, p: DVec2) -> bool {
        self.bounds.contains(p) && self.polygon.contains(p)
    }

    /// Bounding-rect reject, then sample each region's points against the other
    pub fn intersects(&self, other: &Region) -> bool {
        if !self.bounds.intersects(&other.bounds) {
            return false;
        }
        other.points().iter().any(|&p| self.contains(p))
            || self.points().iter().any(|&p| other.contains(p))
    }

    /// Add a hole to the polygon and refresh the cached area
    pub fn add_hole(&mut self, hole: Contour) {
        self.polygon.add_hole(hole);
        self.refresh();
    }

    /// Recompute `scaled_points` for the given world frame
    pub fn update_scaled(&mut self, origin: DVec2, scale: DVec2) {
        self.scaled_points = self.points().iter().map(|&p| origin + p * scale).collect();
    }

    /// Scaled points cast to `f32` for renderers
    pub fn scaled_points_f32(&self) -> Vec<[f32; 2]> {
        self.scaled_points
            .iter()
            .map(|p| [p.x as f32, p.y as f32])
            .collect()
    }
}
