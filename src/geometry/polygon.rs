//! Contours, polygons and bounding rectangles
//!
//! All math runs in `f64`. Contours are closed implicitly: the last point
//! connects back to the first and is not repeated.

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    /// An inverted rectangle that any point expands
    pub const EMPTY: Rect = Rect {
        min: DVec2::splat(f64::INFINITY),
        max: DVec2::splat(f64::NEG_INFINITY),
    };

    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[DVec2]) -> Self {
        points.iter().fold(Rect::EMPTY, |r, &p| r.expanded(p))
    }

    #[inline]
    pub fn expanded(self, p: DVec2) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    #[inline]
    pub fn union(self, other: Rect) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::EMPTY
    }
}

/// A single closed ring of points
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<DVec2>,
}

impl Contour {
    pub fn new(points: Vec<DVec2>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area, positive for counter-clockwise rings
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.perp_dot(b);
        }
        sum * 0.5
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    #[inline]
    pub fn is_ccw(&self) -> bool {
        self.signed_area() >= 0.0
    }

    /// Reverse in place if the ring is clockwise
    pub fn make_ccw(&mut self) {
        if !self.is_ccw() {
            self.points.reverse();
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(&self.points)
    }

    /// Area centroid; falls back to the vertex average for degenerate rings
    pub fn centroid(&self) -> DVec2 {
        let n = self.points.len();
        if n == 0 {
            return DVec2::ZERO;
        }
        let average = self.points.iter().copied().sum::<DVec2>() / n as f64;
        if n < 3 {
            return average;
        }
        // Relative to the first point to keep precision for far-off grids
        let origin = self.points[0];
        let mut area2 = 0.0;
        let mut acc = DVec2::ZERO;
        for i in 0..n {
            let a = self.points[i] - origin;
            let b = self.points[(i + 1) % n] - origin;
            let cross = a.perp_dot(b);
            area2 += cross;
            acc += (a + b) * cross;
        }
        if area2.abs() < 1e-18 {
            return average;
        }
        origin + acc / (3.0 * area2)
    }

    /// Ray-casting point-in-polygon test
    ///
    /// Axis-aligned four-point rings (unjittered box cells) are answered by
    /// their bounding rectangle alone.
    pub fn contains(&self, p: DVec2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        if n == 4 && self.is_axis_aligned_quad() {
            return self.bounds().contains(p);
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn is_axis_aligned_quad(&self) -> bool {
        let p = &self.points;
        let horizontal = |a: DVec2, b: DVec2| a.y == b.y;
        let vertical = |a: DVec2, b: DVec2| a.x == b.x;
        (horizontal(p[0], p[1]) && vertical(p[1], p[2]) && horizontal(p[2], p[3]) && vertical(p[3], p[0]))
            || (vertical(p[0], p[1]) && horizontal(p[1], p[2]) && vertical(p[2], p[3]) && horizontal(p[3], p[0]))
    }

    /// Whether `inner` lies inside this ring
    ///
    /// Vertices of `inner` that coincide with a vertex of this ring (pinch
    /// points) are ignored; every remaining vertex must be inside.
    pub fn contains_contour(&self, inner: &Contour, epsilon: f64) -> bool {
        if !self.bounds().intersects(&inner.bounds()) {
            return false;
        }
        let eps2 = epsilon * epsilon;
        let mut tested = 0;
        for &p in &inner.points {
            if self.points.iter().any(|q| q.distance_squared(p) <= eps2) {
                continue;
            }
            if !self.contains(p) {
                return false;
            }
            tested += 1;
        }
        tested > 0
    }

    /// Map every point through `f`
    pub fn map(&self, f: impl Fn(DVec2) -> DVec2) -> Contour {
        Contour::new(self.points.iter().map(|&p| f(p)).collect())
    }
}

/// Outer contour followed by zero or more hole contours
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub contours: Vec<Contour>,
}

impl Polygon {
    pub fn new(outer: Contour) -> Self {
        Self {
            contours: vec![outer],
        }
    }

    pub fn outer(&self) -> Option<&Contour> {
        self.contours.first()
    }

    pub fn holes(&self) -> &[Contour] {
        self.contours.get(1..).unwrap_or(&[])
    }

    /// Append a hole, stored clockwise
    pub fn add_hole(&mut self, mut hole: Contour) {
        hole.make_ccw();
        hole.points.reverse();
        self.contours.push(hole);
    }

    /// Outer area minus hole areas
    pub fn area(&self) -> f64 {
        let outer = self.outer().map(Contour::area).unwrap_or(0.0);
        outer - self.holes().iter().map(Contour::area).sum::<f64>()
    }

    pub fn bounds(&self) -> Rect {
        self.outer().map(Contour::bounds).unwrap_or(Rect::EMPTY)
    }

    /// Even-odd containment over every contour, so holes exclude their interior
    pub fn contains(&self, p: DVec2) -> bool {
        self.contours.iter().filter(|c| c.contains(p)).count() % 2 == 1
    }
}
