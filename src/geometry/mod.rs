//! Planar geometry kernel
//!
//! Points are `glam::DVec2`. Nothing in here knows about cells or territories.

mod connector;
mod polygon;
mod segment;

pub use connector::{Connector, MIN_VERTEX_DISTANCE};
pub use polygon::{Contour, Polygon, Rect};
pub use segment::{Segment, SegmentId};

/// Point type used throughout the crate
pub type Point = glam::DVec2;
