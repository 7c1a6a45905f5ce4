//! Capabilities shared by cells and territories

use glam::DVec2;
use rustc_hash::FxHashMap;

/// Free-form key/value data a host attaches to a cell or territory
pub type Attributes = FxHashMap<String, String>;

/// Common surface of [`Cell`](crate::Cell) and [`Territory`](crate::Territory)
pub trait Entity {
    /// Whether the entity currently takes part in frontiers and searches
    fn is_visible(&self) -> bool;

    /// Whether the entity changed since its geometry was last rebuilt
    fn is_dirty(&self) -> bool;

    fn set_dirty(&mut self, dirty: bool);

    fn attributes(&self) -> &Attributes;

    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Centre in world coordinates
    fn scaled_center(&self) -> DVec2;

    /// Convenience lookup of a single attribute
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes().get(key).map(String::as_str)
    }
}
