//! Cell grids with territories and pathfinding
//!
//! A library for partitioning a 2D area into box, hexagonal or irregular
//! (Voronoi) cells, grouping cells into territories, tracing the frontiers
//! between them and searching paths over the cell graph, within one grid or
//! across several grids joined by bridges.
//!
//! # Quick Start
//!
//! ```rust
//! use territory_grid::*;
//!
//! // Generate a relaxed Voronoi grid
//! let config = GridConfigBuilder::new()
//!     .topology(Topology::Irregular)
//!     .cell_count(300)
//!     .seed(42)
//!     .relaxation(4)
//!     .build();
//!
//! // Split it into five territories
//! let territories = TerritoryConfigBuilder::new()
//!     .count(5)
//!     .organic(0.3)
//!     .build();
//!
//! let mut grid = CellGrid::with_territories(config, territories);
//! for territory in grid.territories() {
//!     println!(
//!         "territory {}: {} cells in {} regions",
//!         territory.index,
//!         territory.cell_count(),
//!         territory.regions.len()
//!     );
//! }
//!
//! // Search a path between two cells
//! let last = grid.cell_count() - 1;
//! if let Some(path) = grid.find_path(0, last, &PathOptions::default()).unwrap() {
//!     println!("{} steps, cost {}", path.len(), path.cost);
//! }
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): Enables O(log n) position-to-cell lookups using KD-tree
//! - `serde`: Enables serialization support for configuration, cells, territories and baked Voronoi data

// Modules
pub mod error;
pub mod config;
pub mod geometry;
pub mod region;
pub mod entity;
pub mod cell;
pub mod generation;
pub mod graph;
pub mod territory;
pub mod pathfinding;
pub mod grid;
pub mod context;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{GridError, Result};
pub use config::{GridConfig, GridConfigBuilder, SeedMethod, TerritoryConfig, TerritoryConfigBuilder, Topology};
pub use geometry::{Contour, Polygon, Rect, Segment, SegmentId};
pub use region::Region;
pub use entity::{Attributes, Entity};
pub use cell::{Cell, CellSide};
pub use generation::{BakedCell, BakedVoronoi, LloydOptions};
pub use territory::{Frontier, FrontierStatus, Territory};
pub use pathfinding::{CustomCost, GroupMatch, HeuristicFormula, PathFinder, PathOptions, PathResult};
pub use grid::CellGrid;
pub use context::{Bridge, CrossGridPath, GridCell, GridContext};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
