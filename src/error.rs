//! Error types for grid generation and queries

use thiserror::Error;

/// Errors reported by grid, territory and pathfinding calls
///
/// Expected edge cases (bad configuration values, degenerate cells, no path)
/// never produce an error. These variants cover caller contract violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Requested cell index does not exist
    #[error("cell not found: {0}")]
    CellNotFound(usize),

    /// Requested territory index does not exist
    #[error("territory not found: {0}")]
    TerritoryNotFound(usize),

    /// Requested grid id does not exist in a context
    #[error("grid not found: {0}")]
    GridNotFound(usize),

    /// A point does not fall inside any valid cell
    #[error("point ({x}, {y}) is outside every grid cell")]
    PointOutsideGrid { x: f64, y: f64 },

    /// Baked Voronoi data is internally inconsistent
    #[error("invalid baked data: {0}")]
    InvalidBakedData(String),

    /// An array argument has the wrong length
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type alias for grid operations
pub type Result<T> = std::result::Result<T, GridError>;
