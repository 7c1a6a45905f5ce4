//! Grid and territory configuration and builders
//!
//! Both configurations are plain data: the same configuration always produces
//! the same grid and the same territory partition. Out-of-range values are
//! clamped to the nearest valid value rather than rejected, so a configuration
//! can always be built.

use glam::DVec2;
use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest row or column count accepted for regular topologies
pub const MAX_ROWS_OR_COLUMNS: usize = 1000;

/// Largest approximate cell count accepted for irregular topology
pub const MAX_IRREGULAR_CELLS: usize = 50_000;

/// Upper bound for edge curvature
pub const MAX_CURVATURE: f64 = 0.1;

/// Upper bound for corner jitter (fraction of a cell size)
pub const MAX_CORNER_JITTER: f64 = 0.5;

/// Upper bound for Lloyd relaxation iterations
pub const MAX_RELAXATION: usize = 32;

/// Cell layout of a grid
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    /// Rectangular lattice, four sides per cell
    #[default]
    Box,
    /// Hexagons with a flat top, columns staggered vertically
    FlatHex,
    /// Hexagons with a pointy top, rows staggered horizontally
    PointyHex,
    /// Relaxed Voronoi tessellation
    Irregular,
}

impl Topology {
    /// Whether cells carry meaningful row/column coordinates
    #[inline]
    pub fn is_regular(self) -> bool {
        !matches!(self, Topology::Irregular)
    }

    /// Whether the topology is one of the hexagonal layouts
    #[inline]
    pub fn is_hexagonal(self) -> bool {
        matches!(self, Topology::FlatHex | Topology::PointyHex)
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Topology::Box => "Box",
            Topology::FlatHex => "FlatHex",
            Topology::PointyHex => "PointyHex",
            Topology::Irregular => "Irregular",
        }
    }
}

/// Topology descriptor for grid generation
///
/// Cells are generated in a normalized `[-0.5, 0.5]²` space. `origin` and
/// `scale` map that space into world coordinates: `world = origin + local * scale`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Cell layout
    pub topology: Topology,

    /// Row count for regular topologies
    pub rows: usize,

    /// Column count for regular topologies
    pub columns: usize,

    /// Approximate cell count for irregular topology
    pub cell_count: usize,

    /// Seed for site sampling and corner jitter
    pub seed: u32,

    /// How far shared edges bow outward (0 = straight)
    pub curvature: f64,

    /// Corner displacement as a fraction of cell size (regular topologies only)
    pub corner_jitter: f64,

    /// Lloyd relaxation iterations for irregular topology
    pub relaxation: usize,

    /// Stop relaxing once the largest site displacement falls below this
    /// fraction of the average cell spacing. 0 runs every iteration.
    pub relaxation_convergence: f64,

    /// Which hex column (flat) or row (pointy) parity is pushed in
    pub even_layout: bool,

    /// World position of the grid centre
    pub origin: DVec2,

    /// World size of the grid
    pub scale: DVec2,

    /// User-supplied Voronoi sites in normalized space. Overrides random sampling.
    pub sites: Option<Vec<DVec2>>,
}

impl GridConfig {
    /// Total cell count the configuration asks for before degenerate cells are dropped
    pub fn requested_cells(&self) -> usize {
        match self.topology {
            Topology::Irregular => self
                .sites
                .as_ref()
                .map(|s| s.len())
                .unwrap_or(self.cell_count),
            _ => self.rows * self.columns,
        }
    }

    /// Map a normalized point into world coordinates
    #[inline]
    pub fn to_world(&self, local: DVec2) -> DVec2 {
        self.origin + local * self.scale
    }

    /// Map a world point back into normalized grid space
    #[inline]
    pub fn to_local(&self, world: DVec2) -> DVec2 {
        (world - self.origin) / self.scale
    }

    /// Apply the builder's clamping to every field
    ///
    /// Configurations written as struct literals skip the builder; the grid
    /// normalizes them before generating. Already valid values pass through
    /// unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use territory_grid::*;
    ///
    /// let config = GridConfig { rows: 0, curvature: 2.0, ..Default::default() }.normalized();
    /// assert_eq!(config.rows, 1);
    /// assert_eq!(config.curvature, 0.1);
    /// ```
    pub fn normalized(self) -> GridConfig {
        let GridConfig {
            topology,
            rows,
            columns,
            cell_count,
            seed,
            curvature,
            corner_jitter,
            relaxation,
            relaxation_convergence,
            even_layout,
            origin,
            scale,
            sites,
        } = self;
        let builder = GridConfigBuilder::new()
            .topology(topology)
            .rows(rows)
            .columns(columns)
            .cell_count(cell_count)
            .seed(seed)
            .curvature(curvature)
            .corner_jitter(corner_jitter)
            .relaxation(relaxation)
            .relaxation_convergence(relaxation_convergence)
            .even_layout(even_layout)
            .origin(origin)
            .scale(scale);
        match sites {
            Some(sites) => builder.sites(sites).build(),
            None => builder.build(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfigBuilder::new().build()
    }
}

/// Builder for [`GridConfig`] with clamping setters
///
/// # Example
///
/// ```rust
/// use territory_grid::*;
///
/// let config = GridConfigBuilder::new()
///     .topology(Topology::FlatHex)
///     .rows(8)
///     .columns(12)
///     .seed(7)
///     .corner_jitter(0.2)
///     .build();
/// assert_eq!(config.rows, 8);
/// ```
#[derive(Debug, Clone)]
pub struct GridConfigBuilder {
    config: GridConfig,
}

impl GridConfigBuilder {
    /// Create a builder with defaults: 16×16 box grid, seed 1, no curvature or jitter,
    /// 3 relaxation iterations for irregular grids.
    pub fn new() -> Self {
        Self {
            config: GridConfig {
                topology: Topology::Box,
                rows: 16,
                columns: 16,
                cell_count: 256,
                seed: 1,
                curvature: 0.0,
                corner_jitter: 0.0,
                relaxation: 3,
                relaxation_convergence: 0.0,
                even_layout: false,
                origin: DVec2::ZERO,
                scale: DVec2::ONE,
                sites: None,
            },
        }
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.config.topology = topology;
        self
    }

    /// Set the row count, clamped to `1..=MAX_ROWS_OR_COLUMNS`
    pub fn rows(mut self, rows: usize) -> Self {
        self.config.rows = clamp_count("rows", rows, 1, MAX_ROWS_OR_COLUMNS);
        self
    }

    /// Set the column count, clamped to `1..=MAX_ROWS_OR_COLUMNS`
    pub fn columns(mut self, columns: usize) -> Self {
        self.config.columns = clamp_count("columns", columns, 1, MAX_ROWS_OR_COLUMNS);
        self
    }

    /// Set the approximate irregular cell count, clamped to `2..=MAX_IRREGULAR_CELLS`
    pub fn cell_count(mut self, count: usize) -> Self {
        self.config.cell_count = clamp_count("cell_count", count, 2, MAX_IRREGULAR_CELLS);
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn curvature(mut self, curvature: f64) -> Self {
        self.config.curvature = clamp_unit("curvature", curvature, MAX_CURVATURE);
        self
    }

    pub fn corner_jitter(mut self, jitter: f64) -> Self {
        self.config.corner_jitter = clamp_unit("corner_jitter", jitter, MAX_CORNER_JITTER);
        self
    }

    pub fn relaxation(mut self, iterations: usize) -> Self {
        self.config.relaxation = clamp_count("relaxation", iterations, 0, MAX_RELAXATION);
        self
    }

    pub fn relaxation_convergence(mut self, threshold: f64) -> Self {
        self.config.relaxation_convergence = clamp_unit("relaxation_convergence", threshold, 1.0);
        self
    }

    pub fn even_layout(mut self, even: bool) -> Self {
        self.config.even_layout = even;
        self
    }

    /// Set the world position of the grid centre; non-finite origins fall back to zero
    pub fn origin(mut self, origin: DVec2) -> Self {
        self.config.origin = if origin.is_finite() {
            origin
        } else {
            warn!("grid origin {} is not finite, using zero", origin);
            DVec2::ZERO
        };
        self
    }

    /// Set the world size. Non-positive or non-finite axes fall back to 1.
    pub fn scale(mut self, scale: DVec2) -> Self {
        let fix = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                warn!("grid scale axis {} is not positive, using 1", v);
                1.0
            }
        };
        self.config.scale = DVec2::new(fix(scale.x), fix(scale.y));
        self
    }

    /// Supply Voronoi sites in normalized space. Points outside `[-0.5, 0.5]²`
    /// are clamped onto the square.
    pub fn sites(mut self, sites: Vec<DVec2>) -> Self {
        let clamped = sites
            .into_iter()
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(DVec2::splat(-0.5), DVec2::splat(0.5)))
            .collect();
        self.config.sites = Some(clamped);
        self
    }

    pub fn build(self) -> GridConfig {
        self.config
    }
}

impl Default for GridConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// How territory seed cells are chosen
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedMethod {
    /// Scan forward from a seeded random start
    #[default]
    RandomBasedOnSeed,
    /// Take cells from [`TerritoryConfig::user_seeds`], falling back to random
    /// when an entry is unusable
    UserDefined,
}

/// Territory descriptor for partitioning
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryConfig {
    /// Desired territory count (clamped to the usable cell count at partition time)
    pub count: usize,

    pub seed_method: SeedMethod,

    /// Seed cell indices for [`SeedMethod::UserDefined`]
    pub user_seeds: Vec<usize>,

    /// RNG seed for seeding and growth
    pub seed: u32,

    /// Revisit bias toward lower-index territories (0..=1). Territory `k` of
    /// `T` is revisited after a claim with probability `1 - (k + asymmetry) / T`,
    /// so lower values favour the first territories more.
    pub asymmetry: f64,

    /// Raggedness of territory borders (0..=1)
    pub organic: f64,

    /// Growth rounds cap, 0 = unbounded
    pub max_iterations: usize,

    /// Grid distance cap from each seed cell (regular topologies only).
    /// `Some(0)` keeps only the seed; `None` is unbounded.
    pub max_range: Option<usize>,

    /// Subtract fully enclosed pockets from territory polygons as holes
    pub internal_territories: bool,

    /// Let territories grow into cells that are not visible
    pub allow_in_invisible_cells: bool,
}

impl TerritoryConfig {
    /// Clamp `asymmetry` and `organic` into `[0, 1]`, as the builder does
    pub fn normalized(mut self) -> TerritoryConfig {
        self.asymmetry = clamp_unit("asymmetry", self.asymmetry, 1.0);
        self.organic = clamp_unit("organic", self.organic, 1.0);
        self
    }
}

impl Default for TerritoryConfig {
    fn default() -> Self {
        TerritoryConfigBuilder::new().build()
    }
}

/// Builder for [`TerritoryConfig`] with clamping setters
#[derive(Debug, Clone)]
pub struct TerritoryConfigBuilder {
    config: TerritoryConfig,
}

impl TerritoryConfigBuilder {
    /// Defaults: 3 random territories, seed 1, asymmetry 1 (the least biased
    /// revisit rate), no organic growth, unbounded.
    pub fn new() -> Self {
        Self {
            config: TerritoryConfig {
                count: 3,
                seed_method: SeedMethod::RandomBasedOnSeed,
                user_seeds: Vec::new(),
                seed: 1,
                asymmetry: 1.0,
                organic: 0.0,
                max_iterations: 0,
                max_range: None,
                internal_territories: false,
                allow_in_invisible_cells: false,
            },
        }
    }

    pub fn count(mut self, count: usize) -> Self {
        self.config.count = count;
        self
    }

    /// Use the given cells as seeds (switches to [`SeedMethod::UserDefined`])
    pub fn user_seeds(mut self, seeds: Vec<usize>) -> Self {
        self.config.seed_method = SeedMethod::UserDefined;
        self.config.user_seeds = seeds;
        self
    }

    pub fn seed_method(mut self, method: SeedMethod) -> Self {
        self.config.seed_method = method;
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn asymmetry(mut self, asymmetry: f64) -> Self {
        self.config.asymmetry = clamp_unit("asymmetry", asymmetry, 1.0);
        self
    }

    pub fn organic(mut self, organic: f64) -> Self {
        self.config.organic = clamp_unit("organic", organic, 1.0);
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.config.max_iterations = iterations;
        self
    }

    pub fn max_range(mut self, range: Option<usize>) -> Self {
        self.config.max_range = range;
        self
    }

    pub fn internal_territories(mut self, enabled: bool) -> Self {
        self.config.internal_territories = enabled;
        self
    }

    pub fn allow_in_invisible_cells(mut self, allow: bool) -> Self {
        self.config.allow_in_invisible_cells = allow;
        self
    }

    pub fn build(self) -> TerritoryConfig {
        self.config
    }
}

impl Default for TerritoryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_count(name: &str, value: usize, min: usize, max: usize) -> usize {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{} = {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

fn clamp_unit(name: &str, value: f64, max: f64) -> f64 {
    if !value.is_finite() {
        warn!("{} is not finite, using 0", name);
        return 0.0;
    }
    let clamped = value.clamp(0.0, max);
    if clamped != value {
        warn!("{} = {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}
