//! Baked Voronoi data
//!
//! Relaxing and clipping a large irregular grid is the slowest part of
//! generation. A baked copy stores the final sites and cell polygons so a
//! later run can rebuild the exact same grid without either step.

use glam::DVec2;

use crate::error::{GridError, Result};

use super::voronoi::VoronoiCellGeometry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One precomputed Voronoi cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BakedCell {
    pub vertices: Vec<DVec2>,
    /// Site across each edge, `None` on the outer square
    pub edge_neighbours: Vec<Option<u32>>,
}

/// Flat, serializable snapshot of an irregular grid's Voronoi diagram
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BakedVoronoi {
    pub sites: Vec<DVec2>,
    pub cells: Vec<BakedCell>,
}

impl BakedVoronoi {
    pub fn from_geometry(geometry: &[VoronoiCellGeometry]) -> Self {
        Self {
            sites: geometry.iter().map(|g| g.site).collect(),
            cells: geometry
                .iter()
                .map(|g| BakedCell {
                    vertices: g.vertices.clone(),
                    edge_neighbours: g.edge_neighbours.clone(),
                })
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Check that arrays agree in length and neighbour tags are consistent
    pub fn validate(&self) -> Result<()> {
        if self.sites.len() != self.cells.len() {
            return Err(GridError::InvalidBakedData(format!(
                "{} sites but {} cells",
                self.sites.len(),
                self.cells.len()
            )));
        }
        let n = self.cells.len();
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.vertices.len() != cell.edge_neighbours.len() {
                return Err(GridError::InvalidBakedData(format!(
                    "cell {} has {} vertices but {} edge tags",
                    i,
                    cell.vertices.len(),
                    cell.edge_neighbours.len()
                )));
            }
            if cell.vertices.iter().any(|p| !p.is_finite()) || !self.sites[i].is_finite() {
                return Err(GridError::InvalidBakedData(format!(
                    "cell {} has a non-finite coordinate",
                    i
                )));
            }
            for &j in cell.edge_neighbours.iter().flatten() {
                let j = j as usize;
                if j >= n || j == i {
                    return Err(GridError::InvalidBakedData(format!(
                        "cell {} names invalid neighbour {}",
                        i, j
                    )));
                }
                if !self.cells[j].edge_neighbours.contains(&Some(i as u32)) {
                    return Err(GridError::InvalidBakedData(format!(
                        "cell {} lists {} as neighbour but not the reverse",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate and expand back into cell geometry
    pub fn to_geometry(&self) -> Result<Vec<VoronoiCellGeometry>> {
        self.validate()?;
        Ok(self
            .sites
            .iter()
            .zip(&self.cells)
            .map(|(&site, cell)| VoronoiCellGeometry {
                site,
                vertices: cell.vertices.clone(),
                edge_neighbours: cell.edge_neighbours.clone(),
            })
            .collect())
    }
}
