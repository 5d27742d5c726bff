//! Full grid pipeline: lattice, height field and mesh for one point set.

use crate::dtm::{interpolate, HeightField};
use crate::error::Result;
use crate::geometry::PointSet;
use crate::grid::{build_grid, Lattice};
use crate::mesh::{extract, Mesh};

/// Result of running the grid pipeline once. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGrid {
    pub step: f64,
    pub lattice: Lattice,
    pub heights: HeightField,
    pub mesh: Mesh,
}

impl SurfaceGrid {
    /// Builds the lattice over `points`, interpolates every node and extracts
    /// the mesh. Any failure aborts the whole computation.
    pub fn build(points: &PointSet, step: f64) -> Result<Self> {
        let lattice = build_grid(points, step)?;
        log::info!(
            "Interpolating {} points onto {} x {} lattice",
            points.len(),
            lattice.n_x(),
            lattice.n_y()
        );
        let heights = interpolate(points, &lattice)?;
        let mesh = extract(&lattice, &heights)?;
        log::info!(
            "{} cells, {} of {} nodes defined",
            mesh.cells.len(),
            mesh.nodes.len(),
            lattice.len()
        );
        Ok(Self {
            step,
            lattice,
            heights,
            mesh,
        })
    }
}
