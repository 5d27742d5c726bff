//! Step aligned lattice over the bounding box of a point set.
//!
//! Nodes are visited X-major, Y-minor: node `(i, j)` has flat index
//! `i * n_y + j` and traversal id `i * n_y + j + 1`. Every consumer of a
//! [`Lattice`] (height fields, mesh extraction, exports) relies on this order.

use crate::error::{Error, Result};
use crate::geometry::{Point, PointSet};

/// Largest lattice [`build_grid`] accepts, per axis and in total.
pub const MAX_LATTICE_NODES: usize = 25_000_000;

/// Number of nodes needed to cover `extent` with spacing `step`.
///
/// Uses round-half-to-even, so an extent of exactly 2.5 steps gives 2 nodes
/// and 3.5 steps gives 4. Negative or NaN ratios clamp to zero; ratios
/// beyond `usize`, infinity included, saturate.
pub fn axis_len(extent: f64, step: f64) -> usize {
    let n = (extent / step).round_ties_even();
    if n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// One axis of the lattice: `origin + k * step` for `k` in `0..len`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    pub origin: f64,
    pub step: f64,
    values: Vec<f64>,
}

impl GridAxis {
    pub fn new(origin: f64, step: f64, len: usize) -> Self {
        let values = (0..len).map(|k| k as f64 * step + origin).collect();
        Self {
            origin,
            step,
            values,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, k: usize) -> Option<f64> {
        self.values.get(k).copied()
    }
}

/// Regular grid of candidate node positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    pub x: GridAxis,
    pub y: GridAxis,
}

impl Lattice {
    pub fn new(x: GridAxis, y: GridAxis) -> Self {
        Self { x, y }
    }

    pub fn n_x(&self) -> usize {
        self.x.len()
    }

    pub fn n_y(&self) -> usize {
        self.y.len()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.n_x().saturating_mul(self.n_y())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of node `(i, j)` in traversal order.
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.n_y() + j
    }

    /// Traversal id of node `(i, j)`; ids start at 1.
    pub fn id(&self, i: usize, j: usize) -> usize {
        self.index(i, j) + 1
    }

    /// Position of node `(i, j)`, or `None` outside the lattice.
    pub fn node(&self, i: usize, j: usize) -> Option<Point> {
        Some(Point::new(self.x.get(i)?, self.y.get(j)?))
    }

    /// Yields `(i, j, position)` for every node in traversal order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, usize, Point)> + '_ {
        self.x.values().iter().enumerate().flat_map(move |(i, &x)| {
            self.y
                .values()
                .iter()
                .enumerate()
                .map(move |(j, &y)| (i, j, Point::new(x, y)))
        })
    }
}

/// Builds the lattice spanning `points` with spacing `step`.
///
/// Fails with [`Error::InvalidParameter`] unless `step` is finite and
/// positive, and when the lattice would exceed [`MAX_LATTICE_NODES`].
pub fn build_grid(points: &PointSet, step: f64) -> Result<Lattice> {
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "grid step must be a positive number, got {step}"
        )));
    }
    let bounds = points.bounds();
    let n_x = axis_len(bounds.width(), step);
    let n_y = axis_len(bounds.height(), step);
    let total = n_x.checked_mul(n_y);
    if n_x > MAX_LATTICE_NODES
        || n_y > MAX_LATTICE_NODES
        || total.map_or(true, |n| n > MAX_LATTICE_NODES)
    {
        return Err(Error::InvalidParameter(format!(
            "step {step} gives a {n_x} x {n_y} lattice, more than {MAX_LATTICE_NODES} nodes"
        )));
    }
    log::debug!("lattice {n_x} x {n_y} nodes at step {step}");
    Ok(Lattice::new(
        GridAxis::new(bounds.min.x, step, n_x),
        GridAxis::new(bounds.min.y, step, n_y),
    ))
}
