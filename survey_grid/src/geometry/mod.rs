//! Geometry primitives for scattered samples and lattice nodes.

pub mod point;
pub mod point3;

pub use point::Point;
pub use point3::Point3;

use crate::error::{Error, Result};

/// Axis aligned extent of a set of points in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Computes the planar bounds of `points`. Returns `None` for an empty slice.
    pub fn of(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min: first.xy(),
            max: first.xy(),
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Non-empty collection of finite sample points. Order carries no meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    points: Vec<Point3>,
}

impl PointSet {
    /// Validates and wraps `points`.
    ///
    /// Fails with [`Error::NoData`] when `points` is empty and with
    /// [`Error::Dimension`] when a coordinate is NaN or infinite.
    pub fn new(points: Vec<Point3>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::NoData("point set is empty".into()));
        }
        if let Some((idx, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(Error::Dimension(format!(
                "point {} has a non-finite coordinate ({}, {}, {})",
                idx + 1,
                p.x,
                p.y,
                p.z
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a set built through [`PointSet::new`].
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        // Non-empty by construction.
        Bounds::of(&self.points).unwrap_or(Bounds {
            min: Point::new(0.0, 0.0),
            max: Point::new(0.0, 0.0),
        })
    }
}
