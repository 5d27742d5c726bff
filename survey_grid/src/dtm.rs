//! Triangulated surface and the height field sampled from it.

use crate::error::{Error, Result};
use crate::geometry::{Point, Point3, PointSet};
use crate::grid::Lattice;

/// Slack on barycentric weights so nodes lying on a hull edge or vertex
/// count as inside.
const BARYCENTRIC_TOL: f64 = 1e-9;

fn barycentric(p: Point, a: Point3, b: Point3, c: Point3) -> Option<(f64, f64, f64)> {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det == 0.0 {
        return None;
    }
    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / det;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / det;
    let w = 1.0 - u - v;
    Some((u, v, w))
}

/// Triangulated Irregular Network constructed from 3D points.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Tin {
    /// Vertices of the TIN.
    pub vertices: Vec<Point3>,
    /// Indices into `vertices` forming triangles.
    pub triangles: Vec<[usize; 3]>,
}

impl Tin {
    /// Builds a TIN from the provided vertices using Delaunay triangulation on
    /// the XY plane.
    ///
    /// Fails with [`Error::Interpolation`] for fewer than three points or when
    /// every point lies on one line.
    pub fn from_points(points: Vec<Point3>) -> Result<Self> {
        if points.len() < 3 {
            return Err(Error::Interpolation(format!(
                "at least 3 points are required, got {}",
                points.len()
            )));
        }
        let coords: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&coords);
        let triangles: Vec<[usize; 3]> = triangulation
            .triangles
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        if triangles.is_empty() {
            return Err(Error::Interpolation(
                "points are collinear in the XY plane".into(),
            ));
        }
        log::debug!(
            "triangulated {} points into {} triangles",
            points.len(),
            triangles.len()
        );
        Ok(Self {
            vertices: points,
            triangles,
        })
    }

    /// Builds a TIN from a validated point set.
    pub fn from_point_set(points: &PointSet) -> Result<Self> {
        Self::from_points(points.points().to_vec())
    }

    /// Returns the linearly interpolated elevation at (x, y), or `None` when
    /// the location lies outside the triangulated area.
    pub fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        let p = Point::new(x, y);
        for tri in &self.triangles {
            let a = self.vertices[tri[0]];
            let b = self.vertices[tri[1]];
            let c = self.vertices[tri[2]];
            if x < a.x.min(b.x).min(c.x) - BARYCENTRIC_TOL
                || x > a.x.max(b.x).max(c.x) + BARYCENTRIC_TOL
                || y < a.y.min(b.y).min(c.y) - BARYCENTRIC_TOL
                || y > a.y.max(b.y).max(c.y) + BARYCENTRIC_TOL
            {
                continue;
            }
            if let Some((u, v, w)) = barycentric(p, a, b, c) {
                if u >= -BARYCENTRIC_TOL && v >= -BARYCENTRIC_TOL && w >= -BARYCENTRIC_TOL {
                    return Some(u * a.z + v * b.z + w * c.z);
                }
            }
        }
        None
    }
}

/// Interpolated height per lattice node, stored in traversal order.
/// `None` marks nodes outside the convex hull of the samples.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    n_x: usize,
    n_y: usize,
    values: Vec<Option<f64>>,
}

impl HeightField {
    /// Wraps `values` laid out as `i * n_y + j`.
    pub fn new(n_x: usize, n_y: usize, values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != n_x * n_y {
            return Err(Error::Dimension(format!(
                "height field of {} values does not fit a {n_x} x {n_y} lattice",
                values.len()
            )));
        }
        Ok(Self { n_x, n_y, values })
    }

    pub fn n_x(&self) -> usize {
        self.n_x
    }

    pub fn n_y(&self) -> usize {
        self.n_y
    }

    /// Height at node `(i, j)`. `None` both outside the lattice and for
    /// undefined nodes.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.n_x && j < self.n_y {
            self.values[i * self.n_y + j]
        } else {
            None
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of nodes with a defined height.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Samples the linear interpolant of `points` at every node of `lattice`.
pub fn interpolate(points: &PointSet, lattice: &Lattice) -> Result<HeightField> {
    let tin = Tin::from_point_set(points)?;
    let values = lattice
        .nodes()
        .map(|(_, _, p)| tin.elevation_at(p.x, p.y))
        .collect();
    HeightField::new(lattice.n_x(), lattice.n_y(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{build_grid, GridAxis};

    fn set(pts: &[(f64, f64, f64)]) -> PointSet {
        PointSet::new(pts.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect()).unwrap()
    }

    #[test]
    fn node_on_sample_reproduces_its_height() {
        let pts = set(&[(0.0, 0.0, 1.0), (2.0, 0.0, 2.0), (0.0, 2.0, 3.0)]);
        let lattice = build_grid(&pts, 2.0).unwrap();
        let field = interpolate(&pts, &lattice).unwrap();
        assert_eq!(field.n_x(), 1);
        assert_eq!(field.n_y(), 1);
        assert!((field.get(0, 0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tiny_triangle_keeps_sample_height() {
        let pts = set(&[(0.0, 0.0, 1.0), (1e-8, 0.0, 2.0), (0.0, 1e-8, 3.0)]);
        let lattice = build_grid(&pts, 1e-8).unwrap();
        assert_eq!((lattice.n_x(), lattice.n_y()), (1, 1));
        let field = interpolate(&pts, &lattice).unwrap();
        assert_eq!(field.get(0, 0), Some(1.0));
        let tin = Tin::from_point_set(&pts).unwrap();
        let mid = tin.elevation_at(2.5e-9, 2.5e-9).unwrap();
        // z = 1 + 1e8 x + 2e8 y
        assert!((mid - 1.75).abs() < 1e-9);
    }

    #[test]
    fn every_sample_vertex_is_reproduced() {
        let tin = Tin::from_points(vec![
            Point3::new(0.0, 0.0, 1.5),
            Point3::new(3.0, 0.5, -2.0),
            Point3::new(1.0, 4.0, 7.25),
            Point3::new(4.0, 3.0, 0.5),
        ])
        .unwrap();
        for v in &tin.vertices {
            let z = tin.elevation_at(v.x, v.y).unwrap();
            assert!((z - v.z).abs() < 1e-9);
        }
    }

    #[test]
    fn plane_is_reproduced_inside_hull() {
        let tin = Tin::from_points(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 20.0),
            Point3::new(10.0, 10.0, 50.0),
            Point3::new(0.0, 10.0, 30.0),
        ])
        .unwrap();
        // z = 2x + 3y
        let z = tin.elevation_at(4.0, 7.0).unwrap();
        assert!((z - 29.0).abs() < 1e-9);
        let edge = tin.elevation_at(5.0, 0.0).unwrap();
        assert!((edge - 10.0).abs() < 1e-9);
    }

    #[test]
    fn outside_hull_is_undefined() {
        let pts = set(&[(0.0, 0.0, 0.0), (4.0, 0.0, 0.0), (0.0, 4.0, 4.0)]);
        let lattice = Lattice::new(GridAxis::new(0.0, 2.0, 3), GridAxis::new(0.0, 2.0, 3));
        let field = interpolate(&pts, &lattice).unwrap();
        assert!(field.get(0, 0).is_some());
        assert!(field.get(1, 1).is_some());
        assert_eq!(field.get(2, 1), None);
        assert_eq!(field.get(2, 2), None);
        assert_eq!(field.get(1, 2), None);
        assert_eq!(field.defined_count(), 6);
    }

    #[test]
    fn collinear_points_fail() {
        let pts = set(&[(0.0, 0.0, 0.0), (2.0, 2.0, 1.0)]);
        let lattice = build_grid(&pts, 1.0).unwrap();
        assert!(matches!(
            interpolate(&pts, &lattice),
            Err(Error::Interpolation(_))
        ));
        let line = set(&[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0), (3.0, 3.0, 2.0)]);
        assert!(matches!(
            Tin::from_point_set(&line),
            Err(Error::Interpolation(_))
        ));
    }

    #[test]
    fn mismatched_field_shape_is_rejected() {
        assert!(matches!(
            HeightField::new(2, 2, vec![None; 3]),
            Err(Error::Dimension(_))
        ));
    }
}
