//! Valid node coordinates stored as parallel JSON arrays.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Point3;
use crate::mesh::ValidNode;

use super::{read_to_string, write_string};

/// Node coordinates as `{ "x": [...], "y": [...], "z": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeArrays {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl NodeArrays {
    pub fn from_points(points: &[Point3]) -> Self {
        Self {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            z: points.iter().map(|p| p.z).collect(),
        }
    }

    pub fn from_nodes(nodes: &[ValidNode]) -> Self {
        Self {
            x: nodes.iter().map(|n| n.x).collect(),
            y: nodes.iter().map(|n| n.y).collect(),
            z: nodes.iter().map(|n| n.z).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Zips the arrays back into points. Arrays of unequal length are a
    /// [`Error::Dimension`].
    pub fn to_points(&self) -> Result<Vec<Point3>> {
        if self.y.len() != self.x.len() || self.z.len() != self.x.len() {
            return Err(Error::Dimension(format!(
                "node arrays differ in length: x={}, y={}, z={}",
                self.x.len(),
                self.y.len(),
                self.z.len()
            )));
        }
        Ok(self
            .x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| Point3::new(x, y, z))
            .collect())
    }
}

pub fn write_nodes_json(path: &Path, nodes: &NodeArrays) -> Result<()> {
    write_string(path, &serde_json::to_string(nodes)?)?;
    Ok(())
}

pub fn read_nodes_json(path: &Path) -> Result<NodeArrays> {
    Ok(serde_json::from_str(&read_to_string(path)?)?)
}
