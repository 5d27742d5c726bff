//! Numbered quadrilateral cells and valid nodes derived from a height field.

use serde::{Deserialize, Serialize};

use crate::dtm::HeightField;
use crate::error::{Error, Result};
use crate::grid::Lattice;

/// Quadrilateral formed by nodes `(i, j)`, `(i+1, j)`, `(i, j+1)` and
/// `(i+1, j+1)`, identified by the traversal id of `(i, j)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshCell {
    pub id: usize,
    /// Corner heights in the order `(i,j)`, `(i+1,j)`, `(i,j+1)`, `(i+1,j+1)`.
    pub corners: [Option<f64>; 4],
}

impl MeshCell {
    /// Returns `true` when all four corners have a height.
    pub fn is_complete(&self) -> bool {
        self.corners.iter().all(Option::is_some)
    }
}

/// Lattice node with a defined height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidNode {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Cells and valid nodes, both in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub cells: Vec<MeshCell>,
    pub nodes: Vec<ValidNode>,
}

/// Walks `lattice` X-major and collects cells and valid nodes.
///
/// Every node consumes one id whether or not it produces a cell, so ids are
/// contiguous over the whole lattice. Nodes on the last row or column have no
/// cell.
pub fn extract(lattice: &Lattice, heights: &HeightField) -> Result<Mesh> {
    let (n_x, n_y) = (lattice.n_x(), lattice.n_y());
    if heights.n_x() != n_x || heights.n_y() != n_y {
        return Err(Error::Dimension(format!(
            "height field is {} x {}, lattice is {n_x} x {n_y}",
            heights.n_x(),
            heights.n_y()
        )));
    }
    let mut mesh = Mesh {
        cells: Vec::with_capacity(n_x.saturating_sub(1) * n_y.saturating_sub(1)),
        nodes: Vec::new(),
    };
    for (i, j, p) in lattice.nodes() {
        let id = lattice.id(i, j);
        if i + 1 < n_x && j + 1 < n_y {
            mesh.cells.push(MeshCell {
                id,
                corners: [
                    heights.get(i, j),
                    heights.get(i + 1, j),
                    heights.get(i, j + 1),
                    heights.get(i + 1, j + 1),
                ],
            });
        }
        if let Some(z) = heights.get(i, j) {
            mesh.nodes.push(ValidNode { id, x: p.x, y: p.y, z });
        }
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridAxis;

    fn lattice(n_x: usize, n_y: usize) -> Lattice {
        Lattice::new(GridAxis::new(0.0, 1.0, n_x), GridAxis::new(0.0, 1.0, n_y))
    }

    #[test]
    fn cell_count_and_ids() {
        let lat = lattice(4, 3);
        let values = (0..12).map(|v| Some(v as f64)).collect();
        let field = HeightField::new(4, 3, values).unwrap();
        let mesh = extract(&lat, &field).unwrap();
        assert_eq!(mesh.cells.len(), 3 * 2);
        assert_eq!(mesh.nodes.len(), 12);
        let ids: Vec<usize> = mesh.cells.iter().map(|c| c.id).collect();
        // last column (j = 2) and last row (i = 3) are skipped
        assert_eq!(ids, vec![1, 2, 4, 5, 7, 8]);
        let node_ids: Vec<usize> = mesh.nodes.iter().map(|n| n.id).collect();
        assert_eq!(node_ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn corners_follow_neighbour_layout() {
        let lat = lattice(2, 2);
        let field =
            HeightField::new(2, 2, vec![Some(1.0), Some(2.0), Some(3.0), None]).unwrap();
        let mesh = extract(&lat, &field).unwrap();
        assert_eq!(mesh.cells.len(), 1);
        let cell = mesh.cells[0];
        assert_eq!(cell.id, 1);
        // (0,0) (1,0) (0,1) (1,1)
        assert_eq!(cell.corners, [Some(1.0), Some(3.0), Some(2.0), None]);
        assert!(!cell.is_complete());
        assert_eq!(mesh.nodes.len(), 3);
        assert_eq!(
            mesh.nodes[2],
            ValidNode {
                id: 3,
                x: 1.0,
                y: 0.0,
                z: 3.0
            }
        );
    }

    #[test]
    fn single_row_has_no_cells() {
        let lat = lattice(1, 5);
        let field = HeightField::new(1, 5, vec![Some(0.0); 5]).unwrap();
        let mesh = extract(&lat, &field).unwrap();
        assert!(mesh.cells.is_empty());
        assert_eq!(mesh.nodes.len(), 5);
    }

    #[test]
    fn empty_lattice_gives_empty_mesh() {
        let lat = lattice(0, 3);
        let field = HeightField::new(0, 3, Vec::new()).unwrap();
        assert_eq!(extract(&lat, &field).unwrap(), Mesh::default());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let lat = lattice(2, 3);
        let field = HeightField::new(3, 2, vec![None; 6]).unwrap();
        assert!(matches!(extract(&lat, &field), Err(Error::Dimension(_))));
    }
}
