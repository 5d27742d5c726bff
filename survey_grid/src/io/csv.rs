//! Delimited text: `x,y,z` sample files and the cell table export.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::Point3;
use crate::mesh::MeshCell;
use crate::settings::TableFormat;

use super::{read_lines, write_string};

/// Reads a CSV file of `x,y,z` rows. Blank lines and lines starting with `#`
/// are skipped; extra columns are ignored.
pub fn read_points_csv(path: &Path) -> Result<Vec<Point3>> {
    let lines = read_lines(path)?;
    let mut pts = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return Err(Error::Dimension(format!(
                "line {}: expected x,y,z but found {} value(s)",
                idx + 1,
                parts.len()
            )));
        }
        let mut xyz = [0.0; 3];
        for (v, s) in xyz.iter_mut().zip(&parts) {
            *v = s
                .parse()
                .map_err(|e| Error::format(idx + 1, format!("{s:?}: {e}")))?;
        }
        pts.push(Point3::new(xyz[0], xyz[1], xyz[2]));
    }
    Ok(pts)
}

fn format_height(out: &mut String, value: Option<f64>, fmt: &TableFormat) {
    let (w, p) = (fmt.width, fmt.precision);
    let _ = match value {
        Some(v) if !v.is_nan() => write!(out, "{v:>w$.p$}"),
        _ => write!(out, "{:>w$}", "nan"),
    };
}

/// Formats one table row: `id` followed by the four corner heights.
pub fn format_cell_row(cell: &MeshCell, fmt: &TableFormat) -> String {
    let mut row = cell.id.to_string();
    for corner in cell.corners {
        row.push(fmt.delimiter);
        format_height(&mut row, corner, fmt);
    }
    row
}

/// Writes one row per cell, in the order given. No header row.
pub fn write_cells_csv(path: &Path, cells: &[MeshCell], fmt: &TableFormat) -> Result<()> {
    let mut out = String::new();
    for cell in cells {
        out.push_str(&format_cell_row(cell, fmt));
        out.push('\n');
    }
    write_string(path, &out)?;
    Ok(())
}
