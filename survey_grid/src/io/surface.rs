//! Triangulated surface export of valid nodes.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dtm::Tin;
use crate::error::{Error, Result};
use crate::geometry::Point3;

use super::landxml::write_landxml_surface;

/// File format for the triangulated surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceFormat {
    #[default]
    #[serde(alias = "xml")]
    LandXml,
    Obj,
}

impl SurfaceFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::LandXml => "xml",
            Self::Obj => "obj",
        }
    }
}

impl fmt::Display for SurfaceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LandXml => "landxml",
            Self::Obj => "obj",
        })
    }
}

impl FromStr for SurfaceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "landxml" | "xml" => Ok(Self::LandXml),
            "obj" => Ok(Self::Obj),
            other => Err(Error::InvalidParameter(format!(
                "unknown surface format {other:?}, expected landxml or obj"
            ))),
        }
    }
}

/// Writes a [`Tin`] as a Wavefront OBJ mesh. Faces are wound
/// counter-clockwise seen from above.
pub fn write_obj_surface(path: &Path, tin: &Tin) -> io::Result<()> {
    let mut obj = BufWriter::new(File::create(path)?);
    writeln!(obj, "# {} vertices, {} faces", tin.vertices.len(), tin.triangles.len())?;
    for v in &tin.vertices {
        writeln!(obj, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for t in &tin.triangles {
        let [a, b, c] = *t;
        let (pa, pb, pc) = (tin.vertices[a], tin.vertices[b], tin.vertices[c]);
        let area2 = (pb.x - pa.x) * (pc.y - pa.y) - (pc.x - pa.x) * (pb.y - pa.y);
        if area2 >= 0.0 {
            writeln!(obj, "f {} {} {}", a + 1, b + 1, c + 1)?;
        } else {
            writeln!(obj, "f {} {} {}", a + 1, c + 1, b + 1)?;
        }
    }
    obj.flush()
}

/// Writes `tin` in `format`. An empty TIN gives a surface without points.
pub fn write_tin(path: &Path, tin: &Tin, format: SurfaceFormat) -> io::Result<()> {
    match format {
        SurfaceFormat::LandXml => write_landxml_surface(path, tin, "Grid"),
        SurfaceFormat::Obj => write_obj_surface(path, tin),
    }
}

/// Triangulates `points` and writes the surface in `format`.
///
/// Fails with [`Error::Interpolation`] when the points cannot be
/// triangulated.
pub fn write_surface(path: &Path, points: Vec<Point3>, format: SurfaceFormat) -> Result<Tin> {
    let tin = Tin::from_points(points)?;
    write_tin(path, &tin, format)?;
    log::info!(
        "Wrote {} surface with {} triangles to {}",
        format,
        tin.triangles.len(),
        path.display()
    );
    Ok(tin)
}
