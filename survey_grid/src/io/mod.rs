//! File input and output for sample points and grid results.

pub mod csv;
pub mod dxf;
pub mod landxml;
pub mod nodes;
pub mod surface;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::geometry::PointSet;
use crate::settings::EntityKind;

/// Reads a file to string.
pub fn read_to_string(path: &Path) -> io::Result<String> {
    let mut buffer = String::new();
    File::open(path)?.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Reads a whole file as raw bytes.
pub fn read_bytes(path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// Writes raw bytes to a file, replacing any existing content.
pub fn write_bytes(path: &Path, contents: &[u8]) -> io::Result<()> {
    std::fs::write(path, contents)
}

/// Writes a string to a file, replacing any existing content.
pub fn write_string(path: &Path, contents: &str) -> io::Result<()> {
    std::fs::write(path, contents)
}

/// Reads a file into lines without trailing line terminators.
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    reader.lines().collect()
}

/// Builds `<dir>/<stem><suffix>.<ext>` next to `input`.
pub fn sibling_path(input: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.{ext}"))
}

/// Fails with [`Error::InvalidParameter`] when `path` is not an existing file.
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "input file {} does not exist",
            path.display()
        )))
    }
}

/// Whether `path` names a plain `x,y,z` point table rather than a drawing.
pub fn is_point_table(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("txt"))
}

/// Selects model space entities of kind `entity` on `layer` from a drawing.
/// An empty selection fails with [`Error::NoData`].
pub fn select_points(doc: &dxf::DxfDocument, entity: EntityKind, layer: &str) -> Result<PointSet> {
    let points = doc.entity_points(entity, layer)?;
    if points.is_empty() {
        return Err(Error::NoData(format!(
            "no {entity} entities on layer {layer:?}"
        )));
    }
    PointSet::new(points)
}

/// Sample points and, for DXF input, the drawing they were selected from.
#[derive(Debug)]
pub struct LoadedInput {
    pub points: PointSet,
    pub drawing: Option<dxf::DxfDocument>,
}

/// Loads sample points from a DXF drawing or a CSV file of `x,y,z` rows,
/// keeping the drawing for later annotation.
///
/// For DXF input only model space entities of kind `entity` on `layer` are
/// used. CSV input ignores both selectors. An empty selection fails with
/// [`Error::NoData`].
pub fn load_input(path: &Path, entity: EntityKind, layer: &str) -> Result<LoadedInput> {
    require_file(path)?;
    let loaded = if is_point_table(path) {
        let points = csv::read_points_csv(path)?;
        if points.is_empty() {
            return Err(Error::NoData(format!("no points in {}", path.display())));
        }
        LoadedInput {
            points: PointSet::new(points)?,
            drawing: None,
        }
    } else {
        let doc = dxf::DxfDocument::read(path)?;
        LoadedInput {
            points: select_points(&doc, entity, layer)?,
            drawing: Some(doc),
        }
    };
    log::info!(
        "Loaded {} points from {}",
        loaded.points.len(),
        path.display()
    );
    Ok(loaded)
}

/// Like [`load_input`] without keeping the drawing.
pub fn load_points(path: &Path, entity: EntityKind, layer: &str) -> Result<PointSet> {
    load_input(path, entity, layer).map(|loaded| loaded.points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_path_keeps_directory() {
        let p = sibling_path(Path::new("/data/site/survey.dxf"), "_output", "csv");
        assert_eq!(p, PathBuf::from("/data/site/survey_output.csv"));
        let p = sibling_path(Path::new("plan.v2.dxf"), "", "json");
        assert_eq!(p, PathBuf::from("plan.v2.json"));
    }

    #[test]
    fn point_tables_are_recognised_by_extension() {
        assert!(is_point_table(Path::new("pts.CSV")));
        assert!(is_point_table(Path::new("pts.txt")));
        assert!(!is_point_table(Path::new("pts.dxf")));
        assert!(!is_point_table(Path::new("pts")));
    }

    #[test]
    fn csv_input_has_no_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pts.csv");
        std::fs::write(&path, "# x,y,z\n0,0,1\n4,0,2\n\n0,4,3\n").unwrap();
        let loaded = load_input(&path, EntityKind::Circle, "ignored").unwrap();
        assert_eq!(loaded.points.len(), 3);
        assert!(loaded.drawing.is_none());

        std::fs::write(&path, "# header only\n").unwrap();
        assert!(matches!(
            load_input(&path, EntityKind::Circle, "0"),
            Err(Error::NoData(_))
        ));
    }

    #[test]
    fn dxf_input_keeps_its_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pts.dxf");
        let text = "  0\nSECTION\n  2\nENTITIES\n  0\nPOINT\n  8\nS\n 10\n1.0\n 20\n2.0\n 30\n3.0\n  0\nENDSEC\n  0\nEOF\n";
        std::fs::write(&path, text).unwrap();
        let loaded = load_input(&path, EntityKind::Point, "s").unwrap();
        assert_eq!(loaded.points.len(), 1);
        assert_eq!(loaded.drawing.unwrap().entities().len(), 1);
    }

    #[test]
    fn missing_file_is_a_parameter_error() {
        let err = load_points(Path::new("/no/such/file.dxf"), EntityKind::Point, "0");
        assert!(matches!(err, Err(Error::InvalidParameter(_))));
    }
}
