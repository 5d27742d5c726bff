//! Consumers of a finished [`SurfaceGrid`].
//!
//! Each sink writes one artifact. [`run_sinks`] runs all of them and keeps
//! going when one fails, so a broken surface export never costs the
//! annotated drawing or the cell table.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::geometry::{Point, Point3};
use crate::io::csv::write_cells_csv;
use crate::io::dxf::{DxfDocument, GroupPair};
use crate::dtm::Tin;
use crate::io::surface::{write_tin, SurfaceFormat};
use crate::settings::{AnnotationStyle, TableFormat};
use crate::surface::SurfaceGrid;

/// Something that turns grid results into an output artifact.
pub trait OutputSink {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Path of the artifact this sink produces.
    fn output(&self) -> &Path;

    fn write(&mut self, grid: &SurfaceGrid) -> Result<()>;
}

/// Adds node labels and valid node points to a drawing.
pub struct DxfAnnotationSink {
    document: DxfDocument,
    output: PathBuf,
    style: AnnotationStyle,
}

impl DxfAnnotationSink {
    pub fn new(document: DxfDocument, output: PathBuf, style: AnnotationStyle) -> Self {
        Self {
            document,
            output,
            style,
        }
    }
}

/// Labels every traversal id at its cell center and adds a `POINT` for each
/// valid node.
pub fn annotate(document: &mut DxfDocument, grid: &SurfaceGrid, style: &AnnotationStyle) {
    document.set_header_var(
        "$PDMODE",
        vec![GroupPair::new(70, style.point_mode.to_string())],
    );
    document.set_header_var(
        "$PDSIZE",
        vec![GroupPair::new(40, style.point_size.to_string())],
    );
    document.ensure_text_style(&style.text_style, &style.font);
    document.ensure_layer(&style.layer, 7);

    let half = grid.step / 2.0;
    let mut out = document.entity_writer();
    let mut nodes = grid.mesh.nodes.iter().peekable();
    for (i, j, p) in grid.lattice.nodes() {
        let id = grid.lattice.id(i, j);
        let node = nodes.next_if(|n| n.id == id);
        if node.is_some() || style.label_undefined {
            out.text(
                &id.to_string(),
                Point::new(p.x + half, p.y + half),
                style.text_height,
                &style.text_style,
                &style.layer,
                style.label_color,
            );
        }
        if let Some(n) = node {
            out.point(Point3::new(n.x, n.y, n.z), &style.layer, style.point_color);
        }
    }
    drop(out);
    document.zoom_extents();
}

impl OutputSink for DxfAnnotationSink {
    fn name(&self) -> &str {
        "dxf"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn write(&mut self, grid: &SurfaceGrid) -> Result<()> {
        annotate(&mut self.document, grid, &self.style);
        self.document.write(&self.output)
    }
}

/// Writes the cell table.
pub struct CellTableSink {
    output: PathBuf,
    format: TableFormat,
}

impl CellTableSink {
    pub fn new(output: PathBuf, format: TableFormat) -> Self {
        Self { output, format }
    }
}

impl OutputSink for CellTableSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn write(&mut self, grid: &SurfaceGrid) -> Result<()> {
        write_cells_csv(&self.output, &grid.mesh.cells, &self.format)
    }
}

/// Triangulates the valid nodes and writes the surface. Fewer than three
/// valid nodes, or nodes on one line, give an empty surface file.
pub struct SurfaceSink {
    output: PathBuf,
    format: SurfaceFormat,
}

impl SurfaceSink {
    pub fn new(output: PathBuf, format: SurfaceFormat) -> Self {
        Self { output, format }
    }
}

impl OutputSink for SurfaceSink {
    fn name(&self) -> &str {
        "surface"
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn write(&mut self, grid: &SurfaceGrid) -> Result<()> {
        let points = grid
            .mesh
            .nodes
            .iter()
            .map(|n| Point3::new(n.x, n.y, n.z))
            .collect();
        let tin = match Tin::from_points(points) {
            Ok(tin) => tin,
            Err(Error::Interpolation(reason)) => {
                log::warn!("Writing an empty surface: {}", reason);
                Tin::default()
            }
            Err(e) => return Err(e),
        };
        write_tin(&self.output, &tin, self.format)?;
        log::info!(
            "Wrote {} surface with {} triangles to {}",
            self.format,
            tin.triangles.len(),
            self.output.display()
        );
        Ok(())
    }
}

/// Outcome of a single sink.
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: String,
    pub output: PathBuf,
    pub result: Result<()>,
}

/// Outcomes of all sinks, in the order they ran.
#[derive(Debug, Default)]
pub struct SinkReport {
    pub outcomes: Vec<SinkOutcome>,
}

impl SinkReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.sink.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.output.as_path())
    }
}

/// Runs every sink, logging and collecting failures instead of stopping.
pub fn run_sinks(sinks: &mut [Box<dyn OutputSink>], grid: &SurfaceGrid) -> SinkReport {
    let mut report = SinkReport::default();
    for sink in sinks.iter_mut() {
        log::info!("Saving {} to {}", sink.name(), sink.output().display());
        let result = sink.write(grid);
        if let Err(e) = &result {
            log::error!("{} output failed: {}", sink.name(), e);
        }
        report.outcomes.push(SinkOutcome {
            sink: sink.name().to_string(),
            output: sink.output().to_path_buf(),
            result,
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointSet;
    use crate::settings::EntityKind;

    fn grid() -> SurfaceGrid {
        let pts = PointSet::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(0.0, 6.0, 6.0),
        ])
        .unwrap();
        SurfaceGrid::build(&pts, 2.0).unwrap()
    }

    struct Failing;

    impl OutputSink for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn output(&self) -> &Path {
            Path::new("nowhere")
        }

        fn write(&mut self, _grid: &SurfaceGrid) -> Result<()> {
            Err(Error::InvalidParameter("no display".into()))
        }
    }

    #[test]
    fn annotation_labels_and_points() {
        let grid = grid();
        let mut doc = DxfDocument::new();
        annotate(&mut doc, &grid, &AnnotationStyle::default());
        let texts: Vec<_> = doc.entities().into_iter().filter(|e| e.kind() == "TEXT").collect();
        assert_eq!(texts.len(), grid.lattice.len());
        assert_eq!(texts[0].get(1), Some("1"));
        assert_eq!(texts[0].get(11), Some("1"));
        let points = doc.entity_points(EntityKind::Point, "PY").unwrap();
        assert_eq!(points.len(), grid.mesh.nodes.len());
        assert_eq!(points[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(doc.header_var("$PDMODE").unwrap()[0].value, "32");
        assert!(doc.has_table_entry("LAYER", "PY"));
    }

    #[test]
    fn undefined_nodes_can_stay_unlabelled() {
        let grid = grid();
        let style = AnnotationStyle {
            label_undefined: false,
            ..AnnotationStyle::default()
        };
        let mut doc = DxfDocument::new();
        annotate(&mut doc, &grid, &style);
        let labels: Vec<String> = doc
            .entities()
            .into_iter()
            .filter(|e| e.kind() == "TEXT")
            .filter_map(|e| e.get(1).map(str::to_string))
            .collect();
        let ids: Vec<String> = grid.mesh.nodes.iter().map(|n| n.id.to_string()).collect();
        assert_eq!(labels, ids);
        assert!(labels.len() < grid.lattice.len());
    }

    #[test]
    fn large_lattice_is_annotated_in_one_pass() {
        let pts = PointSet::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(400.0, 0.0, 0.0),
            Point3::new(0.0, 400.0, 40.0),
            Point3::new(400.0, 400.0, 40.0),
        ])
        .unwrap();
        let grid = SurfaceGrid::build(&pts, 2.0).unwrap();
        assert_eq!(grid.lattice.len(), 40_000);
        let mut doc = DxfDocument::new();
        let started = std::time::Instant::now();
        annotate(&mut doc, &grid, &AnnotationStyle::default());
        assert!(started.elapsed() < std::time::Duration::from_secs(20));
        assert_eq!(doc.entities().len(), 40_000 + grid.mesh.nodes.len());
        assert_eq!(doc.pairs().last().unwrap().value, "EOF");
    }

    #[test]
    fn too_few_nodes_give_an_empty_surface() {
        let pts = PointSet::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 3.0, 1.0),
            Point3::new(0.9, 6.0, 2.0),
        ])
        .unwrap();
        let grid = SurfaceGrid::build(&pts, 2.0).unwrap();
        assert!(grid.mesh.nodes.is_empty());
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("surface.xml");
        let mut sinks: Vec<Box<dyn OutputSink>> =
            vec![Box::new(SurfaceSink::new(xml.clone(), SurfaceFormat::LandXml))];
        let report = run_sinks(&mut sinks, &grid);
        assert!(report.is_success());
        let text = std::fs::read_to_string(&xml).unwrap();
        assert!(text.contains("<Pnts>"));
        assert!(!text.contains("<P "));
    }

    #[test]
    fn failing_sink_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("cells.csv");
        let mut sinks: Vec<Box<dyn OutputSink>> = vec![
            Box::new(Failing),
            Box::new(CellTableSink::new(csv.clone(), TableFormat::default())),
        ];
        let report = run_sinks(&mut sinks, &grid());
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.written().collect::<Vec<_>>(), vec![csv.as_path()]);
        let rows = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(rows.lines().count(), 4);
    }
}
