use assert_fs::prelude::*;
use predicates::prelude::*;
use survey_grid::{
    io::{
        dxf::DxfDocument,
        load_points,
        nodes::{read_nodes_json, write_nodes_json, NodeArrays},
        sibling_path,
    },
    settings::{EntityKind, Settings},
    sink::{run_sinks, CellTableSink, DxfAnnotationSink, OutputSink, SurfaceSink},
    Error, SurfaceGrid,
};

/// R2000 drawing with handles, sample circles on `TOPO` and one circle in
/// paper space that must be ignored.
const DRAWING: &str = "  0
SECTION
  2
HEADER
  9
$ACADVER
  1
AC1015
  9
$HANDSEED
  5
40
  0
ENDSEC
  0
SECTION
  2
TABLES
  0
TABLE
  2
LAYER
  5
2
 70
1
  0
LAYER
  5
10
  2
TOPO
 70
0
 62
3
  6
CONTINUOUS
  0
ENDTAB
  0
ENDSEC
  0
SECTION
  2
ENTITIES
  0
CIRCLE
  5
20
  8
TOPO
 10
10.0
 20
20.0
 30
100.0
 40
0.3
  0
CIRCLE
  5
21
  8
topo
 10
16.0
 20
20.0
 30
103.0
 40
0.3
  0
CIRCLE
  5
22
  8
TOPO
 10
10.0
 20
26.0
 30
106.0
 40
0.3
  0
CIRCLE
  5
23
  8
TOPO
 10
16.0
 20
26.0
 30
109.0
 40
0.3
  0
CIRCLE
  5
24
  8
TOPO
 67
1
 10
500.0
 20
500.0
 30
0.0
 40
0.3
  0
ENDSEC
  0
EOF
";

#[test]
fn selection_ignores_other_layers_and_paper_space() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = dir.child("topo.dxf");
    input.write_str(DRAWING).unwrap();

    let pts = load_points(input.path(), EntityKind::Circle, "TOPO").unwrap();
    assert_eq!(pts.len(), 4);
    let b = pts.bounds();
    assert_eq!((b.min.x, b.min.y, b.max.x, b.max.y), (10.0, 20.0, 16.0, 26.0));

    let err = load_points(input.path(), EntityKind::Point, "TOPO").unwrap_err();
    assert!(matches!(err, Error::NoData(_)));
}

#[test]
fn annotated_drawing_round_trips_through_nodes_json() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = dir.child("topo.dxf");
    input.write_str(DRAWING).unwrap();

    let settings = Settings {
        layer: "TOPO".into(),
        ..Settings::default()
    };
    let pts = load_points(input.path(), settings.entity, &settings.layer).unwrap();
    let grid = SurfaceGrid::build(&pts, settings.step).unwrap();
    // extent 6 at step 2 gives 3 nodes per axis
    assert_eq!((grid.lattice.n_x(), grid.lattice.n_y()), (3, 3));
    assert_eq!(grid.mesh.cells.len(), 4);
    assert_eq!(grid.mesh.nodes.len(), 9);

    let drawing = DxfDocument::read(input.path()).unwrap();
    let dxf_out = sibling_path(input.path(), "_output", "dxf");
    let csv_out = sibling_path(input.path(), "_output", "csv");
    let xml_out = sibling_path(input.path(), "_output", "xml");
    let mut sinks: Vec<Box<dyn OutputSink>> = vec![
        Box::new(DxfAnnotationSink::new(
            drawing,
            dxf_out.clone(),
            settings.annotation.clone(),
        )),
        Box::new(CellTableSink::new(csv_out.clone(), settings.table.clone())),
        Box::new(SurfaceSink::new(xml_out.clone(), settings.surface)),
    ];
    let report = run_sinks(&mut sinks, &grid);
    assert!(report.is_success());
    assert_eq!(report.written().count(), 3);

    dir.child("topo_output.csv").assert(predicate::function(|s: &str| {
        s.lines().count() == 4 && s.starts_with("1;  100.0000;")
    }));

    let annotated = DxfDocument::read(&dxf_out).unwrap();
    assert_eq!(annotated.version(), "AC1015");
    // original samples survive next to the new points
    assert_eq!(
        annotated.entity_points(EntityKind::Circle, "TOPO").unwrap().len(),
        4
    );
    assert!(annotated.has_table_entry("LAYER", "PY"));
    assert!(annotated.has_table_entry("STYLE", "myStandard"));
    let seed = annotated.header_var("$HANDSEED").unwrap()[0].value.clone();
    assert!(u64::from_str_radix(&seed, 16).unwrap() > 0x40);

    let nodes = annotated.entity_points(EntityKind::Point, "PY").unwrap();
    assert_eq!(nodes.len(), grid.mesh.nodes.len());
    for (p, n) in nodes.iter().zip(&grid.mesh.nodes) {
        assert!((p.x - n.x).abs() < 1e-9 && (p.y - n.y).abs() < 1e-9);
        assert!((p.z - n.z).abs() < 1e-6);
    }

    let json = dir.child("topo_output.json");
    write_nodes_json(json.path(), &NodeArrays::from_points(&nodes)).unwrap();
    let back = read_nodes_json(json.path()).unwrap();
    assert_eq!(back.len(), 9);
    assert_eq!(back, NodeArrays::from_nodes(&grid.mesh.nodes));

    let xml = std::fs::read_to_string(&xml_out).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let pnts = doc.descendants().filter(|n| n.has_tag_name("P")).count();
    assert_eq!(pnts, 9);
    assert!(doc.descendants().any(|n| n.has_tag_name("F")));
}

#[test]
fn missing_coordinate_is_a_dimension_error() {
    let text = DRAWING.replacen(" 20\n20.0\n", "", 1);
    let dir = assert_fs::TempDir::new().unwrap();
    let input = dir.child("broken.dxf");
    input.write_str(&text).unwrap();
    let err = load_points(input.path(), EntityKind::Circle, "TOPO").unwrap_err();
    assert!(matches!(err, Error::Dimension(_)));
}
