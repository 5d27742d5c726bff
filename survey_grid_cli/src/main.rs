use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use survey_grid::{
    io::{
        dxf::DxfDocument,
        load_input,
        nodes::{read_nodes_json, write_nodes_json, NodeArrays},
        require_file, sibling_path,
        surface::{write_surface, SurfaceFormat},
        LoadedInput,
    },
    settings::{EntityKind, Settings},
    sink::{run_sinks, CellTableSink, DxfAnnotationSink, OutputSink, SinkReport, SurfaceSink},
    Error, Result, SurfaceGrid,
};

/// Builds regular height grids from scattered survey points.
#[derive(Parser)]
#[command(name = "survey_grid_cli", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpolate a grid from a DXF or CSV point file and write the
    /// annotated drawing, the cell table and the surface.
    Grid {
        input: PathBuf,
        /// Layer holding the sample entities
        #[arg(long)]
        layer: Option<String>,
        /// Sample entity type: CIRCLE or POINT
        #[arg(long)]
        typ: Option<String>,
        /// Grid spacing in drawing units
        #[arg(long, allow_negative_numbers = true)]
        step: Option<f64>,
        /// JSON settings file; command line flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        no_dxf: bool,
        #[arg(long)]
        no_csv: bool,
        #[arg(long)]
        no_surface: bool,
        /// Surface export format: landxml or obj
        #[arg(long)]
        surface_format: Option<String>,
    },
    /// Extract node points from an annotated drawing into a JSON file.
    Nodes {
        input: PathBuf,
        #[arg(long, default_value = "PY")]
        layer: String,
        /// Defaults to the input name with a .json extension
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Triangulate a nodes JSON file and write the surface.
    Surface {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "landxml")]
        format: String,
    },
}

struct GridArgs {
    input: PathBuf,
    layer: Option<String>,
    typ: Option<String>,
    step: Option<f64>,
    config: Option<PathBuf>,
    no_dxf: bool,
    no_csv: bool,
    no_surface: bool,
    surface_format: Option<String>,
}

fn init_logging() {
    if let Ok(path) = std::env::var("SURVEY_GRID_LOG") {
        match File::create(&path) {
            Ok(file) => {
                env_logger::Builder::from_default_env()
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Failed to create log file {}: {}", path, e);
                env_logger::Builder::from_default_env().init();
            }
        }
    } else {
        env_logger::Builder::from_default_env().init();
    }
}

/// File settings with command line overrides applied, validated before any
/// input is read.
fn resolve_settings(args: &GridArgs) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => {
            require_file(path)?;
            Settings::load(path)?
        }
        None => Settings::default(),
    };
    if let Some(layer) = &args.layer {
        settings.layer = layer.clone();
    }
    if let Some(typ) = &args.typ {
        settings.entity = EntityKind::from_str(typ)?;
    }
    if let Some(step) = args.step {
        settings.step = step;
    }
    if let Some(format) = &args.surface_format {
        settings.surface = SurfaceFormat::from_str(format)?;
    }
    settings.validate()?;
    Ok(settings)
}

fn run_grid(args: GridArgs) -> Result<SinkReport> {
    let settings = resolve_settings(&args)?;
    let LoadedInput { points, drawing } =
        load_input(&args.input, settings.entity, &settings.layer)?;

    let grid = SurfaceGrid::build(&points, settings.step)?;

    let mut sinks: Vec<Box<dyn OutputSink>> = Vec::new();
    if !args.no_dxf {
        sinks.push(Box::new(DxfAnnotationSink::new(
            drawing.unwrap_or_default(),
            sibling_path(&args.input, "_output", "dxf"),
            settings.annotation.clone(),
        )));
    }
    if !args.no_csv {
        sinks.push(Box::new(CellTableSink::new(
            sibling_path(&args.input, "_output", "csv"),
            settings.table.clone(),
        )));
    }
    if !args.no_surface {
        sinks.push(Box::new(SurfaceSink::new(
            sibling_path(&args.input, "_output", settings.surface.extension()),
            settings.surface,
        )));
    }
    println!(
        "Grid {} x {}: {} cells, {} valid nodes",
        grid.lattice.n_x(),
        grid.lattice.n_y(),
        grid.mesh.cells.len(),
        grid.mesh.nodes.len()
    );
    Ok(run_sinks(&mut sinks, &grid))
}

fn run_nodes(input: &Path, layer: &str, output: Option<PathBuf>) -> Result<PathBuf> {
    require_file(input)?;
    let doc = DxfDocument::read(input)?;
    let points = doc.entity_points(EntityKind::Point, layer)?;
    if points.is_empty() {
        return Err(Error::NoData(format!(
            "no POINT entities on layer {layer:?} in {}",
            input.display()
        )));
    }
    let output = output.unwrap_or_else(|| sibling_path(input, "", "json"));
    write_nodes_json(&output, &NodeArrays::from_points(&points))?;
    println!("Saved {} nodes to {}", points.len(), output.display());
    Ok(output)
}

fn run_surface(input: &Path, output: &Path, format: &str) -> Result<()> {
    let format = SurfaceFormat::from_str(format)?;
    require_file(input)?;
    let points = read_nodes_json(input)?.to_points()?;
    let tin = write_surface(output, points, format)?;
    println!(
        "Wrote {} triangles to {}",
        tin.triangles.len(),
        output.display()
    );
    Ok(())
}

fn fail(e: &Error) -> ExitCode {
    eprintln!("Error: {}", e);
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Grid {
            input,
            layer,
            typ,
            step,
            config,
            no_dxf,
            no_csv,
            no_surface,
            surface_format,
        } => {
            let args = GridArgs {
                input,
                layer,
                typ,
                step,
                config,
                no_dxf,
                no_csv,
                no_surface,
                surface_format,
            };
            match run_grid(args) {
                Ok(report) => {
                    for path in report.written() {
                        println!("Wrote {}", path.display());
                    }
                    let mut status = ExitCode::SUCCESS;
                    for (sink, e) in report.failures() {
                        eprintln!("Error: {} output failed: {}", sink, e);
                        status = ExitCode::FAILURE;
                    }
                    status
                }
                Err(e) => fail(&e),
            }
        }
        Commands::Nodes {
            input,
            layer,
            output,
        } => match run_nodes(&input, &layer, output) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        },
        Commands::Surface {
            input,
            output,
            format,
        } => match run_surface(&input, &output, &format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        },
    }
}
