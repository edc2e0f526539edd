//! Vignette command-line host.
//!
//! Loads a diagram snapshot from JSON, renders it into the in-memory scene
//! graph and writes the result as SVG or as a JSON scene dump.

use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use vignette_core::Diagram;
use vignette_core::stencil::DirectoryStencils;
use vignette_render::{DiagramView, SceneGraph, ViewConfig, ViewError};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the diagram snapshot (JSON)
    pub input: PathBuf,

    /// Output file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,

    /// Directory holding `<diagram-type>.json` stencil documents
    #[arg(long)]
    pub stencils: Option<PathBuf>,

    /// View configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Svg,
    Json,
}

/// Host errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Render error: {0}")]
    Render(#[from] ViewError),
}

/// Render the input described by `args` and return the output document.
pub fn render(args: &Args) -> Result<String, AppError> {
    let diagram = Diagram::from_json(&fs::read_to_string(&args.input)?)?;
    let config = match &args.config {
        Some(path) => ViewConfig::from_json(&fs::read_to_string(path)?)?,
        None => ViewConfig::default(),
    };

    let mut view = DiagramView::new(SceneGraph::new(), config);
    if let Some(dir) = &args.stencils {
        view = view.with_stencil_provider(Box::new(DirectoryStencils::new(dir)));
    }
    view.render(&diagram)?;
    view.fit_to_content()?;
    log::info!(
        "Rendered {} elements into {} cells",
        diagram.elements.len(),
        view.surface().len()
    );

    let output = match args.format {
        OutputFormat::Svg => vignette_render::to_svg_string(view.surface()),
        OutputFormat::Json => serde_json::to_string_pretty(&view.surface().snapshot())?,
    };
    Ok(output)
}

/// Render and write the output.
pub fn run(args: &Args) -> Result<(), AppError> {
    let output = render(args)?;
    match &args.output {
        Some(path) => {
            fs::write(path, output)?;
            log::info!("Wrote {}", path.display());
        }
        None => io::stdout().write_all(output.as_bytes())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use vignette_core::stencil::{Stencil, StencilSet};
    use vignette_core::{ConnectionAttributes, ShapeAttributes};

    fn diagram() -> Diagram {
        Diagram::new("generic")
            .with(ShapeAttributes::new(1, "Rectangle", Rect::new(0.0, 0.0, 100.0, 50.0)).with_label("Order"))
            .with(ShapeAttributes::new(2, "Router", Rect::new(200.0, 0.0, 240.0, 40.0)))
            .with(ConnectionAttributes::new(3, Some(1), Some(2)))
    }

    fn write_diagram(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("diagram.json");
        fs::write(&path, diagram().to_json().unwrap()).unwrap();
        path
    }

    fn args(input: PathBuf) -> Args {
        Args {
            input,
            output: None,
            format: OutputFormat::Svg,
            stencils: None,
            config: None,
        }
    }

    #[test]
    fn test_parse_arguments() {
        let args = Args::parse_from(["vignette", "in.json", "-o", "out.svg", "--format", "json", "--stencils", "st"]);
        assert_eq!(args.input, PathBuf::from("in.json"));
        assert_eq!(args.output, Some(PathBuf::from("out.svg")));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.stencils, Some(PathBuf::from("st")));
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_run_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.svg");
        let args = Args {
            output: Some(output.clone()),
            ..args(write_diagram(dir.path()))
        };
        run(&args).unwrap();

        let svg = fs::read_to_string(output).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Order"));
    }

    #[test]
    fn test_json_dump_uses_stencils_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let stencil_dir = dir.path().join("stencils");
        DirectoryStencils::new(&stencil_dir)
            .save(
                "generic",
                &StencilSet::new().with(Stencil::new("Router").with_shape("mxgraph.cisco.router")),
            )
            .unwrap();
        let config = dir.path().join("view.json");
        fs::write(&config, r#"{"includeRoot": true}"#).unwrap();

        let args = Args {
            format: OutputFormat::Json,
            stencils: Some(stencil_dir),
            config: Some(config),
            ..args(write_diagram(dir.path()))
        };
        let dump: serde_json::Value = serde_json::from_str(&render(&args).unwrap()).unwrap();
        let cells = dump["cells"].as_array().unwrap();
        // Layer, two shapes and one edge.
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0]["style"], "layer;selectable=0");
        assert!(cells[2]["style"].as_str().unwrap().contains("shape=mxgraph.cisco.router"));
        assert_eq!(cells[3]["kind"], "edge");
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = render(&args(dir.path().join("missing.json")));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_malformed_input_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(render(&args(path)), Err(AppError::Json(_))));
    }
}
