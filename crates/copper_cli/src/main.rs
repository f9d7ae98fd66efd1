//! Copper CLI
//!
//! Plot board layers to a call trace or render them to PNG.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use copper_plot::{plot_standard_layers, Board, Layer, LayerSet, RecordingPlotter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod preview;

use config::CopperConfig;

#[derive(Parser)]
#[command(name = "copper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Copper board plotter", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./copper.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot layers into a JSON trace of plotter calls
    Plot {
        /// Board snapshot (JSON)
        board: PathBuf,

        /// Layers to plot (e.g. F.Cu, Edge.Cuts); all layers when omitted
        #[arg(short, long = "layer")]
        layers: Vec<String>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rasterize layers to a PNG image
    Render {
        /// Board snapshot (JSON)
        board: PathBuf,

        /// Layers to render; all layers when omitted
        #[arg(short, long = "layer")]
        layers: Vec<String>,

        /// Output image
        #[arg(short, long, default_value = "board.png")]
        output: PathBuf,
    },

    /// Write a default copper.toml to the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// List the layer table
    Layers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Plot {
            board,
            layers,
            output,
        } => cmd_plot(cli.config.as_deref(), &board, &layers, output.as_deref()),

        Commands::Render {
            board,
            layers,
            output,
        } => cmd_render(cli.config.as_deref(), &board, &layers, &output),

        Commands::Init { force } => cmd_init(force),

        Commands::Layers => cmd_layers(),
    }
}

fn load_board(path: &Path) -> Result<Board> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let board =
        Board::from_json(&content).with_context(|| format!("Failed to load {}", path.display()))?;

    info!(
        "Loaded {}: {} footprints, {} tracks, {} zones",
        path.display(),
        board.footprints.len(),
        board.tracks.len(),
        board.zones.len()
    );

    Ok(board)
}

/// Union of the named layers, or every layer when none is named
fn layer_mask(names: &[String]) -> Result<LayerSet> {
    if names.is_empty() {
        return Ok(Layer::all().collect());
    }

    names
        .iter()
        .map(|name| {
            name.parse::<Layer>()
                .with_context(|| format!("Invalid layer '{}'", name))
        })
        .collect()
}

fn cmd_plot(
    config: Option<&Path>,
    board: &Path,
    layers: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let config = CopperConfig::load(config)?;
    let board = load_board(board)?;
    let mask = layer_mask(layers)?;

    let mut plotter = RecordingPlotter::new();
    plot_standard_layers(&board, &mut plotter, &config.plot, mask);
    let calls = plotter.into_calls();

    let json = serde_json::to_string_pretty(&calls).context("Failed to serialize plot")?;

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} plot calls to {}", calls.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn cmd_render(config: Option<&Path>, board: &Path, layers: &[String], output: &Path) -> Result<()> {
    let config = CopperConfig::load(config)?;
    let board = load_board(board)?;
    let mask = layer_mask(layers)?;

    let image = preview::render(&board, &config, mask)?;
    preview::save_png(&image, output)?;

    info!(
        "Rendered {} layers to {} ({}x{})",
        mask.len(),
        output.display(),
        image.width(),
        image.height()
    );

    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!("{} already exists. Use --force to overwrite.", path.display());
    }

    let content = CopperConfig::default().to_toml()?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());

    Ok(())
}

fn cmd_layers() -> Result<()> {
    for layer in Layer::all() {
        let kind = if layer.is_copper() {
            "copper"
        } else if LayerSet::all_board_tech().contains(layer) {
            "technical"
        } else {
            "user"
        };
        println!("{:>2}  {:<10} {}", layer.index(), layer.name(), kind);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_mask_from_names() {
        let mask = layer_mask(&["F.Cu".to_string(), "Edge.Cuts".to_string()]).unwrap();
        assert_eq!(mask.len(), 2);
        assert!(mask.contains(Layer::EDGE_CUTS));

        assert_eq!(layer_mask(&[]).unwrap().len(), 50);
        assert!(layer_mask(&["Top".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from([
            "copper", "-v", "render", "board.json", "-l", "F.Cu", "-l", "B.Cu", "-o", "out.png",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Render {
                board,
                layers,
                output,
            } => {
                assert_eq!(board, PathBuf::from("board.json"));
                assert_eq!(layers, vec!["F.Cu", "B.Cu"]);
                assert_eq!(output, PathBuf::from("out.png"));
            }
            _ => panic!("expected render"),
        }
    }
}
