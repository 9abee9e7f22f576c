//! demflow CLI - hydrological terrain analysis from DEMs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use demflow_algorithms::hydrology::{
    build_directed, detect_sinks, downstream_path, fill_sinks, filter_threshold,
    flow_accumulation_mfd, nodes_from_grid, watershed, watershed_threshold, FillSinksParams,
    FlowRouting, MfdParams, ThresholdMode,
};
use demflow_algorithms::resample::{resample_average, resample_bilinear};
use demflow_core::io::{
    read_ascii_grid, read_geotiff, write_ascii_grid, write_geotiff, write_network_geojson,
    write_path_geojson,
};
use demflow_core::Grid;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "demflow")]
#[command(author, version, about = "Hydrological terrain analysis from DEMs", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file (.tif or .asc)
        input: PathBuf,
    },
    /// Detect sinks and write a 0/1 mask
    Sinks {
        /// Input DEM file
        input: PathBuf,
        /// Output mask file
        output: PathBuf,
        /// Neighbor connectivity: d4 or d8
        #[arg(short, long, default_value = "d8")]
        routing: String,
    },
    /// Fill sinks by iterative neighbor-mean raising
    FillSinks {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Neighbor connectivity: d4 or d8
        #[arg(short, long, default_value = "d8")]
        routing: String,
        /// Maximum number of raising passes
        #[arg(short, long, default_value = "100")]
        max_passes: usize,
    },
    /// Weighted MFD flow accumulation
    Accumulate {
        /// Input DEM file (ideally sink-filled)
        input: PathBuf,
        /// Output accumulation file
        output: PathBuf,
        /// Neighbor connectivity: d4 or d8
        #[arg(short, long, default_value = "d8")]
        routing: String,
        /// Flow dispersion exponent
        #[arg(short, long, default_value = "1.0")]
        exponent: f64,
    },
    /// Extract channel cells and export the drainage graph as GeoJSON
    Streams {
        /// Input accumulation file
        input: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        /// Accumulation threshold (world area units)
        #[arg(short, long)]
        threshold: f64,
    },
    /// Delineate the watershed of a pour point
    Watershed {
        /// Input DEM file (ideally sink-filled)
        input: PathBuf,
        /// Output masked-grid file
        output: PathBuf,
        /// Pour point row index
        #[arg(long)]
        row: usize,
        /// Pour point column index
        #[arg(long)]
        col: usize,
        /// Neighbor connectivity: d4 or d8
        #[arg(short, long, default_value = "d8")]
        routing: String,
        /// Grow across neighboring pour points until this many cells
        #[arg(short, long)]
        min_size: Option<usize>,
    },
    /// Trace the downstream path from a cell and export it as GeoJSON
    Trace {
        /// Input DEM file
        input: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        /// Start row index
        #[arg(long)]
        row: usize,
        /// Start column index
        #[arg(long)]
        col: usize,
        /// Neighbor connectivity: d4 or d8
        #[arg(short, long, default_value = "d8")]
        routing: String,
    },
    /// Resample a grid to new dimensions
    Resample {
        /// Input raster file
        input: PathBuf,
        /// Output raster file
        output: PathBuf,
        /// Target rows
        #[arg(long)]
        rows: usize,
        /// Target columns
        #[arg(long)]
        cols: usize,
        /// Method: bilinear or average
        #[arg(short, long, default_value = "bilinear")]
        method: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn parse_routing(s: &str) -> Result<FlowRouting> {
    match s.to_ascii_lowercase().as_str() {
        "d4" => Ok(FlowRouting::D4),
        "d8" => Ok(FlowRouting::D8),
        other => bail!("unknown routing {other:?}, expected d4 or d8"),
    }
}

fn read_raster(path: &Path) -> Result<Grid> {
    let grid = match path.extension().and_then(|e| e.to_str()) {
        Some("asc") | Some("txt") => {
            read_ascii_grid(path).with_context(|| format!("reading {}", path.display()))?
        }
        _ => read_geotiff(path, None).with_context(|| format!("reading {}", path.display()))?,
    };
    Ok(grid)
}

fn write_raster(grid: &Grid, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("asc") | Some("txt") => {
            write_ascii_grid(grid, path).with_context(|| format!("writing {}", path.display()))?
        }
        _ => write_geotiff(grid, path).with_context(|| format!("writing {}", path.display()))?,
    }
    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .expect("static template is valid"),
    );
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

// ─── Entry point ────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let start = Instant::now();

    match cli.command {
        Commands::Info { input } => {
            let grid = read_raster(&input)?;
            let stats = grid.statistics();
            let gt = grid.transform();
            println!("File:      {}", input.display());
            println!("Size:      {} x {} cells", grid.cols(), grid.rows());
            println!("Cell size: {} x {}", gt.cell_width, gt.cell_height);
            println!("Origin:    ({}, {})", gt.origin_x, gt.origin_y);
            println!(
                "Values:    min {:?}, max {:?}, mean {:?}",
                stats.min, stats.max, stats.mean
            );
            println!(
                "Cells:     {} valid, {} nodata",
                stats.valid_count, stats.nodata_count
            );
        }

        Commands::Sinks {
            input,
            output,
            routing,
        } => {
            let routing = parse_routing(&routing)?;
            let grid = read_raster(&input)?;
            info!("Input: {} x {}", grid.cols(), grid.rows());

            let mask = detect_sinks(&grid, routing);
            let count = mask
                .data()
                .iter()
                .filter(|v| !v.is_nan() && **v == 1.0)
                .count();
            info!("Found {count} sink cells");
            write_raster(&mask, &output)?;
        }

        Commands::FillSinks {
            input,
            output,
            routing,
            max_passes,
        } => {
            let routing = parse_routing(&routing)?;
            let grid = read_raster(&input)?;
            info!("Input: {} x {}", grid.cols(), grid.rows());

            let bar = spinner("filling sinks");
            let result = fill_sinks(
                &grid,
                FillSinksParams {
                    routing,
                    max_passes,
                },
            );
            bar.finish_and_clear();

            if result.converged {
                info!("Converged after {} passes", result.passes);
            } else {
                info!(
                    "Pass budget ({}) exhausted before convergence; output is best-effort",
                    result.passes
                );
            }
            write_raster(&result.grid, &output)?;
        }

        Commands::Accumulate {
            input,
            output,
            routing,
            exponent,
        } => {
            let routing = parse_routing(&routing)?;
            let grid = read_raster(&input)?;
            info!("Input: {} x {}", grid.cols(), grid.rows());

            let bar = spinner("accumulating flow");
            let acc = flow_accumulation_mfd(&grid, MfdParams { routing, exponent })?;
            bar.finish_and_clear();

            let stats = acc.statistics();
            info!(
                "Accumulation range: {:?} .. {:?}",
                stats.min, stats.max
            );
            write_raster(&acc, &output)?;
        }

        Commands::Streams {
            input,
            output,
            threshold,
        } => {
            let grid = read_raster(&input)?;
            let channels = filter_threshold(&grid, threshold, ThresholdMode::Greater);
            let nodes = nodes_from_grid(&channels);
            if nodes.is_empty() {
                bail!("no cells exceed threshold {threshold}");
            }
            info!("{} channel cells above threshold", nodes.len());

            let network = build_directed(nodes);
            info!(
                "Drainage graph: {} nodes, {} edges",
                network.node_count(),
                network.edge_count()
            );
            write_network_geojson(&network, &output)?;
        }

        Commands::Watershed {
            input,
            output,
            row,
            col,
            routing,
            min_size,
        } => {
            let routing = parse_routing(&routing)?;
            let grid = read_raster(&input)?;
            info!("Input: {} x {}", grid.cols(), grid.rows());

            let basin = match min_size {
                Some(min) => watershed_threshold(&grid, (row, col), min, routing)?,
                None => watershed(&grid, (row, col), routing)?,
            };
            info!("Watershed: {} contributing cells", basin.valid_count());
            write_raster(&basin, &output)?;
        }

        Commands::Trace {
            input,
            output,
            row,
            col,
            routing,
        } => {
            let routing = parse_routing(&routing)?;
            let grid = read_raster(&input)?;

            let path = downstream_path(&grid, (row, col), routing)?;
            if path.is_empty() {
                bail!("start cell ({row}, {col}) holds no data");
            }
            info!("Path: {} points", path.len());
            write_path_geojson(&path, &output)?;
        }

        Commands::Resample {
            input,
            output,
            rows,
            cols,
            method,
        } => {
            let grid = read_raster(&input)?;
            info!(
                "Resampling {} x {} -> {} x {}",
                grid.cols(),
                grid.rows(),
                cols,
                rows
            );

            let result = match method.to_ascii_lowercase().as_str() {
                "bilinear" => resample_bilinear(&grid, rows, cols)?,
                "average" => resample_average(&grid, rows, cols)?,
                other => bail!("unknown method {other:?}, expected bilinear or average"),
            };
            write_raster(&result, &output)?;
        }
    }

    info!("Done in {:.2?}", start.elapsed());
    Ok(())
}
