//! Thalweg CLI - Drainage-network analysis on synthetic watersheds

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use thalweg_algorithms::network::{
    find_headwaters, find_outlets, map_contributing_area, map_flow_distance, map_strahler_order,
    FlowGrid,
};
use thalweg_core::{Raster, RasterElement};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "thalweg")]
#[command(author, version, about = "Drainage-network analysis on synthetic watersheds", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: outlets, distance, headwaters, order, area
    Analyze {
        #[command(flatten)]
        watershed: WatershedArgs,
    },
    /// Map the flow distance from every cell to its outlet
    Distance {
        #[command(flatten)]
        watershed: WatershedArgs,
    },
    /// Map the Strahler stream order of every cell
    Order {
        #[command(flatten)]
        watershed: WatershedArgs,
    },
    /// Map the upstream contributing area of every cell
    Area {
        #[command(flatten)]
        watershed: WatershedArgs,
    },
}

/// Shape of the generated test watershed
#[derive(Args)]
struct WatershedArgs {
    /// Grid rows
    #[arg(short, long, default_value = "64")]
    rows: usize,

    /// Grid columns
    #[arg(short, long, default_value = "96")]
    cols: usize,

    /// Carve an unmasked lake to split off interior basins
    #[arg(short, long)]
    lake: bool,

    /// Print the result grid as ASCII (small grids only)
    #[arg(short, long)]
    ascii: bool,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Herringbone watershed: every column drains south into a mainstem along
/// the bottom row, which drains east off the grid. With `lake`, a hole in
/// the middle splits off interior basins draining into the lake.
fn build_watershed(args: &WatershedArgs) -> Result<FlowGrid> {
    if args.rows < 2 || args.cols < 2 {
        bail!("Watershed needs at least 2x2 cells, got {}x{}", args.rows, args.cols);
    }

    let mut mask: Raster<u8> = Raster::filled(args.rows, args.cols, 1);
    let mut dirs: Raster<u8> = Raster::new(args.rows, args.cols);

    for row in 0..args.rows {
        for col in 0..args.cols {
            // South everywhere, East along the mainstem.
            let code = if row + 1 == args.rows { 2 } else { 3 };
            dirs.set(row, col, code)?;
        }
    }

    if args.lake {
        for row in args.rows / 4..args.rows / 2 {
            for col in args.cols / 3..2 * args.cols / 3 {
                mask.set(row, col, 0)?;
            }
        }
    }

    let pb = spinner("Validating watershed...");
    let grid = FlowGrid::from_rasters(&mask, &dirs).context("Failed to validate watershed")?;
    pb.finish_and_clear();
    info!(
        "Watershed: {} x {}, {} masked cells",
        args.cols,
        args.rows,
        grid.masked_cells()
    );
    Ok(grid)
}

fn print_stats<T: RasterElement>(name: &str, raster: &Raster<T>) {
    let stats = raster.statistics();
    println!("\n{} statistics:", name);
    if let Some(min) = stats.min {
        println!("  Min: {:?}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:?}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.3}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len() as f64
    );
}

fn print_ascii<T: RasterElement>(raster: &Raster<T>) {
    let (rows, cols) = raster.shape();
    if rows > 64 || cols > 96 {
        println!("(grid too large for ASCII output, limit is 64x96)");
        return;
    }
    for row in 0..rows {
        let line: String = (0..cols)
            .map(|col| {
                let value = unsafe { raster.get_unchecked(row, col) };
                match value.to_f64().unwrap_or(0.0) as u64 {
                    0 => '.',
                    n if n < 10 => char::from_digit((n % 10) as u32, 10).unwrap(),
                    _ => '#',
                }
            })
            .collect();
        println!("  {}", line);
    }
}

fn done(name: &str, elapsed: std::time::Duration) {
    println!("{} finished in {:.2?}", name, elapsed);
}

// ─── Entry point ────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Analyze { watershed } => {
            let grid = build_watershed(&watershed)?;

            let start = Instant::now();
            let outlets = find_outlets(&grid).context("Failed to locate outlets")?;
            let distance = map_flow_distance(&grid).context("Failed to map flow distance")?;
            let heads =
                find_headwaters(&grid, &distance).context("Failed to locate headwaters")?;
            let orders =
                map_strahler_order(&grid, &distance).context("Failed to map stream order")?;
            let areas = map_contributing_area(&grid, &distance)
                .context("Failed to map contributing area")?;
            let elapsed = start.elapsed();

            println!("Outlets: {}", outlets.statistics().valid_count);
            println!("Headwaters: {}", heads.statistics().valid_count);
            print_stats("Flow distance", &distance);
            print_stats("Strahler order", &orders);
            print_stats("Contributing area", &areas);
            if watershed.ascii {
                println!("\nStream orders ('.' = outside the mask):");
                print_ascii(&orders);
            }
            done("Analysis", elapsed);
        }

        Commands::Distance { watershed } => {
            let grid = build_watershed(&watershed)?;
            let start = Instant::now();
            let distance = map_flow_distance(&grid).context("Failed to map flow distance")?;
            let elapsed = start.elapsed();

            print_stats("Flow distance", &distance);
            if watershed.ascii {
                print_ascii(&distance);
            }
            done("Flow distance", elapsed);
        }

        Commands::Order { watershed } => {
            let grid = build_watershed(&watershed)?;
            let start = Instant::now();
            let distance = map_flow_distance(&grid).context("Failed to map flow distance")?;
            let orders =
                map_strahler_order(&grid, &distance).context("Failed to map stream order")?;
            let elapsed = start.elapsed();

            print_stats("Strahler order", &orders);
            if watershed.ascii {
                print_ascii(&orders);
            }
            done("Stream order", elapsed);
        }

        Commands::Area { watershed } => {
            let grid = build_watershed(&watershed)?;
            let start = Instant::now();
            let distance = map_flow_distance(&grid).context("Failed to map flow distance")?;
            let areas = map_contributing_area(&grid, &distance)
                .context("Failed to map contributing area")?;
            let elapsed = start.elapsed();

            print_stats("Contributing area", &areas);
            if watershed.ascii {
                print_ascii(&areas);
            }
            done("Contributing area", elapsed);
        }
    }

    Ok(())
}
