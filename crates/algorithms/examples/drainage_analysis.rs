//! Drainage analysis demo: full network pipeline on a synthetic watershed
//!
//! Builds a herringbone basin (every column drains south into a mainstem
//! along the bottom row, which drains east off the grid), carves an
//! unmasked lake into it, and runs the whole pipeline:
//!   1. outlets            — where flow leaves the mask
//!   2. flow distance      — cells to the outlet, per cell
//!   3. headwaters         — channel starts
//!   4. Strahler order     — branching classification
//!   5. contributing area  — upstream cells, per cell
//!
//! Finishes with a small ASCII rendering of the order map.
//!
//! Run:
//!   cargo run -p thalweg-algorithms --example drainage_analysis

use thalweg_algorithms::network::{
    find_headwaters, find_outlets, map_contributing_area, map_flow_distance, map_strahler_order,
    FlowGrid,
};
use thalweg_core::{Raster, RasterElement};

const ROWS: usize = 12;
const COLS: usize = 20;

fn main() {
    // --- 1. Build the watershed ---
    let (mask, dirs) = build_watershed();
    let grid = FlowGrid::from_rasters(&mask, &dirs).expect("watershed should validate");
    println!(
        "Watershed: {}x{}, {} masked cells",
        COLS,
        ROWS,
        grid.masked_cells()
    );

    // --- 2. Outlets ---
    let outlets = find_outlets(&grid).expect("outlet pass failed");
    println!("\nOutlets: {}", outlets.statistics().valid_count);

    // --- 3. Flow distance ---
    let distance = map_flow_distance(&grid).expect("flow distance failed");
    print_stats("flow distance", &distance);

    // --- 4. Headwaters ---
    let heads = find_headwaters(&grid, &distance).expect("headwater pass failed");
    println!("Headwaters: {}", heads.statistics().valid_count);

    // --- 5. Strahler order ---
    let orders = map_strahler_order(&grid, &distance).expect("stream order failed");
    print_stats("Strahler order", &orders);

    // --- 6. Contributing area ---
    let areas = map_contributing_area(&grid, &distance).expect("contributing area failed");
    print_stats("contributing area", &areas);

    // --- 7. Render the order map ---
    println!("\nStream orders ('.' = outside the mask):");
    for row in 0..ROWS {
        let line: String = (0..COLS)
            .map(|col| match orders.get(row, col).unwrap() {
                0 => '.',
                n => char::from_digit(n % 10, 10).unwrap(),
            })
            .collect();
        println!("  {}", line);
    }
}

/// Herringbone basin with a 3x4 unmasked lake. Cells draining into the
/// lake become interior outlets of their own small basins.
fn build_watershed() -> (Raster<u8>, Raster<u8>) {
    let mut mask: Raster<u8> = Raster::filled(ROWS, COLS, 1);
    let mut dirs: Raster<u8> = Raster::new(ROWS, COLS);

    for row in 0..ROWS {
        for col in 0..COLS {
            // South everywhere, East along the mainstem.
            let code = if row + 1 == ROWS { 2 } else { 3 };
            dirs.set(row, col, code).unwrap();
        }
    }

    // The lake.
    for row in 3..6 {
        for col in 8..12 {
            mask.set(row, col, 0).unwrap();
        }
    }

    (mask, dirs)
}

fn print_stats<T: RasterElement>(name: &str, raster: &Raster<T>) {
    let stats = raster.statistics();
    println!(
        "{}: min {:?}, max {:?}, mean {:.2}",
        name,
        stats.min.unwrap(),
        stats.max.unwrap(),
        stats.mean.unwrap_or(0.0)
    );
}
