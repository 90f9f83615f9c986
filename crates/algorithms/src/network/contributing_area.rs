//! Contributing area
//!
//! Counts, for every masked cell, the cells whose flow eventually passes
//! through it, the cell itself included. Headwaters count 1; the outlet
//! accumulates its whole basin. Expressed in cell counts rather than
//! square meters so the result is exact and grid-resolution agnostic.
//!
//! Uses the same deferred-confluence frontier as the Strahler pass: each
//! cell is summed exactly once, when all of its tributaries have arrived.
//!
//! Reference: O'Callaghan, J.F., Mark, D.M. (1984): "The extraction of
//! drainage networks from digital elevation data", Computer Vision,
//! Graphics, and Image Processing 28(3), 323-344.

use thalweg_core::{Algorithm, Error, Raster, Result};

use super::grid::FlowGrid;
use super::headwaters::headwater_mask;
use super::trace::accumulate;

/// Contributing-area merge: tributary counts plus the cell itself.
fn merge_areas(tributaries: [Option<u64>; 4]) -> u64 {
    tributaries.into_iter().flatten().sum::<u64>() + 1
}

/// Map the upstream contributing area of every masked cell, in cells.
///
/// # Arguments
/// * `grid` - Validated mask plus flow directions
/// * `flow_distance` - Distance map from `map_flow_distance`
///
/// # Returns
/// Raster<u64> of upstream cell counts, 1 at headwaters; 0 outside the
/// mask (nodata 0)
///
/// # Errors
/// * `Error::SizeMismatch` if the distance map differs in shape
/// * `Error::CycleDetected` if the frontier stalls or some masked cell
///   never receives a count
pub fn map_contributing_area(grid: &FlowGrid, flow_distance: &Raster<u32>) -> Result<Raster<u64>> {
    let (rows, cols) = grid.shape();
    if flow_distance.shape() != (rows, cols) {
        let (ar, ac) = flow_distance.shape();
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar,
            ac,
        });
    }

    let heads = headwater_mask(grid, flow_distance.data())?;
    let (areas, rounds) = accumulate(grid, &heads, 1u64, merge_areas)?;

    let resolved = areas.iter().filter(|v| v.is_some()).count();
    if resolved < grid.masked_cells() {
        return Err(Error::CycleDetected { iterations: rounds });
    }

    let mut output: Raster<u64> = flow_distance.with_same_shape();
    output.set_nodata(Some(0));
    *output.data_mut() = areas.mapv(|v| v.unwrap_or(0));
    Ok(output)
}

/// Contributing-area algorithm
#[derive(Debug, Clone, Default)]
pub struct ContributingArea;

impl Algorithm for ContributingArea {
    type Input = FlowGrid;
    type Output = Raster<u64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Contributing Area"
    }

    fn description(&self) -> &'static str {
        "Counts the upstream cells draining through every watershed cell"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let distance = super::flow_distance::map_flow_distance(&input)?;
        map_contributing_area(&input, &distance)
    }
}
