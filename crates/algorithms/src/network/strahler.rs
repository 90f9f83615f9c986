//! Strahler stream order
//!
//! Classifies the drainage network by branching complexity. Headwater
//! channels are order 1; where two streams of equal order meet, the order
//! steps up by one; where unequal streams meet, the larger order carries
//! through. A basin's highest order at the outlet summarizes how nested
//! its tributary structure is.
//!
//! Orders are resolved by advancing a valued frontier downstream from the
//! headwaters. A confluence is merged only once every tributary has
//! arrived, so each cell receives its final order exactly once, no matter
//! how unequal the tributary path lengths are.
//!
//! Reference: Strahler, A.N. (1957): "Quantitative analysis of watershed
//! geomorphology", Transactions of the American Geophysical Union 38(6),
//! 913-920.

use thalweg_core::{Algorithm, Error, Raster, Result};

use super::grid::FlowGrid;
use super::headwaters::headwater_mask;
use super::trace::accumulate;

/// Strahler merge rule for the tributary orders converging on one cell.
///
/// The unique maximum carries through; a tie at the maximum steps the
/// order up by one, whether two or three streams tie.
fn merge_orders(tributaries: [Option<u32>; 4]) -> u32 {
    let mut max = 0u32;
    let mut at_max = 0u32;
    for order in tributaries.into_iter().flatten() {
        if order > max {
            max = order;
            at_max = 1;
        } else if order == max {
            at_max += 1;
        }
    }
    if at_max > 1 {
        max + 1
    } else {
        max
    }
}

/// Map the Strahler stream order of every masked cell.
///
/// # Arguments
/// * `grid` - Validated mask plus flow directions
/// * `flow_distance` - Distance map from `map_flow_distance`
///
/// # Returns
/// Raster<u32> of stream orders, 1 at headwaters; 0 outside the mask
/// (nodata 0)
///
/// # Errors
/// * `Error::SizeMismatch` if the distance map differs in shape
/// * `Error::CycleDetected` if the frontier stalls or some masked cell
///   never receives an order
pub fn map_strahler_order(grid: &FlowGrid, flow_distance: &Raster<u32>) -> Result<Raster<u32>> {
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
    let (orders, rounds) = accumulate(grid, &heads, 1u32, merge_orders)?;

    let resolved = orders.iter().filter(|v| v.is_some()).count();
    if resolved < grid.masked_cells() {
        // Every masked cell lies below some headwater unless the
        // directions loop or the distance map is partial.
        return Err(Error::CycleDetected { iterations: rounds });
    }

    let mut output: Raster<u32> = flow_distance.with_same_shape();
    output.set_nodata(Some(0));
    *output.data_mut() = orders.mapv(|v| v.unwrap_or(0));
    Ok(output)
}

/// Strahler stream-order algorithm
#[derive(Debug, Clone, Default)]
pub struct StrahlerOrder;

impl Algorithm for StrahlerOrder {
    type Input = FlowGrid;
    type Output = Raster<u32>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Strahler Stream Order"
    }

    fn description(&self) -> &'static str {
        "Classifies every watershed cell by Strahler stream order"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let distance = super::flow_distance::map_flow_distance(&input)?;
        map_strahler_order(&input, &distance)
    }
}
