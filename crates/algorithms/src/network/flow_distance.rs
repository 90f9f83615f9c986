//! Flow distance to the outlet
//!
//! Assigns every masked cell the number of cells on its flow path to the
//! watershed outlet, counting both ends: outlets are 1, their immediate
//! contributors 2, and so on upstream. The map is resolved as a
//! level-synchronous sweep: all cells at distance d are found in round d
//! by backtracing the cells found in round d - 1.
//!
//! With several outlets each cell ends up with the distance to its own
//! basin's outlet, since the sweep reaches it along its unique
//! downstream path.

use ndarray::Array2;
use thalweg_core::{Algorithm, Error, Raster, Result};

use super::grid::FlowGrid;
use super::outlets::outlet_mask;
use super::trace::backtrace_mask;

/// Map the topological flow distance from every masked cell to its outlet.
///
/// # Arguments
/// * `grid` - Validated mask plus flow directions
///
/// # Returns
/// Raster<u32> of path lengths in cells, outlet = 1; 0 outside the
/// mask (nodata 0)
///
/// # Errors
/// * `Error::NoOutlet` if no masked cell drains off the mask
/// * `Error::CycleDetected` if the sweep cannot reach every masked cell,
///   which means some directions form a loop
pub fn map_flow_distance(grid: &FlowGrid) -> Result<Raster<u32>> {
    let seeds = outlet_mask(grid)?;
    let (distance, visited, rounds) = sweep_upstream(grid, &seeds)?;

    if visited < grid.masked_cells() {
        // Cells a cycle cuts off from the outlet are never reached.
        return Err(Error::CycleDetected { iterations: rounds });
    }

    Ok(distance_raster(distance))
}

/// Map flow distance to a caller-chosen seed set instead of the outlets.
///
/// Used to measure drainage paths toward arbitrary targets, for example
/// tracing how far burned cells sit above a reservoir intake. Seeds
/// outside the mask are ignored. Masked cells whose flow path never meets
/// a seed keep 0; that is expected, so reaching every cell is not
/// enforced here.
///
/// # Arguments
/// * `grid` - Validated mask plus flow directions
/// * `seeds` - Non-zero cells to measure from, same shape as the grid
///
/// # Errors
/// * `Error::SizeMismatch` if `seeds` differs from the grid in shape
/// * `Error::NoOutlet` if no seed lands on a masked cell
pub fn flow_distance_from(grid: &FlowGrid, seeds: &Raster<u8>) -> Result<Raster<u32>> {
    let (rows, cols) = grid.shape();
    if seeds.shape() != (rows, cols) {
        let (ar, ac) = seeds.shape();
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar,
            ac,
        });
    }

    let mut members = Array2::from_elem((rows, cols), false);
    for ((row, col), &value) in seeds.data().indexed_iter() {
        if value != 0 && grid.is_inside(row, col) {
            members[(row, col)] = true;
        }
    }

    let (distance, _visited, _rounds) = sweep_upstream(grid, &members)?;
    Ok(distance_raster(distance))
}

/// Level-synchronous upstream sweep. Round d marks the cells at distance
/// d; a cell already carrying a distance is never re-marked, so the first
/// visit wins. Returns the distances, the number of cells reached, and
/// the number of rounds run.
fn sweep_upstream(grid: &FlowGrid, seeds: &Array2<bool>) -> Result<(Array2<u32>, usize, usize)> {
    let (rows, cols) = grid.shape();
    let mut distance = Array2::<u32>::zeros((rows, cols));
    let mut frontier = Array2::from_elem((rows, cols), false);
    let mut visited = 0usize;

    for ((row, col), &seed) in seeds.indexed_iter() {
        if seed {
            distance[(row, col)] = 1;
            frontier[(row, col)] = true;
            visited += 1;
        }
    }
    if visited == 0 {
        return Err(Error::NoOutlet);
    }

    let max_rounds = grid.masked_cells() + 1; // absolute safety limit
    let mut depth: u32 = 1;
    let mut rounds = 0usize;

    loop {
        rounds += 1;
        if rounds > max_rounds {
            return Err(Error::CycleDetected { iterations: rounds });
        }

        let found = backtrace_mask(grid, &frontier)?;

        depth += 1;
        let mut next = Array2::from_elem((rows, cols), false);
        let mut advanced = 0usize;
        for ((row, col), &hit) in found.indexed_iter() {
            if hit && distance[(row, col)] == 0 {
                distance[(row, col)] = depth;
                next[(row, col)] = true;
                advanced += 1;
            }
        }

        if advanced == 0 {
            break;
        }
        visited += advanced;
        frontier = next;
    }

    Ok((distance, visited, rounds))
}

fn distance_raster(distance: Array2<u32>) -> Raster<u32> {
    let mut output = Raster::from_array(distance);
    output.set_nodata(Some(0));
    output
}

/// Flow distance algorithm
#[derive(Debug, Clone, Default)]
pub struct FlowDistance;

impl Algorithm for FlowDistance {
    type Input = FlowGrid;
    type Output = Raster<u32>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Flow Distance"
    }

    fn description(&self) -> &'static str {
        "Maps the topological distance from every watershed cell to its outlet"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        map_flow_distance(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(mask: &[u8], dirs: &[u8], rows: usize, cols: usize) -> FlowGrid {
        let mask = Raster::from_vec(mask.to_vec(), rows, cols).unwrap();
        let dirs = Raster::from_vec(dirs.to_vec(), rows, cols).unwrap();
        FlowGrid::from_rasters(&mask, &dirs).unwrap()
    }

    #[test]
    fn test_straight_channel_counts_from_the_outlet() {
        // Five cells flowing east; the outlet (0,4) is 1, the head is 5.
        let g = grid(&[1, 1, 1, 1, 1], &[2, 2, 2, 2, 2], 1, 5);
        let distance = map_flow_distance(&g).unwrap();

        for col in 0..5 {
            assert_eq!(
                distance.get(0, col).unwrap(),
                (5 - col) as u32,
                "Wrong distance at col {}",
                col
            );
        }
        assert_eq!(distance.nodata(), Some(0));
    }

    #[test]
    fn test_confluence_distances() {
        // Two arms meet at (1,1), which drains south off the grid:
        //
        //   .  v  .        (0,1) flows south
        //   >  v  <        (1,0) east, (1,1) south, (1,2) west
        //   .  v  .        (2,1) south = outlet
        #[rustfmt::skip]
        let g = grid(
            &[0, 1, 0,
              1, 1, 1,
              0, 1, 0],
            &[0, 3, 0,
              2, 3, 4,
              0, 3, 0],
            3, 3,
        );
        let distance = map_flow_distance(&g).unwrap();

        assert_eq!(distance.get(2, 1).unwrap(), 1, "Outlet");
        assert_eq!(distance.get(1, 1).unwrap(), 2, "Confluence");
        assert_eq!(distance.get(0, 1).unwrap(), 3);
        assert_eq!(distance.get(1, 0).unwrap(), 3);
        assert_eq!(distance.get(1, 2).unwrap(), 3);
        assert_eq!(distance.get(0, 0).unwrap(), 0, "Unmasked stays zero");
    }

    #[test]
    fn test_disjoint_basins_resolve_in_one_call() {
        // Two channels separated by an unmasked column, each with its own
        // outlet. Every cell measures to the outlet of its own basin.
        #[rustfmt::skip]
        let g = grid(
            &[1, 1, 0, 1, 1],
            &[4, 4, 0, 2, 2],
            1, 5,
        );
        let distance = map_flow_distance(&g).unwrap();

        assert_eq!(distance.get(0, 0).unwrap(), 1);
        assert_eq!(distance.get(0, 1).unwrap(), 2);
        assert_eq!(distance.get(0, 3).unwrap(), 2);
        assert_eq!(distance.get(0, 4).unwrap(), 1);
    }

    #[test]
    fn test_single_cell_watershed() {
        let g = grid(&[1], &[1], 1, 1);
        let distance = map_flow_distance(&g).unwrap();
        assert_eq!(distance.get(0, 0).unwrap(), 1, "Sole cell is its own outlet");
    }

    #[test]
    fn test_no_outlet_is_an_error() {
        // Two cells pointing at each other never leave the mask.
        let g = grid(&[1, 1], &[2, 4], 1, 2);
        assert!(matches!(map_flow_distance(&g), Err(Error::NoOutlet)));
    }

    #[test]
    fn test_cycle_behind_an_outlet_is_detected() {
        // (0,0) drains west off the grid, fed by (0,1). The pair
        // (0,2) <-> (0,3) swirls and never reaches the outlet.
        let g = grid(&[1, 1, 1, 1], &[4, 4, 2, 4], 1, 4);
        assert!(matches!(
            map_flow_distance(&g),
            Err(Error::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_rerun_is_identical() {
        #[rustfmt::skip]
        let g = grid(
            &[1, 1, 1,
              1, 1, 1],
            &[2, 3, 3,
              2, 2, 2],
            2, 3,
        );
        let first = map_flow_distance(&g).unwrap();
        let second = map_flow_distance(&g).unwrap();
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn test_distance_from_custom_seeds() {
        // Seeding mid-channel measures the upstream side only; the cells
        // below the seed keep zero.
        let g = grid(&[1, 1, 1, 1, 1], &[2, 2, 2, 2, 2], 1, 5);
        let mut seeds: Raster<u8> = Raster::new(1, 5);
        seeds.set(0, 2, 1).unwrap();

        let distance = flow_distance_from(&g, &seeds).unwrap();
        assert_eq!(distance.get(0, 2).unwrap(), 1);
        assert_eq!(distance.get(0, 1).unwrap(), 2);
        assert_eq!(distance.get(0, 0).unwrap(), 3);
        assert_eq!(distance.get(0, 3).unwrap(), 0);
        assert_eq!(distance.get(0, 4).unwrap(), 0);
    }

    #[test]
    fn test_distance_from_ignores_unmasked_seeds() {
        let g = grid(&[1, 1, 0], &[2, 2, 0], 1, 3);
        let mut seeds: Raster<u8> = Raster::new(1, 3);
        seeds.set(0, 2, 1).unwrap();
        assert!(matches!(
            flow_distance_from(&g, &seeds),
            Err(Error::NoOutlet)
        ));
    }

    #[test]
    fn test_algorithm_trait_matches_free_function() {
        let g = grid(&[1, 1, 1], &[2, 2, 2], 1, 3);
        let by_trait = FlowDistance.execute_default(g.clone()).unwrap();
        let by_fn = map_flow_distance(&g).unwrap();
        assert_eq!(by_trait.data(), by_fn.data());
        assert_eq!(FlowDistance.name(), "Flow Distance");
    }
}
