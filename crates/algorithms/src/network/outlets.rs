//! Outlet location
//!
//! An outlet is a masked cell whose flow direction exits the watershed:
//! the pointed-to neighbor is off the grid edge or outside the mask.
//! Outlets are where drainage leaves the basin, and they seed the
//! flow-distance sweep. A disjoint mask can have several.

use crate::maybe_rayon::*;
use ndarray::Array2;
use thalweg_core::{Error, Raster, Result};

use super::grid::FlowGrid;

/// Locate the watershed outlets.
///
/// # Arguments
/// * `grid` - Validated mask plus flow directions
///
/// # Returns
/// Raster<u8> with 1 at outlet cells, 0 elsewhere (nodata 0).
/// A mask with no outlet yields an all-zero raster; the sweep in
/// `map_flow_distance` is what turns that into `Error::NoOutlet`.
pub fn find_outlets(grid: &FlowGrid) -> Result<Raster<u8>> {
    let outlets = outlet_mask(grid)?;

    let mut output: Raster<u8> = Raster::new(grid.rows(), grid.cols());
    output.set_nodata(Some(0));
    *output.data_mut() = outlets.mapv(u8::from);
    Ok(output)
}

/// Dense outlet membership, shared with the flow-distance sweep.
pub(crate) fn outlet_mask(grid: &FlowGrid) -> Result<Array2<bool>> {
    let (rows, cols) = grid.shape();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];
            for col in 0..cols {
                if !grid.is_inside(row, col) {
                    continue;
                }
                row_data[col] = match grid.downstream(row, col) {
                    // Flow leaves through the grid edge.
                    None => true,
                    // Flow lands on an unmasked cell.
                    Some((nrow, ncol)) => !grid.is_inside(nrow, ncol),
                };
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
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
    fn test_edge_outlet() {
        // Channel flows east, last cell drains off the grid edge.
        let g = grid(&[1, 1, 1], &[2, 2, 2], 1, 3);
        let outlets = find_outlets(&g).unwrap();

        assert_eq!(outlets.get(0, 0).unwrap(), 0);
        assert_eq!(outlets.get(0, 1).unwrap(), 0);
        assert_eq!(outlets.get(0, 2).unwrap(), 1);
        assert_eq!(outlets.nodata(), Some(0));
    }

    #[test]
    fn test_interior_outlet_through_unmasked_hole() {
        // (0,1) is outside the mask, so (0,0) flowing east is an outlet
        // even though its target is on the grid.
        let g = grid(&[1, 0, 1], &[2, 0, 2], 1, 3);
        let outlets = find_outlets(&g).unwrap();

        assert_eq!(outlets.get(0, 0).unwrap(), 1);
        assert_eq!(outlets.get(0, 2).unwrap(), 1);
    }

    #[test]
    fn test_interior_cells_are_not_outlets() {
        #[rustfmt::skip]
        let g = grid(
            &[1, 1,
              1, 1],
            &[3, 3,
              2, 2],
            2, 2,
        );
        let outlets = find_outlets(&g).unwrap();

        // Only (1,1) leaves the mask (east edge).
        assert_eq!(outlets.get(0, 0).unwrap(), 0);
        assert_eq!(outlets.get(0, 1).unwrap(), 0);
        assert_eq!(outlets.get(1, 0).unwrap(), 0);
        assert_eq!(outlets.get(1, 1).unwrap(), 1);
    }

    #[test]
    fn test_multiple_outlets_in_disjoint_basins() {
        // Two one-cell basins separated by an unmasked column.
        let g = grid(&[1, 0, 1], &[4, 0, 2], 1, 3);
        let outlets = find_outlets(&g).unwrap();

        assert_eq!(outlets.get(0, 0).unwrap(), 1);
        assert_eq!(outlets.get(0, 2).unwrap(), 1);
    }

    #[test]
    fn test_unmasked_grid_has_no_outlets() {
        let g = grid(&[0, 0, 0], &[0, 0, 0], 1, 3);
        let outlets = find_outlets(&g).unwrap();
        let stats = outlets.statistics();
        assert_eq!(stats.valid_count, 0, "All cells should be nodata zero");
    }
}
