//! Headwater location
//!
//! A headwater is a masked cell that no neighbor drains into: the start
//! of a channel. The test runs against the flow-distance map so that a
//! neighbor can be discounted either way: it sits lower on the same path
//! (smaller distance), or its direction simply does not point in.
//! Headwaters seed the downstream accumulation passes.

use crate::maybe_rayon::*;
use ndarray::Array2;
use thalweg_core::{Direction, Error, Raster, Result};

use super::grid::FlowGrid;

/// Locate the headwater cells.
///
/// A masked cell qualifies when, for each of the four directions, the
/// neighbor there is off the grid, carries a smaller flow distance, or
/// does not drain toward the cell. Cells without a mapped distance are
/// skipped, so a partial map from `flow_distance_from` confines the
/// headwaters to the traced region.
///
/// # Arguments
/// * `grid` - Validated mask plus flow directions
/// * `flow_distance` - Distance map from `map_flow_distance`
///
/// # Returns
/// Raster<u8> with 1 at headwater cells, 0 elsewhere (nodata 0)
pub fn find_headwaters(grid: &FlowGrid, flow_distance: &Raster<u32>) -> Result<Raster<u8>> {
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

    let mut output: Raster<u8> = flow_distance.with_same_shape();
    output.set_nodata(Some(0));
    *output.data_mut() = heads.mapv(u8::from);
    Ok(output)
}

/// Dense headwater membership, shared with the accumulation drivers.
pub(crate) fn headwater_mask(grid: &FlowGrid, distance: &Array2<u32>) -> Result<Array2<bool>> {
    let (rows, cols) = grid.shape();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];
            for col in 0..cols {
                if !grid.is_inside(row, col) {
                    continue;
                }
                let here = distance[(row, col)];
                if here == 0 {
                    continue;
                }
                row_data[col] = Direction::CARDINAL.iter().all(|&dir| {
                    match grid.neighbor(row, col, dir) {
                        None => true,
                        Some((nrow, ncol)) => {
                            distance[(nrow, ncol)] < here
                                || grid.direction(nrow, ncol) != Some(dir.opposite())
                        }
                    }
                });
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{flow_distance_from, map_flow_distance};

    fn grid(mask: &[u8], dirs: &[u8], rows: usize, cols: usize) -> FlowGrid {
        let mask = Raster::from_vec(mask.to_vec(), rows, cols).unwrap();
        let dirs = Raster::from_vec(dirs.to_vec(), rows, cols).unwrap();
        FlowGrid::from_rasters(&mask, &dirs).unwrap()
    }

    #[test]
    fn test_channel_has_one_headwater() {
        let g = grid(&[1, 1, 1, 1], &[2, 2, 2, 2], 1, 4);
        let distance = map_flow_distance(&g).unwrap();
        let heads = find_headwaters(&g, &distance).unwrap();

        assert_eq!(heads.get(0, 0).unwrap(), 1, "Channel head");
        for col in 1..4 {
            assert_eq!(heads.get(0, col).unwrap(), 0, "Mid-channel at col {}", col);
        }
    }

    #[test]
    fn test_confluence_arms_are_headwaters() {
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
        let heads = find_headwaters(&g, &distance).unwrap();

        assert_eq!(heads.get(0, 1).unwrap(), 1, "North arm tip");
        assert_eq!(heads.get(1, 0).unwrap(), 1, "West arm tip");
        assert_eq!(heads.get(1, 2).unwrap(), 1, "East arm tip");
        assert_eq!(heads.get(1, 1).unwrap(), 0, "Confluence is fed");
        assert_eq!(heads.get(2, 1).unwrap(), 0, "Outlet is fed");
    }

    #[test]
    fn test_single_cell_is_both_outlet_and_headwater() {
        let g = grid(&[1], &[3], 1, 1);
        let distance = map_flow_distance(&g).unwrap();
        let heads = find_headwaters(&g, &distance).unwrap();
        assert_eq!(heads.get(0, 0).unwrap(), 1);
    }

    #[test]
    fn test_untraced_cells_are_not_headwaters() {
        // Partial distance map: only the seed cell and its upstream side
        // carry distances, so the downstream cells cannot qualify.
        let g = grid(&[1, 1, 1, 1], &[2, 2, 2, 2], 1, 4);
        let mut seeds: Raster<u8> = Raster::new(1, 4);
        seeds.set(0, 1, 1).unwrap();

        let partial = flow_distance_from(&g, &seeds).unwrap();
        let heads = find_headwaters(&g, &partial).unwrap();

        assert_eq!(heads.get(0, 0).unwrap(), 1, "Head of the traced region");
        assert_eq!(heads.get(0, 2).unwrap(), 0, "Untraced cell");
        assert_eq!(heads.get(0, 3).unwrap(), 0, "Untraced cell");
    }

    #[test]
    fn test_shape_mismatch() {
        let g = grid(&[1, 1], &[2, 2], 1, 2);
        let distance: Raster<u32> = Raster::new(2, 2);
        assert!(matches!(
            find_headwaters(&g, &distance),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
