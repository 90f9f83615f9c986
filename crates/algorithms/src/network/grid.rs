//! Validated watershed grid: mask plus D4 flow directions
//!
//! `FlowGrid` is the shared substrate for every network algorithm. It is
//! built once from the two input rasters, validating shape and direction
//! codes up front so the grid passes themselves never re-check cell values.

use ndarray::Array2;
use thalweg_core::{Direction, Error, Raster, Result};

/// A watershed mask with one validated D4 flow direction per masked cell.
///
/// Construction is the single validation point for the network algorithms:
/// the mask and direction rasters must share a shape, and every masked cell
/// must carry a direction code in 1-4. Direction codes under unmasked cells
/// are ignored.
#[derive(Debug, Clone)]
pub struct FlowGrid {
    inside: Array2<bool>,
    direction: Array2<Option<Direction>>,
    masked_cells: usize,
}

impl FlowGrid {
    /// Build a validated grid from a watershed mask (non-zero = inside) and
    /// a D4 direction raster (1=N, 2=E, 3=S, 4=W).
    ///
    /// # Arguments
    /// * `mask` - Watershed membership raster
    /// * `direction` - Flow-direction codes, same shape as `mask`
    ///
    /// # Errors
    /// * `Error::SizeMismatch` if the rasters differ in shape
    /// * `Error::InvalidDirectionCode` if a masked cell holds a code
    ///   outside 1-4, reported with the offending cell's coordinates
    pub fn from_rasters(mask: &Raster<u8>, direction: &Raster<u8>) -> Result<Self> {
        let (rows, cols) = mask.shape();
        let (drows, dcols) = direction.shape();
        if (rows, cols) != (drows, dcols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: drows,
                ac: dcols,
            });
        }

        let mut inside = Array2::from_elem((rows, cols), false);
        let mut directions: Array2<Option<Direction>> = Array2::from_elem((rows, cols), None);
        let mut masked_cells = 0usize;

        for row in 0..rows {
            for col in 0..cols {
                let member = unsafe { mask.get_unchecked(row, col) };
                if member == 0 || mask.is_nodata(member) {
                    continue;
                }
                let code = unsafe { direction.get_unchecked(row, col) };
                let dir = Direction::from_code(code)
                    .ok_or(Error::InvalidDirectionCode { row, col, code })?;
                inside[(row, col)] = true;
                directions[(row, col)] = Some(dir);
                masked_cells += 1;
            }
        }

        Ok(Self {
            inside,
            direction: directions,
            masked_cells,
        })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.inside.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.inside.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.inside.dim()
    }

    /// Number of cells inside the watershed mask
    pub fn masked_cells(&self) -> usize {
        self.masked_cells
    }

    /// Whether (row, col) is inside the watershed mask
    pub fn is_inside(&self, row: usize, col: usize) -> bool {
        self.inside[(row, col)]
    }

    /// Flow direction at (row, col); `None` outside the mask
    pub fn direction(&self, row: usize, col: usize) -> Option<Direction> {
        self.direction[(row, col)]
    }

    /// The neighbor of (row, col) one step in `dir`, or `None` off-grid
    pub fn neighbor(&self, row: usize, col: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dr, dc) = dir.offset();
        let nrow = row as isize + dr;
        let ncol = col as isize + dc;
        if nrow < 0 || ncol < 0 || nrow >= self.rows() as isize || ncol >= self.cols() as isize {
            None
        } else {
            Some((nrow as usize, ncol as usize))
        }
    }

    /// The cell that (row, col) drains into: its neighbor in the pointed
    /// direction. `None` if the cell is unmasked or its flow leaves the grid.
    pub fn downstream(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let dir = self.direction[(row, col)]?;
        self.neighbor(row, col, dir)
    }

    /// The masked cell draining into (row, col) with flow direction
    /// `flow_dir`: the neighbor on the opposite side whose own direction
    /// is `flow_dir`. At most one such cell exists per direction.
    pub fn upstream_neighbor(
        &self,
        row: usize,
        col: usize,
        flow_dir: Direction,
    ) -> Option<(usize, usize)> {
        let (nrow, ncol) = self.neighbor(row, col, flow_dir.opposite())?;
        // Only masked cells hold Some(direction), so this also checks membership.
        if self.direction[(nrow, ncol)] == Some(flow_dir) {
            Some((nrow, ncol))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(values: &[u8], rows: usize, cols: usize) -> Raster<u8> {
        Raster::from_vec(values.to_vec(), rows, cols).unwrap()
    }

    #[test]
    fn test_construction_counts_masked_cells() {
        // 2x3, middle column unmasked
        #[rustfmt::skip]
        let mask = raster(&[
            1, 0, 1,
            1, 0, 1,
        ], 2, 3);
        #[rustfmt::skip]
        let dirs = raster(&[
            3, 0, 3,
            2, 0, 2,
        ], 2, 3);

        let grid = FlowGrid::from_rasters(&mask, &dirs).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.masked_cells(), 4);
        assert!(grid.is_inside(0, 0));
        assert!(!grid.is_inside(0, 1));
        assert_eq!(grid.direction(1, 0), Some(Direction::East));
        assert_eq!(grid.direction(0, 1), None);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let mask = raster(&[1, 1], 1, 2);
        let dirs = raster(&[2, 2, 2], 1, 3);
        let err = FlowGrid::from_rasters(&mask, &dirs).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch { er: 1, ec: 2, ar: 1, ac: 3 }
        ));
    }

    #[test]
    fn test_invalid_code_reports_cell() {
        #[rustfmt::skip]
        let mask = raster(&[
            1, 1,
            1, 1,
        ], 2, 2);
        #[rustfmt::skip]
        let dirs = raster(&[
            2, 3,
            7, 3,
        ], 2, 2);

        let err = FlowGrid::from_rasters(&mask, &dirs).unwrap_err();
        match err {
            Error::InvalidDirectionCode { row, col, code } => {
                assert_eq!((row, col, code), (1, 0, 7));
            }
            other => panic!("Expected InvalidDirectionCode, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_codes_outside_mask_are_ignored() {
        let mask = raster(&[1, 0], 1, 2);
        let dirs = raster(&[4, 255], 1, 2);
        let grid = FlowGrid::from_rasters(&mask, &dirs).unwrap();
        assert_eq!(grid.masked_cells(), 1);
        assert_eq!(grid.direction(0, 1), None);
    }

    #[test]
    fn test_downstream_follows_direction() {
        // (0,0) flows east into (0,1); (0,1) flows east off the grid edge
        let mask = raster(&[1, 1], 1, 2);
        let dirs = raster(&[2, 2], 1, 2);
        let grid = FlowGrid::from_rasters(&mask, &dirs).unwrap();

        assert_eq!(grid.downstream(0, 0), Some((0, 1)));
        assert_eq!(grid.downstream(0, 1), None);
    }

    #[test]
    fn test_upstream_neighbor_requires_pointing_direction() {
        // West-to-east channel: each cell contributes to the one east of it.
        let mask = raster(&[1, 1, 1], 1, 3);
        let dirs = raster(&[2, 2, 2], 1, 3);
        let grid = FlowGrid::from_rasters(&mask, &dirs).unwrap();

        // A cell flowing East arrives from the west side.
        assert_eq!(grid.upstream_neighbor(0, 1, Direction::East), Some((0, 0)));
        // Nothing flows West into (0,1).
        assert_eq!(grid.upstream_neighbor(0, 1, Direction::West), None);
        // Nothing north of row 0.
        assert_eq!(grid.upstream_neighbor(0, 1, Direction::South), None);
    }
}
