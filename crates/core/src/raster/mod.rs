//! Raster data structures and operations

mod direction;
mod element;
mod grid;

pub use direction::Direction;
pub use element::RasterElement;
pub use grid::{Raster, RasterStatistics};
