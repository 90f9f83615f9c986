//! Drainage-network analysis over masked D4 flow-direction grids
//!
//! A watershed is given as two same-shape rasters: a mask of cells that
//! belong to it, and a D4 direction code (1=N, 2=E, 3=S, 4=W) telling
//! where each masked cell drains. Together they define an implicit DAG
//! with one outgoing edge per cell. The algorithms here resolve that
//! network by repeated whole-grid passes:
//!
//! - **Outlets**: cells whose flow leaves the mask
//! - **Flow distance**: level-synchronous upstream sweep from the outlets
//! - **Headwaters**: cells no neighbor drains into
//! - **Strahler order / contributing area**: valued frontiers advanced
//!   downstream from the headwaters, with each confluence merged only
//!   once every tributary has arrived

mod contributing_area;
mod flow_distance;
mod grid;
mod headwaters;
mod outlets;
mod strahler;
mod trace;

pub use contributing_area::{map_contributing_area, ContributingArea};
pub use flow_distance::{flow_distance_from, map_flow_distance, FlowDistance};
pub use grid::FlowGrid;
pub use headwaters::find_headwaters;
pub use outlets::find_outlets;
pub use strahler::{map_strahler_order, StrahlerOrder};
pub use trace::{backtrace, forward_trace, ForwardRound};
