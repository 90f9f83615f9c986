//! # Thalweg Algorithms
//!
//! Drainage-network analysis for thalweg.
//!
//! ## Available Algorithm Categories
//!
//! - **network**: Outlets, flow distance, headwaters, Strahler stream order,
//!   contributing area over masked D4 flow-direction grids

pub mod network;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::network::{
        backtrace, find_headwaters, find_outlets, flow_distance_from, forward_trace,
        map_contributing_area, map_flow_distance, map_strahler_order, ContributingArea,
        FlowDistance, FlowGrid, ForwardRound, StrahlerOrder,
    };
    pub use thalweg_core::prelude::*;
}
