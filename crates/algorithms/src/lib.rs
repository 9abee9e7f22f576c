//! # demflow Algorithms
//!
//! Hydrological terrain analysis from digital elevation models:
//!
//! - **hydrology**: flow routing (D4/D8/MFD), sink detection and filling,
//!   watershed delineation, flow accumulation, path tracing and drainage
//!   graph construction
//! - **resample**: bilinear and block-average grid resampling
//!
//! Every operation is a pure transformation from input grids to fresh
//! output grids, paths or graphs; nothing holds state across calls.

pub mod hydrology;
pub mod resample;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{
        build_directed, crop_masked, detect_sinks, downstream_path, fill_sinks,
        filter_threshold, flow_accumulation_mfd, nodes_from_grid, steepest_descent, watershed,
        watershed_mfd, watershed_threshold, FillSinks, FillSinksParams, FillResult,
        FlowAccumulationMfd, FlowRouting, MfdParams, ThresholdMode, WatershedDelineation,
        WatershedParams,
    };
    pub use crate::resample::{
        resample_average, resample_bilinear, Resample, ResampleMethod, ResampleParams,
    };
    pub use demflow_core::prelude::*;
}
