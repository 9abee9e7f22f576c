//! Hydrological analysis
//!
//! The full drainage pipeline from a raw DEM:
//! - Flow routing: D4/D8 steepest descent and MFD weighting
//! - Sink detection and iterative filling
//! - Watershed delineation (single-flow, MFD, threshold-growing)
//! - Weighted flow accumulation
//! - Downstream path tracing
//! - Drainage graph construction from channel cells

mod accumulation;
mod flow;
mod path;
mod sinks;
mod stream_graph;
mod watershed;

pub use accumulation::{
    filter_threshold, flow_accumulation_mfd, FlowAccumulationMfd, MfdParams, ThresholdMode,
};
pub use flow::{downslope_weights, is_sink, steepest_descent, FlowRouting};
pub use path::downstream_path;
pub use sinks::{detect_sinks, fill_sinks, FillResult, FillSinks, FillSinksParams};
pub use stream_graph::{build_directed, nodes_from_grid, strahler_orders};
pub use watershed::{
    crop_masked, watershed, watershed_mfd, watershed_threshold, WatershedDelineation,
    WatershedParams,
};
