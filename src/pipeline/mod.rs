//! Fetch-and-analyse pipeline: location resolution, per-sensor series, the
//! bounded multi-sensor merge and the end-to-end analysis run.

mod analysis;
mod merge;
mod resolver;
mod series;

pub use analysis::{
    default_report_name, run_analysis, AnalysisOutcome, AnalysisReport, AnalysisRequest,
};
pub use merge::list_sensors_in_city;
pub use resolver::list_distinct_localities;
