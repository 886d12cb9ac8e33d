//! Daily aggregation and KPI/trend computation.
//!
//! Pure functions only: no I/O, no state between calls.

mod daily;
mod kpi;
mod rolling;
mod stats;

pub use daily::aggregate_daily;
pub use kpi::compute_kpis;
pub use rolling::{chart_min_periods, rolling_mean};
