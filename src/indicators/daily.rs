//! Collapses a unified series into one row per UTC calendar day.

use super::stats;
use crate::models::{DailyRecord, UnifiedSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Groups readings by UTC calendar date and computes mean, median and count.
///
/// Absent values are ignored in the statistics; a day whose readings are all absent
/// still gets a row, with `mean`/`median` of `None` and `n == 0`. Days without any
/// reading get no row. Rows come back in ascending date order.
pub fn aggregate_daily(series: &UnifiedSeries) -> Vec<DailyRecord> {
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for reading in series.readings() {
        let values = by_day.entry(reading.timestamp.date_naive()).or_default();
        if let Some(v) = reading.value.filter(|v| v.is_finite()) {
            values.push(v);
        }
    }

    let daily: Vec<DailyRecord> = by_day
        .into_iter()
        .map(|(date, values)| DailyRecord {
            date,
            mean: stats::mean(&values),
            median: stats::median(&values),
            n: values.len(),
        })
        .collect();

    debug!(
        "Aggregated {} readings into {} daily rows",
        series.len(),
        daily.len()
    );
    daily
}
