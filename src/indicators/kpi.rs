//! Exceedance, summary and 90-day trend indicators.

use super::rolling::rolling_mean;
use super::stats::{self, round2};
use crate::models::{DailyRecord, KpiRecord};
use tracing::debug;

/// Rows in each trend window.
pub const TREND_WINDOW: usize = 90;
/// Observations a trend window needs before it yields a value.
pub const TREND_MIN_PERIODS: usize = 30;
/// The previous window is only consulted when the table is longer than this.
const TREND_MIN_ROWS: usize = 180;
/// `prev90` sits at this position counted back from the end (1 is the final row).
const TREND_OFFSET_FROM_END: usize = 91;

/// Derives the KPI record for a daily table and a guideline threshold.
///
/// Rows with no mean are excluded from every statistic. A day counts as an
/// exceedance only when its mean is strictly above the guideline.
pub fn compute_kpis(daily: &[DailyRecord], guideline: f64) -> KpiRecord {
    let mut rows: Vec<&DailyRecord> = daily.iter().filter(|r| r.mean.is_some()).collect();
    if rows.is_empty() {
        return KpiRecord::empty();
    }
    rows.sort_by_key(|r| r.date);

    let means: Vec<f64> = rows.iter().filter_map(|r| r.mean).collect();
    let medians: Vec<f64> = rows.iter().filter_map(|r| r.median).collect();

    let days_total = means.len();
    let days_exceed = means.iter().filter(|m| **m > guideline).count();
    let exceed_pct = round2(days_exceed as f64 / days_total as f64 * 100.0);

    let kpis = KpiRecord {
        days_total,
        days_exceed,
        exceed_pct,
        mean: stats::mean(&means).map(round2),
        median: stats::median(&medians).map(round2),
        p95: stats::quantile(&means, 0.95).map(round2),
        trend_pct_90d: trend_pct_90d(&means),
    };
    debug!("KPIs: {:?}", kpis);
    kpis
}

/// Percent change of the latest 90-row rolling mean over the one 91 rows from the end.
///
/// `means` must be in date order. `None` when the table is too short, when either
/// rolling value is missing, or when the earlier value is zero.
pub fn trend_pct_90d(means: &[f64]) -> Option<f64> {
    let values: Vec<Option<f64>> = means.iter().copied().map(Some).collect();
    let rolled = rolling_mean(&values, TREND_WINDOW, TREND_MIN_PERIODS);

    let last90 = (*rolled.last()?)?;
    let prev90 = if rolled.len() > TREND_MIN_ROWS {
        rolled[rolled.len() - TREND_OFFSET_FROM_END]?
    } else {
        return None;
    };

    if prev90 == 0.0 {
        return None;
    }
    Some(round2((last90 / prev90 - 1.0) * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rstest::rstest;

    fn table(means: &[f64]) -> Vec<DailyRecord> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        means
            .iter()
            .enumerate()
            .map(|(i, m)| DailyRecord {
                date: start + Duration::days(i as i64),
                mean: Some(*m),
                median: Some(*m),
                n: 1,
            })
            .collect()
    }

    #[test]
    fn empty_table_gives_zero_counters_and_no_statistics() {
        let kpis = compute_kpis(&[], 15.0);
        assert_eq!(kpis, KpiRecord::empty());
        assert_eq!(kpis.exceed_pct, 0.0);
    }

    #[test]
    fn table_without_any_mean_is_treated_as_empty() {
        let mut daily = table(&[1.0, 2.0]);
        for row in &mut daily {
            row.mean = None;
            row.median = None;
            row.n = 0;
        }
        assert_eq!(compute_kpis(&daily, 15.0), KpiRecord::empty());
    }

    #[test]
    fn exceedance_is_strictly_greater_than_guideline() {
        let kpis = compute_kpis(&table(&[10.0, 16.0, 15.0, 20.0]), 15.0);
        assert_eq!(kpis.days_total, 4);
        assert_eq!(kpis.days_exceed, 2);
        assert_eq!(kpis.exceed_pct, 50.0);
        assert_eq!(kpis.mean, Some(15.25));
        assert_eq!(kpis.median, Some(15.5));
        assert_eq!(kpis.p95, Some(19.4));
        assert_eq!(kpis.trend_pct_90d, None);
    }

    #[test]
    fn statistics_round_half_to_even() {
        let kpis = compute_kpis(&table(&[12.125]), 15.0);
        assert_eq!(kpis.mean, Some(12.12));
        assert_eq!(kpis.median, Some(12.12));
        assert_eq!(kpis.p95, Some(12.12));
    }

    #[rstest]
    #[case(&[15.0, 15.0, 15.0], 0)]
    #[case(&[15.000001, 14.999999], 1)]
    #[case(&[100.0, 200.0], 2)]
    fn guideline_boundary(#[case] means: &[f64], #[case] expected: usize) {
        assert_eq!(compute_kpis(&table(means), 15.0).days_exceed, expected);
    }

    #[test]
    fn null_means_are_dropped_not_zeroed() {
        let mut daily = table(&[10.0, 30.0, 20.0]);
        daily[1].mean = None;
        daily[1].median = None;
        let kpis = compute_kpis(&daily, 15.0);
        assert_eq!(kpis.days_total, 2);
        assert_eq!(kpis.days_exceed, 1);
        assert_eq!(kpis.mean, Some(15.0));
    }

    #[test]
    fn exceed_pct_rounds_to_two_decimals() {
        let kpis = compute_kpis(&table(&[20.0, 1.0, 1.0]), 15.0);
        assert_eq!(kpis.exceed_pct, 33.33);
    }

    #[test]
    fn exceedance_bounds_hold_for_varied_tables() {
        for len in 1..60usize {
            let means: Vec<f64> = (0..len).map(|i| ((i * 37) % 41) as f64).collect();
            let kpis = compute_kpis(&table(&means), 20.0);
            assert!(kpis.days_exceed <= kpis.days_total);
            assert!((0.0..=100.0).contains(&kpis.exceed_pct));
        }
    }

    #[test]
    fn unsorted_input_is_sorted_by_date_first() {
        let mut daily = table(&[1.0, 2.0, 3.0]);
        daily.reverse();
        let kpis = compute_kpis(&daily, 1.5);
        assert_eq!(kpis.days_exceed, 2);
        assert_eq!(kpis.median, Some(2.0));
    }

    #[test]
    fn trend_is_null_for_150_rows() {
        let means: Vec<f64> = (0..150).map(|i| 10.0 + i as f64).collect();
        assert_eq!(compute_kpis(&table(&means), 15.0).trend_pct_90d, None);
    }

    #[test]
    fn trend_is_null_at_exactly_180_rows() {
        let means: Vec<f64> = (0..180).map(|i| 10.0 + i as f64).collect();
        assert_eq!(trend_pct_90d(&means), None);
    }

    #[test]
    fn trend_compares_latest_window_with_the_one_91_rows_back() {
        // 110 rows at 10, then 90 rows at 20: the last window is all 20s and the
        // window ending at index 200 - 91 = 109 is all 10s.
        let mut means = vec![10.0; 110];
        means.extend(vec![20.0; 90]);
        let kpis = compute_kpis(&table(&means), 15.0);
        assert_eq!(kpis.trend_pct_90d, Some(100.0));
    }

    #[test]
    fn trend_is_present_for_dense_200_rows() {
        let means: Vec<f64> = (0..200).map(|i| 20.0 + (i % 7) as f64).collect();
        assert!(compute_kpis(&table(&means), 15.0).trend_pct_90d.is_some());
    }

    #[test]
    fn zero_previous_window_gives_no_trend() {
        let mut means = vec![0.0; 110];
        means.extend(vec![20.0; 90]);
        assert_eq!(trend_pct_90d(&means), None);
    }

    #[test]
    fn falling_levels_give_negative_trend() {
        let mut means = vec![40.0; 110];
        means.extend(vec![30.0; 90]);
        assert_eq!(trend_pct_90d(&means), Some(-25.0));
    }
}
