//! Positional rolling means with a minimum-observation gate.

/// Rolling mean over the trailing `window` positions.
///
/// Absent values do not count as observations; a position whose window holds fewer
/// than `min_periods` observations yields `None`. The window is positional: it spans
/// rows, not calendar days.
pub fn rolling_mean(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let min_periods = min_periods.max(1);

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, value) in values.iter().enumerate() {
        if let Some(v) = value {
            sum += v;
            count += 1;
        }
        if i >= window {
            if let Some(old) = values[i - window] {
                sum -= old;
                count -= 1;
            }
        }
        out.push((count >= min_periods).then(|| sum / count as f64));
    }
    out
}

/// Minimum observations used for chart smoothing: a quarter of the window, at least 7.
pub fn chart_min_periods(window: usize) -> usize {
    (window / 4).max(7)
}
