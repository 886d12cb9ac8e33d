//! SVG charts of the daily table, drawn with `plotters`.
//!
//! The x axis is the row index of the daily table, labelled with the row's date,
//! so days without data close up instead of leaving gaps.

use crate::error::{AppError, Result};
use crate::models::DailyRecord;
use chrono::NaiveDate;
use plotters::prelude::*;
use std::fs;
use std::path::Path;
use tracing::debug;

const CHART_SIZE: (u32, u32) = (1120, 630);

fn chart_err(e: impl std::fmt::Display) -> AppError {
    AppError::Chart(e.to_string())
}

/// Value range with a little headroom; a flat or empty series still gets a visible band.
fn y_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.08).max(1.0);
    (lo - pad, hi + pad)
}

/// Draws one line (or several) against the date-labelled row axis.
fn draw_lines(
    out_path: &Path,
    title: &str,
    dates: &[NaiveDate],
    lines: &[(String, RGBColor, Vec<(i32, f64)>)],
) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let (y_min, y_max) = y_range(lines.iter().flat_map(|(_, _, pts)| pts.iter().map(|p| p.1)));
    let x_max = dates.len().max(2) as i32 - 1;
    let label_for = |x: &i32| {
        usize::try_from(*x)
            .ok()
            .and_then(|i| dates.get(i))
            .map(|d| d.to_string())
            .unwrap_or_default()
    };

    let root = SVGBackend::new(out_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(18)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(0..x_max, y_min..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("µg/m³")
        .x_labels(8)
        .x_label_formatter(&label_for)
        .draw()
        .map_err(chart_err)?;

    for (label, color, points) in lines {
        let color = *color;
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(chart_err)?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    debug!("Wrote chart {}", out_path.display());
    Ok(())
}

/// Daily means with the guideline drawn as a horizontal line.
pub fn plot_timeseries(
    daily: &[DailyRecord],
    guideline: f64,
    title: &str,
    out_path: &Path,
) -> Result<()> {
    let dates: Vec<NaiveDate> = daily.iter().map(|r| r.date).collect();
    let points: Vec<(i32, f64)> = daily
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.mean.map(|m| (i as i32, m)))
        .collect();
    let x_end = dates.len().max(2) as i32 - 1;

    draw_lines(
        out_path,
        title,
        &dates,
        &[
            ("Daily mean".to_string(), BLUE, points),
            (
                format!("WHO 24h guideline ({})", super::fmt_number(guideline)),
                RED,
                vec![(0, guideline), (x_end, guideline)],
            ),
        ],
    )
}

/// Rolling mean of the daily means, one value (or gap) per daily row.
pub fn plot_rolling(
    daily: &[DailyRecord],
    rolling: &[Option<f64>],
    window: usize,
    title: &str,
    out_path: &Path,
) -> Result<()> {
    let dates: Vec<NaiveDate> = daily.iter().map(|r| r.date).collect();
    let points: Vec<(i32, f64)> = rolling
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as i32, v)))
        .collect();

    draw_lines(
        out_path,
        title,
        &dates,
        &[(format!("{}-day rolling mean", window), BLUE, points)],
    )
}
