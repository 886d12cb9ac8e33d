//! End-to-end analysis: fetch → daily table → KPIs → brief.

use super::merge::{fetch_city_parameter_daily, fetch_selected_sensors_daily};
use crate::api::OpenAqApi;
use crate::error::{AppError, Result};
use crate::indicators::{aggregate_daily, chart_min_periods, compute_kpis, rolling_mean};
use crate::models::{DailyRecord, KpiRecord, Pollutant};
use crate::report::{self, BriefContext};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Inputs of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub city: String,
    pub country: Option<String>,
    pub pollutant: Pollutant,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Guideline threshold in µg/m³.
    pub guideline: f64,
    /// Window (rows) of the rolling chart.
    pub rolling_window: usize,
    pub report_name: String,
    /// Restrict the analysis to these sensors; empty means automatic selection.
    pub sensor_ids: Vec<i64>,
    /// Link chart files from the brief.
    pub include_images: bool,
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<()> {
        if self.city.trim().is_empty() {
            return Err(AppError::Cli("City must not be empty.".to_string()));
        }
        if self.start > self.end {
            return Err(AppError::Cli(format!(
                "Start date {} is after end date {}.",
                self.start, self.end
            )));
        }
        if !self.guideline.is_finite() || self.guideline < 0.0 {
            return Err(AppError::Cli(format!(
                "Guideline must be a non-negative number, got {}.",
                self.guideline
            )));
        }
        if self.rolling_window == 0 {
            return Err(AppError::Cli("Rolling window must be at least 1 day.".to_string()));
        }
        if self.report_name.trim().is_empty() {
            return Err(AppError::Cli("Report name must not be empty.".to_string()));
        }
        Ok(())
    }
}

/// `<city>_<pollutant>_<start>_<end>` with spaces replaced by underscores.
pub fn default_report_name(city: &str, pollutant: Pollutant, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}_{}_{}_{}", city.trim(), pollutant, start, end).replace(' ', "_")
}

/// One point of the rolling chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub request: AnalysisRequest,
    pub sensors_used: Vec<i64>,
    pub readings: usize,
    pub daily: Vec<DailyRecord>,
    pub kpis: KpiRecord,
    pub rolling: Vec<RollingPoint>,
    pub report_md: String,
}

/// Paths of the files written for a report.
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub daily_csv: PathBuf,
    pub timeseries_chart: PathBuf,
    pub rolling_chart: PathBuf,
    pub brief: PathBuf,
}

impl AnalysisReport {
    fn chart_title(&self, suffix: &str) -> String {
        format!(
            "{} — {} {}",
            self.request.city,
            self.request.pollutant.as_str().to_uppercase(),
            suffix
        )
    }

    /// Writes the daily CSV, both charts and the brief.
    pub fn write_files(&self, charts_dir: &Path, reports_dir: &Path) -> Result<WrittenFiles> {
        let name = &self.request.report_name;
        let window = self.request.rolling_window;
        let files = WrittenFiles {
            daily_csv: reports_dir.join(format!("{}_daily.csv", name)),
            timeseries_chart: charts_dir.join(format!("{}_timeseries.svg", name)),
            rolling_chart: charts_dir.join(format!("{}_rolling{}.svg", name, window)),
            brief: reports_dir.join(format!("{}.md", name)),
        };

        report::write_daily_csv(&self.daily, &files.daily_csv)?;
        report::plot_timeseries(
            &self.daily,
            self.request.guideline,
            &self.chart_title("Daily Mean"),
            &files.timeseries_chart,
        )?;
        let rolling: Vec<Option<f64>> = self.rolling.iter().map(|p| p.value).collect();
        report::plot_rolling(
            &self.daily,
            &rolling,
            window,
            &self.chart_title(&format!("{}-day Rolling Mean", window)),
            &files.rolling_chart,
        )?;
        std::fs::write(&files.brief, &self.report_md)?;

        info!("Report files written under {}", reports_dir.display());
        Ok(files)
    }
}

/// Either a finished report or a single error message, never both.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Report(Box<AnalysisReport>),
    Error { error: String },
}

impl From<Result<AnalysisReport>> for AnalysisOutcome {
    fn from(result: Result<AnalysisReport>) -> Self {
        match result {
            Ok(report) => AnalysisOutcome::Report(Box::new(report)),
            Err(e) => AnalysisOutcome::Error {
                error: e.to_string(),
            },
        }
    }
}

/// Runs the whole pipeline for one request.
pub async fn run_analysis<A: OpenAqApi + ?Sized>(
    api: &A,
    request: &AnalysisRequest,
) -> Result<AnalysisReport> {
    request.validate()?;
    info!(
        "Analysing {} {} in '{}' ({}) from {} to {}",
        request.pollutant,
        if request.sensor_ids.is_empty() { "(auto sensors)" } else { "(selected sensors)" },
        request.city,
        request.country.as_deref().unwrap_or("any country"),
        request.start,
        request.end
    );

    let series = if request.sensor_ids.is_empty() {
        fetch_city_parameter_daily(
            api,
            request.country.as_deref(),
            &request.city,
            request.pollutant,
            request.start,
            request.end,
        )
        .await?
    } else {
        fetch_selected_sensors_daily(
            api,
            request.country.as_deref(),
            &request.city,
            request.pollutant,
            &request.sensor_ids,
            request.start,
            request.end,
        )
        .await?
    };

    if series.is_empty() {
        return Err(AppError::NoUsableData(
            "No data returned. Try another city/parameter/date range.".to_string(),
        ));
    }

    let daily = aggregate_daily(&series);
    let kpis = compute_kpis(&daily, request.guideline);

    let means: Vec<Option<f64>> = daily.iter().map(|r| r.mean).collect();
    let rolling = rolling_mean(
        &means,
        request.rolling_window,
        chart_min_periods(request.rolling_window),
    )
    .into_iter()
    .zip(&daily)
    .map(|(value, row)| RollingPoint {
        date: row.date,
        value,
    })
    .collect();

    let report_md = report::render_markdown(
        &BriefContext {
            city: &request.city,
            pollutant: request.pollutant,
            start: request.start,
            end: request.end,
            guideline: request.guideline,
            report_name: &request.report_name,
            window: request.rolling_window,
            include_images: request.include_images,
            generated_at: Utc::now(),
        },
        &kpis,
    );

    info!(
        "{} daily rows, {} exceedance days ({}%)",
        kpis.days_total, kpis.days_exceed, kpis.exceed_pct
    );

    Ok(AnalysisReport {
        request: request.clone(),
        sensors_used: series.sensor_ids(),
        readings: series.len(),
        daily,
        kpis,
        rolling,
        report_md,
    })
}
