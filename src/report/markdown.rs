//! Markdown brief built from the KPI record and the request labels.

use crate::models::{KpiRecord, Pollutant};
use chrono::{DateTime, NaiveDate, Utc};

/// Everything the brief needs besides the KPIs themselves.
#[derive(Debug, Clone)]
pub struct BriefContext<'a> {
    pub city: &'a str,
    pub pollutant: Pollutant,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub guideline: f64,
    pub report_name: &'a str,
    pub window: usize,
    /// Link the chart files next to the brief (file output), or refer to
    /// charts shown elsewhere (JSON/interactive output).
    pub include_images: bool,
    pub generated_at: DateTime<Utc>,
}

/// Formats a number the way the brief shows it: integral values keep one decimal
/// (`15.0`), others print in shortest form (`15.25`).
pub fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(fmt_number).unwrap_or_else(|| "N/A".to_string())
}

/// `elevated` when at least 10 % of days exceed the guideline.
pub fn summary_word(kpis: &KpiRecord) -> &'static str {
    if kpis.exceed_pct >= 10.0 {
        "elevated"
    } else {
        "moderate"
    }
}

pub fn trend_label(kpis: &KpiRecord) -> String {
    match kpis.trend_pct_90d {
        Some(t) => format!("{}%", fmt_number(t)),
        None => "N/A".to_string(),
    }
}

pub fn render_markdown(ctx: &BriefContext<'_>, kpis: &KpiRecord) -> String {
    let p = ctx.pollutant.as_str();
    let who = fmt_number(ctx.guideline);
    let pct = fmt_number(kpis.exceed_pct);
    let mut md = String::new();

    md.push_str(&format!(
        "# Environmental Assessment Brief — {} ({})\n",
        ctx.city,
        p.to_uppercase()
    ));
    md.push_str(&format!("**Period:** {} to {}  \n", ctx.start, ctx.end));
    md.push_str("**Source:** OpenAQ (v3)\n\n");

    md.push_str("## Executive Summary\n");
    md.push_str(&format!(
        "- Average {}: **{} µg/m³** (median **{}**, p95 **{}**)\n",
        p,
        fmt_opt(kpis.mean),
        fmt_opt(kpis.median),
        fmt_opt(kpis.p95)
    ));
    md.push_str(&format!(
        "- Days above threshold ({} µg/m³): **{}/{}** (**{}%**)\n",
        who, kpis.days_exceed, kpis.days_total, pct
    ));
    md.push_str(&format!(
        "- 90-day rolling trend vs prior 90 days: **{}**\n\n",
        trend_label(kpis)
    ));
    md.push_str(&format!(
        "Overall, levels were {} relative to the selected guideline.",
        summary_word(kpis)
    ));
    if !ctx.include_images {
        md.push_str(" Charts are displayed alongside this brief.");
    }
    md.push_str("\n\n");

    md.push_str("## Baseline & Data\n");
    md.push_str(&format!(
        "Data pulled from OpenAQ for *{}* between **{}** and **{}**. Values are daily means across selected sensors.\n\n",
        ctx.city, ctx.start, ctx.end
    ));

    md.push_str("## Key Findings\n");
    md.push_str(&format!("- Exceedance rate: **{}%** of days\n", pct));
    md.push_str("- Peaks/seasonality visible in rolling chart\n");
    md.push_str("- Locations with highest readings may warrant targeted mitigations\n\n");

    md.push_str("## Recommended Mitigations (generic)\n");
    md.push_str("- Dust control and transport emissions management\n");
    md.push_str("- Targeted hotspot monitoring; public alerts on high-pollution days\n\n");

    if ctx.include_images {
        md.push_str("## Charts\n");
        md.push_str(&format!(
            "![Daily Mean](../charts/{}_timeseries.svg)\n\n",
            ctx.report_name
        ));
        md.push_str(&format!(
            "![{w}-day Rolling Mean](../charts/{}_rolling{w}.svg)\n\n",
            ctx.report_name,
            w = ctx.window
        ));
    }

    md.push_str("## Appendix\n");
    md.push_str(&format!("- Parameter: **{}**\n", p));
    md.push_str(&format!("- WHO threshold: **{} µg/m³**\n", who));
    md.push_str(&format!(
        "- Generated on: {}\n",
        ctx.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    md
}
