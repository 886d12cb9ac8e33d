//! Domain types that flow through the fetch, aggregation and KPI stages.
//!
//! Everything here is created fresh per analysis run and dropped once the brief is written.

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pollutants the tool can analyse, named as OpenAQ v3 names its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    #[value(name = "pm25")]
    Pm25,
    #[value(name = "pm10")]
    Pm10,
    #[value(name = "no2")]
    No2,
    #[value(name = "o3")]
    O3,
    #[value(name = "so2")]
    So2,
    #[value(name = "co")]
    Co,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Co,
    ];

    /// The OpenAQ parameter name (`pm25`, `no2`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
            Pollutant::O3 => "o3",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pollutant::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown pollutant '{}'. Must be one of: pm25, pm10, no2, o3, so2, co",
                    s
                )
            })
    }
}

/// A sensor descriptor as listed inside a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDescriptor {
    pub id: i64,
    pub parameter: String,
    pub unit: Option<String>,
}

/// A monitoring location that matched the city filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: i64,
    pub name: Option<String>,
    pub locality: Option<String>,
    pub country_code: Option<String>,
    pub timezone: Option<String>,
    pub sensors: Vec<SensorDescriptor>,
}

impl Location {
    /// Display label, falling back to the id when the provider left the name blank.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Location {}", self.id))
    }
}

/// A sensor reporting the requested pollutant at one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub id: i64,
    /// Parent location. Non-owning: only the id is kept.
    pub location_id: i64,
    pub parameter: String,
    pub unit: Option<String>,
}

/// One daily value from one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Start of the day-period, in UTC.
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub sensor_id: i64,
    pub location_id: Option<i64>,
    pub location_name: Option<String>,
}

/// Readings from every selected sensor of a city, in timestamp order.
///
/// Same-day readings from different sensors are kept as separate points.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedSeries {
    readings: Vec<Reading>,
}

impl UnifiedSeries {
    /// Concatenates per-sensor series and orders them by timestamp.
    /// The sort is stable, so same-instant readings keep their sensor order.
    pub fn from_parts(parts: Vec<Vec<Reading>>) -> Self {
        let mut readings: Vec<Reading> = parts.into_iter().flatten().collect();
        readings.sort_by_key(|r| r.timestamp);
        Self { readings }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Distinct sensor ids, in first-seen order.
    pub fn sensor_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for r in &self.readings {
            if !ids.contains(&r.sensor_id) {
                ids.push(r.sensor_id);
            }
        }
        ids
    }
}

/// Daily statistics for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub n: usize,
}

/// Headline indicators derived from a daily table and a guideline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub days_total: usize,
    pub days_exceed: usize,
    pub exceed_pct: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub p95: Option<f64>,
    pub trend_pct_90d: Option<f64>,
}

impl KpiRecord {
    /// The record for a table with no usable rows.
    pub fn empty() -> Self {
        Self {
            days_total: 0,
            days_exceed: 0,
            exceed_pct: 0.0,
            mean: None,
            median: None,
            p95: None,
            trend_pct_90d: None,
        }
    }
}

/// A sensor offered to the user when picking sensors by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorChoice {
    pub sensor_id: i64,
    pub label: String,
}
