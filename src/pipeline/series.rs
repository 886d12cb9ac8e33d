//! Daily series retrieval for a single sensor.

use crate::api::OpenAqApi;
use crate::error::{AppError, Result};
use crate::models::Reading;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

/// Parses an OpenAQ UTC timestamp.
///
/// Accepts RFC 3339 with any offset (normalised to UTC) and offset-less
/// `YYYY-MM-DDTHH:MM:SS`, which is taken as UTC.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Fetches the daily means of one sensor over `[date_from, date_to]` (inclusive, UTC).
///
/// Rows without a parseable period start are dropped; the rest come back in
/// ascending timestamp order. An empty upstream listing is `AppError::NoMatch`.
/// The returned readings carry no location tag; the caller adds it.
pub async fn fetch_daily_series<A: OpenAqApi + ?Sized>(
    api: &A,
    sensor_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<Reading>> {
    let rows = api.sensor_days(sensor_id, date_from, date_to).await?;
    if rows.is_empty() {
        return Err(AppError::NoMatch(
            "No daily values for this sensor & period.".to_string(),
        ));
    }

    let total = rows.len();
    let mut readings: Vec<Reading> = rows
        .iter()
        .filter_map(|row| {
            let timestamp = row.period_start_utc().and_then(parse_utc)?;
            Some(Reading {
                timestamp,
                value: row.value,
                unit: row.units().map(str::to_string),
                sensor_id,
                location_id: None,
                location_name: None,
            })
        })
        .collect();
    readings.sort_by_key(|r| r.timestamp);

    if readings.len() < total {
        warn!(
            "Sensor {}: dropped {} of {} rows without a valid timestamp",
            sensor_id,
            total - readings.len(),
            total
        );
    }
    debug!("Sensor {}: {} daily readings", sensor_id, readings.len());
    Ok(readings)
}
