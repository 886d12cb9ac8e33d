//! Wire structures for the OpenAQ API v3 responses this tool consumes.
//!
//! Only the fields the pipeline reads are modelled, and nearly all of them are optional:
//! OpenAQ omits or nulls fields freely and a single odd row must not sink a whole listing.

use serde::{Deserialize, Serialize};

/// Generic paged envelope used by every v3 listing endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Represents date and time with UTC and local variants (from V3 schema).
///
/// Kept as raw strings: an unparseable timestamp drops its row later instead of
/// failing the whole response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatetimeObject {
    pub utc: Option<String>,
    pub local: Option<String>,
}

/// Base representation of a parameter (from V3 schema).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterBase {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub units: Option<String>,
    pub display_name: Option<String>,
}

/// Base representation of a country (from V3 schema).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CountryBase {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
}

/// A sensor as embedded in a location, or as listed by `/locations/{id}/sensors`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorBase {
    pub id: i64,
    pub name: Option<String>,
    pub parameter: Option<ParameterBase>,
}

impl SensorBase {
    pub fn parameter_name(&self) -> Option<&str> {
        self.parameter.as_ref().and_then(|p| p.name.as_deref())
    }

    pub fn units(&self) -> Option<&str> {
        self.parameter.as_ref().and_then(|p| p.units.as_deref())
    }
}

/// Represents a single location from the `/v3/locations` endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationV3 {
    pub id: i64,
    pub name: Option<String>,
    pub locality: Option<String>, // Often the city name
    pub timezone: Option<String>,
    pub country: Option<CountryBase>,
    #[serde(default)]
    pub sensors: Option<Vec<SensorBase>>,
}

/// The aggregation window of a `/v3/sensors/{id}/days` row.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub label: Option<String>,
    pub interval: Option<String>,
    pub datetime_from: Option<DatetimeObject>,
    pub datetime_to: Option<DatetimeObject>,
}

/// Represents one daily aggregate from `/v3/sensors/{id}/days`.
/// `value` is the daily mean.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailyValueV3 {
    pub value: Option<f64>,
    pub parameter: Option<ParameterBase>,
    pub period: Option<Period>,
}

impl DailyValueV3 {
    /// The UTC start of the day-period, exactly as the API sent it.
    pub fn period_start_utc(&self) -> Option<&str> {
        self.period
            .as_ref()
            .and_then(|p| p.datetime_from.as_ref())
            .and_then(|dt| dt.utc.as_deref())
    }

    pub fn units(&self) -> Option<&str> {
        self.parameter.as_ref().and_then(|p| p.units.as_deref())
    }
}
