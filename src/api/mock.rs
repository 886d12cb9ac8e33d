//! In-memory `OpenAqApi` double for tests.
//!
//! Responses are configured per location or sensor id and every call is recorded,
//! so tests can assert both the merged output and the exact request sequence.

use super::OpenAqApi;
use crate::error::{AppError, Result};
use crate::models::{
    CountryBase, DailyValueV3, DatetimeObject, LocationV3, ParameterBase, Period, SensorBase,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    locations: Option<Result<Vec<LocationV3>>>,
    sensors: HashMap<i64, Result<Vec<SensorBase>>>,
    days: HashMap<i64, Result<Vec<DailyValueV3>>>,
    calls: Vec<String>,
}

/// Unconfigured sensor and day lookups answer with an empty listing.
#[derive(Clone, Default)]
pub struct MockOpenAq {
    state: Arc<Mutex<MockState>>,
}

impl MockOpenAq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations(self, locations: Vec<LocationV3>) -> Self {
        self.state.lock().unwrap().locations = Some(Ok(locations));
        self
    }

    pub fn fail_locations(self, err: AppError) -> Self {
        self.state.lock().unwrap().locations = Some(Err(err));
        self
    }

    pub fn with_sensors(self, location_id: i64, sensors: Vec<SensorBase>) -> Self {
        self.state
            .lock()
            .unwrap()
            .sensors
            .insert(location_id, Ok(sensors));
        self
    }

    pub fn fail_sensors(self, location_id: i64, err: AppError) -> Self {
        self.state
            .lock()
            .unwrap()
            .sensors
            .insert(location_id, Err(err));
        self
    }

    pub fn with_days(self, sensor_id: i64, days: Vec<DailyValueV3>) -> Self {
        self.state.lock().unwrap().days.insert(sensor_id, Ok(days));
        self
    }

    pub fn fail_days(self, sensor_id: i64, err: AppError) -> Self {
        self.state.lock().unwrap().days.insert(sensor_id, Err(err));
        self
    }

    /// Every call made so far, e.g. `"locations:IN"`, `"sensors:7"`, `"days:71"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Sensor ids whose daily series were requested, in order.
    pub fn day_requests(&self) -> Vec<i64> {
        self.calls()
            .iter()
            .filter_map(|c| c.strip_prefix("days:"))
            .filter_map(|id| id.parse().ok())
            .collect()
    }
}

#[async_trait]
impl OpenAqApi for MockOpenAq {
    async fn locations(&self, country_iso: Option<&str>, _limit: u32) -> Result<Vec<LocationV3>> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("locations:{}", country_iso.unwrap_or("*")));
        state.locations.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn location_sensors(&self, location_id: i64) -> Result<Vec<SensorBase>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("sensors:{}", location_id));
        state
            .sensors
            .get(&location_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn sensor_days(
        &self,
        sensor_id: i64,
        _date_from: NaiveDate,
        _date_to: NaiveDate,
    ) -> Result<Vec<DailyValueV3>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("days:{}", sensor_id));
        state
            .days
            .get(&sensor_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// --- Fixture builders ---

pub fn parameter(name: &str) -> ParameterBase {
    ParameterBase {
        id: None,
        name: Some(name.to_string()),
        units: Some("µg/m³".to_string()),
        display_name: None,
    }
}

pub fn sensor(id: i64, parameter_name: &str) -> SensorBase {
    SensorBase {
        id,
        name: Some(format!("{} µg/m³", parameter_name)),
        parameter: Some(parameter(parameter_name)),
    }
}

/// A location with embedded sensors given as `(sensor_id, parameter)` pairs.
pub fn location(
    id: i64,
    name: Option<&str>,
    locality: Option<&str>,
    sensors: &[(i64, &str)],
) -> LocationV3 {
    LocationV3 {
        id,
        name: name.map(str::to_string),
        locality: locality.map(str::to_string),
        timezone: Some("UTC".to_string()),
        country: Some(CountryBase {
            id: None,
            code: Some("IN".to_string()),
            name: Some("India".to_string()),
        }),
        sensors: Some(sensors.iter().map(|(sid, p)| sensor(*sid, p)).collect()),
    }
}

/// A daily row whose period starts at the given raw UTC string.
pub fn day(utc: Option<&str>, value: Option<f64>) -> DailyValueV3 {
    DailyValueV3 {
        value,
        parameter: Some(parameter("pm25")),
        period: Some(Period {
            label: Some("1 day".to_string()),
            interval: Some("24:00:00".to_string()),
            datetime_from: Some(DatetimeObject {
                utc: utc.map(str::to_string),
                local: None,
            }),
            datetime_to: None,
        }),
    }
}

/// Consecutive daily rows starting at `start`, one per value.
pub fn days_from(start: NaiveDate, values: &[f64]) -> Vec<DailyValueV3> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let date = start + Duration::days(i as i64);
            day(Some(&format!("{}T00:00:00Z", date)), Some(*v))
        })
        .collect()
}
