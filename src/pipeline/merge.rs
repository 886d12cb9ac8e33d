//! Assembles a bounded multi-sensor sample for a city.
//!
//! Locations are visited in resolver order, sensors within a location in resolver
//! order, one request at a time. Failures of a single location or sensor are logged
//! and skipped; only a total absence of data is reported to the caller.

use super::resolver::{resolve_locations, resolve_sensors};
use super::series::fetch_daily_series;
use crate::api::OpenAqApi;
use crate::error::{AppError, Result};
use crate::models::{Location, Pollutant, Reading, SensorChoice, UnifiedSeries};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Caps on how many sensors a single analysis may pull from upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchBudget {
    /// Sensors tried per location (first N in resolver order).
    pub per_location: usize,
    /// Successful sensors after which fetching stops altogether.
    pub total: usize,
}

impl Default for FetchBudget {
    fn default() -> Self {
        Self {
            per_location: 3,
            total: 5,
        }
    }
}

impl FetchBudget {
    fn tracker(self) -> BudgetTracker {
        BudgetTracker {
            budget: self,
            contributed: 0,
        }
    }
}

/// Running count of sensors that contributed data, checked against a `FetchBudget`.
#[derive(Debug)]
struct BudgetTracker {
    budget: FetchBudget,
    contributed: usize,
}

impl BudgetTracker {
    fn record_success(&mut self) {
        self.contributed += 1;
    }

    fn exhausted(&self) -> bool {
        self.contributed >= self.budget.total
    }
}

fn tag_with_location(mut readings: Vec<Reading>, location: &Location) -> Vec<Reading> {
    let name = location.label();
    for r in &mut readings {
        r.location_id = Some(location.id);
        r.location_name = Some(name.clone());
    }
    readings
}

fn no_usable_data() -> AppError {
    AppError::NoUsableData(
        "Found locations, but could not fetch daily series for sensors in this period."
            .to_string(),
    )
}

/// Fetches and concatenates daily series for a city with the default budget
/// (at most 3 sensors per location, stopping after 5 successful sensors).
pub async fn fetch_city_parameter_daily<A: OpenAqApi + ?Sized>(
    api: &A,
    country_iso: Option<&str>,
    city_text: &str,
    pollutant: Pollutant,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<UnifiedSeries> {
    fetch_city_parameter_daily_with_budget(
        api,
        country_iso,
        city_text,
        pollutant,
        date_from,
        date_to,
        FetchBudget::default(),
    )
    .await
}

/// Same as [`fetch_city_parameter_daily`] with explicit caps.
pub async fn fetch_city_parameter_daily_with_budget<A: OpenAqApi + ?Sized>(
    api: &A,
    country_iso: Option<&str>,
    city_text: &str,
    pollutant: Pollutant,
    date_from: NaiveDate,
    date_to: NaiveDate,
    budget: FetchBudget,
) -> Result<UnifiedSeries> {
    let locations = resolve_locations(api, country_iso, city_text, pollutant).await?;

    let mut tracker = budget.tracker();
    let mut parts: Vec<Vec<Reading>> = Vec::new();

    'locations: for location in &locations {
        let sensors = match resolve_sensors(api, location.id, pollutant).await {
            Ok(sensors) => sensors,
            Err(e) => {
                warn!("Skipping location {}: {}", location.id, e);
                continue;
            },
        };

        for sensor in sensors.iter().take(tracker.budget.per_location) {
            match fetch_daily_series(api, sensor.id, date_from, date_to).await {
                Ok(readings) => {
                    debug!(
                        "Sensor {} at location {} contributed {} readings",
                        sensor.id,
                        location.id,
                        readings.len()
                    );
                    parts.push(tag_with_location(readings, location));
                    tracker.record_success();
                    if tracker.exhausted() {
                        break 'locations;
                    }
                },
                Err(e) => warn!("Skipping sensor {}: {}", sensor.id, e),
            }
        }
    }

    if parts.is_empty() {
        return Err(no_usable_data());
    }

    let series = UnifiedSeries::from_parts(parts);
    info!(
        "Merged {} readings from {} sensors for '{}'",
        series.len(),
        tracker.contributed,
        city_text
    );
    Ok(series)
}

/// Lists every sensor in a city that reports `pollutant`, labelled for a picker.
pub async fn list_sensors_in_city<A: OpenAqApi + ?Sized>(
    api: &A,
    country_iso: Option<&str>,
    city_text: &str,
    pollutant: Pollutant,
) -> Result<Vec<SensorChoice>> {
    let locations = resolve_locations(api, country_iso, city_text, pollutant).await?;

    let mut choices = Vec::new();
    for location in &locations {
        let sensors = match resolve_sensors(api, location.id, pollutant).await {
            Ok(sensors) => sensors,
            Err(e) => {
                debug!("No sensors listed for location {}: {}", location.id, e);
                continue;
            },
        };
        choices.extend(sensors.into_iter().map(|s| SensorChoice {
            label: format!("{} • {} • sensor {}", location.label(), s.parameter, s.id),
            sensor_id: s.id,
        }));
    }

    if choices.is_empty() {
        return Err(AppError::NoMatch(
            "No sensors found for that city + pollutant.".to_string(),
        ));
    }
    Ok(choices)
}

/// Fetches exactly the chosen sensors of a city, skipping any that fail.
///
/// An explicit choice is not subject to the fetch budget.
pub async fn fetch_selected_sensors_daily<A: OpenAqApi + ?Sized>(
    api: &A,
    country_iso: Option<&str>,
    city_text: &str,
    pollutant: Pollutant,
    sensor_ids: &[i64],
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<UnifiedSeries> {
    let locations = resolve_locations(api, country_iso, city_text, pollutant).await?;

    let mut found_any = false;
    let mut parts: Vec<Vec<Reading>> = Vec::new();

    for location in &locations {
        let sensors = match resolve_sensors(api, location.id, pollutant).await {
            Ok(sensors) => sensors,
            Err(e) => {
                warn!("Skipping location {}: {}", location.id, e);
                continue;
            },
        };

        for sensor in sensors.iter().filter(|s| sensor_ids.contains(&s.id)) {
            found_any = true;
            match fetch_daily_series(api, sensor.id, date_from, date_to).await {
                Ok(readings) => parts.push(tag_with_location(readings, location)),
                Err(e) => warn!("Skipping sensor {}: {}", sensor.id, e),
            }
        }
    }

    if !found_any {
        return Err(AppError::NoMatch(format!(
            "None of the selected sensors {:?} report {} in '{}'.",
            sensor_ids, pollutant, city_text
        )));
    }
    if parts.is_empty() {
        return Err(no_usable_data());
    }
    Ok(UnifiedSeries::from_parts(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{days_from, location, sensor, MockOpenAq};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn run(api: &MockOpenAq) -> Result<UnifiedSeries> {
        fetch_city_parameter_daily(
            api,
            Some("IN"),
            "delhi",
            Pollutant::Pm25,
            date(2024, 1, 1),
            date(2024, 1, 10),
        )
        .await
    }

    #[tokio::test]
    async fn zero_locations_propagates_no_match() {
        let api = MockOpenAq::new().with_locations(vec![]);
        let err = run(&api).await.unwrap_err();
        assert!(matches!(err, AppError::NoMatch(_)));
        assert!(api.day_requests().is_empty());
    }

    #[tokio::test]
    async fn locations_failure_propagates_unchanged() {
        let api = MockOpenAq::new().fail_locations(AppError::upstream("/locations", 403, "nope"));
        let err = run(&api).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 403, .. }));
    }

    #[tokio::test]
    async fn every_sensor_failing_is_no_usable_data() {
        let api = MockOpenAq::new()
            .with_locations(vec![location(1, Some("A"), Some("Delhi"), &[(11, "pm25")])])
            .with_sensors(1, vec![sensor(11, "pm25"), sensor(12, "pm25")])
            .fail_days(11, AppError::upstream("/sensors/11/days", 500, "err"))
            .with_days(12, vec![]);

        let err = run(&api).await.unwrap_err();
        match err {
            AppError::NoUsableData(msg) => {
                assert!(msg.starts_with("Found locations, but could not fetch daily series"))
            },
            other => panic!("Expected NoUsableData, got {:?}", other),
        }
        assert_eq!(api.day_requests(), vec![11, 12]);
    }

    #[tokio::test]
    async fn failed_sensor_listing_skips_location() {
        let start = date(2024, 1, 1);
        let api = MockOpenAq::new()
            .with_locations(vec![
                location(1, Some("A"), Some("Delhi"), &[(11, "pm25")]),
                location(2, Some("B"), Some("Delhi"), &[(21, "pm25")]),
            ])
            .fail_sensors(1, AppError::upstream("/locations/1/sensors", 500, "err"))
            .with_sensors(2, vec![sensor(21, "pm25")])
            .with_days(21, days_from(start, &[5.0, 6.0]));

        let series = run(&api).await.unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.readings().iter().all(|r| r.location_id == Some(2)));
        assert!(series
            .readings()
            .iter()
            .all(|r| r.location_name.as_deref() == Some("B")));
    }

    #[tokio::test]
    async fn at_most_three_sensors_per_location() {
        let start = date(2024, 1, 1);
        let api = MockOpenAq::new()
            .with_locations(vec![location(1, Some("A"), Some("Delhi"), &[(11, "pm25")])])
            .with_sensors(
                1,
                (11..=15).map(|id| sensor(id, "pm25")).collect(),
            )
            .with_days(11, days_from(start, &[1.0]))
            .with_days(12, days_from(start, &[2.0]))
            .with_days(13, days_from(start, &[3.0]))
            .with_days(14, days_from(start, &[4.0]))
            .with_days(15, days_from(start, &[5.0]));

        let series = run(&api).await.unwrap();
        assert_eq!(api.day_requests(), vec![11, 12, 13]);
        assert_eq!(series.sensor_ids(), vec![11, 12, 13]);
    }

    #[tokio::test]
    async fn stops_after_five_successful_sensors_across_locations() {
        let start = date(2024, 1, 1);
        let mut api = MockOpenAq::new().with_locations(vec![
            location(1, Some("A"), Some("Delhi"), &[(11, "pm25")]),
            location(2, Some("B"), Some("Delhi"), &[(21, "pm25")]),
            location(3, Some("C"), Some("Delhi"), &[(31, "pm25")]),
        ]);
        for loc in 1..=3i64 {
            let ids: Vec<i64> = (1..=3).map(|s| loc * 10 + s).collect();
            api = api.with_sensors(loc, ids.iter().map(|id| sensor(*id, "pm25")).collect());
            for id in ids {
                api = api.with_days(id, days_from(start, &[id as f64]));
            }
        }
        // A failure inside the budget does not count towards it
        api = api.fail_days(12, AppError::NoMatch("none".into()));

        let series = run(&api).await.unwrap();

        assert_eq!(api.day_requests(), vec![11, 12, 13, 21, 22, 23]);
        assert_eq!(series.sensor_ids().len(), 5);
        assert!(!api.calls().contains(&"sensors:3".to_string()));
    }

    #[tokio::test]
    async fn custom_budget_is_respected() {
        let start = date(2024, 1, 1);
        let api = MockOpenAq::new()
            .with_locations(vec![
                location(1, Some("A"), Some("Delhi"), &[(11, "pm25")]),
                location(2, Some("B"), Some("Delhi"), &[(21, "pm25")]),
            ])
            .with_sensors(1, vec![sensor(11, "pm25"), sensor(12, "pm25")])
            .with_sensors(2, vec![sensor(21, "pm25")])
            .with_days(11, days_from(start, &[1.0]))
            .with_days(12, days_from(start, &[2.0]))
            .with_days(21, days_from(start, &[3.0]));

        let budget = FetchBudget {
            per_location: 1,
            total: 2,
        };
        let series = fetch_city_parameter_daily_with_budget(
            &api,
            None,
            "delhi",
            Pollutant::Pm25,
            start,
            date(2024, 1, 2),
            budget,
        )
        .await
        .unwrap();
        assert_eq!(api.day_requests(), vec![11, 21]);
        assert_eq!(series.sensor_ids(), vec![11, 21]);
    }

    #[tokio::test]
    async fn same_day_readings_from_different_sensors_are_kept() {
        let start = date(2024, 1, 1);
        let api = MockOpenAq::new()
            .with_locations(vec![location(1, Some("A"), Some("Delhi"), &[(11, "pm25")])])
            .with_sensors(1, vec![sensor(11, "pm25"), sensor(12, "pm25")])
            .with_days(11, days_from(start, &[10.0, 11.0]))
            .with_days(12, days_from(start, &[20.0, 21.0]));

        let series = run(&api).await.unwrap();
        assert_eq!(series.len(), 4);
        let values: Vec<f64> = series.readings().iter().filter_map(|r| r.value).collect();
        assert_eq!(values, vec![10.0, 20.0, 11.0, 21.0]);
    }

    #[tokio::test]
    async fn sensor_choices_are_labelled_per_location() {
        let api = MockOpenAq::new()
            .with_locations(vec![
                location(1, Some("Anand Vihar"), Some("Delhi"), &[(11, "pm25")]),
                location(2, Some("ITO"), Some("Delhi"), &[(21, "pm25")]),
            ])
            .with_sensors(1, vec![sensor(11, "pm25"), sensor(12, "pm10")])
            .with_sensors(2, vec![sensor(21, "pm25")]);

        let choices = list_sensors_in_city(&api, Some("IN"), "delhi", Pollutant::Pm25)
            .await
            .unwrap();
        assert_eq!(
            choices,
            vec![
                SensorChoice {
                    sensor_id: 11,
                    label: "Anand Vihar • pm25 • sensor 11".to_string()
                },
                SensorChoice {
                    sensor_id: 21,
                    label: "ITO • pm25 • sensor 21".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn no_sensor_choices_is_no_match() {
        let api = MockOpenAq::new()
            .with_locations(vec![location(1, Some("A"), Some("Delhi"), &[(11, "pm25")])])
            .with_sensors(1, vec![sensor(12, "pm10")]);
        let err = list_sensors_in_city(&api, Some("IN"), "delhi", Pollutant::Pm25)
            .await
            .unwrap_err();
        match err {
            AppError::NoMatch(msg) => assert_eq!(msg, "No sensors found for that city + pollutant."),
            other => panic!("Expected NoMatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn selected_sensors_bypass_the_budget() {
        let start = date(2024, 1, 1);
        let mut api = MockOpenAq::new()
            .with_locations(vec![location(1, Some("A"), Some("Delhi"), &[(11, "pm25")])])
            .with_sensors(1, (11..=16).map(|id| sensor(id, "pm25")).collect());
        for id in 11..=16 {
            api = api.with_days(id, days_from(start, &[id as f64]));
        }

        let chosen = [12, 13, 14, 15, 16, 999];
        let series = fetch_selected_sensors_daily(
            &api,
            Some("IN"),
            "delhi",
            Pollutant::Pm25,
            &chosen,
            start,
            date(2024, 1, 1),
        )
        .await
        .unwrap();
        assert_eq!(api.day_requests(), vec![12, 13, 14, 15, 16]);
        assert_eq!(series.len(), 5);
    }

    #[tokio::test]
    async fn selected_sensors_not_in_city_is_no_match() {
        let api = MockOpenAq::new()
            .with_locations(vec![location(1, Some("A"), Some("Delhi"), &[(11, "pm25")])])
            .with_sensors(1, vec![sensor(11, "pm25")]);
        let err = fetch_selected_sensors_daily(
            &api,
            None,
            "delhi",
            Pollutant::Pm25,
            &[42],
            date(2024, 1, 1),
            date(2024, 1, 2),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NoMatch(_)));
        assert!(api.day_requests().is_empty());
    }
}
