//! Location and sensor resolution for a city and pollutant.

use crate::api::OpenAqApi;
use crate::error::{AppError, Result};
use crate::models::{Location, LocationV3, Pollutant, Sensor, SensorDescriptor};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Page size used when searching locations for a city.
const CITY_SEARCH_LIMIT: u32 = 100;
/// Page size used when listing the localities of a country.
const LOCALITY_LIST_LIMIT: u32 = 200;

/// True when `locality` or `name` contains `city_text`, ignoring case.
///
/// Plain substring containment: no trimming, no accent folding.
pub fn matches_city(location: &LocationV3, city_text: &str) -> bool {
    let needle = city_text.to_lowercase();
    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
            .contains(&needle)
    };
    contains(&location.locality) || contains(&location.name)
}

/// True when at least one embedded sensor reports `pollutant`.
pub fn has_pollutant(location: &LocationV3, pollutant: Pollutant) -> bool {
    location
        .sensors
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|s| s.parameter_name() == Some(pollutant.as_str()))
}

fn to_location(raw: LocationV3) -> Location {
    let sensors = raw
        .sensors
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| {
            let parameter = s.parameter_name()?.to_string();
            Some(SensorDescriptor {
                id: s.id,
                unit: s.units().map(str::to_string),
                parameter,
            })
        })
        .collect();

    Location {
        id: raw.id,
        name: raw.name,
        locality: raw.locality,
        country_code: raw.country.and_then(|c| c.code),
        timezone: raw.timezone,
        sensors,
    }
}

/// Finds the monitoring locations of a city that expose `pollutant`.
///
/// Upstream listing order is preserved. Zero matches is `AppError::NoMatch`.
pub async fn resolve_locations<A: OpenAqApi + ?Sized>(
    api: &A,
    country_iso: Option<&str>,
    city_text: &str,
    pollutant: Pollutant,
) -> Result<Vec<Location>> {
    let raw = api.locations(country_iso, CITY_SEARCH_LIMIT).await?;
    let listed = raw.len();

    let locations: Vec<Location> = raw
        .into_iter()
        .filter(|loc| matches_city(loc, city_text) && has_pollutant(loc, pollutant))
        .map(to_location)
        .collect();

    info!(
        "{} of {} locations match city '{}' with {} sensors",
        locations.len(),
        listed,
        city_text,
        pollutant
    );

    if locations.is_empty() {
        return Err(AppError::NoMatch(
            "No matching locations with that city + parameter. Try adjusting city text or country ISO."
                .to_string(),
        ));
    }
    Ok(locations)
}

/// Lists the sensors of one location that report `pollutant` (exact name match).
pub async fn resolve_sensors<A: OpenAqApi + ?Sized>(
    api: &A,
    location_id: i64,
    pollutant: Pollutant,
) -> Result<Vec<Sensor>> {
    let sensors: Vec<Sensor> = api
        .location_sensors(location_id)
        .await?
        .into_iter()
        .filter(|s| s.parameter_name() == Some(pollutant.as_str()))
        .map(|s| Sensor {
            id: s.id,
            location_id,
            parameter: pollutant.as_str().to_string(),
            unit: s.units().map(str::to_string),
        })
        .collect();

    debug!(
        "Location {} has {} {} sensors",
        location_id,
        sensors.len(),
        pollutant
    );

    if sensors.is_empty() {
        return Err(AppError::NoMatch(
            "No sensors for that parameter at this location.".to_string(),
        ));
    }
    Ok(sensors)
}

/// Sorted, deduplicated locality names (falling back to the location name)
/// of every location in a country that exposes `pollutant`.
pub async fn list_distinct_localities<A: OpenAqApi + ?Sized>(
    api: &A,
    country_iso: &str,
    pollutant: Pollutant,
) -> Result<Vec<String>> {
    let raw = api.locations(Some(country_iso), LOCALITY_LIST_LIMIT).await?;

    let names: BTreeSet<String> = raw
        .iter()
        .filter(|loc| has_pollutant(loc, pollutant))
        .filter_map(|loc| {
            // An empty locality falls back to the name as well
            let label = loc
                .locality
                .as_deref()
                .filter(|l| !l.is_empty())
                .or(loc.name.as_deref())
                .unwrap_or("")
                .trim();
            (!label.is_empty()).then(|| label.to_string())
        })
        .collect();

    if names.is_empty() {
        return Err(AppError::NoMatch(
            "No cities with that pollutant in this country.".to_string(),
        ));
    }
    Ok(names.into_iter().collect())
}
