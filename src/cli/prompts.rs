//! Interactive prompts used by the menu mode (`dialoguer`).

use crate::error::{AppError, Result};
use crate::models::{Pollutant, SensorChoice};
use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect, Input, MultiSelect, Select};

const DEFAULT_COUNTRY: &str = "IN";
const DEFAULT_CITY: &str = "New Delhi";

/// ISO country code; an empty answer means "any country".
pub fn prompt_country() -> Result<Option<String>> {
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Country ISO (e.g. IN, US, SA; empty for any)")
        .default(DEFAULT_COUNTRY.to_string())
        .allow_empty(true)
        .interact_text()?;
    Ok(super::normalize_country(&raw))
}

pub fn prompt_pollutant() -> Result<Pollutant> {
    let items: Vec<&str> = Pollutant::ALL.iter().map(|p| p.as_str()).collect();
    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Pollutant")
        .items(&items)
        .default(0)
        .interact()?;
    Pollutant::ALL
        .get(idx)
        .copied()
        .ok_or_else(|| AppError::Cli(format!("Invalid pollutant selection {}", idx)))
}

/// Picks a city from the known localities, or asks for free text when none are known.
pub fn prompt_city(known: &[String]) -> Result<String> {
    if known.is_empty() {
        let city: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("City (free text)")
            .default(DEFAULT_CITY.to_string())
            .interact_text()?;
        return Ok(city.trim().to_string());
    }
    let idx = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("City")
        .items(known)
        .default(0)
        .interact()?;
    known
        .get(idx)
        .cloned()
        .ok_or_else(|| AppError::Cli(format!("Invalid city selection {}", idx)))
}

pub fn confirm_sensor_pick() -> Result<bool> {
    let pick = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Pick specific sensors (optional)?")
        .default(false)
        .interact()?;
    Ok(pick)
}

/// Multi-select over the city's sensors; an empty result means automatic selection.
pub fn prompt_sensors(choices: &[SensorChoice]) -> Result<Vec<i64>> {
    if choices.is_empty() {
        return Ok(Vec::new());
    }
    let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Sensors (space to toggle, enter to confirm)")
        .items(&labels)
        .interact()?;
    Ok(picked
        .into_iter()
        .filter_map(|i| choices.get(i).map(|c| c.sensor_id))
        .collect())
}

pub fn prompt_date(label: &str, default: NaiveDate) -> Result<NaiveDate> {
    let date: NaiveDate = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{} (YYYY-MM-DD)", label))
        .default(default)
        .interact_text()?;
    Ok(date)
}

pub fn prompt_guideline(default: f64) -> Result<f64> {
    let value: f64 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("WHO 24h guideline (µg/m³)")
        .default(default)
        .validate_with(|v: &f64| -> std::result::Result<(), &str> {
            if v.is_finite() && *v >= 0.0 {
                Ok(())
            } else {
                Err("Guideline must be a non-negative number")
            }
        })
        .interact_text()?;
    Ok(value)
}

pub fn prompt_window(default: usize) -> Result<usize> {
    let value: usize = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Rolling window (days)")
        .default(default)
        .validate_with(|v: &usize| -> std::result::Result<(), &str> {
            if *v >= 1 {
                Ok(())
            } else {
                Err("Window must be at least 1 day")
            }
        })
        .interact_text()?;
    Ok(value)
}

pub fn prompt_report_name(default: String) -> Result<String> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Report name")
        .default(default)
        .interact_text()?;
    Ok(name.trim().to_string())
}
