//! Provides clients and utilities for interacting with the OpenAQ v3 API.
//!
//! Includes:
//! - `OpenAqApi`: the seam the pipeline talks to.
//! - `openaq`: the `reqwest` client for the real API.
//! - `mock`: an in-memory double for tests.

#[cfg(test)]
pub(crate) mod mock;
mod openaq;

pub use openaq::*;

use crate::error::Result;
use crate::models::{DailyValueV3, LocationV3, SensorBase};
use async_trait::async_trait;
use chrono::NaiveDate;

/// The three upstream listings the pipeline needs.
///
/// Implementations must report a missing credential as `AppError::MissingCredential`
/// without touching the network, and non-success statuses as `AppError::Upstream`.
#[async_trait]
pub trait OpenAqApi: Send + Sync {
    /// `GET /locations`, optionally filtered by ISO country code.
    async fn locations(&self, country_iso: Option<&str>, limit: u32) -> Result<Vec<LocationV3>>;

    /// `GET /locations/{id}/sensors`.
    async fn location_sensors(&self, location_id: i64) -> Result<Vec<SensorBase>>;

    /// `GET /sensors/{id}/days` for the inclusive UTC date range.
    async fn sensor_days(
        &self,
        sensor_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<DailyValueV3>>;
}
