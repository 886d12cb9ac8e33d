//! Provides a client for interacting with the OpenAQ v3 API.
//!
//! This module defines the `OpenAQClient` struct and its methods for listing locations,
//! the sensors of a location, and daily aggregates of a sensor.

use super::OpenAqApi;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{DailyValueV3, ListResponse, LocationV3, SensorBase};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

/// Rows requested per daily-aggregate call; one call covers ~2.7 years of days.
const DAYS_LIMIT: u32 = 1000;

/// An asynchronous client for fetching data from the OpenAQ API v3.
pub struct OpenAQClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAQClient {
    /// Creates a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.api_key.clone(),
            &config.api_base_url,
            config.request_timeout,
        )
    }

    /// Creates a new `OpenAQClient` with a custom base URL.
    ///
    /// This is primarily intended for testing purposes (e.g., using a mock server).
    #[cfg(test)]
    pub fn new_with_base_url(api_key: Option<String>, base_url: &str) -> Result<Self> {
        Self::build(api_key, base_url, Duration::from_secs(5))
    }

    fn build(api_key: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issues a GET against `endpoint` and decodes the `results` listing.
    ///
    /// The credential check happens before any I/O so a missing key never
    /// surfaces as a network failure.
    async fn get_results<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingCredential)?;

        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .header("X-API-Key", api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", endpoint, e);
                AppError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("API request to {} failed with status {}", endpoint, status);
            // Provide more specific feedback for the common failure modes
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                error!("Received 401/403. Check OPENAQ_API_KEY validity and permissions.");
            } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                error!("Received 429. OpenAQ rate limit reached; retry later.");
            }
            return Err(AppError::upstream(endpoint, status.as_u16(), &body));
        }

        let parsed: ListResponse<T> = serde_json::from_str(&body).map_err(|e| {
            error!("Error parsing {} response JSON: {}", endpoint, e);
            AppError::from(e)
        })?;

        debug!("Received {} results from {}", parsed.results.len(), endpoint);
        Ok(parsed.results)
    }
}

#[async_trait]
impl OpenAqApi for OpenAQClient {
    async fn locations(&self, country_iso: Option<&str>, limit: u32) -> Result<Vec<LocationV3>> {
        info!(
            "Fetching locations for country: {}",
            country_iso.unwrap_or("<any>")
        );
        let mut query = vec![("limit", limit.to_string())];
        if let Some(iso) = country_iso {
            query.push(("iso", iso.to_string()));
        }
        self.get_results("/locations", &query).await
    }

    async fn location_sensors(&self, location_id: i64) -> Result<Vec<SensorBase>> {
        debug!("Fetching sensors for location {}", location_id);
        let endpoint = format!("/locations/{}/sensors", location_id);
        self.get_results(&endpoint, &[]).await
    }

    async fn sensor_days(
        &self,
        sensor_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<DailyValueV3>> {
        info!(
            "Fetching daily values for sensor {} from {} to {}",
            sensor_id, date_from, date_to
        );
        let endpoint = format!("/sensors/{}/days", sensor_id);
        let query = [
            ("datetime_from", format!("{}T00:00:00Z", date_from)),
            ("datetime_to", format!("{}T23:59:59Z", date_to)),
            ("limit", DAYS_LIMIT.to_string()),
        ];
        self.get_results(&endpoint, &query).await
    }
}
