//! Runtime configuration loaded from the environment (with optional `.env` support).
//!
//! Per-run inputs such as the city or the date range come from CLI flags or prompts;
//! this module only covers the values that stay fixed for the lifetime of the process.

use crate::error::{AppError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.openaq.org/v3";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Strongly typed application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAQ API key. `None` when unset or blank.
    pub api_key: Option<String>,
    /// OpenAQ v3 base URL.
    pub api_base_url: String,
    /// Per-request ceiling; a request running longer is a network error.
    pub request_timeout: Duration,
    /// Root directory for generated charts and reports.
    pub output_dir: PathBuf,
    /// Directory for the rotated JSON log file, if file logging is wanted.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// Recognised variables:
    /// - `OPENAQ_API_KEY` – API key (optional here, checked before each request)
    /// - `OPENAQ_BASE_URL` – API base URL (default: `https://api.openaq.org/v3`)
    /// - `OPENAQ_TIMEOUT_SECS` – request timeout in seconds (default: 30)
    /// - `AQ_OUTPUT_DIR` – output root (default: `outputs`)
    /// - `AQ_LOG_DIR` – enables JSON file logging into this directory
    pub fn from_env() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let api_key = non_blank("OPENAQ_API_KEY");
        let api_base_url = non_blank("OPENAQ_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match non_blank("OPENAQ_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                AppError::Config(format!("Invalid OPENAQ_TIMEOUT_SECS '{}': {}", raw, e))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(AppError::Config(
                "OPENAQ_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let output_dir = non_blank("AQ_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let log_dir = non_blank("AQ_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            api_key,
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            output_dir,
            log_dir,
        })
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.output_dir.join("charts")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.output_dir.join("reports")
    }

    /// Log the loaded configuration, masking the API key.
    pub fn log_config(&self) {
        let masked_key = mask_key(self.api_key.as_deref());

        info!("Configuration loaded:");
        info!("  OPENAQ_API_KEY      : {}", masked_key);
        info!("  OPENAQ_BASE_URL     : {}", self.api_base_url);
        info!("  OPENAQ_TIMEOUT_SECS : {}", self.request_timeout.as_secs());
        info!("  AQ_OUTPUT_DIR       : {}", self.output_dir.display());
        info!(
            "  AQ_LOG_DIR          : {}",
            self.log_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

/// Keeps only the last four characters of the key visible.
fn mask_key(key: Option<&str>) -> String {
    match key {
        Some(key) if key.chars().count() > 4 => {
            let tail: String = key.chars().skip(key.chars().count() - 4).collect();
            format!("****{}", tail)
        },
        Some(_) => "****".to_string(),
        None => "<not set>".to_string(),
    }
}

/// Reads an environment variable, treating blank values as unset.
fn non_blank(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
