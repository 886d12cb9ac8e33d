//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all application-specific errors.
///
/// The first four variants are the expected outcomes of talking to OpenAQ:
/// a caller can tell "no data" apart from "system broken" via [`AppError::is_soft`],
/// while both still travel through the same `Result` channel.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// No API key configured. Detected before any request is sent.
    #[error("Missing OpenAQ API key. Set OPENAQ_API_KEY in .env.")]
    MissingCredential,

    /// The upstream API answered with a non-success status.
    #[error("{endpoint} {status}: {body_excerpt}")]
    Upstream {
        endpoint: String,
        status: u16,
        body_excerpt: String,
    },

    /// A filter (city text, pollutant, period) produced zero results.
    #[error("{0}")]
    NoMatch(String),

    /// Candidates were found but none of them produced usable data.
    #[error("{0}")]
    NoUsableData(String),

    /// Transport failure or timeout from the HTTP client (`reqwest`).
    #[error("Network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Error during JSON parsing (`serde_json`). Wrapped in Arc as serde_json::Error is not Clone.
    #[error("JSON Parsing Error: {0}")]
    JsonParse(Arc<serde_json::Error>),

    /// Invalid or unreadable configuration value.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Error writing the daily CSV export.
    #[error("CSV Error: {0}")]
    Csv(Arc<csv::Error>),

    /// Error rendering a chart with `plotters`.
    #[error("Chart Error: {0}")]
    Chart(String),

    /// Error specific to CLI logic or argument handling.
    #[error("CLI Error: {0}")]
    Cli(String),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Dialoguer Error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    /// Error related to progress bar style templating (`indicatif`).
    #[error("Progress Style Template Error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),
}

impl AppError {
    /// Builds an `Upstream` error, keeping at most 240 characters of the response body.
    pub fn upstream(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        AppError::Upstream {
            endpoint: endpoint.into(),
            status,
            body_excerpt: body.chars().take(240).collect(),
        }
    }

    /// True for the outcomes a merge loop may absorb and skip past.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            AppError::MissingCredential
                | AppError::Upstream { .. }
                | AppError::NoMatch(_)
                | AppError::NoUsableData(_)
                | AppError::Network(_)
                | AppError::JsonParse(_)
        )
    }
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---
// These allow easy conversion from external error types into AppError
// using the `?` operator. Arc is used for non-Clone error types.

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse(Arc::new(err))
    }
}
