//! Defines the data structures and models used throughout the application.
//!
//! `openaq` holds the wire structures deserialized from the OpenAQ v3 API;
//! `air_quality` holds the domain types the pipeline, indicators and reports share.

mod air_quality;
mod openaq;

pub use air_quality::*;
pub use openaq::*;
