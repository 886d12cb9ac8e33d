//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes the clap command definitions, the command handlers that drive the
//! pipeline and print results, and the `dialoguer` prompts of the interactive menu.

mod commands;
pub mod prompts;

pub use commands::*;

/// Trimmed, upper-cased ISO code; blank input means no country filter.
pub fn normalize_country(raw: &str) -> Option<String> {
    let iso = raw.trim().to_uppercase();
    (!iso.is_empty()).then_some(iso)
}

#[cfg(test)]
mod tests {
    use super::normalize_country;

    #[test]
    fn country_codes_are_normalized() {
        assert_eq!(normalize_country(" in "), Some("IN".to_string()));
        assert_eq!(normalize_country("US"), Some("US".to_string()));
        assert_eq!(normalize_country("   "), None);
    }
}
