//! Endpoint configuration for the portal API, read from the environment with
//! an optional programmatic override. Values are public endpoints and knobs;
//! do not store secrets here.

use std::env;
use std::time::Duration;

/// Environment variable naming the API base URL.
pub const API_BASE_URL_VAR: &str = "GARDISTO_API_BASE_URL";
/// Environment variable overriding the request timeout, in milliseconds.
pub const TIMEOUT_MS_VAR: &str = "GARDISTO_TIMEOUT_MS";

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Client configuration derived from environment variables.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub timeout: Duration,
}

impl PortalConfig {
    /// Loads config from the environment, falling back to the local-dev
    /// defaults used by the portal backend.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(value) = env_value(API_BASE_URL_VAR) {
            config.api_base_url = value.trim_end_matches('/').to_string();
        }
        if let Some(ms) = env_value(TIMEOUT_MS_VAR).and_then(|value| value.parse::<u64>().ok()) {
            config.timeout = Duration::from_millis(ms);
        }

        config
    }

    /// Overrides the base URL, trimming a trailing slash so path joins stay
    /// predictable.
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Reads an environment variable, treating unset and blank the same.
fn env_value(name: &str) -> Option<String> {
    let value = env::var(name).ok()?;
    normalize_value(&value)
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_value_trims_and_rejects_empty() {
        assert_eq!(normalize_value(""), None);
        assert_eq!(normalize_value("   "), None);
        assert_eq!(
            normalize_value("  https://portal.example "),
            Some("https://portal.example".to_string())
        );
    }

    #[test]
    fn load_defaults_when_env_is_unset() {
        temp_env::with_vars(
            [(API_BASE_URL_VAR, None::<&str>), (TIMEOUT_MS_VAR, None)],
            || {
                let config = PortalConfig::load();
                assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
                assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
            },
        );
    }

    #[test]
    fn load_reads_env_overrides() {
        temp_env::with_vars(
            [
                (API_BASE_URL_VAR, Some("https://api.portal.example/")),
                (TIMEOUT_MS_VAR, Some("2500")),
            ],
            || {
                let config = PortalConfig::load();
                assert_eq!(config.api_base_url, "https://api.portal.example");
                assert_eq!(config.timeout, Duration::from_millis(2500));
            },
        );
    }

    #[test]
    fn load_ignores_blank_and_unparsable_values() {
        temp_env::with_vars(
            [
                (API_BASE_URL_VAR, Some("   ")),
                (TIMEOUT_MS_VAR, Some("soon")),
            ],
            || {
                let config = PortalConfig::load();
                assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
                assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
            },
        );
    }

    #[test]
    fn builder_overrides_win() {
        let config = PortalConfig::default()
            .with_api_base_url("https://override.example/")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.api_base_url, "https://override.example");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
