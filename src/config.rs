//! Runtime configuration.
//!
//! Configuration is via environment variables:
//! - `TRAMITE_API_URL` - API base URL (default: `http://127.0.0.1:8000`)
//! - `TRAMITE_AUTH_URL` - Identity provider base URL (sign-in disabled when unset)
//! - `TRAMITE_AUTH_KEY` - Public key sent to the identity provider as `apikey`
//! - `TRAMITE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)

use std::time::Duration;

use thiserror::Error;

/// Default URL for local development.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub auth_url: Option<String>,
    pub auth_key: Option<String>,
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("TRAMITE_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match std::env::var("TRAMITE_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "TRAMITE_HTTP_TIMEOUT_SECS",
                    value: raw,
                })?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url: trim_base(api_url),
            auth_url: std::env::var("TRAMITE_AUTH_URL").ok().map(trim_base),
            auth_key: std::env::var("TRAMITE_AUTH_KEY").ok(),
            timeout,
        })
    }

    /// Create with an explicit API URL and no identity provider.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: trim_base(api_url.into()),
            auth_url: None,
            auth_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_auth(mut self, auth_url: impl Into<String>, auth_key: impl Into<String>) -> Self {
        self.auth_url = Some(trim_base(auth_url.into()));
        self.auth_key = Some(auth_key.into());
        self
    }

    /// Shared HTTP client honoring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// Paths are appended as `/empresas/`, so the base must not end in a slash.
fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slashes() {
        let config = Config::new("http://localhost:8000/");
        assert_eq!(config.api_url, "http://localhost:8000");
    }

    #[test]
    fn with_auth_sets_both_fields() {
        let config = Config::new(DEFAULT_API_URL).with_auth("https://auth.example/", "anon");
        assert_eq!(config.auth_url.as_deref(), Some("https://auth.example"));
        assert_eq!(config.auth_key.as_deref(), Some("anon"));
    }
}
