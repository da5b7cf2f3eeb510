//! Endpoint, key and timeout settings read from the environment.

use std::time::Duration;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local development stack.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Pipeline REST API base URL, without trailing slash.
    pub api_url: String,
    /// Static credential sent as `X-API-Key`.
    pub api_key: String,
    /// Backend-as-a-service base URL, without trailing slash.
    pub baas_url: String,
    /// Backend anon key. Realtime, storage and publish need it.
    pub baas_key: Option<String>,
    /// Detail view re-fetch interval while a story is in progress.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Lifetime of signed asset URLs.
    pub signed_url_ttl: Duration,
}

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                          | Default                  |
    /// |----------------------------------|--------------------------|
    /// | `REELBOARD_API_URL`              | `http://localhost:8000`  |
    /// | `REELBOARD_API_KEY`              | `dev-key-change-me`      |
    /// | `REELBOARD_BAAS_URL`             | `http://localhost:54321` |
    /// | `REELBOARD_BAAS_KEY`             | unset                    |
    /// | `REELBOARD_POLL_INTERVAL_SECS`   | `5`                      |
    /// | `REELBOARD_REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `REELBOARD_SIGNED_URL_TTL_SECS`  | `3600`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string_or = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secs_or = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match lookup(name) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
                    _ => Err(ConfigError::InvalidNumber {
                        var: name,
                        value: raw,
                    }),
                },
            }
        };

        Ok(Self {
            api_url: trim_slash(string_or("REELBOARD_API_URL", "http://localhost:8000")),
            api_key: string_or("REELBOARD_API_KEY", "dev-key-change-me"),
            baas_url: trim_slash(string_or("REELBOARD_BAAS_URL", "http://localhost:54321")),
            baas_key: lookup("REELBOARD_BAAS_KEY")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            poll_interval: secs_or("REELBOARD_POLL_INTERVAL_SECS", 5)?,
            request_timeout: secs_or("REELBOARD_REQUEST_TIMEOUT_SECS", 30)?,
            signed_url_ttl: secs_or("REELBOARD_SIGNED_URL_TTL_SECS", 3600)?,
        })
    }

    /// The backend key, or an error naming the missing variable.
    pub fn require_baas_key(&self) -> Result<&str, ConfigError> {
        self.baas_key
            .as_deref()
            .ok_or(ConfigError::Missing("REELBOARD_BAAS_KEY"))
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
