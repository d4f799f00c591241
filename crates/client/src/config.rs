//! Environment-based client configuration.

use std::env;

/// Default service URL when `NARRATE_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:4100";

/// Connection settings for the audio-generation service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP URL of the service.
    pub api_url: String,
}

impl ClientConfig {
    /// Read configuration from the environment.
    ///
    /// Falls back to [`DEFAULT_API_URL`] when `NARRATE_API_URL` is
    /// unset or empty. Trailing slashes are stripped so path joins
    /// stay well-formed.
    pub fn from_env() -> Self {
        let api_url = env::var("NARRATE_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}
