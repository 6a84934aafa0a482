use std::time::Duration;

const DEFAULT_API_URL: &str = "https://beatsmart.onrender.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Storefront API configuration, passed explicitly to [`crate::StoreClient`].
///
/// There is no hidden global: embedders construct one and hand it over,
/// together with a token provider.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store API. A trailing slash is tolerated.
    pub api_url: String,
    /// Bound on every request. An elapsed request surfaces as a network
    /// error for which [`crate::StoreError::is_timeout`] is true.
    pub request_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl StoreConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Default config with a `BEATS_API_URL` env override for dev/testing.
    pub fn from_env() -> Self {
        match std::env::var("BEATS_API_URL").ok().filter(|s| !s.is_empty()) {
            Some(url) => Self::new(url),
            None => Self::default(),
        }
    }
}
