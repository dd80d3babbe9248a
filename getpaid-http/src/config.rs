//! Client configuration.

use std::time::Duration;

use getpaid_core::ConfigError;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::retry::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY};

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.getpaidhq.co";

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// User agent string sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("getpaid-rust/", env!("CARGO_PKG_VERSION"));

/// Settings recognized by the pipeline at construction.
///
/// Durations are (de)serialized as integer milliseconds under `timeout_ms`
/// and `retry_delay_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL; request paths are appended to it.
    pub base_url: String,
    /// Per-attempt timeout.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub retries: u32,
    /// Base delay of the exponential backoff.
    #[serde(rename = "retry_delay_ms", with = "millis")]
    pub retry_delay: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the backoff base delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Checks that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidBaseUrl(format!(
                "{}: unsupported scheme '{other}'",
                self.base_url
            ))),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
