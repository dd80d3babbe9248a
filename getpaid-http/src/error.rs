//! Transport error types.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single attempt before any response was received.
///
/// Every variant classifies as a network failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The attempt exceeded the per-attempt timeout.
    #[error("timeout of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    /// The connection could not be established (DNS, refused, TLS).
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request could not be built (bad URL, header or body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure while sending or reading the response.
    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// Converts a `reqwest` error, reporting timeouts with the configured limit.
    ///
    /// The message carries the whole source chain, so a DNS failure and a
    /// refused connection stay distinguishable.
    pub fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connect(error_chain(err))
        } else if err.is_builder() {
            Self::InvalidRequest(error_chain(err))
        } else {
            Self::Request(error_chain(err))
        }
    }

    /// Whether sending the same request again could succeed.
    ///
    /// A request that could not be built fails identically on every attempt.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }
}

/// Joins an error and its sources with `": "`, skipping repeated messages.
fn error_chain(err: &dyn StdError) -> String {
    let mut parts: Vec<String> = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !message.is_empty() && parts.iter().all(|p| !p.contains(&message)) {
            parts.push(message);
        }
        source = cause.source();
    }
    parts.join(": ")
}
