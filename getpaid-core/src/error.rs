//! Error types for the `GetPaid` client.
//!
//! Every call through the request pipeline ends in either a decoded body or
//! exactly one [`ApiError`]. The error is a single struct with a closed
//! [`ErrorKind`] discriminator; callers branch on the kind, never on the
//! message text.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Error Kind
// ============================================================================

/// Closed taxonomy of terminal call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was rejected as invalid (400).
    Validation,
    /// Credentials were missing or rejected (401).
    Authentication,
    /// Credentials were valid but lack permission (403).
    Authorization,
    /// The addressed resource does not exist (404).
    NotFound,
    /// Too many requests (429).
    RateLimit {
        /// Seconds to wait before retrying, from the `Retry-After` header.
        retry_after: Option<u64>,
    },
    /// The server failed (500, 502, 503, 504).
    ServerError,
    /// No response was received at all.
    Network,
    /// Any other status, or an undecodable success body.
    Api,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::Authentication => "authentication_error",
            Self::Authorization => "authorization_error",
            Self::NotFound => "not_found",
            Self::RateLimit { .. } => "rate_limit_error",
            Self::ServerError => "server_error",
            Self::Network => "network_error",
            Self::Api => "api_error",
        }
    }

    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::Authentication => "Authentication",
            Self::Authorization => "Authorization",
            Self::NotFound => "Not Found",
            Self::RateLimit { .. } => "Rate Limit",
            Self::ServerError => "Server Error",
            Self::Network => "Network",
            Self::Api => "API",
        }
    }

    /// Whether this kind describes a transient failure.
    ///
    /// Only meaningful for reporting: by the time an [`ApiError`] exists the
    /// retry budget for a transient failure has already been spent.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServerError | Self::Network)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// API Error
// ============================================================================

/// The classified failure of one call.
///
/// Built once at the terminal attempt and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
    details: Option<Value>,
    request_id: Option<String>,
}

impl ApiError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
            request_id: None,
        }
    }

    /// Sets the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the structured details.
    #[must_use]
    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    /// Sets the request-correlation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// The kind discriminator.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, absent for network failures.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Structured details copied from the error body.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Value of the `x-request-id` response header.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Seconds to wait before retrying, only set for rate limiting.
    pub fn retry_after(&self) -> Option<u64> {
        match self.kind {
            ErrorKind::RateLimit { retry_after } => retry_after,
            _ => None,
        }
    }

    /// Stable machine-readable code, see [`ErrorKind::code`].
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

// ============================================================================
// Config Error
// ============================================================================

/// Error raised while building a client or updating its credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// None of the credential variants was supplied.
    #[error("Either apiKey, bearerToken, or token must be provided")]
    MissingCredentials,

    /// A credential update carried an empty value.
    #[error("Empty {0} is not a valid credential")]
    EmptyCredential(&'static str),

    /// The base URL could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP verb is not one the API uses.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The underlying HTTP client could not be created.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorKind::Validation.code(), "validation_error");
        assert_eq!(ErrorKind::NotFound.code(), "not_found");
        assert_eq!(
            ErrorKind::RateLimit { retry_after: None }.code(),
            "rate_limit_error"
        );
        assert_eq!(ErrorKind::Network.code(), "network_error");
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::ServerError.is_transient());
        assert!(ErrorKind::Network.is_transient());
        assert!(!ErrorKind::RateLimit { retry_after: Some(1) }.is_transient());
        assert!(!ErrorKind::Validation.is_transient());
    }

    #[test]
    fn test_api_error_fields() {
        let err = ApiError::new(ErrorKind::Validation, "amount is required")
            .with_status(400)
            .with_details(Some(json!({"field": "amount"})))
            .with_request_id(Some("req_123".to_string()));

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.details(), Some(&json!({"field": "amount"})));
        assert_eq!(err.request_id(), Some("req_123"));
        assert_eq!(err.to_string(), "amount is required");
    }

    #[test]
    fn test_retry_after_only_for_rate_limit() {
        let limited = ApiError::new(ErrorKind::RateLimit { retry_after: Some(30) }, "slow down");
        assert_eq!(limited.retry_after(), Some(30));

        let server = ApiError::new(ErrorKind::ServerError, "boom").with_status(503);
        assert_eq!(server.retry_after(), None);
    }
}
