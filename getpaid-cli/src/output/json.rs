//! JSON output formatting.

use anyhow::Result;
use getpaid_core::{ApiError, ConfigError};
use getpaid_http::{Attempt, PipelineOutcome};
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a completed request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOutput {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub attempts: Vec<AttemptOutput>,
    pub duration_ms: u64,
    pub body: Value,
}

/// A single attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutput {
    pub number: u32,
    pub delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Attempt> for AttemptOutput {
    fn from(attempt: &Attempt) -> Self {
        Self {
            number: attempt.number,
            delay_ms: millis(attempt.delay),
            status: attempt.status,
            error: attempt.error.clone(),
        }
    }
}

/// JSON output for a failed command.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub error: ErrorDetail,
}

/// Error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorOutput {
    /// Builds the error output, keeping API error fields when present.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let detail = if let Some(api) = err.downcast_ref::<ApiError>() {
            ErrorDetail {
                code: api.code().to_string(),
                message: api.message().to_string(),
                status: api.status(),
                request_id: api.request_id().map(str::to_string),
                retry_after: api.retry_after(),
                details: api.details().cloned(),
            }
        } else {
            let code = if err.downcast_ref::<ConfigError>().is_some() {
                "config_error"
            } else {
                "cli_error"
            };
            ErrorDetail {
                code: code.to_string(),
                message: format!("{err:#}"),
                status: None,
                request_id: None,
                retry_after: None,
                details: None,
            }
        };

        Self { error: detail }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a successful pipeline outcome with its decoded body.
    pub fn format_response(&self, outcome: &PipelineOutcome, body: Value) -> Result<String> {
        let (status, request_id) = match &outcome.result {
            Ok(response) => (response.status, response.request_id().map(str::to_string)),
            Err(err) => (err.status().unwrap_or_default(), err.request_id().map(str::to_string)),
        };

        self.format(&ResponseOutput {
            status,
            request_id,
            attempts: outcome.attempts.iter().map(AttemptOutput::from).collect(),
            duration_ms: millis(outcome.duration),
            body,
        })
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
