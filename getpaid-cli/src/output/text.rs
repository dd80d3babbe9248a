//! Text output formatting.

use getpaid_core::ApiError;
use getpaid_http::Attempt;
use serde_json::Value;

/// Plain text formatter.
#[derive(Debug, Default)]
pub struct TextFormatter;

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new() -> Self {
        Self
    }

    /// Formats a command failure, with API error fields on separate lines.
    pub fn format_error(&self, err: &anyhow::Error) -> String {
        let Some(api) = err.downcast_ref::<ApiError>() else {
            return format!("Error: {err:#}");
        };

        let mut lines = vec![format!("Error [{}]: {}", api.code(), api.message())];
        if let Some(status) = api.status() {
            lines.push(format!("  status:      {status}"));
        }
        if let Some(request_id) = api.request_id() {
            lines.push(format!("  request id:  {request_id}"));
        }
        if let Some(secs) = api.retry_after() {
            lines.push(format!("  retry after: {secs}s"));
        }
        if let Some(details) = api.details() {
            lines.push(format!("  details:     {details}"));
        }
        lines.join("\n")
    }

    /// Formats one line per attempt.
    pub fn format_attempts(&self, attempts: &[Attempt]) -> String {
        attempts
            .iter()
            .map(|a| {
                let result = match (a.status, &a.error) {
                    (Some(status), None) => format!("{status}"),
                    (_, Some(error)) => error.clone(),
                    (None, None) => "-".to_string(),
                };
                format!(
                    "#{:<2} after {:>6}ms  {:>6}ms  {result}",
                    a.number,
                    a.delay.as_millis(),
                    a.duration.as_millis()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats a response body; `null` prints nothing.
    pub fn format_body(&self, body: &Value) -> String {
        match body {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}
