//! Wire models the pipeline itself reads.
//!
//! Resource payloads are opaque to the pipeline; only the error body and the
//! health response are modelled here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Error Body
// ============================================================================

/// JSON error body returned by the API on a non-2xx status.
///
/// All fields are optional. A body that is empty, not JSON, or not an object
/// parses to the default (all `None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Longer error text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Arbitrary structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    /// Parses an error body leniently.
    ///
    /// Non-string `error`/`message` fields and empty strings are treated as
    /// absent; `details` is kept verbatim unless it is `null`.
    pub fn parse(bytes: &[u8]) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) else {
            return Self::default();
        };

        let text = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            error: text("error"),
            message: text("message"),
            details: map.get("details").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// The most specific message in the body: `error`, then `message`.
    pub fn best_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

// ============================================================================
// Health
// ============================================================================

/// Response of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Service status, `"ok"` when healthy.
    pub status: String,
}

impl HealthStatus {
    /// Returns true if the service reports itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
