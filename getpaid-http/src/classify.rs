//! Classification of terminal outcomes into [`ApiError`].
//!
//! | Status | Kind |
//! |---|---|
//! | no response | [`ErrorKind::Network`] |
//! | 400 | [`ErrorKind::Validation`] |
//! | 401 | [`ErrorKind::Authentication`] |
//! | 403 | [`ErrorKind::Authorization`] |
//! | 404 | [`ErrorKind::NotFound`] |
//! | 429 | [`ErrorKind::RateLimit`] |
//! | 500, 502, 503, 504 | [`ErrorKind::ServerError`] |
//! | anything else | [`ErrorKind::Api`] |

use getpaid_core::{ApiError, ErrorBody, ErrorKind};
use serde_json::json;

use crate::transport::{Outcome, RawResponse};

/// Message used when the transport reports nothing useful.
const NETWORK_FALLBACK_MESSAGE: &str = "Network error occurred";

/// Message of every 404; the resource is not known at this layer.
const NOT_FOUND_MESSAGE: &str = "Resource not found";

/// Turns the outcome of the terminal attempt into the caller's error.
pub fn classify(outcome: &Outcome) -> ApiError {
    match outcome {
        Outcome::Network(error) => {
            let message = error.to_string();
            let message = if message.is_empty() {
                NETWORK_FALLBACK_MESSAGE.to_string()
            } else {
                message
            };
            ApiError::new(ErrorKind::Network, message)
        }
        Outcome::Response(response) => classify_response(response),
    }
}

fn classify_response(response: &RawResponse) -> ApiError {
    let status = response.status;
    let request_id = response.request_id().map(str::to_string);
    let body = ErrorBody::parse(&response.body);

    if status == 404 {
        return ApiError::new(ErrorKind::NotFound, NOT_FOUND_MESSAGE)
            .with_status(status)
            .with_details(Some(json!({ "resource": "Resource" })))
            .with_request_id(request_id);
    }

    let kind = kind_for_status(status, response);
    let message = body
        .best_message()
        .map_or_else(|| format!("Request failed with status code {status}"), str::to_string);

    ApiError::new(kind, message)
        .with_status(status)
        .with_details(body.details)
        .with_request_id(request_id)
}

/// Maps a non-2xx status to its kind.
fn kind_for_status(status: u16, response: &RawResponse) -> ErrorKind {
    match status {
        400 => ErrorKind::Validation,
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Authorization,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::RateLimit {
            retry_after: response.retry_after_secs(),
        },
        500 | 502 | 503 | 504 => ErrorKind::ServerError,
        _ => ErrorKind::Api,
    }
}

// ============================================================================
// Tests
// ============================================================================
