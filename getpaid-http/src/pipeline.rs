//! Request pipeline: auth, send, retry, classify.
//!
//! Each attempt re-applies auth against the current credential, sends once
//! through the [`Transport`], and either returns a 2xx response, backs off
//! and tries again, or classifies the failure and stops.

use std::sync::Arc;
use std::time::Duration;

use getpaid_core::{ApiError, ErrorKind, RequestSpec};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::auth::CredentialStore;
use crate::classify::classify;
use crate::retry::RetryPolicy;
use crate::transport::{Outcome, PreparedRequest, RawResponse, Transport};

// ============================================================================
// Attempt
// ============================================================================

/// Record of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    /// Backoff delay that preceded the attempt.
    pub delay: Duration,
    /// Response status, if a response was received.
    pub status: Option<u16>,
    /// Failure description for unsuccessful attempts.
    pub error: Option<String>,
    /// How long the send took.
    pub duration: Duration,
}

impl Attempt {
    fn record(number: u32, delay: Duration, outcome: &Outcome, duration: Duration) -> Self {
        let error = match outcome {
            Outcome::Network(error) => Some(error.to_string()),
            Outcome::Response(response) if !response.is_success() => Some(format!(
                "Request failed with status code {}",
                response.status
            )),
            Outcome::Response(_) => None,
        };

        Self {
            number,
            delay,
            status: outcome.status(),
            error,
            duration,
        }
    }

    /// Returns true if the attempt got a 2xx response.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// ============================================================================
// Pipeline Outcome
// ============================================================================

/// The outcome of a pipeline execution.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The 2xx response or the classified terminal error.
    pub result: Result<RawResponse, ApiError>,
    /// All attempts made, in order.
    pub attempts: Vec<Attempt>,
    /// Total duration including backoff.
    pub duration: Duration,
}

impl PipelineOutcome {
    /// Returns true if the call succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the number of sends.
    pub fn attempts_count(&self) -> usize {
        self.attempts.len()
    }

    /// Backoff delays preceding each attempt.
    pub fn delays(&self) -> Vec<Duration> {
        self.attempts.iter().map(|a| a.delay).collect()
    }
}

// ============================================================================
// Request Pipeline
// ============================================================================

/// Executes [`RequestSpec`]s with auth, retry and error classification.
///
/// Cheap to share: calls on one pipeline may run concurrently and only the
/// credential store is shared between them.
#[derive(Clone)]
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialStore>,
    retry: RetryPolicy,
}

impl RequestPipeline {
    /// Creates a pipeline from its stages.
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            credentials,
            retry,
        }
    }

    /// The shared credential store.
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Executes the request and decodes the 2xx body as JSON.
    ///
    /// An empty body decodes as `null`, so `()` and `Option<T>` accept it.
    pub async fn execute<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, ApiError> {
        let response = self.execute_raw(spec).await?;
        decode(&response)
    }

    /// Executes the request and returns the undecoded 2xx response.
    pub async fn execute_raw(&self, spec: &RequestSpec) -> Result<RawResponse, ApiError> {
        self.execute_with_attempts(spec).await.result
    }

    /// Executes the request, keeping the record of every attempt.
    #[instrument(skip(self, spec), fields(method = %spec.method, path = %spec.path))]
    pub async fn execute_with_attempts(&self, spec: &RequestSpec) -> PipelineOutcome {
        let start = Instant::now();
        let mut attempts = Vec::new();
        let mut number = 1;

        loop {
            let delay = self.retry.delay_before_attempt(number);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let mut request = PreparedRequest::from_spec(spec);
            self.credentials.apply(&mut request).await;

            debug!(attempt = number, delay = ?delay, "Sending request");
            let attempt_start = Instant::now();
            let outcome = self.transport.send(&request).await;
            attempts.push(Attempt::record(
                number,
                delay,
                &outcome,
                attempt_start.elapsed(),
            ));

            match outcome {
                Outcome::Response(response) if response.is_success() => {
                    info!(
                        status = response.status,
                        attempts = number,
                        "Request succeeded"
                    );
                    return PipelineOutcome {
                        result: Ok(response),
                        attempts,
                        duration: start.elapsed(),
                    };
                }
                outcome if self.retry.should_retry(&outcome, number) => {
                    warn!(
                        attempt = number,
                        status = ?outcome.status(),
                        next_delay = ?self.retry.delay_before_attempt(number + 1),
                        "Transient failure, retrying"
                    );
                    number += 1;
                }
                outcome => {
                    let error = classify(&outcome);
                    warn!(
                        kind = %error.kind(),
                        status = ?error.status(),
                        request_id = ?error.request_id(),
                        attempts = number,
                        "Request failed"
                    );
                    return PipelineOutcome {
                        result: Err(error),
                        attempts,
                        duration: start.elapsed(),
                    };
                }
            }
        }
    }
}

/// Decodes a 2xx body; a malformed body is reported as [`ErrorKind::Api`].
fn decode<T: DeserializeOwned>(response: &RawResponse) -> Result<T, ApiError> {
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };

    serde_json::from_slice(body).map_err(|e| {
        warn!(status = response.status, error = %e, "Failed to decode response body");
        ApiError::new(ErrorKind::Api, format!("Failed to decode response body: {e}"))
            .with_status(response.status)
            .with_request_id(response.request_id().map(str::to_string))
    })
}

// ============================================================================
// Tests
// ============================================================================
