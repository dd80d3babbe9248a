// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `GetPaid` HTTP
//!
//! The request pipeline underneath the `GetPaid` client.
//!
//! Every call runs through the same linear stages:
//!
//! ```text
//! RequestSpec
//!     → auth      (apply the active credential from the CredentialStore)
//!     → transport (send one attempt, bounded by the per-attempt timeout)
//!     → retry     (network failure or 5xx: back off and go again)
//!     → classify  (terminal failure: one typed ApiError)
//! ```
//!
//! ## Modules
//!
//! - [`auth`] - Credential variants, precedence and request augmentation
//! - [`retry`] - Retry predicate and exponential backoff
//! - [`classify`] - Raw outcome to [`ApiError`](getpaid_core::ApiError)
//! - [`transport`] - The [`Transport`] seam and its `reqwest` implementation
//! - [`pipeline`] - [`RequestPipeline`] orchestrating the stages
//! - [`client`] - [`GetPaidClient`] facade used by resource wrappers
//!
//! ## Example
//!
//! ```ignore
//! use getpaid_http::GetPaidClient;
//!
//! let client = GetPaidClient::builder()
//!     .api_key("sk_test_123")
//!     .retries(2)
//!     .build()?;
//!
//! let health = client.health_check().await?;
//! ```

pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod transport;

// Re-export key types at crate root

// Auth
pub use auth::{AuthType, Credential, CredentialConfig, CredentialStore, TokenProvider, token_fn};

// Pipeline
pub use classify::classify;
pub use pipeline::{Attempt, PipelineOutcome, RequestPipeline};
pub use retry::RetryPolicy;
pub use transport::{Outcome, PreparedRequest, RawResponse, ReqwestTransport, Transport};

// Client & config
pub use client::{GetPaidClient, GetPaidClientBuilder};
pub use config::ClientConfig;
pub use error::TransportError;

// Core types callers need alongside the pipeline
pub use getpaid_core::{ApiError, ConfigError, ErrorKind, HealthStatus, Method, RequestSpec};
