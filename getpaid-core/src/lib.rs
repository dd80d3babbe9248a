// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `GetPaid` Core
//!
//! Transport-independent types shared by the `GetPaid` client crates.
//!
//! ## Key Types
//!
//! ### Requests
//! - [`Method`] - HTTP verb of a logical operation
//! - [`RequestSpec`] - Verb, path, query, body and header overrides of one call
//!
//! ### Errors
//! - [`ApiError`] - The single classified failure of a call
//! - [`ErrorKind`] - Closed taxonomy the caller branches on
//! - [`ConfigError`] - Client construction and credential update failures
//!
//! ### Wire Models
//! - [`ErrorBody`] - JSON error body returned by the API
//! - [`HealthStatus`] - Response of the health endpoint

pub mod error;
pub mod models;
pub mod request;

pub use error::{ApiError, ConfigError, ErrorKind};
pub use models::{ErrorBody, HealthStatus};
pub use request::{Method, RequestSpec};
