//! CLI command implementations.

pub mod auth;
pub mod config;
pub mod health;
pub mod request;

use anyhow::Result;
use getpaid_http::GetPaidClient;
use tracing::debug;

use crate::{Cli, credentials, settings};

/// Builds a client from the effective settings and credentials.
pub fn build_client(cli: &Cli) -> Result<GetPaidClient> {
    let config = settings::resolve(cli)?;
    let (creds, source) = credentials::resolve(cli);
    debug!(source = %source, base_url = %config.base_url, "Building client");

    let client = GetPaidClient::builder()
        .config(config)
        .credentials(creds)
        .build()?;
    Ok(client)
}
