//! Health command - check API availability.

use anyhow::Result;
use tracing::info;

use super::build_client;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Runs the health command.
pub async fn run(cli: &Cli) -> Result<()> {
    let client = build_client(cli)?;
    let health = client.health_check().await?;
    info!(status = %health.status, "Health check complete");

    match cli.format {
        OutputFormat::Text => {
            let marker = if health.is_ok() { "✓" } else { "✗" };
            println!("{marker} {} is {}", client.config().base_url, health.status);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&health)?);
        }
    }

    if !health.is_ok() {
        anyhow::bail!("API reported status '{}'", health.status);
    }
    Ok(())
}
