//! Auth command - manage the API key stored in the system keychain.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use getpaid_http::Credential;
use serde_json::json;
use tracing::info;

use crate::credentials::{self, KeychainStore};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the auth command.
#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Auth subcommands.
#[derive(Subcommand)]
pub enum AuthAction {
    /// Store an API key in the system keychain.
    SetKey {
        /// API key to store.
        key: String,
    },

    /// Remove the stored API key.
    Clear,

    /// Show which credential would be used.
    Status,
}

/// Runs the auth command.
pub fn run(args: &AuthArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        AuthAction::SetKey { key } => set_key(key),
        AuthAction::Clear => clear(),
        AuthAction::Status => status(cli),
    }
}

fn set_key(key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    KeychainStore::save(key).context("Failed to store API key in keychain")?;
    info!("API key stored");
    println!("Stored API key {}", credentials::mask(key));
    Ok(())
}

fn clear() -> Result<()> {
    let removed = KeychainStore::delete().context("Failed to remove API key from keychain")?;
    if removed {
        info!("API key removed");
        println!("Removed stored API key");
    } else {
        println!("No stored API key");
    }
    Ok(())
}

fn status(cli: &Cli) -> Result<()> {
    let (config, source) = credentials::resolve(cli);
    let active = Credential::select(config);

    let auth_type = active.as_ref().map(|c| c.auth_type().to_string());
    let masked = match &active {
        Some(
            Credential::ApiKey(value) | Credential::BearerStatic(value) | Credential::QueryToken(value),
        ) => Some(credentials::mask(value)),
        Some(Credential::BearerDynamic(_)) | None => None,
    };

    match cli.format {
        OutputFormat::Text => match &auth_type {
            Some(auth_type) => {
                println!("Auth type: {auth_type}");
                println!("Source:    {source}");
                if let Some(masked) = &masked {
                    println!("Value:     {masked}");
                }
            }
            None => {
                println!("No credentials configured");
                println!("Set GETPAID_API_KEY or run `getpaid auth set-key <KEY>`");
            }
        },
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = json!({
                "authType": auth_type,
                "source": source.to_string(),
                "value": masked,
            });
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}
