//! Config command - inspect and initialize configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use getpaid_http::ClientConfig;
use tracing::info;

use crate::output::JsonFormatter;
use crate::settings::{self, default_config_dir};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (file plus overrides).
    Show,

    /// Show configuration paths.
    Path,

    /// Write a config file with the default settings.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init { force } => init_config(cli, *force),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = settings::resolve(cli)?;

    match cli.format {
        OutputFormat::Text => {
            println!("GetPaid Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Base URL:    {}", config.base_url);
            println!("Timeout:     {}ms", config.timeout.as_millis());
            println!("Retries:     {}", config.retries);
            println!("Retry delay: {}ms", config.retry_delay.as_millis());
            println!("User agent:  {}", config.user_agent);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_file = settings::config_path(cli);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_file.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_file.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = settings::config_path(cli);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    settings::save_to(&ClientConfig::default(), &path)?;
    info!(path = %path.display(), "Config initialized");
    println!("Wrote {}", path.display());
    Ok(())
}
