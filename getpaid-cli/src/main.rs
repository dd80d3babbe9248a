// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `GetPaid` CLI - ad-hoc calls against the `GetPaid` API.
//!
//! # Examples
//!
//! ```bash
//! # Check API health
//! getpaid health
//!
//! # Store an API key in the system keychain
//! getpaid auth set-key sk_live_...
//!
//! # Arbitrary calls
//! getpaid request GET /api/customers --query email=ada@example.com
//! getpaid request POST /api/orders --data '{"customer_id":"cus_1"}'
//!
//! # JSON output
//! getpaid --format json --pretty health
//!
//! # Local API, no retries
//! getpaid --base-url http://localhost:8081 --retries 0 health
//! ```

mod commands;
mod credentials;
mod output;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use getpaid_core::{ApiError, ConfigError, ErrorKind};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{auth, config, health, request};

// ============================================================================
// CLI Definition
// ============================================================================

/// `GetPaid` CLI - ad-hoc calls against the `GetPaid` API.
#[derive(Parser)]
#[command(name = "getpaid")]
#[command(about = "Command-line client for the GetPaid billing API")]
#[command(long_about = r#"
Sends authenticated, retrying requests to the GetPaid API.

Credentials are taken from the first source that has any:
  1. --api-key / --bearer-token / --token (or GETPAID_* env vars)
  2. API key stored in the system keychain (getpaid auth set-key)

Examples:
  getpaid health                          # API health
  getpaid request GET /api/customers      # Arbitrary call
  getpaid --format json request GET /api/products
  getpaid config show                     # Effective settings
"#)]
#[command(version)]
#[command(author = "GetPaid Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// API base URL.
    #[arg(long, env = "GETPAID_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API key sent as X-API-Key.
    #[arg(long, env = "GETPAID_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Static bearer token.
    #[arg(long, env = "GETPAID_BEARER_TOKEN", hide_env_values = true, global = true)]
    pub bearer_token: Option<String>,

    /// Public payment token sent as the `token` query parameter.
    #[arg(long, env = "GETPAID_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Per-attempt timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Retries after the first attempt.
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Base backoff delay in milliseconds; doubles for each further retry.
    #[arg(long, global = true)]
    pub retry_delay: Option<u64>,

    /// Config file (defaults to <config dir>/getpaid/config.json).
    #[arg(long = "config", env = "GETPAID_CONFIG", global = true)]
    pub config_file: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Check API health.
    #[command(visible_alias = "h")]
    Health,

    /// Send an arbitrary request.
    #[command(visible_alias = "r")]
    Request(request::RequestArgs),

    /// Manage the stored API key.
    Auth(auth::AuthArgs),

    /// Inspect configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error, including validation and unclassified API errors.
    Error = 1,
    /// Missing credentials or invalid settings.
    Config = 2,
    /// Rejected credentials or insufficient permissions.
    Auth = 3,
    /// Resource not found.
    NotFound = 4,
    /// Rate limited.
    RateLimited = 5,
    /// API unreachable or failing (network, 5xx).
    Unavailable = 6,
}

impl ExitCode {
    /// Picks the exit code for a command failure.
    pub fn for_error(err: &anyhow::Error) -> Self {
        if let Some(api) = err.downcast_ref::<ApiError>() {
            return Self::for_kind(api.kind());
        }
        if err.downcast_ref::<ConfigError>().is_some() {
            return Self::Config;
        }
        Self::Error
    }

    fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Authentication | ErrorKind::Authorization => Self::Auth,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::RateLimit { .. } => Self::RateLimited,
            ErrorKind::Network | ErrorKind::ServerError => Self::Unavailable,
            ErrorKind::Validation | ErrorKind::Api => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("getpaid=debug")
        } else {
            EnvFilter::new("getpaid=warn")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Health => health::run(&cli).await,
        Commands::Request(args) => request::run(args, &cli).await,
        Commands::Auth(args) => auth::run(args, &cli),
        Commands::Config(args) => config::run(args, &cli),
    };

    let code = match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            if !cli.quiet {
                output::print_error(&e, &cli);
            }
            ExitCode::for_error(&e)
        }
    };

    if code != ExitCode::Success {
        std::process::exit(code as i32);
    }
}

// ============================================================================
// Tests
// ============================================================================
