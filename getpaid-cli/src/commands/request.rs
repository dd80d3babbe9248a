//! Request command - send an arbitrary call through the pipeline.

use anyhow::{Context, Result};
use clap::Args;
use getpaid_core::{Method, RequestSpec};
use serde_json::Value;
use tracing::debug;

use super::build_client;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the request command.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE).
    #[arg(value_parser = parse_method)]
    pub method: Method,

    /// Path relative to the base URL, e.g. /api/customers.
    pub path: String,

    /// Query parameter as key=value. Repeat for lists.
    #[arg(long, value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Extra header as "Name: value".
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// JSON body, or @path to read it from a file.
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Print every attempt (text format).
    #[arg(long)]
    pub attempts: bool,
}

impl RequestArgs {
    /// Builds the request described by the arguments.
    pub fn to_spec(&self) -> Result<RequestSpec> {
        let mut spec = RequestSpec::new(self.method, self.path.as_str());
        for (key, value) in &self.query {
            spec = spec.query(key.as_str(), value);
        }
        for (name, value) in &self.headers {
            spec = spec.header(name.as_str(), value.as_str());
        }
        if let Some(data) = &self.data {
            spec = spec.body(parse_body(data)?);
        }
        Ok(spec)
    }
}

/// Runs the request command.
pub async fn run(args: &RequestArgs, cli: &Cli) -> Result<()> {
    let spec = args.to_spec()?;
    let client = build_client(cli)?;

    debug!(method = %spec.method, path = %spec.path, "Sending request");
    let outcome = client.pipeline().execute_with_attempts(&spec).await;

    if args.attempts && cli.format == OutputFormat::Text {
        eprintln!("{}", TextFormatter::new().format_attempts(&outcome.attempts));
    }

    let body = match &outcome.result {
        Ok(response) => decode_body(&response.body),
        Err(err) => return Err(err.clone().into()),
    };

    match cli.format {
        OutputFormat::Text => {
            let text = TextFormatter::new().format_body(&body);
            if !text.is_empty() {
                println!("{text}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_response(&outcome, body)?);
        }
    }

    Ok(())
}

/// Decodes a response body, keeping non-JSON bodies as a string.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn parse_body(data: &str) -> Result<Value> {
    let text = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request body from {path}"))?,
        None => data.to_string(),
    };
    serde_json::from_str(&text).context("Request body is not valid JSON")
}

fn parse_method(s: &str) -> Result<Method, String> {
    s.parse::<Method>().map_err(|e| e.to_string())
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected 'Name: value', got '{s}'")),
    }
}
