//! Output formatting for CLI.

mod json;
mod text;

pub use json::{ErrorOutput, JsonFormatter};
pub use text::TextFormatter;

use crate::{Cli, OutputFormat};

/// Prints a command failure to stderr in the selected format.
pub fn print_error(err: &anyhow::Error, cli: &Cli) {
    match cli.format {
        OutputFormat::Text => eprintln!("{}", TextFormatter::new().format_error(err)),
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            match formatter.format(&ErrorOutput::from_error(err)) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("Error: {err}"),
            }
        }
    }
}
