//! Report output formats.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format of reporting commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Print `value` as JSON or YAML, or through `text` for the text format.
pub fn emit<T, F>(format: OutputFormat, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}
