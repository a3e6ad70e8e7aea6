use anyhow::Result;
use dynamodb_backup_core::monitor::{trigger_backup, InvocationResult, LambdaInvoker};
use dynamodb_backup_core::Config;
use std::process::ExitCode;
use tracing::info;

use super::output::{emit, OutputFormat};

/// Invoke the deployed backup function synchronously.
pub async fn run(config_path: &str, function: Option<&str>, format: OutputFormat) -> Result<ExitCode> {
    info!("Loading configuration from: {}", config_path);
    let config = Config::load(config_path)?.backup_config;
    let function_name = function.unwrap_or(&config.backup_function_name);

    let invoker = LambdaInvoker::connect(&config.source_region).await;
    let result = trigger_backup(&invoker, function_name).await?;
    emit(format, &result, |r| print_result(r, function_name))?;

    Ok(if result.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_result(result: &InvocationResult, function_name: &str) {
    match &result.function_error {
        None => println!("Backup triggered via {} (status {})", function_name, result.status_code),
        Some(kind) => println!("Backup function {} failed ({})", function_name, kind),
    }
    match result.payload_json() {
        Some(json) => match serde_json::to_string_pretty(&json) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", result.payload_text()),
        },
        None => println!("{}", result.payload_text()),
    }
}
