use anyhow::Result;
use clap::{Parser, Subcommand};
use dynamodb_backup_core::config::DEFAULT_CONFIG_PATH;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::output::OutputFormat;

#[derive(Parser)]
#[command(name = "dynamodb-backup")]
#[command(about = "DynamoDB daily backup and restore tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a table's schema to the local schema file
    ExportSchema {
        /// Table name or ARN
        table: String,

        /// Region of the table
        #[arg(default_value = "us-east-1")]
        region: String,
    },

    /// Back up the configured tables to today's prefix
    Backup {
        /// Read tables, bucket and regions from TABLE_ARNS, S3_BUCKET,
        /// S3_REGION and SOURCE_REGION instead of the configuration file
        #[arg(long)]
        from_env: bool,

        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List backups of the last 30 days
    List {
        /// Only list this table
        table: Option<String>,

        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Restore a backup into a new table
    Restore {
        /// Name of the backed up table
        table: String,

        /// Region to create the restored table in
        #[arg(default_value = "us-west-2")]
        region: String,

        /// Backup date (YYYY/MM/DD); the latest backup when omitted
        date: Option<String>,

        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show recent exports and stored backups of the configured tables
    Status {
        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Invoke the deployed backup function and print its response
    Trigger {
        /// Function name (defaults to backup_function_name from the configuration)
        #[arg(long)]
        function: Option<String>,

        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let code = match cli.command {
        Commands::ExportSchema { table, region } => {
            commands::export_schema::run(&cli.config, &table, &region).await?
        }
        Commands::Backup { from_env, format } => {
            if from_env {
                commands::backup::run_from_env(format).await?
            } else {
                commands::backup::run(&cli.config, format).await?
            }
        }
        Commands::List { table, format } => {
            commands::list::run(&cli.config, table.as_deref(), format).await?
        }
        Commands::Restore {
            table,
            region,
            date,
            format,
        } => commands::restore::run(&cli.config, &table, &region, date.as_deref(), format).await?,
        Commands::Status { format } => commands::status::run(&cli.config, format).await?,
        Commands::Trigger { function, format } => {
            commands::trigger::run(&cli.config, function.as_deref(), format).await?
        }
    };

    Ok(code)
}
