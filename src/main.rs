use anyhow::Context;
use clap::{Parser, Subcommand};
use healthdata::core::config::{ServiceConfig, DEFAULT_CONFIG_PATH};
use healthdata::{logging, start_server, summarize, DatasetStore};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "healthdata")]
#[command(version)]
#[command(about = "Health indicator dataset service", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Load a CSV file and print its schema and summary as JSON
    Inspect {
        /// Path to the CSV file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (mut config, config_error) = ServiceConfig::load_or_default(&cli.config);
    logging::init(&config.logging.level)?;
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "failed to parse config, using defaults");
    }

    match cli.command {
        Some(Commands::Inspect { file }) => {
            let raw = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let store = DatasetStore::new(config.dataset.sample_rows);
            store.load(&raw)?;

            let dataset = store.snapshot()?;
            let report = serde_json::json!({
                "schema": store.schema()?,
                "summary": summarize(&dataset, &config.summary),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            start_server(config).await?;
        }
        None => start_server(config).await?,
    }

    Ok(())
}
