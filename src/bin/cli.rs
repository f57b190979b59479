//! circular-tracker CLI
//!
//! Runs a single check, serves the trigger endpoint, or inspects the setup.

use std::path::PathBuf;
#[cfg(feature = "server")]
use std::sync::Arc;

use clap::{Parser, Subcommand};
use circular_tracker::{
    error::Result,
    models::Config,
    pipeline::{RunOutcome, Tracker},
    storage::{JsonFileStore, RecordStore},
};

/// circular-tracker - placement circular watcher
#[derive(Parser, Debug)]
#[command(
    name = "circular-tracker",
    version,
    about = "Watches a placement circulars page and mails new entries"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP trigger endpoint
    #[cfg(feature = "server")]
    Serve,

    /// Run one check now
    Check {
        /// Log the mail instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration
    Validate,

    /// Show record store info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        #[cfg(feature = "server")]
        Command::Serve => {
            config.validate()?;
            JsonFileStore::new(&config.storage.path)
                .ensure_initialized()
                .await?;

            let tracker = Arc::new(Tracker::from_config(&config, false)?);
            circular_tracker::server::serve(tracker, &config.server).await?;
        }

        Command::Check { dry_run } => {
            config.validate()?;
            JsonFileStore::new(&config.storage.path)
                .ensure_initialized()
                .await?;

            let tracker = Tracker::from_config(&config, dry_run)?;
            let report = tracker.run().await?;

            match report.outcome {
                RunOutcome::NoNewRecords => log::info!("No new circulars."),
                RunOutcome::Persisted => log::info!(
                    "{} new circular(s) stored, {} deferred",
                    report.new,
                    report.deferred
                ),
            }
            if !report.notified {
                log::warn!("Notification was not delivered");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            if config.mail.api_key.is_none() {
                log::warn!("No mail API key configured; digests will only be logged");
            }
        }

        Command::Info => {
            let store = JsonFileStore::new(&config.storage.path);
            log::info!("Source page: {}", config.source.url);
            log::info!("Record store: {}", store.location());

            match store.count().await {
                Ok(count) => log::info!("Stored circulars: {}", count),
                Err(e) => log::warn!("Could not read record store: {}", e),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
