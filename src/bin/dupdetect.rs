//! dupdetect CLI - near-duplicate product detection
//!
//! Runs MinHash/LSH duplicate detection on a JSON product dump, tunes
//! thresholds with bootstrap resampling and inspects band splits.

use clap::Parser;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Detect(args) => {
            cli::detect_command(args).await?;
        }
        Commands::Bootstrap(args) => {
            cli::bootstrap_command(args).await?;
        }
        Commands::Bands(args) => {
            cli::bands_command(args).await?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config().await?;
        }
    }

    Ok(())
}
