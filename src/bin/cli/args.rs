//! CLI Argument Structures
//!
//! Command definitions and argument types used by the dupdetect binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use dupdetect::core::dataset::validate_input_path;
use dupdetect::OptimalityMetric;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Near-duplicate product detection with MinHash and LSH
#[derive(Parser)]
#[command(name = "dupdetect")]
#[command(version = VERSION)]
#[command(about = "🔍 dupdetect - Near-duplicate product detection with MinHash and LSH")]
#[command(long_about = "
Detect listings of the same product scraped from different web shops.
The input is a JSON file mapping model ids to lists of listings.

Common Usage:

  # Detect duplicates with the default thresholds
  dupdetect detect data/TVs-all-merged.json

  # Lower the comparison threshold and print JSON
  dupdetect detect data/TVs-all-merged.json --sim 0.6 --format json

  # Tune thresholds over 5 bootstrap rounds
  dupdetect bootstrap data/TVs-all-merged.json --rounds 5

  # Inspect the available row/band splits
  dupdetect bands --hashes 1155 --sim 0.8
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run duplicate detection on a dataset
    Detect(DetectArgs),

    /// Tune thresholds with bootstrap resampling and report out-of-bag results
    Bootstrap(BootstrapArgs),

    /// List the row/band splits for a signature length
    Bands(BandsArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,
}

#[derive(Args)]
pub struct DetectArgs {
    /// JSON file with products indexed by model id
    #[arg(value_name = "FILE", value_parser = parse_input_file)]
    pub file: PathBuf,

    /// Similarity threshold for classifying a banded candidate as duplicate
    #[arg(short, long)]
    pub sim: Option<f64>,

    /// Desired LSH threshold used to pick rows and bands
    #[arg(long)]
    pub lsh_sim: Option<f64>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct BootstrapArgs {
    /// JSON file with products indexed by model id
    #[arg(value_name = "FILE", value_parser = parse_input_file)]
    pub file: PathBuf,

    /// Number of bootstrap rounds
    #[arg(short, long)]
    pub rounds: Option<usize>,

    /// Seed for the resampling RNG
    #[arg(long)]
    pub seed: Option<u64>,

    /// Metric maximized when picking the comparison threshold
    #[arg(short, long, value_enum)]
    pub metric: Option<OptimalityMetric>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct BandsArgs {
    /// Number of hash functions (signature length)
    #[arg(long, default_value_t = 1155)]
    pub hashes: usize,

    /// Desired similarity threshold; highlights the closest split
    #[arg(short, long)]
    pub sim: Option<f64>,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Console tables
    Table,
    /// Pretty-printed JSON
    Json,
}

fn parse_input_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    validate_input_path(&path).map_err(|e| e.to_string())?;
    Ok(path)
}
