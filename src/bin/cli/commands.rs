//! Command execution for the dupdetect CLI.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::info;

use dupdetect::detectors::lsh::BandOptimizer;
use dupdetect::{
    BootstrapHarness, Dataset, DuplicateDetector, DupdetectConfig, ProgressCallback,
};

use crate::cli::args::{BandsArgs, BootstrapArgs, DetectArgs, OutputFormat};
use crate::cli::output::{display_bands, display_bootstrap, display_run, print_json};

/// Load configuration from a YAML file or fall back to defaults.
pub async fn load_configuration(path: Option<&Path>) -> anyhow::Result<DupdetectConfig> {
    match path {
        Some(path) => {
            let path = path.to_path_buf();
            let config =
                tokio::task::spawn_blocking(move || DupdetectConfig::from_yaml_file(path)).await??;
            Ok(config)
        }
        None => Ok(DupdetectConfig::default()),
    }
}

async fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let path = path.to_path_buf();
    let dataset = tokio::task::spawn_blocking(move || Dataset::from_json_file(path)).await??;
    Ok(dataset)
}

/// Run duplicate detection and print the results.
pub async fn detect_command(args: DetectArgs) -> anyhow::Result<()> {
    let mut config = load_configuration(args.config.as_deref()).await?;
    if let Some(sim) = args.sim {
        config.detection.compare_similarity = sim;
    }
    if let Some(lsh_sim) = args.lsh_sim {
        config.detection.lsh_similarity = lsh_sim;
    }
    config.validate()?;

    info!("Performing duplicate detection on file: {}", args.file.display());
    let dataset = load_dataset(&args.file).await?;

    let run = tokio::task::spawn_blocking(move || {
        let detector = DuplicateDetector::new(config.detection)?;
        detector.detect(&dataset)
    })
    .await??;

    match args.format {
        OutputFormat::Json => print_json(&run)?,
        OutputFormat::Table => display_run(&run),
    }
    Ok(())
}

/// Tune thresholds with bootstrap resampling.
pub async fn bootstrap_command(args: BootstrapArgs) -> anyhow::Result<()> {
    let mut config = load_configuration(args.config.as_deref()).await?;
    if let Some(rounds) = args.rounds {
        config.bootstrap.rounds = rounds;
    }
    if let Some(seed) = args.seed {
        config.bootstrap.seed = seed;
    }
    if let Some(metric) = args.metric {
        config.bootstrap.metric = metric;
    }
    config.validate()?;

    info!("Training on bootstraps from: {}", args.file.display());
    let dataset = load_dataset(&args.file).await?;

    let show_progress = args.format == OutputFormat::Table;
    let progress_bar = if show_progress {
        let pb = ProgressBar::new(100);
        pb.set_style(ProgressStyle::with_template(
            "🚀 {msg} [{bar:40.bright_blue/blue}] {pos:>3}% {elapsed_precise}",
        )?);
        Some(pb)
    } else {
        None
    };

    let progress_callback: Option<ProgressCallback> = progress_bar.clone().map(|pb| {
        Box::new(move |stage: &str, progress: f64| {
            pb.set_message(stage.to_string());
            pb.set_position(progress as u64);
        }) as ProgressCallback
    });

    let summary = tokio::task::spawn_blocking(move || {
        let detector = DuplicateDetector::new(config.detection)?;
        let harness = BootstrapHarness::new(detector, config.bootstrap)?;
        harness.run(&dataset, progress_callback)
    })
    .await??;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Bootstrap complete");
    }

    match args.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => display_bootstrap(&summary),
    }
    Ok(())
}

/// List the row/band splits of a signature length.
pub async fn bands_command(args: BandsArgs) -> anyhow::Result<()> {
    let optimizer = BandOptimizer::new(args.hashes)?;
    let selected = args.sim.map(|sim| optimizer.best_for(sim));

    println!(
        "{} n = {}",
        "🪣 Row/band splits for".bright_blue().bold(),
        optimizer.num_hashes()
    );
    display_bands(optimizer.options(), selected);

    if let (Some(sim), Some(best)) = (args.sim, selected) {
        println!(
            "{} r = {}, b = {} (threshold {:.4} for desired {})",
            "✅ Best split:".bright_green().bold(),
            best.rows,
            best.bands,
            best.threshold,
            sim
        );
    }
    Ok(())
}

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    // Output must stay valid YAML when redirected to a file
    println!("# Default dupdetect configuration");
    println!("# Save this to a file and customize as needed");
    println!("# Usage: dupdetect detect --config your-config.yml data.json");
    println!();

    let config = DupdetectConfig::default();
    let yaml_output = serde_yaml::to_string(&config)?;
    println!("{}", yaml_output);

    Ok(())
}
