//! Terminal display functions for detection results.

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use dupdetect::detectors::lsh::BandSelection;
use dupdetect::evaluation::BootstrapSummary;
use dupdetect::{ConfusionMatrix, DetectionRun, PerformanceReport};

/// Print any serializable value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Row type for the confusion matrix table.
#[derive(Tabled)]
struct ConfusionRow {
    #[tabled(rename = "Actual / Pred.")]
    actual: &'static str,
    #[tabled(rename = "True")]
    predicted_true: String,
    #[tabled(rename = "False")]
    predicted_false: String,
    #[tabled(rename = "Total")]
    total: String,
}

/// Display the confusion matrix with its marginal totals.
pub fn display_confusion_matrix(matrix: &ConfusionMatrix) {
    let rows = vec![
        ConfusionRow {
            actual: "True",
            predicted_true: format!("TP = {}", matrix.tp),
            predicted_false: format!("FN = {}", matrix.fn_),
            total: format!("w = {}", matrix.real_duplicates),
        },
        ConfusionRow {
            actual: "False",
            predicted_true: format!("FP = {}", matrix.fp),
            predicted_false: format!("TN = {}", matrix.tn),
            total: format!("s = {}", matrix.real_distinct()),
        },
        ConfusionRow {
            actual: "Total",
            predicted_true: format!("c = {}", matrix.predicted_duplicates()),
            predicted_false: format!("f = {}", matrix.predicted_distinct()),
            total: format!("t = {}", matrix.total_pairs()),
        },
    ];

    println!("{}", "📊 Confusion Matrix".bright_blue().bold());
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);

    if matrix.unknown > 0 {
        println!(
            "   {} {} classified pairs had no ground truth",
            "⚠".yellow(),
            matrix.unknown
        );
    }
}

/// Row type for the metrics table.
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Display the quality measures of a run.
pub fn display_report(report: &PerformanceReport) {
    let rows = vec![
        MetricRow {
            name: "precision",
            value: format!("{:.4}", report.precision),
        },
        MetricRow {
            name: "recall",
            value: format!("{:.4}", report.recall),
        },
        MetricRow {
            name: "F1",
            value: format!("{:.4}", report.f1),
        },
        MetricRow {
            name: "PQ",
            value: format!("{:.4}", report.pq),
        },
        MetricRow {
            name: "PC",
            value: format!("{:.4}", report.pc),
        },
        MetricRow {
            name: "F1*",
            value: format!("{:.4}", report.f1_star),
        },
        MetricRow {
            name: "num_comparisons",
            value: report.num_comparisons.to_string(),
        },
        MetricRow {
            name: "proportion_comparisons",
            value: format!("{:.6}", report.proportion_comparisons),
        },
    ];

    println!("{}", "📈 Performance".bright_blue().bold());
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}

/// Display a complete detection run.
pub fn display_run(run: &DetectionRun) {
    println!(
        "{} n = {}, Nd = {}",
        "📦 Data statistics:".bright_cyan().bold(),
        run.stats.products,
        run.stats.real_duplicate_pairs
    );
    println!(
        "{} r = {}, b = {}, threshold = {:.4}, compare similarity = {}",
        "🪣 LSH:".bright_cyan().bold(),
        run.bands.rows,
        run.bands.bands,
        run.bands.threshold,
        run.compare_similarity
    );
    println!(
        "{} {} banded, {} by model id",
        "🔗 Candidates:".bright_cyan().bold(),
        run.metrics.banded_candidates,
        run.metrics.model_id_candidates
    );
    println!();

    display_confusion_matrix(&run.confusion);
    println!();
    display_report(&run.report);
}

/// Row type for the band split table.
#[derive(Tabled)]
struct BandRow {
    #[tabled(rename = "r")]
    rows: usize,
    #[tabled(rename = "b")]
    bands: usize,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "")]
    marker: &'static str,
}

/// Display all row/band splits, marking the selected one.
pub fn display_bands(options: &[BandSelection], selected: Option<BandSelection>) {
    let rows: Vec<BandRow> = options
        .iter()
        .map(|option| BandRow {
            rows: option.rows,
            bands: option.bands,
            threshold: format!("{:.5}", option.threshold),
            marker: if Some(*option) == selected { "◀ best" } else { "" },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}

/// Row type for the bootstrap summary table.
#[derive(Tabled)]
struct BootstrapRow {
    #[tabled(rename = "r")]
    rows: usize,
    #[tabled(rename = "b")]
    bands: usize,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Rounds")]
    rounds: usize,
    #[tabled(rename = "F1")]
    f1: String,
    #[tabled(rename = "F1*")]
    f1_star: String,
    #[tabled(rename = "PQ")]
    pq: String,
    #[tabled(rename = "PC")]
    pc: String,
    #[tabled(rename = "Comparisons")]
    proportion_comparisons: String,
}

fn mean_std(mean: f64, std_dev: f64) -> String {
    format!("{mean:.3} ± {std_dev:.3}")
}

/// Display averaged out-of-bag results per band split.
pub fn display_bootstrap(summary: &BootstrapSummary) {
    println!(
        "{} {} rounds, tuned for {}",
        "🎯 Bootstrap:".bright_blue().bold(),
        summary.rounds.len(),
        summary.metric
    );

    if summary.bands.is_empty() {
        println!("   {}", "No band split could be evaluated out-of-bag".yellow());
        return;
    }

    let rows: Vec<BootstrapRow> = summary
        .bands
        .iter()
        .map(|band| BootstrapRow {
            rows: band.bands.rows,
            bands: band.bands.bands,
            threshold: format!("{:.4}", band.bands.threshold),
            rounds: band.rounds,
            f1: mean_std(band.f1.mean, band.f1.std_dev),
            f1_star: mean_std(band.f1_star.mean, band.f1_star.std_dev),
            pq: mean_std(band.pq.mean, band.pq.std_dev),
            pc: mean_std(band.pc.mean, band.pc.std_dev),
            proportion_comparisons: mean_std(
                band.proportion_comparisons.mean,
                band.proportion_comparisons.std_dev,
            ),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}
