//! Bootstrap tuning and out-of-bag evaluation.
//!
//! Each round draws `n` product indices with replacement. The distinct drawn
//! products form the in-bag sample, the rest the out-of-bag sample. For
//! every band split the comparison threshold maximizing the chosen metric on
//! the in-bag sample is then evaluated out-of-bag.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use statrs::statistics::Statistics;
use tracing::{info, warn};

use super::metrics::{OptimalityMetric, PerformanceReport};
use crate::core::config::BootstrapConfig;
use crate::core::dataset::Dataset;
use crate::core::errors::{DupdetectError, Result};
use crate::core::pipeline::{DuplicateDetector, ProgressCallback};
use crate::detectors::lsh::{BandSelection, SignatureMatrix};

/// One in-bag / out-of-bag split of a dataset.
#[derive(Debug, Clone)]
pub struct BootstrapSample {
    /// Distinct products drawn
    pub in_bag: Dataset,
    /// Products never drawn
    pub out_of_bag: Dataset,
}

/// Draw a bootstrap sample of `dataset`.
pub fn bootstrap_sample<R: Rng + ?Sized>(dataset: &Dataset, rng: &mut R) -> BootstrapSample {
    let n = dataset.len();
    let drawn: BTreeSet<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    let in_bag: Vec<usize> = drawn.iter().copied().collect();
    let out_of_bag: Vec<usize> = (0..n).filter(|index| !drawn.contains(index)).collect();

    BootstrapSample {
        in_bag: dataset.subset(&in_bag),
        out_of_bag: dataset.subset(&out_of_bag),
    }
}

/// Best in-bag setting of one band split and its out-of-bag performance.
#[derive(Debug, Clone, Serialize)]
pub struct TunedSetting {
    /// Band split
    pub bands: BandSelection,
    /// Comparison threshold that maximized the metric in-bag
    pub compare_similarity: f64,
    /// In-bag value of the metric
    pub in_bag_score: f64,
    /// Out-of-bag performance of the setting
    pub out_of_bag: PerformanceReport,
}

/// Results of one bootstrap round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    /// One-based round number
    pub round: usize,
    /// Products in-bag
    pub in_bag_products: usize,
    /// Products out-of-bag
    pub out_of_bag_products: usize,
    /// Tuned setting per band split
    pub settings: Vec<TunedSetting>,
}

/// Mean and standard deviation of a metric over rounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Mean over rounds
    pub mean: f64,
    /// Sample standard deviation over rounds; 0 for a single round
    pub std_dev: f64,
}

impl MetricSummary {
    fn of(values: &[f64]) -> Self {
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            values.iter().std_dev()
        };
        Self {
            mean: values.iter().mean(),
            std_dev,
        }
    }
}

/// Averaged out-of-bag performance of one band split.
#[derive(Debug, Clone, Serialize)]
pub struct BandSummary {
    /// Band split
    pub bands: BandSelection,
    /// Rounds contributing to the averages
    pub rounds: usize,
    /// Precision
    pub precision: MetricSummary,
    /// Recall
    pub recall: MetricSummary,
    /// F1
    pub f1: MetricSummary,
    /// Pair quality
    pub pq: MetricSummary,
    /// Pair completeness
    pub pc: MetricSummary,
    /// F1*
    pub f1_star: MetricSummary,
    /// Fraction of pairs compared
    pub proportion_comparisons: MetricSummary,
}

impl BandSummary {
    fn from_reports(bands: BandSelection, reports: &[PerformanceReport]) -> Self {
        let column = |f: fn(&PerformanceReport) -> f64| -> MetricSummary {
            let values: Vec<f64> = reports.iter().map(f).collect();
            MetricSummary::of(&values)
        };
        Self {
            bands,
            rounds: reports.len(),
            precision: column(|r| r.precision),
            recall: column(|r| r.recall),
            f1: column(|r| r.f1),
            pq: column(|r| r.pq),
            pc: column(|r| r.pc),
            f1_star: column(|r| r.f1_star),
            proportion_comparisons: column(|r| r.proportion_comparisons),
        }
    }
}

/// Output of a full bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapSummary {
    /// Metric that was maximized
    pub metric: OptimalityMetric,
    /// Per-round details
    pub rounds: Vec<RoundResult>,
    /// Averages per band split, ordered by ascending band count
    pub bands: Vec<BandSummary>,
}

/// Runs the bootstrap tuning procedure.
pub struct BootstrapHarness {
    detector: DuplicateDetector,
    config: BootstrapConfig,
}

impl BootstrapHarness {
    /// Create a harness, validating the bootstrap configuration.
    pub fn new(detector: DuplicateDetector, config: BootstrapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { detector, config })
    }

    /// Run every round and summarize the out-of-bag results.
    pub fn run(
        &self,
        dataset: &Dataset,
        progress: Option<ProgressCallback>,
    ) -> Result<BootstrapSummary> {
        if dataset.is_empty() {
            return Err(DupdetectError::validation("cannot bootstrap an empty dataset"));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let total = self.config.rounds;
        let mut rounds = Vec::with_capacity(total);

        for round in 1..=total {
            if let Some(ref callback) = progress {
                callback(
                    &format!("Bootstrap round {round}/{total}"),
                    (round - 1) as f64 / total as f64 * 100.0,
                );
            }

            let sample = bootstrap_sample(dataset, &mut rng);
            info!(
                "Bootstrap {}: {} in-bag, {} out-of-bag products",
                round,
                sample.in_bag.len(),
                sample.out_of_bag.len()
            );

            match self.run_round(round, &sample) {
                Ok(result) => rounds.push(result),
                Err(e) => warn!("Skipping bootstrap round {}: {}", round, e),
            }
        }

        if let Some(ref callback) = progress {
            callback("Bootstrap complete", 100.0);
        }

        let bands = self.summarize(&rounds);
        Ok(BootstrapSummary {
            metric: self.config.metric,
            rounds,
            bands,
        })
    }

    fn run_round(&self, round: usize, sample: &BootstrapSample) -> Result<RoundResult> {
        let in_bag_signatures = Arc::new(self.detector.compute_signatures(&sample.in_bag)?);
        let out_of_bag_signatures = Arc::new(self.detector.compute_signatures(&sample.out_of_bag)?);

        let mut settings = Vec::new();
        for &bands in self.detector.optimizer().options() {
            let Some((compare_similarity, in_bag_score)) =
                self.tune(sample, &in_bag_signatures, bands)
            else {
                warn!(
                    "Round {}: no defined in-bag result for r={}, b={}",
                    round, bands.rows, bands.bands
                );
                continue;
            };

            match self.detector.detect_with_bands(
                &sample.out_of_bag,
                Arc::clone(&out_of_bag_signatures),
                bands,
                compare_similarity,
            ) {
                Ok(run) => settings.push(TunedSetting {
                    bands,
                    compare_similarity,
                    in_bag_score,
                    out_of_bag: run.report,
                }),
                Err(e) => warn!(
                    "Round {}: out-of-bag evaluation failed for r={}, b={}: {}",
                    round, bands.rows, bands.bands, e
                ),
            }
        }

        Ok(RoundResult {
            round,
            in_bag_products: sample.in_bag.len(),
            out_of_bag_products: sample.out_of_bag.len(),
            settings,
        })
    }

    /// Comparison threshold with the best in-bag metric; ties keep the
    /// smaller threshold.
    fn tune(
        &self,
        sample: &BootstrapSample,
        signatures: &Arc<SignatureMatrix>,
        bands: BandSelection,
    ) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for &threshold in &self.config.compare_grid {
            let run = self
                .detector
                .detect_with_bands(&sample.in_bag, Arc::clone(signatures), bands, threshold);
            let score = match run {
                Ok(run) => run.report.metric(self.config.metric),
                Err(_) => continue,
            };
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((threshold, score));
            }
        }
        best
    }

    fn summarize(&self, rounds: &[RoundResult]) -> Vec<BandSummary> {
        self.detector
            .optimizer()
            .options()
            .iter()
            .filter_map(|&bands| {
                let reports: Vec<PerformanceReport> = rounds
                    .iter()
                    .flat_map(|round| round.settings.iter())
                    .filter(|setting| setting.bands == bands)
                    .map(|setting| setting.out_of_bag)
                    .collect();
                (!reports.is_empty()).then(|| BandSummary::from_reports(bands, &reports))
            })
            .collect()
    }
}
