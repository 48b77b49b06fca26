//! Duplicate detection pipeline that wires the detectors together.
//!
//! Stages:
//! - Normalization (token sets and products)
//! - MinHash signatures
//! - Band selection and LSH bucketing
//! - Pairwise classification
//! - Evaluation against the model ids

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::{validate_unit_interval, DetectionConfig};
use crate::core::dataset::{DataStatistics, Dataset};
use crate::core::errors::{DupdetectError, Result};
use crate::detectors::classifier::{Classification, DuplicateClassifier};
use crate::detectors::lsh::{
    BandOptimizer, BandSelection, LshBucketer, LshRunMetrics, MinHashEngine, SignatureMatrix,
};
use crate::evaluation::metrics::{ConfusionMatrix, Evaluator, PerformanceReport};

/// Progress callback: stage description and percent complete.
pub type ProgressCallback = Box<dyn Fn(&str, f64) + Send + Sync>;

/// Everything produced by one detection run.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionRun {
    /// Band split used for bucketing
    pub bands: BandSelection,
    /// Comparison threshold used for banded candidates
    pub compare_similarity: f64,
    /// Dataset size statistics
    pub stats: DataStatistics,
    /// Confusion matrix over all pairs
    pub confusion: ConfusionMatrix,
    /// Quality measures
    pub report: PerformanceReport,
    /// Timing and candidate counts
    pub metrics: LshRunMetrics,
    /// Every classified candidate pair, in pair order
    #[serde(skip)]
    pub classifications: Vec<Classification>,
    /// Signature matrix, reusable for further runs over the same dataset
    #[serde(skip)]
    pub signatures: Arc<SignatureMatrix>,
}

/// Single entry point for duplicate detection.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    config: DetectionConfig,
    engine: MinHashEngine,
    optimizer: BandOptimizer,
}

impl DuplicateDetector {
    /// Create a detector, validating the configuration.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        let engine = MinHashEngine::from_config(&config)?;
        let optimizer = BandOptimizer::new(config.num_hash_functions)?;
        Ok(Self {
            config,
            engine,
            optimizer,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Band optimizer for the configured signature length
    pub fn optimizer(&self) -> &BandOptimizer {
        &self.optimizer
    }

    /// Band split chosen for the configured LSH threshold
    pub fn selected_bands(&self) -> BandSelection {
        self.optimizer.best_for(self.config.lsh_similarity)
    }

    /// Compute the signature matrix of a dataset.
    pub fn compute_signatures(&self, dataset: &Dataset) -> Result<SignatureMatrix> {
        self.engine.signatures(&dataset.token_sets())
    }

    /// Run the full pipeline on a dataset.
    pub fn detect(&self, dataset: &Dataset) -> Result<DetectionRun> {
        let start = Instant::now();
        let signatures = Arc::new(self.compute_signatures(dataset)?);
        let signature_time = start.elapsed();

        let mut run = self.detect_with_signatures(dataset, signatures)?;
        run.metrics.signature_time = signature_time;
        run.metrics.log_summary();
        Ok(run)
    }

    /// Run the pipeline with precomputed signatures.
    pub fn detect_with_signatures(
        &self,
        dataset: &Dataset,
        signatures: Arc<SignatureMatrix>,
    ) -> Result<DetectionRun> {
        let bands = self.selected_bands();
        info!(
            "r: {} - b: {} - threshold: {:.4}",
            bands.rows, bands.bands, bands.threshold
        );
        self.detect_with_bands(dataset, signatures, bands, self.config.compare_similarity)
    }

    /// Run the pipeline with an explicit band split and comparison threshold.
    pub fn detect_with_bands(
        &self,
        dataset: &Dataset,
        signatures: Arc<SignatureMatrix>,
        bands: BandSelection,
        compare_similarity: f64,
    ) -> Result<DetectionRun> {
        validate_unit_interval(compare_similarity, "compare_similarity")?;

        let stats = dataset.statistics();
        if signatures.num_products() != stats.products {
            return Err(DupdetectError::pipeline(
                "signatures",
                format!(
                    "signature matrix covers {} products, dataset has {}",
                    signatures.num_products(),
                    stats.products
                ),
            ));
        }
        debug!(
            "Data statistics: n={}, Nd={}",
            stats.products, stats.real_duplicate_pairs
        );

        let products = dataset.products();
        let token_sets = dataset.token_sets();
        let mut metrics = LshRunMetrics {
            products: stats.products,
            ..LshRunMetrics::new()
        };

        let start = Instant::now();
        let bucketer = LshBucketer::from_selection(&bands)?;
        let candidates = bucketer.candidates(&signatures, &token_sets)?;
        metrics.bucketing_time = start.elapsed();
        metrics.banded_candidates = candidates.banded.len();
        metrics.model_id_candidates = candidates.model_id.len();

        let start = Instant::now();
        let classifier = DuplicateClassifier::new(compare_similarity);
        let classifications =
            classifier.classify(&candidates, &products, &token_sets, &signatures)?;
        metrics.classification_time = start.elapsed();

        let evaluator = Evaluator::new();
        let graded = evaluator.grade(&classifications, &products)?;
        let confusion = evaluator.confusion_matrix(&graded, stats)?;
        let report = evaluator.evaluate(&confusion)?;

        info!(
            "F1 = {:.4}, F1* = {:.4} over {} comparisons",
            report.f1, report.f1_star, report.num_comparisons
        );

        Ok(DetectionRun {
            bands,
            compare_similarity,
            stats,
            confusion,
            report,
            metrics,
            classifications,
            signatures,
        })
    }
}
