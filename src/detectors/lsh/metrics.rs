//! Timing and volume statistics of a detection run.

use std::time::Duration;

use serde::Serialize;
use tracing::info;

/// Performance metrics for one MinHash/LSH run
#[derive(Debug, Default, Clone, Serialize)]
pub struct LshRunMetrics {
    /// Time spent computing the signature matrix
    pub signature_time: Duration,
    /// Time spent bucketing bands and model ids
    pub bucketing_time: Duration,
    /// Time spent classifying candidate pairs
    pub classification_time: Duration,
    /// Number of products processed
    pub products: usize,
    /// Banded candidate pairs
    pub banded_candidates: usize,
    /// Model-id candidate pairs
    pub model_id_candidates: usize,
}

impl LshRunMetrics {
    /// Create new metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Total candidate pairs classified
    pub fn comparisons(&self) -> usize {
        self.banded_candidates + self.model_id_candidates
    }

    /// Wall time across all stages
    pub fn total_time(&self) -> Duration {
        self.signature_time + self.bucketing_time + self.classification_time
    }

    /// Mean signature time per product
    pub fn average_signature_time(&self) -> Option<Duration> {
        (self.products > 0).then(|| self.signature_time.div_f64(self.products as f64))
    }

    /// Log performance summary
    pub fn log_summary(&self) {
        info!("LSH run summary:");
        info!("  Signature generation: {:?}", self.signature_time);
        info!("  Bucketing: {:?}", self.bucketing_time);
        info!("  Classification: {:?}", self.classification_time);
        info!("  Products processed: {}", self.products);
        info!(
            "  Comparisons: {} ({} banded, {} by model id)",
            self.comparisons(),
            self.banded_candidates,
            self.model_id_candidates
        );

        if let Some(average) = self.average_signature_time() {
            info!("  Average signature time: {:?}", average);
        }
    }
}
