//! Evaluation of detection runs against ground-truth model ids.

pub mod bootstrap;
pub mod metrics;

pub use bootstrap::{
    bootstrap_sample, BandSummary, BootstrapHarness, BootstrapSample, BootstrapSummary,
    MetricSummary, RoundResult, TunedSetting,
};
pub use metrics::{
    ConfusionMatrix, Evaluator, GradedPair, Observation, OptimalityMetric, PerformanceReport, Truth,
};
