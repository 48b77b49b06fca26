//! # dupdetect-rs: Near-Duplicate Product Detection
//!
//! Finds listings of the same product scraped from different web shops
//! without comparing every pair. Titles are normalized into token sets,
//! hashed into MinHash signatures and bucketed with locality-sensitive
//! hashing; only products sharing a bucket are classified.
//!
//! - **Text**: unit folding, token cleaning and model-id extraction
//! - **MinHash/LSH**: linear hash family, signature matrix, band selection,
//!   band and model-id bucketing
//! - **Classification**: brand, signature and similarity rules
//! - **Evaluation**: confusion matrix, F1, pair quality and completeness,
//!   bootstrap tuning
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DuplicateDetector                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Core          │  Detectors            │  Evaluation          │
//! │ • Config       │ • Text normalization  │ • Confusion matrix   │
//! │ • Dataset      │ • MinHash / LSH       │ • Performance report │
//! │ • Pipeline     │ • Classifier          │ • Bootstrap harness  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dupdetect::{Dataset, DetectionConfig, DuplicateDetector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = Dataset::from_json_file("data/TVs-all-merged.json")?;
//!     let detector = DuplicateDetector::new(DetectionConfig::default())?;
//!
//!     let run = detector.detect(&dataset)?;
//!     println!("F1 = {:.3} over {} comparisons", run.report.f1, run.report.num_comparisons);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Core engine modules
pub mod core {
    //! Configuration, datasets, errors and the detection pipeline.

    pub mod config;
    pub mod dataset;
    pub mod errors;
    pub mod pipeline;
}

// Detection algorithms
pub mod detectors {
    //! Text normalization, MinHash/LSH and pairwise classification.

    pub mod classifier;
    pub mod lsh;
    pub mod text;
}

pub mod evaluation;

// Re-export primary types for convenience
pub use crate::core::config::{BootstrapConfig, DetectionConfig, DupdetectConfig};
pub use crate::core::dataset::{DataStatistics, Dataset, Product, ProductRecord};
pub use crate::core::errors::{DupdetectError, Result, ResultExt};
pub use crate::core::pipeline::{DetectionRun, DuplicateDetector, ProgressCallback};
pub use crate::evaluation::{
    BootstrapHarness, BootstrapSummary, ConfusionMatrix, OptimalityMetric, PerformanceReport,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
