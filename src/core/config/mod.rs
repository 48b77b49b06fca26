//! Configuration types and management for dupdetect.
//!
//! Defaults reproduce the reference experiment: 1155 hash functions built from
//! 105 shifts and 11 multipliers over the prime modulus 510529, with both the
//! LSH and comparison thresholds at 0.999.

pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DupdetectError, Result, ResultExt};
use crate::evaluation::metrics::OptimalityMetric;

pub use validation::{is_prime, validate_positive_usize, validate_prime, validate_unit_interval};

/// Modulus used by the reference experiment: 2·3·5·7·11·13·17 + 19.
pub const DEFAULT_MODULUS: u64 = 2 * 3 * 5 * 7 * 11 * 13 * 17 + 19;

/// Largest modulus accepted; keeps `m · x` inside `u64`.
pub const MAX_MODULUS: u64 = u32::MAX as u64;

/// Top-level configuration for the dupdetect engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DupdetectConfig {
    /// MinHash, LSH and classification settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Bootstrap train / out-of-bag evaluation settings
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl DupdetectConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.bootstrap.validate()?;
        Ok(())
    }
}

/// Settings consumed by a single detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Threshold used when classifying banded candidates
    pub compare_similarity: f64,

    /// Desired LSH threshold; picks the (r, b) split
    pub lsh_similarity: f64,

    /// Number of MinHash functions (signature length)
    pub num_hash_functions: usize,

    /// Number of evenly spaced additive constants
    pub num_const: usize,

    /// Number of evenly spaced multipliers
    pub num_mult: usize,

    /// Prime modulus of the linear hash family
    pub modulus: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            compare_similarity: 0.999,
            lsh_similarity: 0.999,
            num_hash_functions: 3 * 5 * 7 * 11,
            num_const: 105,
            num_mult: 11,
            modulus: DEFAULT_MODULUS,
        }
    }
}

impl DetectionConfig {
    /// Validate detection configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_interval(self.compare_similarity, "compare_similarity")?;
        validate_unit_interval(self.lsh_similarity, "lsh_similarity")?;
        validate_positive_usize(self.num_hash_functions, "num_hash_functions")?;
        validate_positive_usize(self.num_const, "num_const")?;
        validate_positive_usize(self.num_mult, "num_mult")?;

        if self.num_const * self.num_mult != self.num_hash_functions {
            return Err(DupdetectError::config_field(
                format!(
                    "num_const * num_mult ({} * {}) must equal num_hash_functions ({})",
                    self.num_const, self.num_mult, self.num_hash_functions
                ),
                "num_hash_functions",
            ));
        }

        if self.modulus > MAX_MODULUS {
            return Err(DupdetectError::validation_mismatch(
                "modulus",
                format!("at most {MAX_MODULUS}"),
                self.modulus.to_string(),
            ));
        }
        validate_prime(self.modulus, "modulus")?;

        Ok(())
    }

    /// Builder-style override of the comparison threshold
    pub fn with_compare_similarity(mut self, value: f64) -> Self {
        self.compare_similarity = value;
        self
    }

    /// Builder-style override of the LSH threshold
    pub fn with_lsh_similarity(mut self, value: f64) -> Self {
        self.lsh_similarity = value;
        self
    }

    /// Builder-style override of the hash family shape
    pub fn with_hash_family(mut self, num_const: usize, num_mult: usize) -> Self {
        self.num_const = num_const;
        self.num_mult = num_mult;
        self.num_hash_functions = num_const * num_mult;
        self
    }
}

/// Bootstrap resampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of bootstrap rounds
    pub rounds: usize,

    /// Seed for the resampling RNG
    pub seed: u64,

    /// Comparison thresholds tried for every band split
    pub compare_grid: Vec<f64>,

    /// Metric maximized when picking the comparison threshold
    pub metric: OptimalityMetric,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            rounds: 5,
            seed: 123,
            compare_grid: (1..=10).map(|step| f64::from(step) / 10.0).collect(),
            metric: OptimalityMetric::F1,
        }
    }
}

impl BootstrapConfig {
    /// Validate bootstrap configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.rounds, "rounds")?;

        if self.compare_grid.is_empty() {
            return Err(DupdetectError::config_field(
                "compare_grid cannot be empty",
                "compare_grid",
            ));
        }
        for &value in &self.compare_grid {
            validate_unit_interval(value, "compare_grid")?;
        }
        Ok(())
    }
}
