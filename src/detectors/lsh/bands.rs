//! Band/row selection for LSH banding.
//!
//! With `b` bands of `r` rows, two signatures with Jaccard similarity `s`
//! become candidates with probability `a(s) = 1 - (1 - s^r)^b`. The point
//! where that S-curve crosses one half acts as the effective similarity
//! threshold of the index; for a fixed signature length `n = r·b` the
//! optimizer picks the split whose threshold sits closest to the one asked
//! for.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{DupdetectError, Result};

/// Convergence tolerance on `|a(s) - 0.5|`.
const TOLERANCE: f64 = 1e-5;

/// Upper bound on bisection steps; f64 resolution is exhausted long before.
const MAX_ITERATIONS: usize = 200;

/// Probability that two signatures with similarity `s` share at least one band.
pub fn candidate_probability(s: f64, rows: usize, bands: usize) -> f64 {
    1.0 - (1.0 - s.powi(rows as i32)).powi(bands as i32)
}

/// A row/band split together with its effective threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSelection {
    /// Rows per band (`r`)
    pub rows: usize,
    /// Number of bands (`b`)
    pub bands: usize,
    /// Similarity at which `a(s, r, b)` crosses 0.5
    pub threshold: f64,
}

impl BandSelection {
    /// Signature length covered by this split
    pub fn num_hashes(&self) -> usize {
        self.rows * self.bands
    }
}

/// Bisection for the root of the increasing function `a(·, r, b) - 0.5` on [0, 1].
fn half_crossing(rows: usize, bands: usize) -> f64 {
    let (mut left, mut right) = (0.0_f64, 1.0_f64);
    let mut x = (left + right) / 2.0;
    let mut err = candidate_probability(x, rows, bands) - 0.5;
    let mut iterations = 0;

    while err.abs() >= TOLERANCE && iterations < MAX_ITERATIONS {
        if err < 0.0 {
            left = x;
        } else {
            right = x;
        }
        x = (left + right) / 2.0;
        err = candidate_probability(x, rows, bands) - 0.5;
        iterations += 1;
    }

    x
}

/// All (r, b, s*) triples with `r·b = n`, ordered by ascending `b`.
pub fn possible_bands(num_hashes: usize) -> Vec<BandSelection> {
    (1..=num_hashes)
        .filter(|bands| num_hashes % bands == 0)
        .map(|bands| {
            let rows = num_hashes / bands;
            BandSelection {
                rows,
                bands,
                threshold: half_crossing(rows, bands),
            }
        })
        .collect()
}

/// Chooses the band split for a fixed signature length.
#[derive(Debug, Clone)]
pub struct BandOptimizer {
    num_hashes: usize,
    options: Vec<BandSelection>,
}

impl BandOptimizer {
    /// Build the optimizer for `num_hashes` rows.
    ///
    /// `num_hashes` must be composite: a prime (or 1) only admits the trivial
    /// splits `(n, 1)` and `(1, n)`.
    pub fn new(num_hashes: usize) -> Result<Self> {
        let options = possible_bands(num_hashes);
        if options.len() <= 2 {
            return Err(DupdetectError::lsh_with_parameters(
                "number of hash functions must admit a non-trivial row/band split",
                format!("n={num_hashes}"),
            ));
        }

        debug!(
            "{} row/band splits available for n={}",
            options.len(),
            num_hashes
        );
        Ok(Self {
            num_hashes,
            options,
        })
    }

    /// Signature length this optimizer was built for
    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Every valid split, ordered by ascending band count
    pub fn options(&self) -> &[BandSelection] {
        &self.options
    }

    /// The split whose threshold is closest to `desired`.
    pub fn best_for(&self, desired: f64) -> BandSelection {
        self.options
            .iter()
            .copied()
            .min_by(|a, b| {
                (a.threshold - desired)
                    .abs()
                    .total_cmp(&(b.threshold - desired).abs())
            })
            .unwrap_or(self.options[0])
    }
}

/// Convenience wrapper: best split of `num_hashes` for `desired`.
pub fn best_bands(desired: f64, num_hashes: usize) -> Result<BandSelection> {
    Ok(BandOptimizer::new(num_hashes)?.best_for(desired))
}
