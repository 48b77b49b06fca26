//! Confusion matrix and duplicate-detection quality measures.
//!
//! Only candidate pairs are ever classified; every other pair is implicitly
//! predicted distinct. The matrix therefore derives FN and TN from the number
//! of real duplicates `Nd` and the total pair count `C(n, 2)` instead of
//! tallying them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::dataset::{pairs_among, DataStatistics, Product};
use crate::core::errors::{DupdetectError, Result};
use crate::detectors::classifier::Classification;
use crate::detectors::lsh::CandidatePair;

/// Metric maximized when tuning settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OptimalityMetric {
    /// Precision
    Precision,
    /// Recall
    Recall,
    /// F1 of precision and recall
    #[default]
    F1,
    /// Pair quality
    Pq,
    /// Pair completeness
    Pc,
    /// F1 of pair quality and pair completeness
    F1Star,
}

impl fmt::Display for OptimalityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::F1 => "F1",
            Self::Pq => "PQ",
            Self::Pc => "PC",
            Self::F1Star => "F1*",
        };
        f.write_str(name)
    }
}

/// Ground truth of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truth {
    /// Both model ids known and equal
    Duplicate,
    /// Both model ids known and different
    Distinct,
    /// At least one model id missing
    Unknown,
}

impl Truth {
    /// Ground truth of two products.
    pub fn of(a: &Product, b: &Product) -> Self {
        match (&a.model_id, &b.model_id) {
            (Some(left), Some(right)) if left == right => Self::Duplicate,
            (Some(_), Some(_)) => Self::Distinct,
            _ => Self::Unknown,
        }
    }
}

/// Grade of one classified pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Observation {
    /// Predicted and real duplicate
    TruePositive,
    /// Predicted duplicate, really distinct
    FalsePositive,
    /// Predicted distinct, really duplicate
    FalseNegative,
    /// Predicted and real distinct
    TrueNegative,
    /// Ground truth missing
    Unknown,
}

impl Observation {
    /// Grade a prediction against the truth.
    pub fn grade(predicted: bool, truth: Truth) -> Self {
        match (predicted, truth) {
            (_, Truth::Unknown) => Self::Unknown,
            (true, Truth::Duplicate) => Self::TruePositive,
            (true, Truth::Distinct) => Self::FalsePositive,
            (false, Truth::Duplicate) => Self::FalseNegative,
            (false, Truth::Distinct) => Self::TrueNegative,
        }
    }

    /// Whether the pair is a real duplicate
    pub fn is_real_duplicate(self) -> bool {
        matches!(self, Self::TruePositive | Self::FalseNegative)
    }
}

/// A classified pair with its grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedPair {
    /// The pair
    pub pair: CandidatePair,
    /// Its grade
    pub observation: Observation,
}

/// Confusion matrix over all `C(n, 2)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// True positives
    pub tp: usize,
    /// False positives
    pub fp: usize,
    /// True negatives
    pub tn: usize,
    /// False negatives
    #[serde(rename = "fn")]
    pub fn_: usize,
    /// Classified pairs without ground truth
    pub unknown: usize,
    /// Candidate pairs classified
    pub num_comparisons: usize,
    /// Real duplicates among the candidates
    pub candidate_duplicates: usize,
    /// Number of products `n`
    pub num_products: usize,
    /// Number of real duplicate pairs `Nd`
    pub real_duplicates: usize,
}

impl ConfusionMatrix {
    /// All pairs, `n(n-1)/2`
    pub fn total_pairs(&self) -> usize {
        pairs_among(self.num_products)
    }

    /// Predicted duplicates (`c` in the rendered matrix)
    pub fn predicted_duplicates(&self) -> usize {
        self.tp + self.fp
    }

    /// Predicted distinct (`f` in the rendered matrix)
    pub fn predicted_distinct(&self) -> usize {
        self.tn + self.fn_
    }

    /// Real distinct pairs (`s` in the rendered matrix)
    pub fn real_distinct(&self) -> usize {
        self.total_pairs() - self.real_duplicates
    }

    /// Whether the four cells add up to `C(n, 2)`.
    pub fn is_consistent(&self) -> bool {
        self.tp + self.fp + self.tn + self.fn_ == self.total_pairs()
    }
}

/// Quality measures of one detection run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// TP / (TP + FP)
    pub precision: f64,
    /// TP / (TP + FN)
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Pair quality: real duplicates per comparison
    pub pq: f64,
    /// Pair completeness: share of real duplicates among the candidates
    pub pc: f64,
    /// Harmonic mean of PQ and PC
    pub f1_star: f64,
    /// Candidate pairs classified
    pub num_comparisons: usize,
    /// Comparisons relative to all pairs
    pub proportion_comparisons: f64,
}

impl PerformanceReport {
    /// Value of `metric`
    pub fn metric(&self, metric: OptimalityMetric) -> f64 {
        match metric {
            OptimalityMetric::Precision => self.precision,
            OptimalityMetric::Recall => self.recall,
            OptimalityMetric::F1 => self.f1,
            OptimalityMetric::Pq => self.pq,
            OptimalityMetric::Pc => self.pc,
            OptimalityMetric::F1Star => self.f1_star,
        }
    }
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

/// Grades classifications and computes the quality measures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Create an evaluator
    pub fn new() -> Self {
        Self
    }

    /// Grade every classification against the products' model ids.
    pub fn grade(
        &self,
        classifications: &[Classification],
        products: &[Product],
    ) -> Result<Vec<GradedPair>> {
        classifications
            .iter()
            .map(|classification| {
                let pair = classification.pair;
                let (a, b) = match (products.get(pair.a), products.get(pair.b)) {
                    (Some(a), Some(b)) => (a, b),
                    _ => {
                        return Err(DupdetectError::pipeline(
                            "evaluation",
                            format!(
                                "pair ({}, {}) out of range for {} products",
                                pair.a,
                                pair.b,
                                products.len()
                            ),
                        ))
                    }
                };
                Ok(GradedPair {
                    pair,
                    observation: Observation::grade(
                        classification.verdict.is_duplicate,
                        Truth::of(a, b),
                    ),
                })
            })
            .collect()
    }

    /// Tally a confusion matrix from the graded stream.
    pub fn confusion_matrix(
        &self,
        graded: &[GradedPair],
        stats: DataStatistics,
    ) -> Result<ConfusionMatrix> {
        let mut matrix = ConfusionMatrix {
            num_comparisons: graded.len(),
            num_products: stats.products,
            real_duplicates: stats.real_duplicate_pairs,
            ..ConfusionMatrix::default()
        };

        for graded_pair in graded {
            match graded_pair.observation {
                Observation::TruePositive => matrix.tp += 1,
                Observation::FalsePositive => matrix.fp += 1,
                Observation::Unknown => matrix.unknown += 1,
                Observation::FalseNegative | Observation::TrueNegative => {}
            }
            if graded_pair.observation.is_real_duplicate() {
                matrix.candidate_duplicates += 1;
            }
        }

        let total = matrix.total_pairs();
        matrix.fn_ = stats.real_duplicate_pairs.checked_sub(matrix.tp).ok_or_else(|| {
            DupdetectError::math_with_context(
                format!(
                    "{} true positives exceed {} real duplicate pairs",
                    matrix.tp, stats.real_duplicate_pairs
                ),
                "confusion matrix",
            )
        })?;
        matrix.tn = total
            .checked_sub(stats.real_duplicate_pairs + matrix.fp)
            .ok_or_else(|| {
                DupdetectError::math_with_context(
                    format!(
                        "{} real duplicates and {} false positives exceed {} pairs",
                        stats.real_duplicate_pairs, matrix.fp, total
                    ),
                    "confusion matrix",
                )
            })?;

        debug!(
            "Confusion matrix: TP={} FP={} TN={} FN={} unknown={}",
            matrix.tp, matrix.fp, matrix.tn, matrix.fn_, matrix.unknown
        );
        Ok(matrix)
    }

    /// Derive the quality measures.
    ///
    /// Fails when the data holds no real duplicate pair, since recall and
    /// pair completeness are undefined.
    pub fn evaluate(&self, matrix: &ConfusionMatrix) -> Result<PerformanceReport> {
        if matrix.real_duplicates == 0 {
            return Err(DupdetectError::math_with_context(
                "recall is undefined without real duplicate pairs",
                "evaluation",
            ));
        }
        if !matrix.is_consistent() {
            return Err(DupdetectError::internal(format!(
                "confusion matrix cells sum to {} instead of {}",
                matrix.tp + matrix.fp + matrix.tn + matrix.fn_,
                matrix.total_pairs()
            )));
        }

        let precision = if matrix.predicted_duplicates() == 0 {
            0.0
        } else {
            matrix.tp as f64 / matrix.predicted_duplicates() as f64
        };
        let recall = matrix.tp as f64 / (matrix.tp + matrix.fn_) as f64;
        let f1 = if matrix.tp == 0 { 0.0 } else { harmonic_mean(precision, recall) };

        let pq = if matrix.num_comparisons == 0 {
            0.0
        } else {
            matrix.candidate_duplicates as f64 / matrix.num_comparisons as f64
        };
        let pc = matrix.candidate_duplicates as f64 / matrix.real_duplicates as f64;
        let f1_star = if matrix.candidate_duplicates == 0 { 0.0 } else { harmonic_mean(pq, pc) };

        Ok(PerformanceReport {
            precision,
            recall,
            f1,
            pq,
            pc,
            f1_star,
            num_comparisons: matrix.num_comparisons,
            proportion_comparisons: matrix.num_comparisons as f64 / matrix.total_pairs() as f64,
        })
    }
}
