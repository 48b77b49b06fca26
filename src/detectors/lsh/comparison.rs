//! Similarity measures used when classifying candidate pairs.

use ndarray::ArrayView1;

use crate::detectors::text::TokenSet;

/// Fraction of positions on which two signatures agree.
///
/// Signatures of different length never agree; empty signatures score 0.
pub fn signature_agreement(sig1: ArrayView1<'_, u64>, sig2: ArrayView1<'_, u64>) -> f64 {
    if sig1.len() != sig2.len() || sig1.is_empty() {
        return 0.0;
    }

    let matching = sig1.iter().zip(sig2.iter()).filter(|(a, b)| a == b).count();
    matching as f64 / sig1.len() as f64
}

/// Exact similarity between two token sets, the fallback rule of the
/// classifier when signatures disagree too often.
pub trait TokenSimilarity: Send + Sync {
    /// Similarity in [0, 1]
    fn similarity(&self, a: &TokenSet, b: &TokenSet) -> f64;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Jaccard similarity of token sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaccard;

impl TokenSimilarity for Jaccard {
    fn similarity(&self, a: &TokenSet, b: &TokenSet) -> f64 {
        a.jaccard(b)
    }

    fn name(&self) -> &'static str {
        "jaccard"
    }
}
