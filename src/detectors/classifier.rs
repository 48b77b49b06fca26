//! Pairwise duplicate classification of LSH candidates.
//!
//! Rules, first match wins:
//! 1. brand check enabled and both products list different brands → distinct
//! 2. signature agreement ≥ threshold → duplicate
//! 3. token similarity > threshold → duplicate
//! 4. otherwise distinct
//!
//! Banded candidates are checked against the configured comparison threshold
//! with the brand rule on. Model-id candidates skip the brand rule and use a
//! zero threshold, so every model-id pair is accepted.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::dataset::Product;
use crate::core::errors::{DupdetectError, Result};
use crate::detectors::lsh::{
    CandidatePair, CandidateSet, CandidateSource, Jaccard, SignatureMatrix, TokenSimilarity,
};
use crate::detectors::text::TokenSet;

/// Rule that decided a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Brands differ
    Brand,
    /// Signature agreement reached the threshold
    Signature,
    /// Token similarity decided
    Similarity,
}

/// Outcome for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the pair is predicted duplicate
    pub is_duplicate: bool,
    /// Rule that decided
    pub reason: Reason,
}

/// Threshold and brand rule applied to one class of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPolicy {
    /// Similarity threshold `t`
    pub threshold: f64,
    /// Whether differing brands veto a match
    pub check_brand: bool,
}

impl ClassifierPolicy {
    /// Policy for banded candidates
    pub fn banded(threshold: f64) -> Self {
        Self {
            threshold,
            check_brand: true,
        }
    }

    /// Policy for model-id candidates
    pub fn model_id() -> Self {
        Self {
            threshold: 0.0,
            check_brand: false,
        }
    }
}

/// Classified candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The candidate pair
    pub pair: CandidatePair,
    /// Bucketing route that produced the pair
    pub source: CandidateSource,
    /// The decision
    pub verdict: Verdict,
}

/// Decides duplicate / distinct for candidate pairs.
#[derive(Debug, Clone)]
pub struct DuplicateClassifier<S = Jaccard> {
    compare_similarity: f64,
    similarity: S,
}

impl DuplicateClassifier<Jaccard> {
    /// Classifier using Jaccard similarity as the fallback rule
    pub fn new(compare_similarity: f64) -> Self {
        Self::with_similarity(compare_similarity, Jaccard)
    }
}

impl<S: TokenSimilarity> DuplicateClassifier<S> {
    /// Classifier with a custom fallback similarity
    pub fn with_similarity(compare_similarity: f64, similarity: S) -> Self {
        Self {
            compare_similarity,
            similarity,
        }
    }

    /// Threshold used for banded candidates
    pub fn compare_similarity(&self) -> f64 {
        self.compare_similarity
    }

    /// Policy applied to candidates from `source`
    pub fn policy_for(&self, source: CandidateSource) -> ClassifierPolicy {
        match source {
            CandidateSource::Banded => ClassifierPolicy::banded(self.compare_similarity),
            CandidateSource::ModelId => ClassifierPolicy::model_id(),
        }
    }

    /// Apply the rules to one pair.
    ///
    /// `agreement` is the signature agreement of the pair; token similarity
    /// is only computed when the signatures fall short.
    pub fn verdict(
        &self,
        products: (&Product, &Product),
        tokens: (&TokenSet, &TokenSet),
        agreement: f64,
        policy: ClassifierPolicy,
    ) -> Verdict {
        if policy.check_brand && brands_differ(products.0, products.1) {
            return Verdict {
                is_duplicate: false,
                reason: Reason::Brand,
            };
        }

        if agreement >= policy.threshold {
            return Verdict {
                is_duplicate: true,
                reason: Reason::Signature,
            };
        }

        Verdict {
            is_duplicate: self.similarity.similarity(tokens.0, tokens.1) > policy.threshold,
            reason: Reason::Similarity,
        }
    }

    /// Classify every candidate pair, in pair order.
    pub fn classify(
        &self,
        candidates: &CandidateSet,
        products: &[Product],
        token_sets: &[TokenSet],
        signatures: &SignatureMatrix,
    ) -> Result<Vec<Classification>> {
        let n = products.len();
        if token_sets.len() != n || signatures.num_products() != n {
            return Err(DupdetectError::pipeline(
                "classification",
                format!(
                    "{} products, {} token sets and {} signatures do not line up",
                    n,
                    token_sets.len(),
                    signatures.num_products()
                ),
            ));
        }
        if let Some((pair, _)) = candidates.tagged().into_iter().find(|(pair, _)| pair.b >= n) {
            return Err(DupdetectError::pipeline(
                "classification",
                format!("candidate ({}, {}) out of range for {n} products", pair.a, pair.b),
            ));
        }

        let start = Instant::now();
        let classifications: Vec<Classification> = candidates
            .tagged()
            .into_par_iter()
            .map(|(pair, source)| {
                let verdict = self.verdict(
                    (&products[pair.a], &products[pair.b]),
                    (&token_sets[pair.a], &token_sets[pair.b]),
                    signatures.agreement(pair.a, pair.b),
                    self.policy_for(source),
                );
                Classification {
                    pair,
                    source,
                    verdict,
                }
            })
            .collect();

        debug!(
            "Classified {} pairs with {} fallback in {:?}",
            classifications.len(),
            self.similarity.name(),
            start.elapsed()
        );
        Ok(classifications)
    }
}

fn brands_differ(a: &Product, b: &Product) -> bool {
    match (a.brand(), b.brand()) {
        (Some(left), Some(right)) => left.to_lowercase() != right.to_lowercase(),
        _ => false,
    }
}
