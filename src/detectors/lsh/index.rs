//! LSH bucketing of signature bands and model identifiers.
//!
//! Every product column is cut into `b` contiguous bands of `r` rows. Two
//! products become candidates when they agree on a whole band at the same
//! band position, or when they share an extracted model identifier.

use std::collections::BTreeSet;
use std::time::Instant;

use ahash::RandomState;
use indexmap::IndexMap;
use ndarray::ArrayView1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bands::BandSelection;
use super::signatures::SignatureMatrix;
use crate::core::errors::{DupdetectError, Result};
use crate::detectors::text::{extract_model_ids, TokenSet};

/// Key of a single bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// Band position plus the exact `r` signature values of that band
    Band {
        /// Zero-based band index
        band: usize,
        /// Signature values of the band, in row order
        values: Box<[u64]>,
    },
    /// Hyphen-free model identifier
    ModelId(String),
}

/// Owned bucket map: key → member product indices.
#[derive(Debug, Clone)]
pub struct Buckets {
    map: IndexMap<BucketKey, Vec<usize>, RandomState>,
}

impl Default for Buckets {
    fn default() -> Self {
        Self::new()
    }
}

impl Buckets {
    /// Create an empty bucket map
    pub fn new() -> Self {
        Self {
            map: IndexMap::with_hasher(RandomState::new()),
        }
    }

    /// Add `product` to the bucket under `key`
    pub fn insert(&mut self, key: BucketKey, product: usize) {
        self.map.entry(key).or_default().push(product);
    }

    /// Fold another shard into this one.
    pub fn merge(&mut self, other: Buckets) {
        for (key, members) in other.map {
            self.map.entry(key).or_default().extend(members);
        }
    }

    /// Drop every bucket with fewer than two members.
    pub fn retain_shared(&mut self) {
        self.map.retain(|_, members| members.len() >= 2);
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no buckets
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Members of the bucket under `key`
    pub fn members(&self, key: &BucketKey) -> Option<&[usize]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Iterate buckets
    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &[usize])> + '_ {
        self.map.iter().map(|(key, members)| (key, members.as_slice()))
    }

    /// Every unordered pair of products sharing a bucket.
    pub fn candidate_pairs(&self) -> BTreeSet<CandidatePair> {
        let mut pairs = BTreeSet::new();
        for members in self.map.values() {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    if a != b {
                        pairs.insert(CandidatePair::new(a, b));
                    }
                }
            }
        }
        pairs
    }
}

/// Unordered product pair, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    /// Smaller product index
    pub a: usize,
    /// Larger product index
    pub b: usize,
}

impl CandidatePair {
    /// Build a pair from two indices in any order
    pub fn new(x: usize, y: usize) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }
}

/// How a candidate pair was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Shared signature band
    Banded,
    /// Shared model identifier
    ModelId,
}

/// Candidate pairs of one run, split by source.
///
/// The two sets are disjoint: a pair found through both routes is kept
/// only as a model-id pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    /// Pairs sharing at least one band
    pub banded: BTreeSet<CandidatePair>,
    /// Pairs sharing a model identifier
    pub model_id: BTreeSet<CandidatePair>,
}

impl CandidateSet {
    /// Extract candidate pairs from the band and model-id bucket maps.
    pub fn from_buckets(banded: &Buckets, model_id: &Buckets) -> Self {
        let model_id = model_id.candidate_pairs();
        let banded = banded
            .candidate_pairs()
            .into_iter()
            .filter(|pair| !model_id.contains(pair))
            .collect();
        Self { banded, model_id }
    }

    /// Total number of distinct pairs
    pub fn len(&self) -> usize {
        self.banded.len() + self.model_id.len()
    }

    /// Whether no pair was found
    pub fn is_empty(&self) -> bool {
        self.banded.is_empty() && self.model_id.is_empty()
    }

    /// Whether `pair` is a candidate through either route
    pub fn contains(&self, pair: &CandidatePair) -> bool {
        self.banded.contains(pair) || self.model_id.contains(pair)
    }

    /// All pairs tagged with their source, sorted by pair.
    pub fn tagged(&self) -> Vec<(CandidatePair, CandidateSource)> {
        let mut tagged: Vec<_> = self
            .banded
            .iter()
            .map(|&pair| (pair, CandidateSource::Banded))
            .chain(
                self.model_id
                    .iter()
                    .map(|&pair| (pair, CandidateSource::ModelId)),
            )
            .collect();
        tagged.sort_unstable_by_key(|(pair, _)| *pair);
        tagged
    }
}

/// Splits signatures into bands and buckets them.
#[derive(Debug, Clone, Copy)]
pub struct LshBucketer {
    rows: usize,
    bands: usize,
}

impl LshBucketer {
    /// Create a bucketer with `bands` bands of `rows` rows.
    pub fn new(rows: usize, bands: usize) -> Result<Self> {
        if rows == 0 || bands == 0 {
            return Err(DupdetectError::lsh_with_parameters(
                "rows and bands must be positive",
                format!("r={rows}, b={bands}"),
            ));
        }
        Ok(Self { rows, bands })
    }

    /// Create a bucketer from an optimizer selection
    pub fn from_selection(selection: &BandSelection) -> Result<Self> {
        Self::new(selection.rows, selection.bands)
    }

    /// Rows per band
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of bands
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Band keys of a single signature column.
    pub fn band_keys(&self, column: ArrayView1<'_, u64>) -> Vec<BucketKey> {
        let values = column.to_vec();
        values
            .chunks(self.rows)
            .take(self.bands)
            .enumerate()
            .map(|(band, chunk)| BucketKey::Band {
                band,
                values: chunk.into(),
            })
            .collect()
    }

    /// Bucket every non-empty product column by band.
    ///
    /// Fails unless `r·b` equals the signature length.
    pub fn bucket_signatures(&self, signatures: &SignatureMatrix) -> Result<Buckets> {
        let num_hashes = signatures.num_hashes();
        if self.rows * self.bands != num_hashes {
            return Err(DupdetectError::lsh_with_parameters(
                "rows times bands must equal the signature length",
                format!("r={}, b={}, n={num_hashes}", self.rows, self.bands),
            ));
        }

        let start = Instant::now();
        let mut buckets = (0..signatures.num_products())
            .into_par_iter()
            .filter(|&product| !signatures.is_empty_column(product))
            .fold(Buckets::new, |mut shard, product| {
                for key in self.band_keys(signatures.column(product)) {
                    shard.insert(key, product);
                }
                shard
            })
            .reduce(Buckets::new, |mut left, right| {
                left.merge(right);
                left
            });

        let before = buckets.len();
        buckets.retain_shared();
        debug!(
            "Band buckets reduced from {} to {} in {:?}",
            before,
            buckets.len(),
            start.elapsed()
        );
        Ok(buckets)
    }

    /// Bucket products by the model identifiers in their token sets.
    pub fn model_id_buckets(&self, token_sets: &[TokenSet]) -> Buckets {
        let mut buckets = token_sets
            .par_iter()
            .enumerate()
            .fold(Buckets::new, |mut shard, (product, tokens)| {
                for id in extract_model_ids(tokens) {
                    shard.insert(BucketKey::ModelId(id), product);
                }
                shard
            })
            .reduce(Buckets::new, |mut left, right| {
                left.merge(right);
                left
            });

        let before = buckets.len();
        buckets.retain_shared();
        debug!(
            "Model-id buckets reduced from {} to {}",
            before,
            buckets.len()
        );
        buckets
    }

    /// Candidate pairs from both bucketing routes.
    pub fn candidates(
        &self,
        signatures: &SignatureMatrix,
        token_sets: &[TokenSet],
    ) -> Result<CandidateSet> {
        if signatures.num_products() != token_sets.len() {
            return Err(DupdetectError::validation_mismatch(
                "token_sets",
                format!("{} entries", signatures.num_products()),
                token_sets.len().to_string(),
            ));
        }

        let banded = self.bucket_signatures(signatures)?;
        let model_ids = self.model_id_buckets(token_sets);
        let candidates = CandidateSet::from_buckets(&banded, &model_ids);

        info!(
            "LSH (r={}, b={}) found {} candidate pairs ({} banded, {} by model id)",
            self.rows,
            self.bands,
            candidates.len(),
            candidates.banded.len(),
            candidates.model_id.len()
        );
        Ok(candidates)
    }
}
