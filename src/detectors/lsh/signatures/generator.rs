//! MinHash signature generation over a linear hash family.
//!
//! Each hash function `h(x) = (c + m·x) mod R` permutes the vocabulary rows
//! `1..=V` when `R` is a prime larger than `V`. A product's signature entry
//! for `h` is the smallest permuted rank among the rows of the words it
//! contains.

use std::collections::BTreeSet;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::types::{SignatureMatrix, EMPTY_SLOT};
use crate::core::config::{is_prime, DetectionConfig, MAX_MODULUS};
use crate::core::errors::{DupdetectError, Result};
use crate::detectors::text::TokenSet;

/// One member of the hash family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearHash {
    /// Additive constant `c`
    pub constant: u64,
    /// Multiplier `m`
    pub multiplier: u64,
}

impl LinearHash {
    /// Permuted rank of vocabulary row `row` (zero-based).
    #[inline]
    pub fn rank(&self, row: usize, modulus: u64) -> u64 {
        (self.constant + self.multiplier * (row as u64 + 1)) % modulus
    }
}

/// Finite, reusable family of linear hash functions.
///
/// Functions are ordered with the constant varying slowest, so function
/// `i` uses constant `i / num_mult` and multiplier `i % num_mult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFamily {
    modulus: u64,
    functions: Vec<LinearHash>,
}

impl HashFamily {
    /// Build `num_const · num_mult` functions over the prime `modulus`.
    pub fn new(num_const: usize, num_mult: usize, modulus: u64) -> Result<Self> {
        if modulus > MAX_MODULUS || !is_prime(modulus) {
            return Err(DupdetectError::validation_mismatch(
                "modulus",
                format!("a prime no larger than {MAX_MODULUS}"),
                modulus.to_string(),
            ));
        }
        if num_const == 0 || num_mult == 0 {
            return Err(DupdetectError::lsh_with_parameters(
                "hash family needs at least one constant and one multiplier",
                format!("num_const={num_const}, num_mult={num_mult}"),
            ));
        }
        if num_const as u64 > modulus || num_mult as u64 >= modulus {
            return Err(DupdetectError::lsh_with_parameters(
                "hash family is larger than the modulus can separate",
                format!("num_const={num_const}, num_mult={num_mult}, modulus={modulus}"),
            ));
        }

        let constants = evenly_spaced_constants(num_const, modulus);
        let multipliers = evenly_spaced_multipliers(num_mult, modulus);

        let functions = constants
            .iter()
            .flat_map(|&constant| {
                multipliers.iter().map(move |&multiplier| LinearHash {
                    constant,
                    multiplier,
                })
            })
            .collect();

        Ok(Self { modulus, functions })
    }

    /// Build the family described by a detection config.
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let family = Self::new(config.num_const, config.num_mult, config.modulus)?;
        if family.len() != config.num_hash_functions {
            return Err(DupdetectError::config_field(
                format!(
                    "hash family has {} functions but num_hash_functions is {}",
                    family.len(),
                    config.num_hash_functions
                ),
                "num_hash_functions",
            ));
        }
        Ok(family)
    }

    /// Modulus `R`
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Number of functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the family is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Functions in signature-row order
    pub fn functions(&self) -> &[LinearHash] {
        &self.functions
    }

    /// Signature of a product given the vocabulary rows of its words.
    pub fn signature_column(&self, rows: &[usize]) -> Vec<u64> {
        let mut column = vec![EMPTY_SLOT; self.functions.len()];
        for &row in rows {
            for (slot, function) in column.iter_mut().zip(&self.functions) {
                let rank = function.rank(row, self.modulus);
                if rank < *slot {
                    *slot = rank;
                }
            }
        }
        column
    }
}

/// `⌊i·R / k⌋` for `i` in `0..k`.
fn evenly_spaced_constants(count: usize, modulus: u64) -> Vec<u64> {
    let count = count as u64;
    (0..count).map(|i| i * modulus / count).collect()
}

/// `count` values from `⌊R / count⌋` to `R − 1` inclusive.
///
/// A single multiplier would start at `R` itself, which is zero mod `R`, so
/// the start is capped at `R − 1`.
fn evenly_spaced_multipliers(count: usize, modulus: u64) -> Vec<u64> {
    let start = (modulus / count as u64).min(modulus - 1);
    let end = modulus - 1;
    if count == 1 {
        return vec![start];
    }
    let steps = (count - 1) as u64;
    (0..count as u64)
        .map(|j| start + j * (end - start) / steps)
        .collect()
}

/// Sorted distinct words of a token-set collection; a word's index is its row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    /// Collect every distinct token across `token_sets`.
    pub fn build(token_sets: &[TokenSet]) -> Self {
        let words: BTreeSet<&str> = token_sets.iter().flat_map(TokenSet::iter).collect();
        Self {
            words: words.into_iter().map(str::to_string).collect(),
        }
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether no product had any token
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Row of `word`, if present
    pub fn row(&self, word: &str) -> Option<usize> {
        self.words.binary_search_by(|w| w.as_str().cmp(word)).ok()
    }

    /// Ascending rows of every word in `tokens` that is in the vocabulary
    pub fn rows_of(&self, tokens: &TokenSet) -> Vec<usize> {
        tokens.iter().filter_map(|word| self.row(word)).collect()
    }

    /// Words in row order
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Computes signature matrices for token-set collections.
#[derive(Debug, Clone)]
pub struct MinHashEngine {
    family: HashFamily,
}

impl MinHashEngine {
    /// Create an engine over an existing family
    pub fn new(family: HashFamily) -> Self {
        Self { family }
    }

    /// Create an engine from a detection config
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        Ok(Self::new(HashFamily::from_config(config)?))
    }

    /// The hash family in use
    pub fn family(&self) -> &HashFamily {
        &self.family
    }

    /// Signature length
    pub fn num_hashes(&self) -> usize {
        self.family.len()
    }

    /// Compute the H×P signature matrix of `token_sets`.
    ///
    /// Fails when the modulus does not exceed the vocabulary size, since the
    /// linear maps would then stop being permutations of the rows.
    pub fn signatures(&self, token_sets: &[TokenSet]) -> Result<SignatureMatrix> {
        let start = Instant::now();
        let vocabulary = Vocabulary::build(token_sets);

        if vocabulary.len() as u64 >= self.family.modulus() {
            return Err(DupdetectError::validation_mismatch(
                "modulus",
                format!("larger than the vocabulary size {}", vocabulary.len()),
                self.family.modulus().to_string(),
            ));
        }

        info!(
            "Computing {} MinHash rows for {} products over {} words (R = {})",
            self.family.len(),
            token_sets.len(),
            vocabulary.len(),
            self.family.modulus()
        );

        let columns: Vec<Vec<u64>> = token_sets
            .par_iter()
            .map(|tokens| self.family.signature_column(&vocabulary.rows_of(tokens)))
            .collect();

        let matrix = SignatureMatrix::from_columns(self.family.len(), columns)?;
        debug!("Signature matrix computed in {:?}", start.elapsed());
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> TokenSet {
        words.iter().copied().collect()
    }

    #[test]
    fn test_family_shape_and_order() {
        let family = HashFamily::new(105, 11, 510_529).unwrap();
        assert_eq!(family.len(), 1155);

        let functions = family.functions();
        assert_eq!(functions[0].constant, 0);
        assert_eq!(functions[0].multiplier, 510_529 / 11);
        assert_eq!(functions[10].multiplier, 510_528);
        assert_eq!(functions[11].constant, 510_529 / 105);
        assert!(functions
            .iter()
            .all(|f| f.constant < 510_529 && f.multiplier > 0 && f.multiplier < 510_529));
    }

    #[test]
    fn test_family_is_reusable() {
        let family = HashFamily::new(3, 2, 101).unwrap();
        let first: Vec<_> = family.functions().iter().collect();
        let second: Vec<_> = family.functions().iter().collect();
        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_multiplier_is_nonzero() {
        let family = HashFamily::new(1, 1, 13).unwrap();
        assert_eq!(family.functions()[0].multiplier, 12);
    }

    #[test]
    fn test_composite_modulus_rejected() {
        assert!(HashFamily::new(3, 2, 100).is_err());
    }

    #[test]
    fn test_oversized_modulus_rejected_before_primality() {
        // largest 64-bit prime; trial division over it would not finish
        let err = HashFamily::new(3, 2, 18_446_744_073_709_551_557).unwrap_err();
        assert!(err.to_string().contains("modulus"));
    }

    #[test]
    fn test_rank_is_permutation_of_rows() {
        let modulus = 11;
        let function = LinearHash {
            constant: 3,
            multiplier: 7,
        };
        let mut ranks: Vec<u64> = (0..10).map(|row| function.rank(row, modulus)).collect();
        ranks.sort_unstable();
        ranks.dedup();
        assert_eq!(ranks.len(), 10);
    }

    #[test]
    fn test_vocabulary_is_sorted_and_indexed() {
        let sets = vec![tokens(&["tv", "led"]), tokens(&["samsung", "tv"])];
        let vocabulary = Vocabulary::build(&sets);

        assert_eq!(vocabulary.words(), &["led", "samsung", "tv"]);
        assert_eq!(vocabulary.row("tv"), Some(2));
        assert_eq!(vocabulary.rows_of(&sets[0]), vec![0, 2]);
        assert_eq!(vocabulary.row("lcd"), None);
    }

    #[test]
    fn test_signature_entries_are_minimum_ranks() {
        let family = HashFamily::new(2, 2, 101).unwrap();
        let engine = MinHashEngine::new(family.clone());
        let sets = vec![tokens(&["a", "c"]), tokens(&["b"])];

        let matrix = engine.signatures(&sets).unwrap();
        assert_eq!(matrix.num_hashes(), 4);
        assert_eq!(matrix.num_products(), 2);

        for (h, function) in family.functions().iter().enumerate() {
            let expected = function.rank(0, 101).min(function.rank(2, 101));
            assert_eq!(matrix.get(h, 0), Some(expected));
            assert_eq!(matrix.get(h, 1), Some(function.rank(1, 101)));
            assert!(matrix.get(h, 0).unwrap() < 101);
        }
    }

    #[test]
    fn test_empty_token_set_keeps_sentinel() {
        let engine = MinHashEngine::new(HashFamily::new(2, 2, 101).unwrap());
        let matrix = engine
            .signatures(&[tokens(&["a"]), TokenSet::new()])
            .unwrap();

        assert!(matrix.is_empty_column(1));
        assert!(!matrix.is_empty_column(0));
    }

    #[test]
    fn test_modulus_must_exceed_vocabulary() {
        let engine = MinHashEngine::new(HashFamily::new(1, 1, 3).unwrap());
        let err = engine
            .signatures(&[tokens(&["a", "b", "c"])])
            .unwrap_err();
        assert!(matches!(err, DupdetectError::Validation { .. }));
    }

    #[test]
    fn test_identical_sets_have_identical_signatures() {
        let engine = MinHashEngine::new(HashFamily::new(5, 4, 10_007).unwrap());
        let matrix = engine
            .signatures(&[tokens(&["lg", "55'", "oled"]), tokens(&["oled", "lg", "55'"])])
            .unwrap();

        assert_eq!(matrix.agreement(0, 1), 1.0);
    }
}
