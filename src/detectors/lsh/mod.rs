//! MinHash signatures and LSH banding for near-duplicate detection.
//!
//! Product titles are hashed into fixed-length MinHash signatures whose
//! per-row agreement estimates the Jaccard similarity of the underlying token
//! sets. Banding the signatures turns the all-pairs comparison into bucket
//! lookups: only products sharing a band (or a model identifier) are ever
//! compared.

pub mod bands;
pub mod comparison;
pub mod index;
pub mod metrics;
pub mod signatures;

pub use bands::{best_bands, candidate_probability, possible_bands, BandOptimizer, BandSelection};
pub use comparison::{signature_agreement, Jaccard, TokenSimilarity};
pub use index::{BucketKey, Buckets, CandidatePair, CandidateSet, CandidateSource, LshBucketer};
pub use metrics::LshRunMetrics;
pub use signatures::{
    HashFamily, LinearHash, MinHashEngine, SignatureMatrix, Vocabulary, EMPTY_SLOT,
};
