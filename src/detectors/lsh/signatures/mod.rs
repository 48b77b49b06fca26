//! Signature generation and representation for LSH.
//!
//! This module contains:
//! - the finite linear hash family and the MinHash engine
//! - the signature matrix consumed by banding and classification

pub mod generator;
pub mod types;

pub use generator::{HashFamily, LinearHash, MinHashEngine, Vocabulary};
pub use types::{SignatureMatrix, EMPTY_SLOT};
