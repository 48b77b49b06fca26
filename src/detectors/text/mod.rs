//! Text canonicalization for product listings.
//!
//! Titles and feature values scraped from different shops spell the same
//! thing in many ways (`"32 Inch"`, `32-inch`, `32"`). This module folds those
//! variants into comparable tokens and flags tokens that look like
//! manufacturer model identifiers.

pub mod model_ids;
pub mod normalize;

pub use model_ids::{classify_token, extract_model_ids, TokenClass};
pub use normalize::{clean, clean_line, normalize_attribute, title_tokens, TokenSet};
