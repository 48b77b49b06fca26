//! Heuristic detection of manufacturer model identifiers.
//!
//! A token is a model-id candidate when, read from its start, it has an
//! optional run of digits, an optional `-` or `/`, a run of letters, another
//! optional `-` or `/` and at least one digit; anything may follow. A lone
//! `x` as the letter run is the multiplication sign in `1920x1080` and is
//! rejected. Extracted identifiers have their hyphens removed so `tn-062-ab`
//! and `tn062ab` land in the same bucket.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::normalize::TokenSet;

/// Classification of a single normalized token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClass {
    /// Token looks like a model identifier; holds the hyphen-free form.
    ModelIdCandidate(String),
    /// Any other word.
    PlainWord,
}

impl TokenClass {
    /// The extracted identifier, if any.
    pub fn model_id(&self) -> Option<&str> {
        match self {
            Self::ModelIdCandidate(id) => Some(id),
            Self::PlainWord => None,
        }
    }
}

/// Anchored at the token start; anything may follow the digit run.
static MODEL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]*[-/]?([a-wyz][a-z]*|[a-z][a-z]+)[-/]?[0-9]+")
        .expect("model-id pattern is valid")
});

fn is_model_id(token: &str) -> bool {
    MODEL_ID_RE.is_match(token)
}

/// Classify one normalized token.
pub fn classify_token(token: &str) -> TokenClass {
    if is_model_id(token) {
        TokenClass::ModelIdCandidate(token.replace('-', ""))
    } else {
        TokenClass::PlainWord
    }
}

/// Extract the distinct model-id candidates of a token set.
pub fn extract_model_ids(tokens: &TokenSet) -> BTreeSet<String> {
    tokens
        .iter()
        .filter_map(|token| match classify_token(token) {
            TokenClass::ModelIdCandidate(id) => Some(id),
            TokenClass::PlainWord => None,
        })
        .collect()
}
