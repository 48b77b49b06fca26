//! Line and word normalization shared by titles, feature values and
//! attribute names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Characters deleted from every word.
const REMOVE_CHARS: &[char] = &['(', ')', '[', ']', '&', '|'];

/// Characters trimmed from both ends of every word.
const STRIP_CHARS: &[char] = &['.', ',', ':', '/', '-'];

/// Shop names and punctuation that carry no identity information.
const STOPWORDS: &[&str] = &[
    "amazon",
    "amazon.com",
    "best",
    "buy",
    "newegg",
    "newegg.com",
    "thenerds",
    "thenerds.net",
    "'",
    "+",
    "-",
    "",
];

/// Ordered unit rewrites applied to whole lines.
const LINE_REWRITES: &[(&str, &str)] = &[
    ("inches", "inch"),
    ("-inch", "inch"),
    (" inch", "inch"),
    ("inch", "'"),
    ("hertz", "hz"),
    (" hz", "hz"),
    (" x ", "x"),
];

/// Lowercase a line and fold unit spellings (`inch`, `hertz`, ` x `).
///
/// The rewrites run in order, so `"32 Inches"` becomes `"32'"` and
/// `"1920 x 1080"` becomes `"1920x1080"`.
pub fn clean_line(line: &str) -> String {
    LINE_REWRITES
        .iter()
        .fold(line.to_lowercase(), |acc, (from, to)| acc.replace(from, to))
}

/// Canonicalize a single word.
///
/// Brackets, `&` and `|` are deleted, every inch-mark variant becomes `'`,
/// en-dashes become hyphens and leading/trailing `.,:/-` are trimmed.
pub fn clean(word: &str) -> String {
    let stripped: String = word
        .to_lowercase()
        .chars()
        .filter(|c| !REMOVE_CHARS.contains(c))
        .collect();

    stripped
        .replace('\u{201d}', "'")
        .replace("''", "'")
        .replace('"', "'")
        .replace('\u{2013}', "-")
        .trim_matches(STRIP_CHARS)
        .to_string()
}

/// Normalize a feature attribute name; `"Brand Name"` and `"Brand"` collapse
/// to the same key.
pub fn normalize_attribute(name: &str) -> String {
    clean(name).replace("brand name", "brand")
}

/// Tokenize a product title into its normalized word set.
pub fn title_tokens(title: &str) -> TokenSet {
    clean_line(title)
        .split(' ')
        .map(clean)
        .filter(|word| !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// Sorted set of normalized words describing one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    /// Create an empty token set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no tokens
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `token` is a member
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Iterate tokens in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    /// Exact Jaccard similarity |A ∩ B| / |A ∪ B|; two empty sets score 0.
    pub fn jaccard(&self, other: &Self) -> f64 {
        let intersection = self.0.intersection(&other.0).count();
        let union = self.0.len() + other.0.len() - intersection;
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }
}

impl FromIterator<String> for TokenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for TokenSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}
