//! Product listings as scraped from the shops, grouped by model id.
//!
//! The input JSON maps a group id to its listings. Flattening the groups in
//! file order defines the product index used by every later stage.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{DupdetectError, Result, ResultExt};
use crate::detectors::text::{clean_line, normalize_attribute, title_tokens, TokenSet};

/// One listing exactly as it appears in the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Listing title
    pub title: String,
    /// Shop the listing was scraped from
    pub shop: String,
    /// Listing URL
    #[serde(default)]
    pub url: String,
    /// Ground-truth model identifier, when known
    #[serde(rename = "modelID", default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Raw key/value features
    #[serde(rename = "featuresMap", default)]
    pub features: IndexMap<String, String>,
}

/// A normalized listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Group id the listing was filed under
    pub group: String,
    /// Lowercased shop name
    pub shop: String,
    /// Title after line-level cleaning
    pub title: String,
    /// Listing URL
    pub url: String,
    /// Ground-truth model identifier, when known
    pub model_id: Option<String>,
    /// Normalized attribute name → cleaned value
    pub features: IndexMap<String, String>,
}

impl Product {
    /// Normalize a raw record filed under `group`.
    pub fn from_record(group: &str, record: &ProductRecord) -> Self {
        Self {
            group: group.to_string(),
            shop: record.shop.to_lowercase(),
            title: clean_line(&record.title),
            url: record.url.clone(),
            model_id: record.model_id.clone(),
            features: record
                .features
                .iter()
                .map(|(name, value)| (normalize_attribute(name), clean_line(value)))
                .collect(),
        }
    }

    /// Brand feature, if the shop listed one
    pub fn brand(&self) -> Option<&str> {
        self.features.get("brand").map(String::as_str)
    }
}

/// Size statistics of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataStatistics {
    /// Number of products `n`
    pub products: usize,
    /// Number of real duplicate pairs `Nd`
    pub real_duplicate_pairs: usize,
}

impl DataStatistics {
    /// All unordered product pairs, `n(n-1)/2`
    pub fn total_pairs(&self) -> usize {
        pairs_among(self.products)
    }
}

/// Number of unordered pairs among `n` items.
pub fn pairs_among(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Listings grouped by group id, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    groups: IndexMap<String, Vec<ProductRecord>>,
}

impl Dataset {
    /// Wrap an existing group map
    pub fn new(groups: IndexMap<String, Vec<ProductRecord>>) -> Self {
        Self { groups }
    }

    /// Parse a dataset from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(content)?;
        debug!(
            "Parsed {} products in {} groups",
            dataset.len(),
            dataset.groups.len()
        );
        Ok(dataset)
    }

    /// Load a dataset from a `.json` file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        validate_input_path(path)?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Group map
    pub fn groups(&self) -> &IndexMap<String, Vec<ProductRecord>> {
        &self.groups
    }

    /// Number of products across all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Whether the dataset holds no products
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened `(group, record)` pairs in product-index order
    pub fn records(&self) -> impl Iterator<Item = (&str, &ProductRecord)> + '_ {
        self.groups
            .iter()
            .flat_map(|(group, records)| records.iter().map(move |record| (group.as_str(), record)))
    }

    /// Normalized products in product-index order
    pub fn products(&self) -> Vec<Product> {
        self.records()
            .map(|(group, record)| Product::from_record(group, record))
            .collect()
    }

    /// Title token sets in product-index order
    pub fn token_sets(&self) -> Vec<TokenSet> {
        self.records()
            .map(|(_, record)| title_tokens(&record.title))
            .collect()
    }

    /// Product count and number of pairs sharing a known model id.
    ///
    /// Listings without a model id never count towards `Nd`, whatever group
    /// they are filed under.
    pub fn statistics(&self) -> DataStatistics {
        let mut per_model: IndexMap<&str, usize> = IndexMap::new();
        for (_, record) in self.records() {
            if let Some(model_id) = record.model_id.as_deref() {
                *per_model.entry(model_id).or_default() += 1;
            }
        }
        DataStatistics {
            products: self.len(),
            real_duplicate_pairs: per_model.values().map(|&count| pairs_among(count)).sum(),
        }
    }

    /// Dataset made of the products at `indices`, regrouped in index order.
    ///
    /// Indices out of range are ignored.
    pub fn subset(&self, indices: &[usize]) -> Self {
        let flat: Vec<(&str, &ProductRecord)> = self.records().collect();
        let mut groups: IndexMap<String, Vec<ProductRecord>> = IndexMap::new();
        for &index in indices {
            if let Some((group, record)) = flat.get(index) {
                groups
                    .entry((*group).to_string())
                    .or_default()
                    .push((*record).clone());
            }
        }
        Self { groups }
    }
}

/// Check that `path` exists and names a `.json` file.
pub fn validate_input_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DupdetectError::validation_mismatch(
            "path",
            "an existing file",
            path.display().to_string(),
        ));
    }

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "json");
    if !is_json {
        return Err(DupdetectError::validation_mismatch(
            "path",
            "a .json file",
            path.display().to_string(),
        ));
    }
    Ok(())
}
