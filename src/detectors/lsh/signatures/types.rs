//! MinHash signature matrix.

use ndarray::{Array2, ArrayView1, ShapeBuilder};
use serde::{Deserialize, Serialize};

use crate::core::errors::{DupdetectError, Result};
use crate::detectors::lsh::comparison::signature_agreement;

/// Slot value of a product whose token set is empty.
pub const EMPTY_SLOT: u64 = u64::MAX;

/// H×P matrix of MinHash values: row = hash function, column = product.
///
/// Stored column-major so each product's signature is contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureMatrix {
    values: Array2<u64>,
}

/// Construction and access methods for [`SignatureMatrix`].
impl SignatureMatrix {
    /// Assemble a matrix from per-product signature columns.
    pub fn from_columns(num_hashes: usize, columns: Vec<Vec<u64>>) -> Result<Self> {
        let num_products = columns.len();
        if let Some((product, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.len() != num_hashes)
        {
            return Err(DupdetectError::lsh_with_parameters(
                format!(
                    "signature column {product} has {} rows, expected {num_hashes}",
                    column.len()
                ),
                format!("num_hashes={num_hashes}"),
            ));
        }

        let flat: Vec<u64> = columns.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((num_hashes, num_products).f(), flat)
            .map_err(|e| DupdetectError::internal(format!("signature matrix shape: {e}")))?;

        Ok(Self { values })
    }

    /// Number of hash functions (rows)
    pub fn num_hashes(&self) -> usize {
        self.values.nrows()
    }

    /// Number of products (columns)
    pub fn num_products(&self) -> usize {
        self.values.ncols()
    }

    /// Signature of one product
    pub fn column(&self, product: usize) -> ArrayView1<'_, u64> {
        self.values.column(product)
    }

    /// Entry (hash, product)
    pub fn get(&self, hash: usize, product: usize) -> Option<u64> {
        self.values.get((hash, product)).copied()
    }

    /// Whether the product had no tokens to hash
    pub fn is_empty_column(&self, product: usize) -> bool {
        self.column(product).iter().all(|&value| value == EMPTY_SLOT)
    }

    /// Fraction of rows on which two product columns agree.
    ///
    /// This is the MinHash estimate of the Jaccard similarity of the two
    /// underlying token sets.
    pub fn agreement(&self, a: usize, b: usize) -> f64 {
        signature_agreement(self.column(a), self.column(b))
    }

    /// Raw matrix view
    pub fn values(&self) -> &Array2<u64> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_shape() {
        let matrix =
            SignatureMatrix::from_columns(3, vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();

        assert_eq!(matrix.num_hashes(), 3);
        assert_eq!(matrix.num_products(), 2);
        assert_eq!(matrix.get(2, 1), Some(6));
        assert_eq!(matrix.get(3, 0), None);
        assert_eq!(matrix.column(0).to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = SignatureMatrix::from_columns(3, vec![vec![1, 2, 3], vec![4, 5]]).unwrap_err();
        assert!(matches!(err, DupdetectError::Lsh { .. }));
    }

    #[test]
    fn test_agreement() {
        let matrix =
            SignatureMatrix::from_columns(4, vec![vec![1, 2, 3, 4], vec![1, 2, 9, 9]]).unwrap();

        assert_eq!(matrix.agreement(0, 1), 0.5);
        assert_eq!(matrix.agreement(1, 1), 1.0);
    }

    #[test]
    fn test_empty_column_detection() {
        let matrix = SignatureMatrix::from_columns(
            2,
            vec![vec![EMPTY_SLOT, EMPTY_SLOT], vec![0, EMPTY_SLOT]],
        )
        .unwrap();

        assert!(matrix.is_empty_column(0));
        assert!(!matrix.is_empty_column(1));
    }

    #[test]
    fn test_no_products() {
        let matrix = SignatureMatrix::from_columns(5, Vec::new()).unwrap();
        assert_eq!(matrix.num_hashes(), 5);
        assert_eq!(matrix.num_products(), 0);
    }
}
