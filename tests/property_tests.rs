//! Property-based tests for band selection, bucketing and evaluation.

use proptest::prelude::*;

use dupdetect::core::dataset::{DataStatistics, Product};
use dupdetect::detectors::classifier::{Classification, Reason, Verdict};
use dupdetect::detectors::lsh::{
    candidate_probability, possible_bands, CandidatePair, CandidateSource, LshBucketer,
    SignatureMatrix,
};
use dupdetect::detectors::text::{extract_model_ids, title_tokens};
use dupdetect::evaluation::Evaluator;
use indexmap::IndexMap;

proptest! {
    #[test]
    fn candidate_probability_is_monotone_in_similarity(
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
        rows in 1usize..20,
        bands in 1usize..20,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            candidate_probability(lo, rows, bands) <= candidate_probability(hi, rows, bands) + 1e-12
        );
    }

    #[test]
    fn possible_bands_cover_signature(n in 1usize..2000) {
        for option in possible_bands(n) {
            prop_assert_eq!(option.rows * option.bands, n);
            prop_assert!(option.threshold >= 0.0 && option.threshold <= 1.0);
        }
    }

    #[test]
    fn shared_band_implies_candidate(
        columns in prop::collection::vec(prop::collection::vec(0u64..5, 12), 2..8),
        band in 0usize..4,
    ) {
        let mut columns = columns;
        // force products 0 and 1 to agree on one whole band of 3 rows
        let shared: Vec<u64> = columns[0][band * 3..band * 3 + 3].to_vec();
        columns[1][band * 3..band * 3 + 3].copy_from_slice(&shared);

        let matrix = SignatureMatrix::from_columns(12, columns).unwrap();
        let bucketer = LshBucketer::new(3, 4).unwrap();
        let pairs = bucketer.bucket_signatures(&matrix).unwrap().candidate_pairs();

        prop_assert!(pairs.contains(&CandidatePair::new(0, 1)));
        prop_assert!(pairs.iter().all(|pair| pair.a < pair.b));
    }

    #[test]
    fn agreement_is_symmetric_and_bounded(
        a in prop::collection::vec(0u64..4, 16),
        b in prop::collection::vec(0u64..4, 16),
    ) {
        let matrix = SignatureMatrix::from_columns(16, vec![a, b]).unwrap();
        let ab = matrix.agreement(0, 1);
        prop_assert_eq!(ab, matrix.agreement(1, 0));
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(matrix.agreement(0, 0), 1.0);
    }

    #[test]
    fn extracted_model_ids_have_no_hyphens(title in "[a-zA-Z0-9 /\"-]{0,40}") {
        for id in extract_model_ids(&title_tokens(&title)) {
            prop_assert!(!id.contains('-'));
            prop_assert!(id.chars().any(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn confusion_cells_sum_to_all_pairs(
        model_ids in prop::collection::vec(0u8..4, 2..12),
        predictions in prop::collection::vec(any::<bool>(), 0..20),
    ) {
        let products: Vec<Product> = model_ids
            .iter()
            .map(|id| Product {
                group: id.to_string(),
                shop: "shop".to_string(),
                title: String::new(),
                url: String::new(),
                model_id: Some(id.to_string()),
                features: IndexMap::new(),
            })
            .collect();
        let n = products.len();

        let mut counts: IndexMap<u8, usize> = IndexMap::new();
        for id in &model_ids {
            *counts.entry(*id).or_default() += 1;
        }
        let stats = DataStatistics {
            products: n,
            real_duplicate_pairs: counts.values().map(|k| k * (k - 1) / 2).sum(),
        };

        let all_pairs: Vec<CandidatePair> = (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| CandidatePair::new(a, b)))
            .collect();
        let classifications: Vec<Classification> = all_pairs
            .iter()
            .zip(&predictions)
            .map(|(&pair, &is_duplicate)| Classification {
                pair,
                source: CandidateSource::Banded,
                verdict: Verdict { is_duplicate, reason: Reason::Similarity },
            })
            .collect();

        let evaluator = Evaluator::new();
        let graded = evaluator.grade(&classifications, &products).unwrap();
        let matrix = evaluator.confusion_matrix(&graded, stats).unwrap();

        prop_assert!(matrix.is_consistent());
        prop_assert_eq!(matrix.tp + matrix.fp + matrix.tn + matrix.fn_, n * (n - 1) / 2);
        prop_assert!(matrix.candidate_duplicates <= stats.real_duplicate_pairs);
    }
}
