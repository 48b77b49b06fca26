//! End-to-end tests of the detection pipeline on small product dumps.

use std::path::PathBuf;
use std::sync::Arc;

use approx::assert_relative_eq;

use dupdetect::detectors::classifier::Reason;
use dupdetect::detectors::lsh::{CandidatePair, CandidateSource, HashFamily, MinHashEngine};
use dupdetect::detectors::text::TokenSet;
use dupdetect::{Dataset, DetectionConfig, DupdetectError, DuplicateDetector};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tvs.json")
}

fn fixture() -> Dataset {
    Dataset::from_json_file(fixture_path()).unwrap()
}

#[test]
fn test_default_detection_on_fixture() {
    let dataset = fixture();
    let detector = DuplicateDetector::new(DetectionConfig::default()).unwrap();
    let run = detector.detect(&dataset).unwrap();

    assert_eq!(run.stats.products, 9);
    assert_eq!(run.stats.real_duplicate_pairs, 5);
    assert_eq!((run.bands.rows, run.bands.bands), (1155, 1));

    // every real duplicate pair shares a model id in its titles
    assert_eq!(run.metrics.model_id_candidates, 5);
    assert_eq!(run.confusion.tp, 5);
    assert_eq!(run.confusion.fp, 0);
    assert!(run.confusion.is_consistent());

    assert_relative_eq!(run.report.precision, 1.0);
    assert_relative_eq!(run.report.recall, 1.0);
    assert_relative_eq!(run.report.f1, 1.0);
    assert_relative_eq!(run.report.proportion_comparisons, 5.0 / 36.0);
}

#[test]
fn test_looser_lsh_threshold_adds_candidates() {
    let dataset = fixture();
    let strict = DuplicateDetector::new(DetectionConfig::default()).unwrap();
    let loose = DuplicateDetector::new(
        DetectionConfig::default()
            .with_lsh_similarity(0.2)
            .with_compare_similarity(0.5),
    )
    .unwrap();

    let strict_run = strict.detect(&dataset).unwrap();
    let loose_run = loose
        .detect_with_signatures(&dataset, Arc::clone(&strict_run.signatures))
        .unwrap();

    assert!(loose_run.bands.bands > strict_run.bands.bands);
    assert!(loose_run.report.num_comparisons >= strict_run.report.num_comparisons);
    assert!(loose_run.confusion.is_consistent());
}

#[test]
fn test_identical_listings_are_signature_duplicates() {
    let dataset = Dataset::from_json_str(
        r#"{
            "m1": [
                {"title": "Vizio 32\" LED HDTV", "shop": "a", "url": "", "modelID": "m1",
                 "featuresMap": {"Brand": "Vizio"}},
                {"title": "VIZIO 32 Inch LED HDTV", "shop": "b", "url": "", "modelID": "m1",
                 "featuresMap": {"Brand": "vizio"}}
            ],
            "m2": [
                {"title": "Toshiba 50\" Plasma", "shop": "a", "url": "", "modelID": "m2",
                 "featuresMap": {"Brand": "Toshiba"}}
            ]
        }"#,
    )
    .unwrap();

    let run = DuplicateDetector::new(DetectionConfig::default())
        .unwrap()
        .detect(&dataset)
        .unwrap();

    let classification = run
        .classifications
        .iter()
        .find(|c| c.pair == CandidatePair::new(0, 1))
        .unwrap();
    assert_eq!(classification.source, CandidateSource::Banded);
    assert!(classification.verdict.is_duplicate);
    assert_eq!(classification.verdict.reason, Reason::Signature);
    assert_eq!(run.confusion.tp, 1);
}

#[test]
fn test_brand_mismatch_blocks_banded_duplicate() {
    let dataset = Dataset::from_json_str(
        r#"{
            "m1": [
                {"title": "Smart LED HDTV 55\"", "shop": "a", "url": "", "modelID": "m1",
                 "featuresMap": {"Brand": "Hisense"}},
                {"title": "Smart LED HDTV 55\"", "shop": "b", "url": "", "modelID": "m1",
                 "featuresMap": {"Brand": "TCL"}}
            ]
        }"#,
    )
    .unwrap();

    let run = DuplicateDetector::new(DetectionConfig::default())
        .unwrap()
        .detect(&dataset)
        .unwrap();

    assert_eq!(run.classifications.len(), 1);
    assert_eq!(run.classifications[0].verdict.reason, Reason::Brand);
    assert!(!run.classifications[0].verdict.is_duplicate);
    assert_eq!(run.confusion.fn_, 1);
}

#[test]
fn test_model_id_match_overrides_brand() {
    let dataset = Dataset::from_json_str(
        r#"{
            "tn062ab": [
                {"title": "Brother TN062AB Toner", "shop": "a", "url": "", "modelID": "tn062ab",
                 "featuresMap": {"Brand": "Brother"}},
                {"title": "Compatible tn-062-ab cartridge black", "shop": "b", "url": "",
                 "modelID": "tn062ab", "featuresMap": {"Brand": "Generic"}}
            ]
        }"#,
    )
    .unwrap();

    let run = DuplicateDetector::new(DetectionConfig::default())
        .unwrap()
        .detect(&dataset)
        .unwrap();

    assert_eq!(run.classifications.len(), 1);
    assert_eq!(run.classifications[0].source, CandidateSource::ModelId);
    assert!(run.classifications[0].verdict.is_duplicate);
    assert_eq!(run.confusion.tp, 1);
}

#[test]
fn test_dataset_without_duplicates_fails_evaluation() {
    let dataset = Dataset::from_json_str(
        r#"{
            "a": [{"title": "Sony TV", "shop": "x", "url": "", "modelID": "a"}],
            "b": [{"title": "LG TV", "shop": "y", "url": "", "modelID": "b"}]
        }"#,
    )
    .unwrap();

    let err = DuplicateDetector::new(DetectionConfig::default())
        .unwrap()
        .detect(&dataset)
        .unwrap_err();
    assert!(matches!(err, DupdetectError::Math { .. }));
}

#[test]
fn test_group_without_model_ids_has_no_real_duplicates() {
    let dataset = Dataset::from_json_str(
        r#"{
            "g": [
                {"title": "Samsung UN46ES6580 LED HDTV", "shop": "x", "url": ""},
                {"title": "Samsung UN46ES6580 46 Inch HDTV", "shop": "y", "url": ""}
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(dataset.statistics().real_duplicate_pairs, 0);

    let err = DuplicateDetector::new(DetectionConfig::default())
        .unwrap()
        .detect(&dataset)
        .unwrap_err();
    assert!(matches!(err, DupdetectError::Math { .. }));
}

#[test]
fn test_model_id_spread_over_groups_counts_every_pair() {
    let dataset = Dataset::from_json_str(
        r#"{
            "g1": [
                {"title": "Samsung UN46ES6580 LED HDTV", "shop": "a", "url": "", "modelID": "X"},
                {"title": "Samsung 46\" UN46ES6580 Smart", "shop": "b", "url": "", "modelID": "X"}
            ],
            "g2": [
                {"title": "UN46ES6580 Samsung 1080p", "shop": "c", "url": "", "modelID": "X"}
            ]
        }"#,
    )
    .unwrap();

    let run = DuplicateDetector::new(DetectionConfig::default())
        .unwrap()
        .detect(&dataset)
        .unwrap();

    assert_eq!(run.stats.real_duplicate_pairs, 3);
    assert_eq!(run.confusion.tp, 3);
    assert_eq!(run.confusion.fn_, 0);
    assert!(run.confusion.is_consistent());
    assert_relative_eq!(run.report.recall, 1.0);
}

#[test]
fn test_products_without_tokens_are_not_candidates() {
    let dataset = Dataset::from_json_str(
        r#"{
            "a": [
                {"title": "Best Buy", "shop": "x", "url": "", "modelID": "a"},
                {"title": "Amazon.com", "shop": "y", "url": "", "modelID": "a"}
            ]
        }"#,
    )
    .unwrap();

    let detector = DuplicateDetector::new(DetectionConfig::default()).unwrap();
    let signatures = detector.compute_signatures(&dataset).unwrap();
    assert!(signatures.is_empty_column(0));
    assert!(signatures.is_empty_column(1));

    let run = detector
        .detect_with_signatures(&dataset, Arc::new(signatures))
        .unwrap();
    assert!(run.classifications.is_empty());
    assert_eq!(run.confusion.fn_, 1);
}

/// Deterministic word-to-side assignment: a quarter of the words only in
/// the first set, a quarter only in the second, the rest in both.
fn side_of(seed: u64, word: u64) -> u64 {
    let mut z = seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(word)
        .wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z ^= z >> 31;
    z % 4
}

fn half_overlapping_pair(seed: u64, words: u64) -> (TokenSet, TokenSet) {
    let mut a = Vec::new();
    let mut b = Vec::new();
    for i in 0..words {
        let word = format!("w{i:04}");
        match side_of(seed, i) {
            0 => a.push(word),
            1 => b.push(word),
            _ => {
                a.push(word.clone());
                b.push(word);
            }
        }
    }
    (a.into_iter().collect(), b.into_iter().collect())
}

/// Absolute estimation error of `engine` on each half-overlapping pair.
fn estimation_errors(engine: &MinHashEngine, seeds: u64) -> Vec<f64> {
    (0..seeds)
        .map(|seed| {
            let (a, b) = half_overlapping_pair(seed, 400);
            let jaccard = a.jaccard(&b);
            let matrix = engine.signatures(&[a, b]).unwrap();
            (matrix.agreement(0, 1) - jaccard).abs()
        })
        .collect()
}

#[test]
fn test_minhash_agreement_at_the_extremes() {
    let engine = MinHashEngine::new(HashFamily::new(105, 11, 510_529).unwrap());

    let same: TokenSet = ["lg", "oled", "55'", "4k"].into_iter().collect();
    let matrix = engine.signatures(&[same.clone(), same]).unwrap();
    assert_relative_eq!(matrix.agreement(0, 1), 1.0);

    let left: TokenSet = ["a", "b", "c"].into_iter().collect();
    let right: TokenSet = ["d", "e", "f"].into_iter().collect();
    let matrix = engine.signatures(&[left, right]).unwrap();
    assert_relative_eq!(matrix.agreement(0, 1), 0.0);
}

#[test]
fn test_minhash_estimate_tracks_jaccard_per_pair() {
    let engine = MinHashEngine::new(HashFamily::new(105, 11, 510_529).unwrap());

    for (seed, error) in estimation_errors(&engine, 8).into_iter().enumerate() {
        assert!(error < 0.2, "seed {seed}: |estimate - J| = {error}");
    }
}

#[test]
fn test_minhash_error_shrinks_with_more_hash_functions() {
    let small = MinHashEngine::new(HashFamily::new(5, 3, 510_529).unwrap());
    let large = MinHashEngine::new(HashFamily::new(105, 11, 510_529).unwrap());

    let mean = |errors: Vec<f64>| errors.iter().sum::<f64>() / errors.len() as f64;
    let small_error = mean(estimation_errors(&small, 8));
    let large_error = mean(estimation_errors(&large, 8));

    assert!(
        large_error < small_error,
        "1155 hashes: {large_error}, 15 hashes: {small_error}"
    );
}
