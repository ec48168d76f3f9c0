//! Integration test: config load, transaction parsing, full feature extraction, ndjson output.

mod common;

use common::{close, tx};
use recur_features::{
    compute_features,
    config::{AppConfig, FeaturesConfig},
    logging::{FeatureRecord, StructuredLogger},
    FeatureError, FeatureExtractor, FeatureMap, FeatureValue, Transaction,
};
use std::io::Write;
use std::path::Path;

fn monthly_history() -> Vec<Transaction> {
    vec![
        tx(1, "Netflix", 15.49, "2023-01-05"),
        tx(2, "Netflix", 15.49, "2023-02-05"),
        tx(3, "Netflix", 15.49, "2023-03-05"),
        tx(4, "Netflix", 17.99, "2023-04-05"),
    ]
}

#[test]
fn config_load_default() {
    let c = AppConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.features.days_flexibility, 7);
    assert_eq!(c.features.same_amount_tolerance, 0.05);
    assert_eq!(c.log.level, "info");
}

#[test]
fn config_load_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, r#"{{"features": {{"same_amount_tolerance": 0.1}}}}"#).unwrap();
    let c = AppConfig::load(&path);
    assert_eq!(c.features.same_amount_tolerance, 0.1);
    assert_eq!(c.features.days_flexibility, 7);
}

#[test]
fn config_load_invalid_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json").unwrap();
    let c = AppConfig::load(&path);
    assert_eq!(c.features.days_flexibility, 7);
}

#[test]
fn transaction_accepts_typed_and_string_dates() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let typed = Transaction::new(1, "user1", "vendor1", 100.0, date).unwrap();
    let parsed = Transaction::new(1, "user1", "vendor1", 100.0, "2024-01-02").unwrap();
    assert_eq!(typed, parsed);
}

#[test]
fn malformed_date_fails_fast() {
    let err = Transaction::new(1, "user1", "vendor1", 100.0, "2024-13-01").unwrap_err();
    assert!(matches!(err, FeatureError::MalformedDate { ref value, .. } if value == "2024-13-01"));
    assert!(err.to_string().contains("malformed date"));

    let json = r#"[{"id":1,"user_id":"u","name":"n","amount":1.0,"date":"01/02/2024"}]"#;
    let res: Result<Vec<Transaction>, _> = serde_json::from_str(json);
    assert!(res.unwrap_err().to_string().contains("malformed date"));
}

#[test]
fn transaction_json_round_trip_date_format() {
    let json = r#"{"id":7,"user_id":"u","name":"Hulu","amount":7.99,"date":"2024-02-29"}"#;
    let t: Transaction = serde_json::from_str(json).unwrap();
    assert_eq!(t.date.to_string(), "2024-02-29");
    assert!(serde_json::to_string(&t).unwrap().contains(r#""date":"2024-02-29""#));
}

#[test]
fn empty_and_singleton_histories_emit_every_feature() {
    let extractor = FeatureExtractor::default();
    let names = extractor.feature_names();
    let t = tx(1, "Netflix", 15.49, "2023-01-05");

    let empty = extractor.compute(&t, &[]);
    let single = extractor.compute(&t, std::slice::from_ref(&t));
    for v in [&empty, &single] {
        let got: Vec<&str> = v.features.names().collect();
        assert_eq!(got, names.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(v.features.iter().all(|(_, value)| value.as_f64().is_finite()));
    }
    assert_eq!(empty.features.get("days_since_last"), Some(FeatureValue::Int(-1)));
}

#[test]
fn feature_names_are_unique_and_stable() {
    let names = FeatureExtractor::default().feature_names();
    let mut dedup = names.clone();
    dedup.sort();
    dedup.dedup();
    assert_eq!(dedup.len(), names.len());
    assert_eq!(names.first().map(String::as_str), Some("likely_same_amount"));
    assert_eq!(names.last().map(String::as_str), Some("is_always_recurring"));
    assert_eq!(names, FeatureExtractor::default().feature_names());
}

#[test]
fn compute_features_monthly_subscription() {
    let history = monthly_history();
    let f = compute_features(&history[3], &history);

    assert_eq!(f.get("is_always_recurring"), Some(FeatureValue::Bool(true)));
    assert_eq!(f.get("is_recurring_company"), Some(FeatureValue::Int(1)));
    assert_eq!(f.get("ends_in_99"), Some(FeatureValue::Bool(true)));
    assert_eq!(f.get("same_day_exact"), Some(FeatureValue::Int(4)));
    assert_eq!(f.get("days_since_last"), Some(FeatureValue::Int(31)));
    assert_eq!(f.get("n_transactions"), Some(FeatureValue::Int(4)));
    assert_eq!(f.get("detected_cycle"), Some(FeatureValue::Float(30.0)));
    assert_eq!(f.get("matches_common_cycle"), Some(FeatureValue::Bool(true)));
    assert!(close(f.get_f64("percent_transactions_same_amount"), 0.25));
    assert_eq!(f.get("n_transactions_same_amount"), Some(FeatureValue::Int(1)));
    assert!(close(f.get_f64("proportion"), 1.0));
    assert!(close(f.get_f64("amount"), 17.99));
    assert!(close(f.get_f64("recurring_confidence"), 1.0));
}

#[test]
fn later_analyzer_wins_on_name_collision() {
    // Three charges: the subscription group reports perfect gap consistency, the enhanced
    // group needs more than five gaps and reports 0.
    let history = vec![
        tx(1, "gym", 30.0, "2023-01-01"),
        tx(2, "gym", 30.0, "2023-01-31"),
        tx(3, "gym", 30.0, "2023-03-02"),
    ];
    let f = compute_features(&history[0], &history);
    assert_eq!(f.get("interval_consistency"), Some(FeatureValue::Float(0.0)));
    assert_eq!(f.names().filter(|n| *n == "interval_consistency").count(), 1);
}

#[test]
fn universe_size_drives_vendor_share() {
    let history = monthly_history();
    let v = FeatureExtractor::default().compute_with_universe(&history[0], &history, 40);
    assert!(close(v.features.get_f64("proportion"), 0.1));
}

#[test]
fn extraction_is_idempotent_and_leaves_history_untouched() {
    let mut history = monthly_history();
    history.reverse();
    let before = history.clone();
    let extractor = FeatureExtractor::new(FeaturesConfig::default());
    let a = extractor.compute(&history[0], &history);
    let b = extractor.compute(&history[0], &history);
    assert_eq!(a, b);
    assert_eq!(history, before);
}

#[test]
fn dense_export_follows_pinned_names() {
    let history = monthly_history();
    let v = FeatureExtractor::default().compute(&history[0], &history);
    let dense = v.to_dense(&["ends_in_99", "not_a_feature", "n_transactions"]);
    assert_eq!(dense, vec![1.0, 0.0, 4.0]);
}

#[test]
fn feature_map_overwrite_keeps_first_position() {
    let mut m = FeatureMap::new();
    assert_eq!(m.insert("a", 1.0), None);
    m.insert("b", true);
    assert_eq!(m.insert("a", 2_i64), Some(FeatureValue::Float(1.0)));
    assert_eq!(m.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"a":2,"b":true}"#);
}

#[test]
fn emit_json_writes_one_line_per_record() {
    let history = monthly_history();
    let v = FeatureExtractor::default().compute(&history[0], &history);
    let mut buf: Vec<u8> = Vec::new();
    for _ in 0..2 {
        let record = FeatureRecord {
            id: history[0].id,
            user_id: &history[0].user_id,
            name: &history[0].name,
            features: &v.features,
        };
        StructuredLogger::emit_json(&record, &mut buf).unwrap();
    }
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["id"], 1);
    assert_eq!(parsed["features"]["is_always_recurring"], true);
}
