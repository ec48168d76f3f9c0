//! Amount-distribution analyzers.

mod common;

use common::{close, tx};
use recur_features::features::amounts::{
    amount_coefficient_of_variation, amount_stability_score, amount_z_score, ends_in_99,
    same_amount_counter, same_amount_ratio, same_amount_ratio_tolerant,
};

#[test]
fn same_amount_counter_and_ratio() {
    let history = vec![
        tx(1, "vendor1", 100.0, "2024-01-02"),
        tx(2, "vendor1", 100.0, "2024-01-03"),
        tx(3, "vendor1", 200.0, "2024-01-04"),
    ];
    assert_eq!(same_amount_counter(&history[0], &history), 2);
    assert_eq!(same_amount_counter(&history[2], &history), 1);
    assert!(close(same_amount_ratio(&history[0], &history), 2.0 / 3.0));
    assert_eq!(same_amount_ratio(&history[0], &[]), 0.0);
}

#[test]
fn same_amount_ratio_with_odd_cents() {
    let history = vec![
        tx(1, "name1", 100.0, "2024-01-01"),
        tx(2, "name1", 100.0, "2024-01-01"),
        tx(3, "name1", 200.0, "2024-01-02"),
        tx(4, "name1", 2.99, "2024-01-03"),
    ];
    assert!(close(same_amount_ratio(&history[0], &history), 0.5));
}

#[test]
fn tolerant_ratio_counts_band() {
    let history = vec![
        tx(1, "vendorE", 100.0, "2023-01-01"),
        tx(2, "vendorE", 102.0, "2023-01-15"),
        tx(3, "vendorE", 98.0, "2023-02-01"),
        tx(4, "vendorE", 150.0, "2023-02-15"),
    ];
    assert!(close(same_amount_ratio_tolerant(&history[0], &history, 0.05), 0.75));
    assert_eq!(same_amount_ratio_tolerant(&history[0], &[], 0.05), 0.0);
}

#[test]
fn tolerant_ratio_outside_band() {
    let history = vec![
        tx(5, "vendorZ", 100.0, "2023-03-01"),
        tx(6, "vendorZ", 120.0, "2023-03-15"),
        tx(7, "vendorZ", 80.0, "2023-04-01"),
    ];
    let target = tx(8, "vendorZ", 100.0, "2023-04-15");
    assert!(close(same_amount_ratio_tolerant(&target, &history, 0.05), 1.0 / 3.0));

    let odd = tx(9, "vendorZ", 199.99, "2023-04-20");
    assert_eq!(same_amount_ratio_tolerant(&odd, &history, 0.05), 0.0);
}

#[test]
fn tolerant_ratio_never_shrinks_with_wider_tolerance() {
    let history = vec![
        tx(1, "v", 100.0, "2023-01-01"),
        tx(2, "v", 104.0, "2023-01-02"),
        tx(3, "v", 111.0, "2023-01-03"),
        tx(4, "v", 125.0, "2023-01-04"),
        tx(5, "v", 60.0, "2023-01-05"),
    ];
    let mut previous = 0.0;
    for step in 0..=20 {
        let ratio = same_amount_ratio_tolerant(&history[0], &history, step as f64 * 0.025);
        assert!(ratio >= previous);
        previous = ratio;
    }
    assert_eq!(previous, 1.0);
}

#[test]
fn amount_stability_score_zero_variance_is_one() {
    let flat = vec![tx(1, "v", 9.99, "2023-01-01"), tx(2, "v", 9.99, "2023-02-01")];
    assert_eq!(amount_stability_score(&flat), 1.0);
    assert_eq!(amount_stability_score(&flat[..1]), 0.0);

    let spread = vec![
        tx(1, "v", 100.0, "2023-01-01"),
        tx(2, "v", 110.0, "2023-02-01"),
        tx(3, "v", 120.0, "2023-03-01"),
    ];
    assert!(close(amount_stability_score(&spread), 11.0));
}

#[test]
fn amount_z_score_against_median() {
    let history = vec![
        tx(1, "v", 100.0, "2023-01-01"),
        tx(2, "v", 110.0, "2023-02-01"),
        tx(3, "v", 120.0, "2023-03-01"),
    ];
    let target = tx(4, "v", 130.0, "2023-04-01");
    assert!(close(amount_z_score(&target, &history), 2.0));

    let flat = vec![tx(1, "v", 5.0, "2023-01-01"), tx(2, "v", 5.0, "2023-02-01")];
    assert_eq!(amount_z_score(&target, &flat), 0.0);
}

#[test]
fn amount_coefficient_of_variation_population() {
    let flat = vec![
        tx(1, "vendorCV", 100.0, "2023-01-01"),
        tx(2, "vendorCV", 100.0, "2023-01-15"),
        tx(3, "vendorCV", 100.0, "2023-02-01"),
    ];
    assert_eq!(amount_coefficient_of_variation(&flat), 0.0);

    let varied = vec![
        tx(4, "vendorCV", 100.0, "2023-03-01"),
        tx(5, "vendorCV", 120.0, "2023-03-15"),
        tx(6, "vendorCV", 80.0, "2023-04-01"),
    ];
    let cov = amount_coefficient_of_variation(&varied);
    assert!(close(cov, (800.0f64 / 3.0).sqrt() / 100.0));

    let zero_mean = vec![tx(1, "v", 10.0, "2023-01-01"), tx(2, "v", -10.0, "2023-01-02")];
    assert_eq!(amount_coefficient_of_variation(&zero_mean), 0.0);
}

#[test]
fn ends_in_99_checks_cents() {
    assert!(ends_in_99(&tx(1, "v", 2.99, "2024-01-01")));
    assert!(ends_in_99(&tx(2, "v", 19.99, "2024-01-01")));
    assert!(ends_in_99(&tx(3, "v", 0.99, "2024-01-01")));
    assert!(!ends_in_99(&tx(4, "v", 100.0, "2024-01-01")));
    assert!(!ends_in_99(&tx(5, "v", 100.50, "2024-01-01")));
    assert!(!ends_in_99(&tx(6, "v", 200.0, "2024-01-01")));
}
