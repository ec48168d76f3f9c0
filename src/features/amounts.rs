//! Amount-distribution analyzers.

use super::stats;
use crate::transaction::Transaction;

fn amounts(history: &[Transaction]) -> Vec<f64> {
    history.iter().map(|t| t.amount).collect()
}

/// Number of history transactions with exactly the target's amount.
pub fn same_amount_counter(transaction: &Transaction, history: &[Transaction]) -> usize {
    history.iter().filter(|t| t.amount == transaction.amount).count()
}

/// [`same_amount_counter`] as a share of the history; 0.0 for an empty history.
pub fn same_amount_ratio(transaction: &Transaction, history: &[Transaction]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    same_amount_counter(transaction, history) as f64 / history.len() as f64
}

/// Share of history amounts inside `amount * (1 ± tolerance)`.
pub fn same_amount_ratio_tolerant(transaction: &Transaction, history: &[Transaction], tolerance: f64) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let a = transaction.amount * (1.0 - tolerance);
    let b = transaction.amount * (1.0 + tolerance);
    // Negative amounts flip the band.
    let (lower, upper) = if a <= b { (a, b) } else { (b, a) };
    let similar = history
        .iter()
        .filter(|t| t.amount >= lower && t.amount <= upper)
        .count();
    similar as f64 / history.len() as f64
}

/// Median amount over its sample standard deviation. 1.0 when every amount is equal,
/// 0.0 below two amounts.
pub fn amount_stability_score(history: &[Transaction]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let values = amounts(history);
    let std_dev = stats::sample_std_dev(&values);
    if std_dev == 0.0 {
        return 1.0;
    }
    stats::median(&values) / std_dev
}

/// Distance of the target amount from the history median, in sample standard deviations.
pub fn amount_z_score(transaction: &Transaction, history: &[Transaction]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let values = amounts(history);
    let std_dev = stats::sample_std_dev(&values);
    if std_dev == 0.0 {
        return 0.0;
    }
    (transaction.amount - stats::median(&values)) / std_dev
}

/// Population standard deviation over mean of the amounts.
pub fn amount_coefficient_of_variation(history: &[Transaction]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let values = amounts(history);
    let m = stats::mean(&values);
    if m == 0.0 {
        return 0.0;
    }
    stats::population_std_dev(&values) / m
}

/// True when the amount's cents are 99, checked on whole cents.
pub fn ends_in_99(transaction: &Transaction) -> bool {
    let cents = (transaction.amount * 100.0).round() as i64;
    cents.rem_euclid(100) == 99
}
