//! Pattern-classification analyzers: subscription likelihood, irregularity, one-off
//! purchases and robust stability summaries.

use super::intervals::{days_since_last, intervals, safe_interval_consistency};
use super::vendor::{detect_recurring_company, vendor_recurrence_score};
use super::{amounts, stats};
use crate::transaction::Transaction;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Weekly, biweekly, monthly, quarterly and yearly billing cycles, in days.
pub const COMMON_CYCLES: [i64; 5] = [7, 14, 30, 90, 365];
/// Slack around each common cycle.
pub const CYCLE_TOLERANCE_DAYS: i64 = 3;

/// Relative deviation from the median still counted as consistent.
const CONSISTENCY_BAND: f64 = 0.15;
/// Keeps irregularity ratios finite when the median is zero.
const MEDIAN_EPSILON: f64 = 1e-8;
/// Distinct-amount share above which amounts count as varying.
const VARYING_AMOUNTS_RATIO: f64 = 0.7;
/// Month-number spread above which dates count as irregular.
const IRREGULAR_MONTHS_STD_DEV: f64 = 1.5;
/// Look-back window for `n_similar_last_90d`.
const RECENT_WINDOW_DAYS: i64 = 90;

fn amounts_of(history: &[Transaction]) -> Vec<f64> {
    history.iter().map(|t| t.amount).collect()
}

fn share_near_median(values: &[f64], median: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let band = (CONSISTENCY_BAND * median).abs();
    let near = values.iter().filter(|v| (*v - median).abs() <= band).count();
    near as f64 / values.len() as f64
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPattern {
    pub subscription_score: f64,
    pub interval_consistency: f64,
    pub amount_consistency: f64,
    pub detected_cycle: f64,
}

/// Common cycle nearest to `median_gap` among those whose slack window contains it.
/// When none does, every candidate is equally far and the first one wins.
pub fn detect_cycle(median_gap: f64) -> i64 {
    let tolerance = CYCLE_TOLERANCE_DAYS as f64;
    let distance = |cycle: i64| {
        let d = (median_gap - cycle as f64).abs();
        if d <= tolerance {
            d
        } else {
            f64::INFINITY
        }
    };
    COMMON_CYCLES
        .iter()
        .copied()
        .fold((COMMON_CYCLES[0], distance(COMMON_CYCLES[0])), |best, cycle| {
            let d = distance(cycle);
            if d < best.1 {
                (cycle, d)
            } else {
                best
            }
        })
        .0
}

/// Subscription likelihood from gap and amount consistency around their medians.
pub fn detect_subscription_pattern(history: &[Transaction]) -> SubscriptionPattern {
    if history.len() < 2 {
        return SubscriptionPattern::default();
    }
    let gaps: Vec<f64> = intervals(history).into_iter().map(|g| g as f64).collect();
    if gaps.is_empty() {
        return SubscriptionPattern::default();
    }
    let median_gap = stats::median(&gaps);
    let values = amounts_of(history);

    let interval_consistency = share_near_median(&gaps, median_gap);
    let amount_consistency = share_near_median(&values, stats::median(&values));

    SubscriptionPattern {
        subscription_score: (interval_consistency + amount_consistency) / 2.0,
        interval_consistency,
        amount_consistency,
        detected_cycle: detect_cycle(median_gap) as f64,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NonRecurringPattern {
    pub irregular_interval_score: f64,
    pub inconsistent_amount_score: f64,
    pub non_recurring_score: f64,
}

/// Irregular gaps and inconsistent amounts, each as a dispersion ratio capped at 1.
pub fn detect_non_recurring_pattern(history: &[Transaction]) -> NonRecurringPattern {
    if history.len() < 2 {
        return NonRecurringPattern::default();
    }
    let gaps: Vec<f64> = intervals(history).into_iter().map(|g| g as f64).collect();
    let values = amounts_of(history);

    let irregular_interval_score =
        (stats::sample_std_dev(&gaps) / (stats::median(&gaps) + MEDIAN_EPSILON)).min(1.0);
    let inconsistent_amount_score =
        (stats::sample_std_dev(&values) / (stats::median(&values) + MEDIAN_EPSILON)).min(1.0);

    NonRecurringPattern {
        irregular_interval_score,
        inconsistent_amount_score,
        non_recurring_score: (irregular_interval_score + inconsistent_amount_score) / 2.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeSignals {
    pub varying_amounts: bool,
    pub irregular_dates: bool,
}

/// Heuristics typical of one-off purchases.
pub fn one_time_features(history: &[Transaction]) -> OneTimeSignals {
    if history.is_empty() {
        return OneTimeSignals::default();
    }
    // -0.0 and 0.0 are the same amount.
    let distinct: HashSet<u64> = history
        .iter()
        .map(|t| (if t.amount == 0.0 { 0.0f64 } else { t.amount }).to_bits())
        .collect();
    let months: Vec<f64> = history.iter().map(|t| f64::from(t.date.month())).collect();

    OneTimeSignals {
        varying_amounts: distinct.len() as f64 / history.len() as f64 > VARYING_AMOUNTS_RATIO,
        irregular_dates: stats::sample_std_dev(&months) > IRREGULAR_MONTHS_STD_DEV,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StabilityFeatures {
    pub transaction_frequency: f64,
    pub robust_interval_median: f64,
    pub robust_interval_iqr: f64,
    pub coefficient_of_variation_intervals: f64,
    pub amount_variability_ratio: f64,
    pub matches_common_cycle: bool,
    pub recurring_confidence: f64,
}

/// True when any gap lies within the slack of a common cycle.
pub fn matches_common_cycle(gaps: &[i64]) -> bool {
    COMMON_CYCLES
        .iter()
        .any(|cycle| gaps.iter().any(|g| (g - cycle).abs() <= CYCLE_TOLERANCE_DAYS))
}

fn midpoint_iqr(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    stats::percentile_midpoint(values, 75.0) - stats::percentile_midpoint(values, 25.0)
}

/// Median/IQR summaries of gaps and amounts, charge frequency and vendor confidence.
pub fn transaction_stability_features(history: &[Transaction]) -> StabilityFeatures {
    if history.len() < 2 {
        return StabilityFeatures::default();
    }
    let day_gaps = intervals(history);
    let gaps: Vec<f64> = day_gaps.iter().map(|g| *g as f64).collect();
    let values = amounts_of(history);

    let robust_interval_median = stats::median(&gaps);
    let robust_interval_iqr = midpoint_iqr(&gaps);
    let coefficient_of_variation_intervals = if robust_interval_median > 0.0 {
        robust_interval_iqr / robust_interval_median
    } else {
        0.0
    };

    let (first, last) = history
        .iter()
        .fold((history[0].date, history[0].date), |(lo, hi), t| {
            (lo.min(t.date), hi.max(t.date))
        });
    let months = ((last - first).num_days() as f64 / 30.0).max(1.0);

    let amount_median = stats::median(&values);
    let amount_variability_ratio = if amount_median > 0.0 {
        midpoint_iqr(&values) / amount_median
    } else {
        0.0
    };

    let names: BTreeSet<&str> = history.iter().map(|t| t.name.as_str()).collect();
    let recurring_confidence = names
        .into_iter()
        .map(|n| detect_recurring_company(n).recurring_score)
        .fold(0.0, f64::max);

    StabilityFeatures {
        transaction_frequency: history.len() as f64 / months,
        robust_interval_median,
        robust_interval_iqr,
        coefficient_of_variation_intervals,
        amount_variability_ratio,
        matches_common_cycle: matches_common_cycle(&day_gaps),
        recurring_confidence,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedFeatures {
    pub amt_std: f64,
    pub amt_med: f64,
    pub amt_iqr: f64,
    pub interval_std: f64,
    pub interval_med: f64,
    pub interval_consistency: f64,
    pub proportion: f64,
    pub day_of_month: u32,
    pub days_since_last: i64,
    pub n_similar_last_90d: usize,
    pub n_transactions: usize,
    pub same_amount_ratio: f64,
}

/// Amount and gap spreads plus vendor share and recency for one transaction.
pub fn enhanced_features(
    transaction: &Transaction,
    history: &[Transaction],
    total_transactions: usize,
    tolerance: f64,
) -> EnhancedFeatures {
    let values = amounts_of(history);
    let gaps: Vec<f64> = intervals(history).into_iter().map(|g| g as f64).collect();
    let amt_iqr = if values.is_empty() {
        0.0
    } else {
        stats::percentile_linear(&values, 75.0) - stats::percentile_linear(&values, 25.0)
    };

    EnhancedFeatures {
        amt_std: stats::sample_std_dev(&values),
        amt_med: stats::median(&values),
        amt_iqr,
        interval_std: stats::sample_std_dev(&gaps),
        interval_med: stats::median(&gaps),
        interval_consistency: safe_interval_consistency(history),
        proportion: vendor_recurrence_score(history, total_transactions),
        day_of_month: transaction.date.day(),
        days_since_last: days_since_last(transaction, history),
        n_similar_last_90d: history
            .iter()
            .filter(|t| (transaction.date - t.date).num_days() <= RECENT_WINDOW_DAYS)
            .count(),
        n_transactions: history.len(),
        same_amount_ratio: amounts::same_amount_ratio_tolerant(transaction, history, tolerance),
    }
}
