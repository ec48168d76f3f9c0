//! Interval and calendar analyzers: gaps between charges, cycle alignment, spending cycles.

use super::stats;
use crate::transaction::Transaction;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Gap window counted as a monthly charge (30 ± 7 days).
const MONTHLY_GAP_DAYS: std::ops::RangeInclusive<i64> = 23..=37;
/// Relative band around the first amount used by [`transaction_intervals`].
const FIRST_AMOUNT_TOLERANCE: f64 = 0.05;
/// Guards the span divisor in [`frequency_features`].
const SPAN_EPSILON: f64 = 1e-8;

/// Dates of `history` in ascending order. The caller's slice is left untouched.
pub fn sorted_dates(history: &[Transaction]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = history.iter().map(|t| t.date).collect();
    dates.sort();
    dates
}

/// Whole-day gaps between chronologically adjacent transactions.
pub fn intervals(history: &[Transaction]) -> Vec<i64> {
    sorted_dates(history)
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .collect()
}

fn intervals_f64(history: &[Transaction]) -> Vec<f64> {
    intervals(history).into_iter().map(|g| g as f64).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    pub avg_days_between_transactions: f64,
    pub std_dev_days_between_transactions: f64,
    /// Share of gaps inside the monthly window
    pub monthly_recurrence: f64,
    /// Share of transactions on the most common weekday
    pub same_weekday_ratio: f64,
    /// Share of amounts within ±5% of the first transaction's amount
    pub same_amount: f64,
}

/// Time-based summary of a history. All zero below two transactions.
pub fn transaction_intervals(history: &[Transaction]) -> IntervalSummary {
    if history.len() < 2 {
        return IntervalSummary::default();
    }
    let dates = sorted_dates(history);
    let day_gaps = intervals(history);
    let gaps: Vec<f64> = day_gaps.iter().map(|g| *g as f64).collect();

    let monthly = day_gaps.iter().filter(|g| MONTHLY_GAP_DAYS.contains(*g)).count();

    let mut weekday_counts: HashMap<u32, usize> = HashMap::new();
    for d in &dates {
        *weekday_counts.entry(d.weekday().num_days_from_monday()).or_default() += 1;
    }
    let most_common = weekday_counts.values().copied().max().unwrap_or(0);

    // A zero first amount would divide by zero; compare against 1 instead.
    let base = if history[0].amount == 0.0 { 1.0 } else { history[0].amount };
    let near_base = history
        .iter()
        .filter(|t| ((t.amount - base) / base).abs() <= FIRST_AMOUNT_TOLERANCE)
        .count();

    IntervalSummary {
        avg_days_between_transactions: stats::mean(&gaps),
        std_dev_days_between_transactions: stats::sample_std_dev(&gaps),
        monthly_recurrence: monthly as f64 / gaps.len() as f64,
        same_weekday_ratio: most_common as f64 / dates.len() as f64,
        same_amount: near_base as f64 / history.len() as f64,
    }
}

/// Number of history transactions whose distance from `transaction` is within
/// `n_days_off` of a whole multiple of `n_days_apart`. Distances shorter than one cycle
/// minus the slack are ignored, so the transaction itself never counts.
pub fn days_apart_counter(
    transaction: &Transaction,
    history: &[Transaction],
    n_days_apart: i64,
    n_days_off: i64,
) -> usize {
    if n_days_apart <= 0 {
        return 0;
    }
    let min_distance = n_days_apart - n_days_off;
    history
        .iter()
        .filter(|t| {
            let distance = (t.date - transaction.date).num_days().abs();
            if distance < min_distance {
                return false;
            }
            let remainder = distance % n_days_apart;
            remainder <= n_days_off || remainder >= n_days_apart - n_days_off
        })
        .count()
}

/// Number of history transactions whose day of month is within `n_days_off` of the
/// target's. Month lengths are not normalized: the 31st and the 1st are 30 days apart.
pub fn same_day_of_month_counter(
    transaction: &Transaction,
    history: &[Transaction],
    n_days_off: u32,
) -> usize {
    let day = transaction.date.day();
    history
        .iter()
        .filter(|t| t.date.day().abs_diff(day) <= n_days_off)
        .count()
}

/// [`same_day_of_month_counter`] as a share of the history; 0.0 for an empty history.
pub fn pct_same_day_of_month(transaction: &Transaction, history: &[Transaction], n_days_off: u32) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    same_day_of_month_counter(transaction, history, n_days_off) as f64 / history.len() as f64
}

/// Days since the most recent strictly earlier transaction with the same vendor name,
/// or -1 when there is none.
pub fn days_since_last(transaction: &Transaction, history: &[Transaction]) -> i64 {
    history
        .iter()
        .filter(|t| t.name == transaction.name && t.date < transaction.date)
        .map(|t| t.date)
        .max()
        .map(|last| (transaction.date - last).num_days())
        .unwrap_or(-1)
}

/// Sample standard deviation of the gaps. Low values mean a regular schedule.
pub fn recurrence_interval_variance(history: &[Transaction]) -> f64 {
    stats::sample_std_dev(&intervals_f64(history))
}

/// Distance of the target from the latest history charge, minus the median gap, in units
/// of gap standard deviation.
pub fn normalized_days_difference(transaction: &Transaction, history: &[Transaction]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let gaps = intervals_f64(history);
    let std_dev = stats::sample_std_dev(&gaps);
    if std_dev == 0.0 {
        return 0.0;
    }
    let Some(last) = history.iter().map(|t| t.date).max() else {
        return 0.0;
    };
    let since_last = (transaction.date - last).num_days() as f64;
    (since_last - stats::median(&gaps)) / std_dev
}

/// 1.0 when the gap from the latest history charge to the target is within
/// `days_flexibility` of the median gap, otherwise `1 - |gap - median| / median`.
/// The result is unbounded below.
pub fn proportional_timing_deviation(
    transaction: &Transaction,
    history: &[Transaction],
    days_flexibility: i64,
) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let median_gap = stats::median(&intervals_f64(history));
    let Some(last) = history.iter().map(|t| t.date).max() else {
        return 0.0;
    };
    let current = (transaction.date - last).num_days() as f64;
    let deviation = (current - median_gap).abs();
    if deviation <= days_flexibility as f64 {
        return 1.0;
    }
    if median_gap == 0.0 {
        return 0.0;
    }
    1.0 - deviation / median_gap
}

/// Coefficient of variation of per-week average amounts. Weeks are ISO week numbers of the
/// date shifted back by `weekday % 3` days, so charges drifting by a day or two stay in one bucket.
pub fn weekly_spending_cycle(history: &[Transaction]) -> f64 {
    let mut weeks: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for t in history {
        let shift = i64::from(t.date.weekday().num_days_from_monday() % 3);
        let week = (t.date - Duration::days(shift)).iso_week().week();
        weeks.entry(week).or_default().push(t.amount);
    }
    bucket_cov(weeks.values())
}

/// Coefficient of variation of per-calendar-month average amounts, restricted to history
/// entries sharing the target's vendor name.
pub fn seasonal_spending_cycle(transaction: &Transaction, history: &[Transaction]) -> f64 {
    let mut months: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for t in history.iter().filter(|t| t.name == transaction.name) {
        months.entry(t.date.month()).or_default().push(t.amount);
    }
    bucket_cov(months.values())
}

fn bucket_cov<'a>(buckets: impl Iterator<Item = &'a Vec<f64>>) -> f64 {
    let averages: Vec<f64> = buckets.filter(|b| !b.is_empty()).map(|b| stats::mean(b)).collect();
    if averages.len() < 2 {
        return 0.0;
    }
    let avg = stats::mean(&averages);
    if avg == 0.0 {
        return 0.0;
    }
    stats::population_std_dev(&averages) / avg
}

/// Slope of transactions-per-month over consecutive observed months, clamped at zero.
pub fn vendor_recurrence_trend(history: &[Transaction]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let mut per_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for t in history {
        *per_month.entry((t.date.year(), t.date.month())).or_default() += 1;
    }
    let counts: Vec<f64> = per_month.values().map(|c| *c as f64).collect();
    stats::linear_slope(&counts).max(0.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencySummary {
    pub transactions_per_month: f64,
    pub transactions_per_week: f64,
}

/// Transactions per 30-day and 7-day period over the history's span.
pub fn frequency_features(history: &[Transaction]) -> FrequencySummary {
    let (Some(first), Some(last)) = (
        history.iter().map(|t| t.date).min(),
        history.iter().map(|t| t.date).max(),
    ) else {
        return FrequencySummary::default();
    };
    let span = (last - first).num_days() as f64;
    let n = history.len() as f64;
    FrequencySummary {
        transactions_per_month: n / (span / 30.0 + SPAN_EPSILON),
        transactions_per_week: n / (span / 7.0 + SPAN_EPSILON),
    }
}

/// `1 - stdev / mean` of the gaps after clipping them to their 5th..95th percentile.
/// Needs more than five gaps; 0.0 otherwise or when the clipped mean is zero.
pub fn safe_interval_consistency(history: &[Transaction]) -> f64 {
    let gaps = intervals_f64(history);
    if gaps.len() <= 5 {
        return 0.0;
    }
    let lower = stats::percentile_linear(&gaps, 5.0);
    let upper = stats::percentile_linear(&gaps, 95.0);
    let clipped: Vec<f64> = gaps.iter().map(|g| g.clamp(lower, upper)).collect();
    let m = stats::mean(&clipped);
    if m == 0.0 {
        return 0.0;
    }
    1.0 - stats::sample_std_dev(&clipped) / m
}
