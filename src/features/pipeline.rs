//! Aggregator: transaction + history → every analyzer → one flat feature mapping.
//!
//! Analyzers run in the fixed order of [`ANALYZERS`] and write into a shared map; a later
//! analyzer emitting an existing name overwrites it. Current overlaps:
//! - `interval_consistency`: subscription pattern (gap share near median) is replaced by the
//!   enhanced group's clipped-gap consistency.

use super::{amounts, intervals, patterns, vendor, FeatureMap, FeatureVector};
use crate::config::FeaturesConfig;
use crate::transaction::Transaction;
use chrono::NaiveDate;
use tracing::debug;

/// Inputs shared by every analyzer for one transaction.
pub struct AnalyzerContext<'a> {
    pub transaction: &'a Transaction,
    pub history: &'a [Transaction],
    /// Size of the transaction universe the vendor share is measured against
    pub total_transactions: usize,
    pub config: &'a FeaturesConfig,
}

type Analyzer = fn(&AnalyzerContext<'_>, &mut FeatureMap);

/// Merge order. Do not reorder without re-pinning downstream column lists.
const ANALYZERS: &[(&str, Analyzer)] = &[
    ("amount_similarity", amount_similarity),
    ("exact_amount", exact_amount),
    ("timing_scores", timing_scores),
    ("amount_scores", amount_scores),
    ("spending_cycles", spending_cycles),
    ("frequency", frequency),
    ("non_recurring", non_recurring),
    ("intervals", interval_summary),
    ("amount_dispersion", amount_dispersion),
    ("timing_deviation", timing_deviation),
    ("recurring_company", recurring_company),
    ("merchant_category", merchant_category),
    ("one_time", one_time),
    ("subscription", subscription),
    ("enhanced", enhanced),
    ("stability", stability),
    ("calendar_alignment", calendar_alignment),
    ("vendor_keywords", vendor_keywords),
];

fn amount_similarity(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert(
        "likely_same_amount",
        amounts::same_amount_ratio_tolerant(cx.transaction, cx.history, cx.config.same_amount_tolerance),
    );
}

fn exact_amount(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert(
        "percent_transactions_same_amount",
        amounts::same_amount_ratio(cx.transaction, cx.history),
    );
    out.insert(
        "n_transactions_same_amount",
        amounts::same_amount_counter(cx.transaction, cx.history),
    );
}

fn timing_scores(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert(
        "normalized_days_difference",
        intervals::normalized_days_difference(cx.transaction, cx.history),
    );
}

fn amount_scores(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert("amount_stability_score", amounts::amount_stability_score(cx.history));
    out.insert("amount_z_score", amounts::amount_z_score(cx.transaction, cx.history));
}

fn spending_cycles(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert("weekly_spending_cycle", intervals::weekly_spending_cycle(cx.history));
    out.insert("vendor_recurrence_trend", intervals::vendor_recurrence_trend(cx.history));
    out.insert(
        "seasonal_spending_cycle",
        intervals::seasonal_spending_cycle(cx.transaction, cx.history),
    );
    out.insert(
        "recurrence_interval_variance",
        intervals::recurrence_interval_variance(cx.history),
    );
}

fn frequency(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let f = intervals::frequency_features(cx.history);
    out.insert("transactions_per_month", f.transactions_per_month);
    out.insert("transactions_per_week", f.transactions_per_week);
}

fn non_recurring(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let p = patterns::detect_non_recurring_pattern(cx.history);
    out.insert("irregular_interval_score", p.irregular_interval_score);
    out.insert("inconsistent_amount_score", p.inconsistent_amount_score);
    out.insert("non_recurring_score", p.non_recurring_score);
}

fn interval_summary(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let s = intervals::transaction_intervals(cx.history);
    out.insert("avg_days_between_transactions", s.avg_days_between_transactions);
    out.insert("std_dev_days_between_transactions", s.std_dev_days_between_transactions);
    out.insert("monthly_recurrence", s.monthly_recurrence);
    out.insert("same_weekday_ratio", s.same_weekday_ratio);
    out.insert("same_amount", s.same_amount);
}

fn amount_dispersion(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert(
        "amount_ratio",
        amounts::same_amount_ratio_tolerant(cx.transaction, cx.history, cx.config.same_amount_tolerance),
    );
    out.insert(
        "amount_coefficient_of_variation",
        amounts::amount_coefficient_of_variation(cx.history),
    );
}

fn timing_deviation(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert(
        "proportional_timing_deviation",
        intervals::proportional_timing_deviation(cx.transaction, cx.history, cx.config.days_flexibility),
    );
}

fn recurring_company(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let c = vendor::detect_recurring_company(&cx.transaction.name);
    out.insert("is_recurring_company", i64::from(c.is_recurring_company));
    out.insert("is_utility_company", i64::from(c.is_utility_company));
    out.insert("recurring_score", c.recurring_score);
}

fn merchant_category(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let m = vendor::merchant_category_features(&cx.transaction.name);
    out.insert("is_retail", i64::from(m.is_retail));
    out.insert("is_entertainment", i64::from(m.is_entertainment));
}

fn one_time(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let o = patterns::one_time_features(cx.history);
    out.insert("varying_amounts", i64::from(o.varying_amounts));
    out.insert("irregular_dates", i64::from(o.irregular_dates));
}

fn subscription(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let s = patterns::detect_subscription_pattern(cx.history);
    out.insert("subscription_score", s.subscription_score);
    out.insert("interval_consistency", s.interval_consistency);
    out.insert("amount_consistency", s.amount_consistency);
    out.insert("detected_cycle", s.detected_cycle);
}

fn enhanced(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let e = patterns::enhanced_features(
        cx.transaction,
        cx.history,
        cx.total_transactions,
        cx.config.same_amount_tolerance,
    );
    out.insert("amt_std", e.amt_std);
    out.insert("amt_med", e.amt_med);
    out.insert("amt_iqr", e.amt_iqr);
    out.insert("interval_std", e.interval_std);
    out.insert("interval_med", e.interval_med);
    out.insert("interval_consistency", e.interval_consistency);
    out.insert("proportion", e.proportion);
    out.insert("day_of_month", e.day_of_month);
    out.insert("days_since_last", e.days_since_last);
    out.insert("n_similar_last_90d", e.n_similar_last_90d);
    out.insert("n_transactions", e.n_transactions);
    out.insert("same_amount_ratio", e.same_amount_ratio);
}

fn stability(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let s = patterns::transaction_stability_features(cx.history);
    out.insert("transaction_frequency", s.transaction_frequency);
    out.insert("robust_interval_median", s.robust_interval_median);
    out.insert("robust_interval_iqr", s.robust_interval_iqr);
    out.insert("coefficient_of_variation_intervals", s.coefficient_of_variation_intervals);
    out.insert("amount_variability_ratio", s.amount_variability_ratio);
    out.insert("matches_common_cycle", s.matches_common_cycle);
    out.insert("recurring_confidence", s.recurring_confidence);
}

fn calendar_alignment(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    let (t, h) = (cx.transaction, cx.history);
    out.insert("ends_in_99", amounts::ends_in_99(t));
    out.insert("amount", t.amount);
    out.insert("same_day_exact", intervals::same_day_of_month_counter(t, h, 0));
    out.insert("pct_transactions_same_day", intervals::pct_same_day_of_month(t, h, 0));
    out.insert("same_day_off_by_1", intervals::same_day_of_month_counter(t, h, 1));
    out.insert("same_day_off_by_2", intervals::same_day_of_month_counter(t, h, 2));
    out.insert("14_days_apart_exact", intervals::days_apart_counter(t, h, 14, 0));
    out.insert("14_days_apart_off_by_1", intervals::days_apart_counter(t, h, 14, 1));
    out.insert("7_days_apart_exact", intervals::days_apart_counter(t, h, 7, 0));
    out.insert("7_days_apart_off_by_1", intervals::days_apart_counter(t, h, 7, 1));
}

fn vendor_keywords(cx: &AnalyzerContext<'_>, out: &mut FeatureMap) {
    out.insert("is_insurance", vendor::is_insurance(cx.transaction));
    out.insert("is_utility", vendor::is_utility(cx.transaction));
    out.insert("is_phone", vendor::is_phone(cx.transaction));
    out.insert("is_always_recurring", vendor::is_always_recurring(cx.transaction));
}

/// Runs every analyzer for one transaction at a time. Holds no per-call state.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeaturesConfig {
        &self.config
    }

    /// Features for `transaction` against `history`, measuring vendor share against the
    /// history itself.
    pub fn compute(&self, transaction: &Transaction, history: &[Transaction]) -> FeatureVector {
        self.compute_with_universe(transaction, history, history.len())
    }

    /// Features for `transaction` against `history`, measuring vendor share against
    /// `total_transactions`.
    pub fn compute_with_universe(
        &self,
        transaction: &Transaction,
        history: &[Transaction],
        total_transactions: usize,
    ) -> FeatureVector {
        let cx = AnalyzerContext {
            transaction,
            history,
            total_transactions,
            config: &self.config,
        };
        let mut features = FeatureMap::new();
        for (_, analyzer) in ANALYZERS {
            analyzer(&cx, &mut features);
        }
        debug!(
            transaction_id = transaction.id,
            history = history.len(),
            features = features.len(),
            "computed features"
        );
        FeatureVector {
            transaction_id: transaction.id,
            features,
        }
    }

    /// Names in output order for this version. Every analyzer emits all of its names
    /// regardless of history size, so an empty history yields the full list.
    pub fn feature_names(&self) -> Vec<String> {
        let probe = Transaction {
            id: 0,
            user_id: String::new(),
            name: String::new(),
            amount: 0.0,
            date: NaiveDate::MIN,
        };
        self.compute(&probe, &[])
            .features
            .names()
            .map(str::to_string)
            .collect()
    }

    /// Analyzer group names in merge order.
    pub fn analyzer_names() -> impl Iterator<Item = &'static str> {
        ANALYZERS.iter().map(|(name, _)| *name)
    }
}

/// Features for one transaction with default tunables.
pub fn compute_features(transaction: &Transaction, history: &[Transaction]) -> FeatureMap {
    FeatureExtractor::default().compute(transaction, history).features
}
