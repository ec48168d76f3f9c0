//! Vendor-name classification against fixed keyword tables.
//!
//! Patterns are compiled once on first use and shared read-only afterwards.

use crate::transaction::Transaction;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Vendors known to bill on a schedule.
pub const KNOWN_RECURRING_COMPANIES: &[&str] = &[
    "netflix",
    "spotify",
    "amazon prime",
    "hulu",
    "disney+",
    "youtube",
    "adobe",
    "microsoft",
    "verizon",
    "at&t",
    "t-mobile",
    "comcast",
    "spectrum",
    "onlyfans",
    "albert",
    "ipsy",
    "experian",
    "walmart+",
    "sirius xm",
    "pandora",
    "sezzle",
    "apple",
    "amazon+",
    "bet+",
    "hbo",
    "credit genie",
    "amazon kids+",
    "paramount+",
    "afterpay",
    "cricut",
];

/// Words that mark a utility, membership or other service bill.
pub const UTILITY_KEYWORDS: &[&str] = &[
    "energy",
    "power",
    "electric",
    "utility",
    "gas",
    "water",
    "sewer",
    "trash",
    "internet",
    "phone",
    "cable",
    "wifi",
    "broadband",
    "telecom",
    "member",
    "fitness",
    "gym",
    "insurance",
    "rent",
    "hoa",
    "subscription",
    "mobile",
    "pay",
    "light",
    "tv",
];

/// Full vendor names that always bill on a schedule.
pub const ALWAYS_RECURRING_VENDORS: &[&str] = &["google storage", "netflix", "hulu", "spotify"];

pub const INSURANCE_KEYWORDS: &[&str] = &["insurance", "insur", "insuranc"];
pub const UTILITY_BILL_KEYWORDS: &[&str] = &["utility", "utilit", "energy"];
pub const PHONE_KEYWORDS: &[&str] = &["at&t", "t-mobile", "verizon"];

pub const RETAIL_KEYWORDS: &[&str] = &["amazon", "walmart", "store", "shop", "motorsports", "gallery"];
pub const ENTERTAINMENT_KEYWORDS: &[&str] = &["movie", "theatre", "bet", "nfl", "roku", "starz"];

const KNOWN_MATCH_SCORE: f64 = 1.0;
const UTILITY_MATCH_SCORE: f64 = 0.8;
const PARTIAL_MATCH_SCORE: f64 = 0.7;

static RECURRING_PATTERN: OnceLock<Regex> = OnceLock::new();
static UTILITY_PATTERN: OnceLock<Regex> = OnceLock::new();
static INSURANCE_PATTERN: OnceLock<Regex> = OnceLock::new();
static UTILITY_BILL_PATTERN: OnceLock<Regex> = OnceLock::new();
static PHONE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Case-insensitive alternation of `keywords`, each bounded as a whole word.
fn whole_word_pattern(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("keyword pattern")
}

fn matches(cell: &'static OnceLock<Regex>, keywords: &[&str], text: &str) -> bool {
    cell.get_or_init(|| whole_word_pattern(keywords)).is_match(text)
}

/// Keep letters, digits and whitespace; trim; lowercase.
pub fn clean_company_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanySignals {
    pub is_recurring_company: bool,
    pub is_utility_company: bool,
    /// 1.0 known vendor, 0.8 utility, 0.7 partial vendor match, else 0.0
    pub recurring_score: f64,
}

/// Classify a vendor name as a known recurring biller or utility.
pub fn detect_recurring_company(name: &str) -> CompanySignals {
    let cleaned = clean_company_name(name);
    let is_recurring_company = matches(&RECURRING_PATTERN, KNOWN_RECURRING_COMPANIES, &cleaned);
    let is_utility_company = matches(&UTILITY_PATTERN, UTILITY_KEYWORDS, &cleaned);

    let recurring_score = if is_recurring_company {
        KNOWN_MATCH_SCORE
    } else if is_utility_company {
        UTILITY_MATCH_SCORE
    } else if KNOWN_RECURRING_COMPANIES.iter().any(|k| cleaned.contains(k)) {
        PARTIAL_MATCH_SCORE
    } else {
        0.0
    };

    CompanySignals {
        is_recurring_company,
        is_utility_company,
        recurring_score,
    }
}

pub fn is_insurance(transaction: &Transaction) -> bool {
    matches(&INSURANCE_PATTERN, INSURANCE_KEYWORDS, &transaction.name)
}

pub fn is_utility(transaction: &Transaction) -> bool {
    matches(&UTILITY_BILL_PATTERN, UTILITY_BILL_KEYWORDS, &transaction.name)
}

pub fn is_phone(transaction: &Transaction) -> bool {
    matches(&PHONE_PATTERN, PHONE_KEYWORDS, &transaction.name)
}

/// Exact, case-insensitive match of the whole vendor name against the allow-list.
pub fn is_always_recurring(transaction: &Transaction) -> bool {
    let name = transaction.name.to_lowercase();
    ALWAYS_RECURRING_VENDORS.iter().any(|v| *v == name)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantCategory {
    pub is_retail: bool,
    pub is_entertainment: bool,
}

/// Substring flags for merchants that rarely bill on a schedule.
pub fn merchant_category_features(name: &str) -> MerchantCategory {
    let lowered = name.to_lowercase();
    MerchantCategory {
        is_retail: RETAIL_KEYWORDS.iter().any(|k| lowered.contains(k)),
        is_entertainment: ENTERTAINMENT_KEYWORDS.iter().any(|k| lowered.contains(k)),
    }
}

/// Share of the transaction universe that belongs to this vendor's history.
pub fn vendor_recurrence_score(history: &[Transaction], total_transactions: usize) -> f64 {
    if total_transactions == 0 {
        return 0.0;
    }
    history.len() as f64 / total_transactions as f64
}
