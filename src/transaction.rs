//! Transaction record as handed to the analyzers.

use crate::error::{FeatureError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
}

impl Transaction {
    /// Build a transaction from either a typed date or an ISO `YYYY-MM-DD` string.
    pub fn new(
        id: i64,
        user_id: impl Into<String>,
        name: impl Into<String>,
        amount: f64,
        date: impl IntoDate,
    ) -> Result<Self> {
        Ok(Self {
            id,
            user_id: user_id.into(),
            name: name.into(),
            amount,
            date: date.into_date()?,
        })
    }
}

/// Anything that resolves to a calendar date.
pub trait IntoDate {
    fn into_date(self) -> Result<NaiveDate>;
}

impl IntoDate for NaiveDate {
    fn into_date(self) -> Result<NaiveDate> {
        Ok(self)
    }
}

impl IntoDate for &str {
    fn into_date(self) -> Result<NaiveDate> {
        parse_date(self)
    }
}

impl IntoDate for String {
    fn into_date(self) -> Result<NaiveDate> {
        parse_date(&self)
    }
}

impl IntoDate for &String {
    fn into_date(self) -> Result<NaiveDate> {
        parse_date(self)
    }
}

/// Parse an ISO `YYYY-MM-DD` date; anything else is a malformed date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| {
        FeatureError::MalformedDate {
            value: value.to_string(),
            source,
        }
    })
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}
