//! Feature extraction: independent analyzers over a transaction history, merged into one
//! named feature mapping per transaction.

pub mod amounts;
pub mod intervals;
pub mod patterns;
mod pipeline;
pub mod stats;
pub mod vendor;

pub use pipeline::{compute_features, AnalyzerContext, FeatureExtractor};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A single feature value as consumed by the downstream classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Float(v) => v,
            FeatureValue::Int(v) => v as f64,
            FeatureValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<u32> for FeatureValue {
    fn from(v: u32) -> Self {
        FeatureValue::Int(i64::from(v))
    }
}

impl From<usize> for FeatureValue {
    fn from(v: usize) -> Self {
        FeatureValue::Int(v as i64)
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

/// Insertion-ordered name → value mapping. Inserting an existing name replaces its value
/// and keeps the position of the first insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMap {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value that was replaced, if any.
    pub fn insert(&mut self, name: &str, value: impl Into<FeatureValue>) -> Option<FeatureValue> {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name.to_string(), value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Numeric view of `name`; 0.0 when absent.
    pub fn get_f64(&self, name: &str) -> f64 {
        self.get(name).map(|v| v.as_f64()).unwrap_or(0.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Features computed for one transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub transaction_id: i64,
    pub features: FeatureMap,
}

impl FeatureVector {
    /// Dense values in the order of a pinned model column list; unknown names read as 0.0.
    pub fn to_dense<S: AsRef<str>>(&self, names: &[S]) -> Vec<f64> {
        names.iter().map(|n| self.features.get_f64(n.as_ref())).collect()
    }
}
