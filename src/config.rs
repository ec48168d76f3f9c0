//! Extractor configuration. The keyword tables are compiled in; only numeric tunables and
//! logging are configurable.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Analyzer tunables
    pub features: FeaturesConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Relative band for "same amount" ratios (0.05 = ±5%)
    pub same_amount_tolerance: f64,
    /// Days a new charge may drift from the median gap and still count as on time
    pub days_flexibility: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            same_amount_tolerance: 0.05,
            days_flexibility: 7,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(crate::FeatureError::from)
            .and_then(|data| serde_json::from_str::<AppConfig>(&data).map_err(Into::into));
        match parsed {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults");
                Self::default()
            }
        }
    }
}
