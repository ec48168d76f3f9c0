//! Errors raised at the input boundary. Analyzers themselves never fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("malformed date {value:?}: expected YYYY-MM-DD")]
    MalformedDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeatureError>;
