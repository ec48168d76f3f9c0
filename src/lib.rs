//! Recurring-transaction feature extraction.
//!
//! Modular structure:
//! - [`transaction`]: Transaction record and date parsing at the boundary
//! - [`features`]: Independent temporal, amount, pattern and vendor analyzers plus the aggregator
//! - [`config`]: Tunables and logging settings
//! - [`logging`]: Structured logging setup and ndjson output
//! - [`error`]: Boundary errors

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod transaction;

pub use config::{AppConfig, FeaturesConfig};
pub use error::{FeatureError, Result};
pub use features::{compute_features, FeatureExtractor, FeatureMap, FeatureValue, FeatureVector};
pub use logging::StructuredLogger;
pub use transaction::{IntoDate, Transaction};
