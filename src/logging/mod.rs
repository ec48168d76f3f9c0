//! Structured logging and ndjson feature output.

mod format;

pub use format::{FeatureRecord, StructuredLogger};
