//! Log lines go to stderr; feature records go to stdout as ndjson, one object per line.

use crate::features::FeatureMap;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One output line: the transaction it describes plus its feature mapping.
#[derive(Debug, Serialize)]
pub struct FeatureRecord<'a> {
    pub id: i64,
    pub user_id: &'a str,
    pub name: &'a str,
    pub features: &'a FeatureMap,
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr, level from RUST_LOG or default.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single serialized record as one line
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> crate::Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(w, "{}", line)?;
        Ok(())
    }
}
