//! Batch entrypoint: reads a JSON array of transactions, groups them per (user, vendor),
//! and prints one feature record per transaction as ndjson on stdout.

use recur_features::{
    config::AppConfig,
    features::FeatureExtractor,
    logging::{FeatureRecord, StructuredLogger},
    transaction::Transaction,
};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufWriter, Write};
use tracing::info;

fn load_transactions(path: &std::path::Path) -> recur_features::Result<Vec<Transaction>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("RECUR_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = AppConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    let input = std::env::args_os()
        .nth(1)
        .map(std::path::PathBuf::from)
        .ok_or("usage: recur-features <transactions.json>")?;
    let transactions = load_transactions(&input)?;
    info!(path = %input.display(), count = transactions.len(), "loaded transactions");

    let mut per_user: HashMap<&str, usize> = HashMap::new();
    let mut groups: BTreeMap<(&str, &str), Vec<Transaction>> = BTreeMap::new();
    for t in &transactions {
        *per_user.entry(t.user_id.as_str()).or_default() += 1;
        groups
            .entry((t.user_id.as_str(), t.name.as_str()))
            .or_default()
            .push(t.clone());
    }

    let extractor = FeatureExtractor::new(config.features.clone());
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for ((user_id, name), history) in &groups {
        let total = per_user.get(user_id).copied().unwrap_or(history.len());
        for t in history {
            let vector = extractor.compute_with_universe(t, history, total);
            let record = FeatureRecord {
                id: t.id,
                user_id,
                name,
                features: &vector.features,
            };
            StructuredLogger::emit_json(&record, &mut out)?;
        }
    }
    out.flush()?;

    info!(groups = groups.len(), "feature extraction complete");
    Ok(())
}
