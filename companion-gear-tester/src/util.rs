use anyhow::{Context, Result};
use companion_gear::OverrideStore;
use std::{fs, path::Path};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Read a persisted override document, the same shape the host saves.
pub fn load_overrides(path: &Path) -> Result<OverrideStore> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read overrides from {}", path.display()))?;
    let store: OverrideStore = serde_json::from_str(&raw)
        .with_context(|| format!("invalid overrides document {}", path.display()))?;

    let malformed = store.malformed_keys();
    if !malformed.is_empty() {
        log::warn!(
            "{} override keys in {} will be ignored: {}",
            malformed.len(),
            path.display(),
            malformed.join(", ")
        );
    }
    log::info!(
        "loaded {} cost and {} item overrides from {}",
        store.raw_costs().len(),
        store.raw_items().len(),
        path.display()
    );
    Ok(store)
}
