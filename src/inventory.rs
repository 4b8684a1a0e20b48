//! Installed-application inventory files

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::matching::find_best_match;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Failed to read inventory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid inventory: {0}")]
    Json(#[from] serde_json::Error),
}

/// One element of the inventory JSON array
#[derive(Debug, Deserialize)]
struct InventoryEntry {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

/// Load `(name, installed_version)` pairs from a JSON inventory file
///
/// The file holds an array of `{"name": ..., "version": ...}` objects. A
/// missing or null version becomes an empty string.
pub fn load_inventory(path: &Path) -> Result<Vec<(String, String)>, InventoryError> {
    let content = std::fs::read_to_string(path)?;
    let apps = parse_inventory(&content)?;
    info!("Loaded {} applications from {}", apps.len(), path.display());
    Ok(apps)
}

/// Parse inventory JSON, keeping the first entry for each name
pub fn parse_inventory(content: &str) -> Result<Vec<(String, String)>, InventoryError> {
    let entries: Vec<InventoryEntry> = serde_json::from_str(content)?;

    let mut apps: IndexMap<String, String> = IndexMap::with_capacity(entries.len());
    for entry in entries {
        let name = entry.name.trim();
        if name.is_empty() {
            continue;
        }
        if apps.contains_key(name) {
            debug!("Skipping duplicate inventory entry {:?}", name);
            continue;
        }
        apps.insert(name.to_string(), entry.version.unwrap_or_default());
    }

    Ok(apps.into_iter().collect())
}

/// Drop apps already provided by the catalog (e.g. installed as casks)
pub fn exclude_managed(
    apps: Vec<(String, String)>,
    managed: &[String],
    threshold: u8,
) -> Vec<(String, String)> {
    if managed.is_empty() {
        return apps;
    }

    let before = apps.len();
    let remaining: Vec<_> = apps
        .into_iter()
        .filter(|(name, _)| match find_best_match(name, managed, threshold) {
            Some(managed_name) => {
                debug!("Excluding {:?}, managed as {:?}", name, managed_name);
                false
            }
            None => true,
        })
        .collect();

    info!("Excluded {} managed applications", before - remaining.len());
    remaining
}
