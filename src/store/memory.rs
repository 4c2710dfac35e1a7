use super::EntryStore;
use crate::core::entry::{ConfigEntry, SensorOptions};
use anyhow::{Result, anyhow, bail};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory entry store, keyed by entry id.
#[derive(Default)]
pub struct MemoryEntryStore {
    entries: RwLock<BTreeMap<String, ConfigEntry>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("Entry store lock poisoned")
}

impl EntryStore for MemoryEntryStore {
    fn list(&self) -> Result<Vec<ConfigEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.values().cloned().collect())
    }

    fn get(&self, entry_id: &str) -> Result<Option<ConfigEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(entry_id).cloned())
    }

    fn add(&self, entry: ConfigEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.values().any(|e| e.unique_id == entry.unique_id) {
            bail!("Instrument {} is already configured", entry.unique_id);
        }
        debug!(entry = %entry.entry_id, "Adding entry");
        entries.insert(entry.entry_id.clone(), entry);
        Ok(())
    }

    fn update_options(&self, entry_id: &str, options: SensorOptions) -> Result<ConfigEntry> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let entry = entries
            .get_mut(entry_id)
            .ok_or_else(|| anyhow!("No entry with id {}", entry_id))?;
        entry.options = options;
        Ok(entry.clone())
    }

    fn remove(&self, entry_id: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries.remove(entry_id).is_some())
    }
}
