use super::EntryStore;
use crate::core::entry::{ConfigEntry, SensorOptions};
use anyhow::{Context, Result, anyhow, bail};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const ENTRIES_PARTITION: &str = "entries";

/// Entry store persisted in a fjall keyspace. Entries are stored as JSON
/// under their entry id.
pub struct DiskEntryStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskEntryStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open entry store at {}", path.display()))?;
        let partition =
            keyspace.open_partition(ENTRIES_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened entry store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }

    fn write(&self, entry: &ConfigEntry) -> Result<()> {
        self.partition
            .insert(entry.entry_id.as_bytes(), serde_json::to_vec(entry)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

impl EntryStore for DiskEntryStore {
    fn list(&self) -> Result<Vec<ConfigEntry>> {
        let mut entries = Vec::new();
        for item in self.partition.iter() {
            let (key, value) = item?;
            let entry: ConfigEntry = serde_json::from_slice(&value).with_context(|| {
                format!(
                    "Failed to parse stored entry {}",
                    String::from_utf8_lossy(&key)
                )
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn get(&self, entry_id: &str) -> Result<Option<ConfigEntry>> {
        match self.partition.get(entry_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn add(&self, entry: ConfigEntry) -> Result<()> {
        if self.list()?.iter().any(|e| e.unique_id == entry.unique_id) {
            bail!("Instrument {} is already configured", entry.unique_id);
        }
        debug!(entry = %entry.entry_id, "Adding entry");
        self.write(&entry)
    }

    fn update_options(&self, entry_id: &str, options: SensorOptions) -> Result<ConfigEntry> {
        let mut entry = self
            .get(entry_id)?
            .ok_or_else(|| anyhow!("No entry with id {}", entry_id))?;
        entry.options = options;
        self.write(&entry)?;
        Ok(entry)
    }

    fn remove(&self, entry_id: &str) -> Result<bool> {
        if !self.partition.contains_key(entry_id)? {
            return Ok(false);
        }
        self.partition.remove(entry_id)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(true)
    }
}
