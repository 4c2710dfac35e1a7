pub mod disk;
pub mod memory;

pub use disk::DiskEntryStore;
pub use memory::MemoryEntryStore;

use crate::core::entry::{ConfigEntry, SensorOptions};
use anyhow::Result;

/// Storage for finished configuration entries.
///
/// Implementations keep at most one entry per instrument (`unique_id`).
pub trait EntryStore: Send + Sync {
    fn list(&self) -> Result<Vec<ConfigEntry>>;

    fn get(&self, entry_id: &str) -> Result<Option<ConfigEntry>>;

    /// Fails when an entry for the same instrument exists.
    fn add(&self, entry: ConfigEntry) -> Result<()>;

    fn update_options(&self, entry_id: &str, options: SensorOptions) -> Result<ConfigEntry>;

    /// Returns whether an entry was removed.
    fn remove(&self, entry_id: &str) -> Result<bool>;

    /// Looks an entry up by entry id or by instrument id.
    fn find(&self, key: &str) -> Result<Option<ConfigEntry>> {
        if let Some(entry) = self.get(key)? {
            return Ok(Some(entry));
        }
        Ok(self.list()?.into_iter().find(|e| e.unique_id == key))
    }

    fn configured_ids(&self) -> Result<Vec<String>> {
        Ok(self.list()?.into_iter().map(|e| e.unique_id).collect())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::entry::SensorConfig;

    pub fn entry(id: &str, name: &str) -> ConfigEntry {
        ConfigEntry::new(name.to_string(), SensorConfig::new(id, name))
    }

    /// Behaviour every store implementation must share.
    pub fn exercise_store(store: &dyn EntryStore) -> Result<()> {
        assert!(store.list()?.is_empty());

        store.add(entry("5361", "Avanza Bank Holding"))?;
        store.add(entry("238449", "Apple Inc"))?;
        let err = store.add(entry("5361", "Duplicate")).unwrap_err();
        assert!(err.to_string().contains("already configured"));

        let mut ids = store.configured_ids()?;
        ids.sort();
        assert_eq!(ids, vec!["238449", "5361"]);

        let found = store.find("5361")?.expect("entry by instrument id");
        assert_eq!(found.entry_id, "avanza_stock_5361");
        assert!(store.find("avanza_stock_238449")?.is_some());
        assert!(store.find("1")?.is_none());

        let options = SensorOptions {
            shares: Some(12.0),
            ..Default::default()
        };
        let updated = store.update_options("avanza_stock_5361", options)?;
        assert_eq!(updated.settings().shares, 12.0);
        assert_eq!(
            store.get("avanza_stock_5361")?.unwrap().options.shares,
            Some(12.0)
        );
        assert!(
            store
                .update_options("avanza_stock_1", SensorOptions::default())
                .is_err()
        );

        assert!(store.remove("avanza_stock_5361")?);
        assert!(!store.remove("avanza_stock_5361")?);
        assert_eq!(store.list()?.len(), 1);
        Ok(())
    }
}
