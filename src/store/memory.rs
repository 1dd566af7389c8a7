//! In-memory store implementations.
//!
//! Used for dry runs and to give each test a fresh, disposable catalog.

use super::{CatalogStore, GameEntry, PreferenceStore, RemoteStatus};
use crate::error::StorageError;
use crate::types::{path_key, PathKey};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Default)]
struct CatalogState {
    entries: BTreeMap<PathKey, GameEntry>,
    /// member path -> owning entry path
    members: HashMap<PathKey, PathKey>,
    statuses: BTreeMap<String, RemoteStatus>,
}

impl CatalogState {
    fn unlink_members(&mut self, owner_key: &PathKey) {
        self.members.retain(|_, owner| owner != owner_key);
    }
}

/// Catalog store held entirely in memory
#[derive(Default)]
pub struct MemoryCatalogStore {
    state: RwLock<CatalogState>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_count(&self) -> usize {
        self.state.read().entries.len()
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn entry(&self, path: &Path) -> Result<Option<GameEntry>, StorageError> {
        Ok(self.state.read().entries.get(&path_key(path)).cloned())
    }

    fn owner_of(&self, path: &Path) -> Result<Option<GameEntry>, StorageError> {
        let state = self.state.read();
        let key = path_key(path);
        if let Some(entry) = state.entries.get(&key) {
            return Ok(Some(entry.clone()));
        }
        Ok(state
            .members
            .get(&key)
            .and_then(|owner| state.entries.get(owner))
            .cloned())
    }

    fn put_entry(&self, entry: &GameEntry) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let key = path_key(&entry.path);
        state.unlink_members(&key);
        for member in &entry.members {
            state.members.insert(path_key(member), key.clone());
        }
        state.entries.insert(key, entry.clone());
        Ok(())
    }

    fn remove_entry(&self, path: &Path) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let key = path_key(path);
        state.unlink_members(&key);
        state.entries.remove(&key);
        Ok(())
    }

    fn clear_entries(&self) -> Result<(), StorageError> {
        let mut state = self.state.write();
        state.entries.clear();
        state.members.clear();
        Ok(())
    }

    fn entries(&self) -> Result<Vec<GameEntry>, StorageError> {
        Ok(self.state.read().entries.values().cloned().collect())
    }

    fn status(&self, product_number: &str) -> Result<Option<RemoteStatus>, StorageError> {
        Ok(self.state.read().statuses.get(product_number).cloned())
    }

    fn put_status(&self, status: &RemoteStatus) -> Result<(), StorageError> {
        self.state
            .write()
            .statuses
            .insert(status.product_number.clone(), status.clone());
        Ok(())
    }

    fn statuses(&self) -> Result<Vec<RemoteStatus>, StorageError> {
        Ok(self.state.read().statuses.values().cloned().collect())
    }
}

/// Preference store held in memory
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
