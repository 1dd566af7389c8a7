//! Sled-backed persistence for the catalog and preferences.
//!
//! Trees:
//! - `entries`: path key -> bincode `GameEntry`
//! - `members`: member path key -> owning entry path key
//! - `status`: product number -> bincode `RemoteStatus`
//! - `preferences`: key -> UTF-8 value

use super::{CatalogStore, GameEntry, PreferenceStore, RemoteStatus};
use crate::error::StorageError;
use crate::types::path_key;
use std::path::Path;

const ENTRIES_TREE: &str = "entries";
const MEMBERS_TREE: &str = "members";
const STATUS_TREE: &str = "status";
const PREFERENCES_TREE: &str = "preferences";

/// Catalog store persisted in a sled database
pub struct SledCatalogStore {
    db: sled::Db,
    entries: sled::Tree,
    members: sled::Tree,
    statuses: sled::Tree,
}

impl SledCatalogStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Wrap an already opened database, sharing it with other stores.
    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            entries: db.open_tree(ENTRIES_TREE)?,
            members: db.open_tree(MEMBERS_TREE)?,
            statuses: db.open_tree(STATUS_TREE)?,
            db,
        })
    }

    fn decode_entry(bytes: &[u8]) -> Result<GameEntry, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn decode_status(bytes: &[u8]) -> Result<RemoteStatus, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Drop member links that still point at `owner_key`.
    fn unlink_members(&self, owner_key: &str) -> Result<(), StorageError> {
        let Some(bytes) = self.entries.get(owner_key)? else {
            return Ok(());
        };
        let previous = Self::decode_entry(&bytes)?;
        for member in &previous.members {
            let member_key = path_key(member);
            if let Some(owner) = self.members.get(&member_key)? {
                if &owner[..] == owner_key.as_bytes() {
                    self.members.remove(&member_key)?;
                }
            }
        }
        Ok(())
    }
}

impl CatalogStore for SledCatalogStore {
    fn entry(&self, path: &Path) -> Result<Option<GameEntry>, StorageError> {
        match self.entries.get(path_key(path))? {
            Some(bytes) => Ok(Some(Self::decode_entry(&bytes)?)),
            None => Ok(None),
        }
    }

    fn owner_of(&self, path: &Path) -> Result<Option<GameEntry>, StorageError> {
        let key = path_key(path);
        if let Some(bytes) = self.entries.get(&key)? {
            return Ok(Some(Self::decode_entry(&bytes)?));
        }
        let Some(owner_key) = self.members.get(&key)? else {
            return Ok(None);
        };
        match self.entries.get(owner_key)? {
            Some(bytes) => Ok(Some(Self::decode_entry(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_entry(&self, entry: &GameEntry) -> Result<(), StorageError> {
        let key = path_key(&entry.path);
        self.unlink_members(&key)?;
        for member in &entry.members {
            self.members.insert(path_key(member), key.as_bytes())?;
        }
        let bytes = bincode::serialize(entry)?;
        self.entries.insert(key, bytes)?;
        Ok(())
    }

    fn remove_entry(&self, path: &Path) -> Result<(), StorageError> {
        let key = path_key(path);
        self.unlink_members(&key)?;
        self.entries.remove(key)?;
        Ok(())
    }

    fn clear_entries(&self) -> Result<(), StorageError> {
        self.entries.clear()?;
        self.members.clear()?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<GameEntry>, StorageError> {
        let mut out = Vec::new();
        for item in self.entries.iter() {
            let (_, bytes) = item?;
            out.push(Self::decode_entry(&bytes)?);
        }
        Ok(out)
    }

    fn status(&self, product_number: &str) -> Result<Option<RemoteStatus>, StorageError> {
        match self.statuses.get(product_number)? {
            Some(bytes) => Ok(Some(Self::decode_status(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_status(&self, status: &RemoteStatus) -> Result<(), StorageError> {
        let bytes = bincode::serialize(status)?;
        self.statuses.insert(status.product_number.as_str(), bytes)?;
        Ok(())
    }

    fn statuses(&self) -> Result<Vec<RemoteStatus>, StorageError> {
        let mut out = Vec::new();
        for item in self.statuses.iter() {
            let (_, bytes) = item?;
            out.push(Self::decode_status(&bytes)?);
        }
        Ok(out)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Preference store persisted in the same sled database
pub struct SledPreferenceStore {
    tree: sled::Tree,
}

impl SledPreferenceStore {
    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            tree: db.open_tree(PREFERENCES_TREE)?,
        })
    }
}

impl PreferenceStore for SledPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.tree.get(key)? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| StorageError::Corrupt(format!("preference {}: {}", key, e))),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.tree.insert(key, value.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }
}
