//! Catalog Store
//!
//! Key-indexed storage for cataloged titles and remote status records.
//! Entries are keyed by absolute source path; container entries also index
//! their member files so a data track owned by a sheet can be recognized
//! without re-reading the sheet.

pub mod memory;
pub mod persistence;

use crate::classify::DiscFormat;
use crate::error::StorageError;
use crate::types::ProductNumber;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use memory::{MemoryCatalogStore, MemoryPreferenceStore};
pub use persistence::{SledCatalogStore, SledPreferenceStore};

/// Market region decoded from a disc header area symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Japan,
    AsiaNtsc,
    NorthAmerica,
    Brazil,
    Korea,
    AsiaPal,
    Europe,
    LatinAmerica,
}

impl Region {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'J' => Some(Region::Japan),
            'T' => Some(Region::AsiaNtsc),
            'U' => Some(Region::NorthAmerica),
            'B' => Some(Region::Brazil),
            'K' => Some(Region::Korea),
            'A' => Some(Region::AsiaPal),
            'E' => Some(Region::Europe),
            'L' => Some(Region::LatinAmerica),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Region::Japan => 'J',
            Region::AsiaNtsc => 'T',
            Region::NorthAmerica => 'U',
            Region::Brazil => 'B',
            Region::Korea => 'K',
            Region::AsiaPal => 'A',
            Region::Europe => 'E',
            Region::LatinAmerica => 'L',
        }
    }
}

/// GameEntry: one cataloged title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    /// Absolute path of the file the title was cataloged from
    pub path: PathBuf,
    pub title: String,
    pub format: DiscFormat,
    /// Files named by a container (tracks, data images)
    #[serde(default)]
    pub members: Vec<PathBuf>,
    pub product_number: Option<ProductNumber>,
    pub maker: Option<String>,
    pub version: Option<String>,
    pub release_date: Option<String>,
    /// Raw area symbols from the disc header
    pub area: Option<String>,
    #[serde(default)]
    pub regions: Vec<Region>,
    pub rating: Option<i64>,
    pub image_url: Option<String>,
    pub update_at: Option<NaiveDateTime>,
    pub cataloged_at: Option<NaiveDateTime>,
}

impl GameEntry {
    pub fn new(path: PathBuf, title: impl Into<String>, format: DiscFormat) -> Self {
        Self {
            path,
            title: title.into(),
            format,
            members: Vec::new(),
            product_number: None,
            maker: None,
            version: None,
            release_date: None,
            area: None,
            regions: Vec::new(),
            rating: None,
            image_url: None,
            update_at: None,
            cataloged_at: None,
        }
    }

    pub fn with_members(mut self, members: Vec<PathBuf>) -> Self {
        self.members = members;
        self
    }

    pub fn with_product_number(mut self, product_number: impl Into<String>) -> Self {
        self.product_number = Some(product_number.into());
        self
    }

    /// Compute derived fields before the entry is persisted.
    ///
    /// Trims the title, decodes regions from the area symbols, stamps the
    /// catalog time and copies any known remote status for the product.
    pub fn finalize(&mut self, status: Option<&RemoteStatus>, now: NaiveDateTime) {
        let trimmed = self.title.trim();
        if trimmed.len() != self.title.len() {
            self.title = trimmed.to_string();
        }

        self.regions.clear();
        if let Some(area) = &self.area {
            for symbol in area.chars() {
                if let Some(region) = Region::from_symbol(symbol) {
                    if !self.regions.contains(&region) {
                        self.regions.push(region);
                    }
                }
            }
        }

        if let Some(status) = status {
            self.apply_status(status);
        }
        self.cataloged_at = Some(now);
    }

    /// Copy remote status fields onto this entry.
    pub fn apply_status(&mut self, status: &RemoteStatus) {
        self.rating = Some(status.rating);
        self.image_url = Some(status.image_url.clone());
        self.update_at = Some(status.update_at);
    }

    /// True if `path` is this entry's source file or one of its members.
    pub fn owns(&self, path: &Path) -> bool {
        self.path == path || self.members.iter().any(|m| m == path)
    }
}

/// RemoteStatus: per-product metadata pulled from the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub product_number: ProductNumber,
    pub image_url: String,
    pub rating: i64,
    pub update_at: NaiveDateTime,
}

/// Catalog store interface
///
/// Writes are expected to come from a single builder at a time.
pub trait CatalogStore: Send + Sync {
    /// Direct lookup by exact source path.
    fn entry(&self, path: &Path) -> Result<Option<GameEntry>, StorageError>;

    /// Indirect lookup: the entry whose source or member list contains `path`.
    fn owner_of(&self, path: &Path) -> Result<Option<GameEntry>, StorageError>;

    fn put_entry(&self, entry: &GameEntry) -> Result<(), StorageError>;
    fn remove_entry(&self, path: &Path) -> Result<(), StorageError>;

    /// Remove every cataloged entry. Remote status records are kept.
    fn clear_entries(&self) -> Result<(), StorageError>;

    fn entries(&self) -> Result<Vec<GameEntry>, StorageError>;

    fn status(&self, product_number: &str) -> Result<Option<RemoteStatus>, StorageError>;
    fn put_status(&self, status: &RemoteStatus) -> Result<(), StorageError>;
    fn statuses(&self) -> Result<Vec<RemoteStatus>, StorageError>;

    /// Sync cursor: newest `update_at` among stored status records.
    fn last_status_update(&self) -> Result<Option<NaiveDateTime>, StorageError> {
        Ok(self.statuses()?.into_iter().map(|s| s.update_at).max())
    }

    /// Entries that carry a product number, grouped by it in one pass.
    fn entries_by_product(&self) -> Result<HashMap<ProductNumber, Vec<GameEntry>>, StorageError> {
        let mut grouped: HashMap<ProductNumber, Vec<GameEntry>> = HashMap::new();
        for entry in self.entries()? {
            if let Some(product) = entry.product_number.clone() {
                grouped.entry(product).or_default().push(entry);
            }
        }
        Ok(grouped)
    }

    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Persisted string preferences (scan roots and similar user settings).
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
