//! StorageConfig and path resolution for the storage root and catalog store.

use crate::config::xdg;
use crate::error::ApiError;
use crate::layout::{BaseCandidates, BasePolicy, StorageLayout};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Application-scoped storage root; None means `$XDG_DATA_HOME/discdex`
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Shared storage root used under the legacy policy
    #[serde(default)]
    pub legacy_root: Option<PathBuf>,

    #[serde(default)]
    pub policy: BasePolicy,

    /// Second games tree on removable media
    #[serde(default)]
    pub external_root: Option<PathBuf>,

    /// Catalog database; None means `$XDG_DATA_HOME/discdex/catalog`
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn base_candidates(&self) -> Result<BaseCandidates, ApiError> {
        let scoped = match &self.root {
            Some(root) => root.clone(),
            None => xdg::data_dir()?,
        };
        Ok(BaseCandidates {
            scoped,
            legacy: self.legacy_root.clone(),
        })
    }

    /// Resolve the storage layout. Nothing is created on disk.
    pub fn layout(&self) -> Result<StorageLayout, ApiError> {
        let mut layout = StorageLayout::resolve_with_policy(&self.base_candidates()?, self.policy);
        layout.set_external_root(self.external_root.clone());
        Ok(layout)
    }

    /// Resolve the catalog database location.
    pub fn resolve_store_path(&self) -> Result<PathBuf, ApiError> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(xdg::data_dir()?.join("catalog")),
        }
    }
}
