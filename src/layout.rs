//! Storage Layout
//!
//! Resolves the storage root and its fixed subdirectories. Resolution never
//! touches the disk; each accessor creates its directory on first use and
//! reports a creation failure itself, so one unwritable directory does not
//! prevent the others from being used.

use crate::classify;
use crate::error::LayoutError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Fixed subdirectories under the storage root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subdir {
    Bios,
    Games,
    Memory,
    Cartridge,
    State,
    Screenshots,
    Record,
}

impl Subdir {
    pub fn all() -> &'static [Subdir] {
        &[
            Subdir::Bios,
            Subdir::Games,
            Subdir::Memory,
            Subdir::Cartridge,
            Subdir::State,
            Subdir::Screenshots,
            Subdir::Record,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subdir::Bios => "bios",
            Subdir::Games => "games",
            Subdir::Memory => "memory",
            Subdir::Cartridge => "cartridge",
            Subdir::State => "state",
            Subdir::Screenshots => "screenshots",
            Subdir::Record => "record",
        }
    }
}

/// Which of the two candidate bases the platform wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasePolicy {
    /// Application-scoped storage (current platforms)
    #[default]
    Scoped,
    /// Shared top-level storage (older platforms)
    Legacy,
}

/// Candidate storage bases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseCandidates {
    pub scoped: PathBuf,
    pub legacy: Option<PathBuf>,
}

impl BaseCandidates {
    /// Pick exactly one base. `Legacy` falls back to the scoped base when no
    /// legacy location exists.
    pub fn select(&self, policy: BasePolicy) -> &Path {
        match (policy, &self.legacy) {
            (BasePolicy::Legacy, Some(legacy)) => legacy,
            _ => &self.scoped,
        }
    }
}

/// Render a directory path with exactly one trailing separator.
fn with_trailing_separator(path: &Path) -> String {
    let mut s = path.to_string_lossy().into_owned();
    if !s.ends_with(MAIN_SEPARATOR) && !s.ends_with('/') {
        s.push(MAIN_SEPARATOR);
    }
    s
}

/// Create `dir` if it is missing.
fn ensure_dir(dir: &Path) -> Result<(), LayoutError> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| LayoutError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Storage root with its fixed subdirectories and optional external games root
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    external: Option<PathBuf>,
}

impl StorageLayout {
    /// Use `base` as the storage root.
    pub fn resolve(base: impl Into<PathBuf>) -> Self {
        Self {
            root: base.into(),
            external: None,
        }
    }

    /// Select a base from the candidates according to `policy`.
    pub fn resolve_with_policy(candidates: &BaseCandidates, policy: BasePolicy) -> Self {
        Self::resolve(candidates.select(policy))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subdir(&self, subdir: Subdir) -> PathBuf {
        self.root.join(subdir.as_str())
    }

    /// Path of `subdir`, creating it if missing.
    pub fn ensure(&self, subdir: Subdir) -> Result<PathBuf, LayoutError> {
        ensure_dir(&self.root)?;
        let dir = self.subdir(subdir);
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Create every fixed subdirectory.
    pub fn init_all(&self) -> Result<(), LayoutError> {
        for subdir in Subdir::all() {
            self.ensure(*subdir)?;
        }
        Ok(())
    }

    fn accessor(&self, subdir: Subdir) -> Result<String, LayoutError> {
        self.ensure(subdir).map(|dir| with_trailing_separator(&dir))
    }

    pub fn root_path(&self) -> Result<String, LayoutError> {
        ensure_dir(&self.root)?;
        Ok(with_trailing_separator(&self.root))
    }

    pub fn bios_path(&self) -> Result<String, LayoutError> {
        self.accessor(Subdir::Bios)
    }

    pub fn games_path(&self) -> Result<String, LayoutError> {
        self.accessor(Subdir::Games)
    }

    pub fn memory_path(&self) -> Result<String, LayoutError> {
        self.accessor(Subdir::Memory)
    }

    pub fn cartridge_path(&self) -> Result<String, LayoutError> {
        self.accessor(Subdir::Cartridge)
    }

    pub fn state_path(&self) -> Result<String, LayoutError> {
        self.accessor(Subdir::State)
    }

    pub fn screenshots_path(&self) -> Result<String, LayoutError> {
        self.accessor(Subdir::Screenshots)
    }

    pub fn record_path(&self) -> Result<String, LayoutError> {
        self.accessor(Subdir::Record)
    }

    pub fn bios_file(&self, name: &str) -> Result<PathBuf, LayoutError> {
        Ok(self.ensure(Subdir::Bios)?.join(name))
    }

    pub fn game_file(&self, name: &str) -> Result<PathBuf, LayoutError> {
        Ok(self.ensure(Subdir::Games)?.join(name))
    }

    pub fn memory_file(&self, name: &str) -> Result<PathBuf, LayoutError> {
        Ok(self.ensure(Subdir::Memory)?.join(name))
    }

    pub fn cartridge_file(&self, name: &str) -> Result<PathBuf, LayoutError> {
        Ok(self.ensure(Subdir::Cartridge)?.join(name))
    }

    pub fn set_external_root(&mut self, external: Option<PathBuf>) {
        self.external = external;
    }

    pub fn has_external_root(&self) -> bool {
        self.external.is_some()
    }

    /// External games root with trailing separator. Not created: external
    /// media may be unmounted.
    pub fn external_games_path(&self) -> Option<String> {
        self.external.as_deref().map(with_trailing_separator)
    }

    /// File names in `subdir` accepted by `filter`, sorted.
    fn list(&self, subdir: Subdir, filter: fn(&str) -> bool) -> Result<Vec<String>, LayoutError> {
        let dir = self.ensure(subdir)?;
        let entries = std::fs::read_dir(&dir).map_err(|source| LayoutError::ListDir {
            path: dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if let Some(name) = entry.file_name().to_str() {
                if filter(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn bios_files(&self) -> Result<Vec<String>, LayoutError> {
        self.list(Subdir::Bios, classify::is_bios_file)
    }

    pub fn memory_files(&self) -> Result<Vec<String>, LayoutError> {
        self.list(Subdir::Memory, classify::is_memory_file)
    }

    /// Game candidates in the games directory, sorted, preceded by
    /// `other_dir_label` (the picker entry for browsing elsewhere).
    pub fn game_files(&self, other_dir_label: &str) -> Result<Vec<String>, LayoutError> {
        let mut files = vec![other_dir_label.to_string()];
        files.extend(self.list(Subdir::Games, classify::is_candidate)?);
        Ok(files)
    }
}
