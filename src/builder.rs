//! Catalog Builder
//!
//! Runs one catalog build: status sync, optional wipe, root resolution and a
//! scan of every root. All collaborators come in through `CatalogContext`.

use crate::error::ApiError;
use crate::extract::MetadataExtractor;
use crate::layout::StorageLayout;
use crate::progress::ProgressSink;
use crate::roots::{self, GAME_DIRECTORIES_KEY};
use crate::scan::{CatalogScanner, ScanReport};
use crate::store::{CatalogStore, PreferenceStore};
use crate::sync::{MalformedPolicy, StatusSource, StatusSyncer, SyncReport};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// How much of the catalog a build refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshLevel {
    /// Keep existing entries; abort if the status sync fails
    StatusOnly,
    /// Drop every entry and rescan, whatever the sync outcome
    #[default]
    Rebuild,
}

impl RefreshLevel {
    /// Numeric levels from older settings: 3 and above rebuild.
    pub fn from_level(level: u8) -> Self {
        if level >= 3 {
            RefreshLevel::Rebuild
        } else {
            RefreshLevel::StatusOnly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshLevel::StatusOnly => "status-only",
            RefreshLevel::Rebuild => "rebuild",
        }
    }
}

impl fmt::Display for RefreshLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status-only" | "status" => Ok(RefreshLevel::StatusOnly),
            "rebuild" => Ok(RefreshLevel::Rebuild),
            other => other
                .parse::<u8>()
                .map(RefreshLevel::from_level)
                .map_err(|_| format!("unknown refresh level '{}'", s)),
        }
    }
}

/// Everything a build needs
#[derive(Clone)]
pub struct CatalogContext {
    pub layout: StorageLayout,
    pub store: Arc<dyn CatalogStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub extractor: Arc<dyn MetadataExtractor>,
    pub status_source: Arc<dyn StatusSource>,
    pub malformed_policy: MalformedPolicy,
    pub progress: Arc<dyn ProgressSink>,
}

/// A root whose scan failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFailure {
    pub root: PathBuf,
    pub error: String,
}

/// Summary of one build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub level: RefreshLevel,
    pub sync: Option<SyncReport>,
    pub sync_error: Option<String>,
    /// Build stopped after the sync; nothing was scanned
    pub aborted: bool,
    /// Entries removed before scanning
    pub cleared: bool,
    pub roots: Vec<String>,
    pub scans: Vec<ScanReport>,
    pub failures: Vec<RootFailure>,
}

impl BuildReport {
    pub fn titles_added(&self) -> usize {
        self.scans.iter().map(ScanReport::added).sum()
    }
}

pub struct CatalogBuilder<'a> {
    context: &'a CatalogContext,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(context: &'a CatalogContext) -> Self {
        Self { context }
    }

    /// Merge persisted roots with the layout's games roots, saving the merged
    /// list when it changed. A failed save is logged, not fatal.
    pub fn resolve_roots(&self) -> Result<Vec<String>, ApiError> {
        let ctx = self.context;
        let games = ctx.layout.games_path()?;
        let external = ctx.layout.external_games_path();
        let persisted = ctx.preferences.get(GAME_DIRECTORIES_KEY)?;

        let resolution = roots::resolve(persisted.as_deref(), &games, external.as_deref());
        if let Some(updated) = &resolution.updated {
            if let Err(e) = ctx.preferences.set(GAME_DIRECTORIES_KEY, updated) {
                warn!("Failed to save scan roots, continuing with in-memory list: {}", e);
            }
        }
        Ok(resolution.roots)
    }

    pub fn build(&self, level: RefreshLevel) -> Result<BuildReport, ApiError> {
        let ctx = self.context;
        let mut report = BuildReport {
            level,
            ..BuildReport::default()
        };
        info!(level = %level, "Starting catalog build");

        let syncer = StatusSyncer::new(ctx.store.as_ref(), ctx.status_source.as_ref())
            .with_policy(ctx.malformed_policy);
        match syncer.sync() {
            Ok(sync) => report.sync = Some(sync),
            Err(e) => {
                warn!("Status sync failed: {}", e);
                report.sync_error = Some(e.to_string());
                if level == RefreshLevel::StatusOnly {
                    report.aborted = true;
                    return Ok(report);
                }
            }
        }

        if level == RefreshLevel::Rebuild {
            ctx.store.clear_entries()?;
            report.cleared = true;
        }

        report.roots = self.resolve_roots()?;

        let scanner = CatalogScanner::new(
            ctx.store.as_ref(),
            ctx.extractor.as_ref(),
            ctx.progress.as_ref(),
        );
        for root in &report.roots {
            match scanner.scan(Path::new(root)) {
                Ok(scan) => report.scans.push(scan),
                Err(e) => {
                    warn!("Scan of {} failed: {}", root, e);
                    report.failures.push(RootFailure {
                        root: PathBuf::from(root),
                        error: e.to_string(),
                    });
                }
            }
        }
        ctx.store.flush()?;

        info!(
            roots = report.roots.len(),
            added = report.titles_added(),
            failures = report.failures.len(),
            "Catalog build complete"
        );
        Ok(report)
    }
}
