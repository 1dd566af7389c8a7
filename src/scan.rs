//! Catalog Scanner
//!
//! Two-phase scan of one root. Containers are cataloged first so that the
//! data files they name are already owned when loose images are considered in
//! the second pass; a `.bin` referenced by a `.cue` therefore never becomes a
//! second title.

use crate::classify::{classify_path, DiscFormat, FileKind};
use crate::error::{ScanError, StorageError};
use crate::extract::MetadataExtractor;
use crate::progress::ProgressSink;
use crate::store::{CatalogStore, GameEntry};
use crate::types::normalize_path;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of scanning one root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub root: PathBuf,
    /// Root missing or not a directory
    pub skipped: bool,
    /// Titles cataloged from containers (phase 1)
    pub containers_added: usize,
    /// Titles cataloged from standalone images (phase 2)
    pub images_added: usize,
    /// Candidates already present in the catalog
    pub already_cataloged: usize,
    /// Candidates the extractor could not read
    pub misses: usize,
    /// Standalone entries replaced by a container that names them
    pub absorbed: usize,
    /// Stale container entries dropped because their file is gone
    pub repromoted: usize,
}

impl ScanReport {
    pub fn added(&self) -> usize {
        self.containers_added + self.images_added
    }
}

/// Scans roots into a catalog store
pub struct CatalogScanner<'a> {
    store: &'a dyn CatalogStore,
    extractor: &'a dyn MetadataExtractor,
    progress: &'a dyn ProgressSink,
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

impl<'a> CatalogScanner<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        extractor: &'a dyn MetadataExtractor,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            store,
            extractor,
            progress,
        }
    }

    /// Candidate files under `root`, in file name order.
    fn walk(root: &Path) -> impl Iterator<Item = (PathBuf, FileKind)> + '_ {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let kind = classify_path(entry.path());
                kind.is_candidate().then(|| (entry.into_path(), kind))
            })
    }

    /// Scan `root`. A missing root is skipped, not an error.
    pub fn scan(&self, root: &Path) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport {
            root: root.to_path_buf(),
            ..ScanReport::default()
        };

        if !root.is_dir() {
            debug!("Skipping scan root {}: not a directory", root.display());
            report.skipped = true;
            return Ok(report);
        }
        let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let storage = |source: StorageError| ScanError::Storage {
            root: root.clone(),
            source,
        };

        info!("Scanning {}", root.display());
        self.catalog_containers(&root, &mut report).map_err(storage)?;
        self.catalog_images(&root, &mut report).map_err(storage)?;
        info!(
            root = %root.display(),
            containers = report.containers_added,
            images = report.images_added,
            misses = report.misses,
            "Scan complete"
        );
        Ok(report)
    }

    fn finalize_and_store(&self, path: PathBuf, mut entry: GameEntry) -> Result<GameEntry, StorageError> {
        entry.path = path;
        for member in &mut entry.members {
            *member = normalize_path(member);
        }
        let status = match entry.product_number.as_deref() {
            Some(product) => self.store.status(product)?,
            None => None,
        };
        entry.finalize(status.as_ref(), now());
        self.store.put_entry(&entry)?;
        Ok(entry)
    }

    /// Phase 1: containers, looked up by exact path.
    fn catalog_containers(&self, root: &Path, report: &mut ScanReport) -> Result<(), StorageError> {
        for (path, kind) in Self::walk(root) {
            let FileKind::Container(format) = kind else {
                continue;
            };
            if self.store.entry(&path)?.is_some() {
                report.already_cataloged += 1;
                continue;
            }

            debug!("Reading container {}", path.display());
            let Some(entry) = self.extractor.from_container(&path, format) else {
                debug!("No title in {}", path.display());
                report.misses += 1;
                continue;
            };

            // Loose images cataloged before this container appeared now belong to it
            for member in &entry.members {
                if let Some(existing) = self.store.entry(member)? {
                    if matches!(existing.format, DiscFormat::Direct(_)) {
                        self.store.remove_entry(member)?;
                        report.absorbed += 1;
                    }
                }
            }

            let entry = self.finalize_and_store(path, entry)?;
            self.progress.on_title_cataloged(&entry.title);
            report.containers_added += 1;
        }
        Ok(())
    }

    /// Indirect lookup. An owner whose container file has disappeared is
    /// dropped. The member stays owned if another cataloged container still
    /// lists it; otherwise it is free to be cataloged on its own.
    fn is_owned(&self, path: &Path, report: &mut ScanReport) -> Result<bool, StorageError> {
        let Some(owner) = self.store.owner_of(path)? else {
            return Ok(false);
        };
        if owner.path == path || owner.path.exists() {
            return Ok(true);
        }
        debug!(
            "Container {} no longer exists; releasing {}",
            owner.path.display(),
            path.display()
        );
        self.store.remove_entry(&owner.path)?;
        report.repromoted += 1;

        let survivor = self
            .store
            .entries()?
            .into_iter()
            .find(|entry| entry.owns(path) && entry.path.exists());
        match survivor {
            Some(survivor) => {
                debug!("{} is still listed by {}", path.display(), survivor.path.display());
                // Re-link the member index to the remaining owner
                self.store.put_entry(&survivor)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Phase 2: standalone images not owned by any cataloged entry.
    fn catalog_images(&self, root: &Path, report: &mut ScanReport) -> Result<(), StorageError> {
        for (path, kind) in Self::walk(root) {
            let FileKind::Direct(format) = kind else {
                continue;
            };
            if self.is_owned(&path, report)? {
                report.already_cataloged += 1;
                continue;
            }

            let Some(entry) = self.extractor.from_image(&path, format) else {
                debug!("No title in {}", path.display());
                report.misses += 1;
                continue;
            };
            self.finalize_and_store(path, entry)?;
            report.images_added += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ContainerFormat, DiscFormat, ImageFormat};
    use crate::extract::tests::header_bytes;
    use crate::extract::HeaderExtractor;
    use crate::progress::SilentProgress;
    use crate::store::{MemoryCatalogStore, RemoteStatus};
    use std::fs;
    use std::sync::mpsc;
    use tempfile::TempDir;

    /// Extractor that names titles after the file stem and treats a `.cue`
    /// as owning the sibling `.bin` with the same stem.
    struct StemExtractor;

    impl MetadataExtractor for StemExtractor {
        fn from_container(&self, path: &Path, format: ContainerFormat) -> Option<GameEntry> {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            let members = vec![path.with_extension("bin")];
            Some(
                GameEntry::new(path.to_path_buf(), stem, DiscFormat::Container(format))
                    .with_members(members),
            )
        }

        fn from_image(&self, path: &Path, format: ImageFormat) -> Option<GameEntry> {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            if stem.starts_with("corrupt") {
                return None;
            }
            Some(GameEntry::new(path.to_path_buf(), stem, DiscFormat::Direct(format)))
        }
    }

    fn titles(store: &MemoryCatalogStore) -> Vec<String> {
        let mut titles: Vec<String> = store.entries().unwrap().into_iter().map(|e| e.title).collect();
        titles.sort();
        titles
    }

    #[test]
    fn test_container_and_member_yield_one_entry() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("game.cue"), "FILE \"game.bin\" BINARY").unwrap();
        fs::write(temp.path().join("game.bin"), "data").unwrap();

        let store = MemoryCatalogStore::new();
        let (tx, rx) = mpsc::channel::<String>();
        let report = CatalogScanner::new(&store, &StemExtractor, &tx)
            .scan(temp.path())
            .unwrap();

        assert_eq!(titles(&store), vec!["game"]);
        assert_eq!(report.containers_added, 1);
        assert_eq!(report.images_added, 0);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["game"]);
    }

    #[test]
    fn test_orphan_image_cataloged_in_second_phase() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("orphan.bin"), "data").unwrap();

        let store = MemoryCatalogStore::new();
        let (tx, rx) = mpsc::channel::<String>();
        let report = CatalogScanner::new(&store, &StemExtractor, &tx)
            .scan(temp.path())
            .unwrap();

        assert_eq!(titles(&store), vec!["orphan"]);
        assert_eq!(report.images_added, 1);
        assert_eq!(report.containers_added, 0);
        assert!(rx.try_recv().is_err(), "phase 2 emits no progress");
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("saturn").join("rpg");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("grandia.cue"), "").unwrap();
        fs::write(nested.join("grandia.bin"), "").unwrap();
        fs::write(temp.path().join("orphan.iso"), "").unwrap();
        fs::write(temp.path().join("readme.txt"), "").unwrap();

        let store = MemoryCatalogStore::new();
        let scanner = CatalogScanner::new(&store, &StemExtractor, &SilentProgress);
        let first = scanner.scan(temp.path()).unwrap();
        assert_eq!(first.added(), 2);

        let (tx, rx) = mpsc::channel::<String>();
        let second = CatalogScanner::new(&store, &StemExtractor, &tx)
            .scan(temp.path())
            .unwrap();
        assert_eq!(second.added(), 0);
        assert_eq!(second.already_cataloged, 3);
        assert_eq!(store.entry_count(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let store = MemoryCatalogStore::new();
        let report = CatalogScanner::new(&store, &StemExtractor, &SilentProgress)
            .scan(&temp.path().join("unmounted"))
            .unwrap();
        assert!(report.skipped);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_file_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("game.iso");
        fs::write(&file, "").unwrap();
        let store = MemoryCatalogStore::new();
        let report = CatalogScanner::new(&store, &StemExtractor, &SilentProgress)
            .scan(&file)
            .unwrap();
        assert!(report.skipped);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_extraction_miss_creates_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("corrupt.img"), "").unwrap();
        let store = MemoryCatalogStore::new();
        let report = CatalogScanner::new(&store, &StemExtractor, &SilentProgress)
            .scan(temp.path())
            .unwrap();
        assert_eq!(report.misses, 1);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_deleted_container_releases_member() {
        let temp = TempDir::new().unwrap();
        let cue = temp.path().join("dragon.cue");
        fs::write(&cue, "").unwrap();
        fs::write(temp.path().join("dragon.bin"), "").unwrap();

        let store = MemoryCatalogStore::new();
        let scanner = CatalogScanner::new(&store, &StemExtractor, &SilentProgress);
        scanner.scan(temp.path()).unwrap();
        assert_eq!(store.entry_count(), 1);

        fs::remove_file(&cue).unwrap();
        let report = scanner.scan(temp.path()).unwrap();
        assert_eq!(report.repromoted, 1);
        assert_eq!(report.images_added, 1);

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].format, DiscFormat::Direct(ImageFormat::Bin)));
    }

    #[test]
    fn test_relative_cue_references_resolve_to_walked_track() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("nights.bin"), header_bytes("GS-9046", "JUE", "NIGHTS")).unwrap();
        fs::write(temp.path().join("nights.cue"), "FILE \"./nights.bin\" BINARY\n").unwrap();
        let cues = temp.path().join("cues");
        fs::create_dir_all(&cues).unwrap();
        fs::write(temp.path().join("rally.bin"), header_bytes("MK-81207", "JUE", "SEGA RALLY")).unwrap();
        fs::write(cues.join("rally.cue"), "FILE \"../rally.bin\" BINARY\n").unwrap();

        let store = MemoryCatalogStore::new();
        let report = CatalogScanner::new(&store, &HeaderExtractor::new(), &SilentProgress)
            .scan(temp.path())
            .unwrap();

        assert_eq!(report.containers_added, 2);
        assert_eq!(report.images_added, 0);
        assert_eq!(report.already_cataloged, 2);
        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| matches!(e.format, DiscFormat::Container(ContainerFormat::Cue))));
    }

    #[test]
    fn test_shared_track_stays_owned_after_one_sheet_is_deleted() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("x.bin"), header_bytes("T-9999G", "J", "SHARED")).unwrap();
        fs::write(temp.path().join("a.cue"), "FILE \"x.bin\" BINARY\n").unwrap();
        let second_sheet = temp.path().join("b.cue");
        fs::write(&second_sheet, "FILE \"x.bin\" BINARY\n").unwrap();

        let store = MemoryCatalogStore::new();
        let extractor = HeaderExtractor::new();
        let scanner = CatalogScanner::new(&store, &extractor, &SilentProgress);
        let first = scanner.scan(temp.path()).unwrap();
        assert_eq!(first.containers_added, 2);
        assert_eq!(first.images_added, 0);

        // b.cue was written last, so it holds the member link
        fs::remove_file(&second_sheet).unwrap();
        let second = scanner.scan(temp.path()).unwrap();
        assert_eq!(second.repromoted, 1);
        assert_eq!(second.images_added, 0);

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.ends_with("a.cue"));
        let owner = store.owner_of(&entries[0].members[0]).unwrap().unwrap();
        assert_eq!(owner.path, entries[0].path);
    }

    #[test]
    fn test_new_container_absorbs_loose_image() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("saga.bin"), "").unwrap();

        let store = MemoryCatalogStore::new();
        let scanner = CatalogScanner::new(&store, &StemExtractor, &SilentProgress);
        scanner.scan(temp.path()).unwrap();
        assert_eq!(store.entry_count(), 1);

        fs::write(temp.path().join("saga.cue"), "").unwrap();
        let report = scanner.scan(temp.path()).unwrap();
        assert_eq!(report.absorbed, 1);
        assert_eq!(store.entry_count(), 1);
        let entries = store.entries().unwrap();
        assert!(matches!(entries[0].format, DiscFormat::Container(ContainerFormat::Cue)));
    }

    #[test]
    fn test_known_status_is_attached_on_catalog() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Panzer Dragoon Saga.iso"),
            header_bytes("MK-81307", "U", "PANZER DRAGOON SAGA"),
        )
        .unwrap();

        let store = MemoryCatalogStore::new();
        store
            .put_status(&RemoteStatus {
                product_number: "MK-81307".to_string(),
                image_url: "https://img.example/pds.png".to_string(),
                rating: 5,
                update_at: chrono::NaiveDateTime::default(),
            })
            .unwrap();

        CatalogScanner::new(&store, &HeaderExtractor::new(), &SilentProgress)
            .scan(temp.path())
            .unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "PANZER DRAGOON SAGA");
        assert_eq!(entries[0].rating, Some(5));
        assert_eq!(entries[0].regions, vec![crate::store::Region::NorthAmerica]);
        assert!(entries[0].cataloged_at.is_some());
    }
}
