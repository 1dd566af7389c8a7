use crate::support::{write_cue_game, ScriptedSource, STATUS_PAYLOAD};
use discdex::extract::HeaderExtractor;
use discdex::progress::SilentProgress;
use discdex::store::{SledCatalogStore, SledPreferenceStore};
use discdex::sync::MalformedPolicy;
use discdex::{CatalogBuilder, CatalogContext, CatalogStore, RefreshLevel, StorageLayout};
use std::sync::Arc;
use tempfile::TempDir;

fn sled_context(temp: &TempDir, source: ScriptedSource) -> CatalogContext {
    let db = sled::open(temp.path().join("catalog")).unwrap();
    CatalogContext {
        layout: StorageLayout::resolve(temp.path().join("discdex")),
        store: Arc::new(SledCatalogStore::from_db(db.clone()).unwrap()),
        preferences: Arc::new(SledPreferenceStore::from_db(&db).unwrap()),
        extractor: Arc::new(HeaderExtractor::new()),
        status_source: Arc::new(source),
        malformed_policy: MalformedPolicy::Abort,
        progress: Arc::new(SilentProgress),
    }
}

#[test]
fn catalog_and_cursor_survive_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let context = sled_context(&temp, ScriptedSource::serving(STATUS_PAYLOAD));
        let games = context.layout.subdir(discdex::layout::Subdir::Games);
        write_cue_game(&games, "nights", "GS-9046", "NiGHTS into Dreams...");
        CatalogBuilder::new(&context)
            .build(RefreshLevel::Rebuild)
            .unwrap();
    }

    let source = ScriptedSource::serving("[]");
    let context = sled_context(&temp, source);
    let entries = context.store.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].rating, Some(4));
    assert_eq!(context.store.statuses().unwrap().len(), 2);

    // Member lookup is persisted too, so the track is not cataloged again
    let report = CatalogBuilder::new(&context)
        .build(RefreshLevel::StatusOnly)
        .unwrap();
    assert_eq!(report.titles_added(), 0);
    assert_eq!(report.sync.unwrap().cursor, "2024/01/20T08:00:00");
}
