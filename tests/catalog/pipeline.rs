use crate::support::{harness, write_cue_game, write_iso_game, ScriptedSource, STATUS_PAYLOAD};
use discdex::classify::{ContainerFormat, DiscFormat, ImageFormat};
use discdex::roots::GAME_DIRECTORIES_KEY;
use discdex::{CatalogBuilder, CatalogStore, GameEntry, PreferenceStore, RefreshLevel};
use std::fs;
use tempfile::TempDir;

fn by_title(entries: Vec<GameEntry>, title: &str) -> GameEntry {
    entries
        .into_iter()
        .find(|e| e.title == title)
        .unwrap_or_else(|| panic!("no entry titled {}", title))
}

#[test]
fn rebuild_catalogs_default_and_external_roots() {
    let temp = TempDir::new().unwrap();
    let mut h = harness(&temp.path().join("discdex"), ScriptedSource::serving(STATUS_PAYLOAD));
    let external = temp.path().join("card");
    h.context.layout.set_external_root(Some(external.clone()));

    let games = h.context.layout.subdir(discdex::layout::Subdir::Games);
    write_cue_game(&games, "nights", "GS-9046", "NiGHTS into Dreams...");
    write_iso_game(&games, "burning", "GS-9174", "BURNING RANGERS");
    write_cue_game(&external.join("rpg"), "pds", "MK-81307", "PANZER DRAGOON SAGA");

    let report = CatalogBuilder::new(&h.context)
        .build(RefreshLevel::Rebuild)
        .unwrap();

    assert_eq!(report.roots.len(), 2);
    assert_eq!(report.titles_added(), 3);
    assert_eq!(h.store.entry_count(), 3);

    // Only container-backed titles report progress, default root first
    assert_eq!(
        *h.progress.titles.lock(),
        vec!["NiGHTS into Dreams...", "PANZER DRAGOON SAGA"]
    );

    let entries = h.store.entries().unwrap();
    let nights = by_title(entries.clone(), "NiGHTS into Dreams...");
    assert_eq!(nights.format, DiscFormat::Container(ContainerFormat::Cue));
    assert_eq!(nights.rating, Some(4));
    assert_eq!(nights.members.len(), 1);
    let burning = by_title(entries.clone(), "BURNING RANGERS");
    assert_eq!(burning.format, DiscFormat::Direct(ImageFormat::Iso));
    assert_eq!(burning.rating, None);
    let pds = by_title(entries, "PANZER DRAGOON SAGA");
    assert_eq!(pds.image_url.as_deref(), Some("https://img.example/pds.png"));

    let saved = h.context.preferences.get(GAME_DIRECTORIES_KEY).unwrap().unwrap();
    assert_eq!(saved, report.roots.join(";"));
}

#[test]
fn unchanged_rescan_adds_nothing_and_advances_cursor() {
    let temp = TempDir::new().unwrap();
    let h = harness(&temp.path().join("discdex"), ScriptedSource::serving(STATUS_PAYLOAD));
    let games = h.context.layout.subdir(discdex::layout::Subdir::Games);
    write_cue_game(&games, "nights", "GS-9046", "NiGHTS into Dreams...");
    write_iso_game(&games, "burning", "GS-9174", "BURNING RANGERS");

    let builder = CatalogBuilder::new(&h.context);
    builder.build(RefreshLevel::Rebuild).unwrap();
    let before = h.store.entries().unwrap();
    h.progress.titles.lock().clear();

    let report = builder.build(RefreshLevel::StatusOnly).unwrap();
    assert_eq!(report.titles_added(), 0);
    assert!(h.progress.titles.lock().is_empty());
    assert_eq!(h.store.entries().unwrap(), before);

    let cursors = h.source.cursors.lock().clone();
    assert_eq!(cursors, vec!["20010101", "2024/01/20T08:00:00"]);
}

#[test]
fn status_only_aborts_when_sync_fails() {
    let temp = TempDir::new().unwrap();
    let h = harness(&temp.path().join("discdex"), ScriptedSource::failing());
    let games = h.context.layout.subdir(discdex::layout::Subdir::Games);
    write_iso_game(&games, "burning", "GS-9174", "BURNING RANGERS");

    let report = CatalogBuilder::new(&h.context)
        .build(RefreshLevel::StatusOnly)
        .unwrap();
    assert!(report.aborted);
    assert!(report.scans.is_empty());
    assert_eq!(h.store.entry_count(), 0);
}

#[test]
fn rebuild_proceeds_when_sync_fails() {
    let temp = TempDir::new().unwrap();
    let h = harness(&temp.path().join("discdex"), ScriptedSource::serving(STATUS_PAYLOAD));
    let games = h.context.layout.subdir(discdex::layout::Subdir::Games);
    write_iso_game(&games, "burning", "GS-9174", "BURNING RANGERS");

    let builder = CatalogBuilder::new(&h.context);
    builder.build(RefreshLevel::Rebuild).unwrap();
    fs::remove_file(games.join("burning.iso")).unwrap();
    write_iso_game(&games, "sega_rally", "GS-9024", "SEGA RALLY CHAMPIONSHIP");

    h.source.set_payload(None);
    let report = builder.build(RefreshLevel::Rebuild).unwrap();
    assert!(report.sync_error.is_some());
    assert!(report.cleared);

    let titles: Vec<String> = h.store.entries().unwrap().into_iter().map(|e| e.title).collect();
    assert_eq!(titles, vec!["SEGA RALLY CHAMPIONSHIP"]);
    // Statuses survive a rebuild
    assert_eq!(h.store.statuses().unwrap().len(), 2);
}

#[test]
fn deleted_sheet_releases_its_track() {
    let temp = TempDir::new().unwrap();
    let h = harness(&temp.path().join("discdex"), ScriptedSource::serving("[]"));
    let games = h.context.layout.subdir(discdex::layout::Subdir::Games);
    write_cue_game(&games, "nights", "GS-9046", "NiGHTS into Dreams...");

    let builder = CatalogBuilder::new(&h.context);
    builder.build(RefreshLevel::Rebuild).unwrap();
    assert_eq!(h.store.entry_count(), 1);

    fs::remove_file(games.join("nights.cue")).unwrap();
    let report = builder.build(RefreshLevel::StatusOnly).unwrap();
    assert_eq!(report.scans[0].repromoted, 1);

    let entries = h.store.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].format, DiscFormat::Direct(ImageFormat::Bin));
    assert_eq!(entries[0].title, "NiGHTS into Dreams...");
}

#[test]
fn persisted_user_roots_are_kept_and_missing_ones_skipped() {
    let temp = TempDir::new().unwrap();
    let h = harness(&temp.path().join("discdex"), ScriptedSource::serving("[]"));
    let library = temp.path().join("library");
    write_iso_game(&library, "burning", "GS-9174", "BURNING RANGERS");
    let unmounted = temp.path().join("unmounted");

    let persisted = format!("{};{}", library.display(), unmounted.display());
    h.context
        .preferences
        .set(GAME_DIRECTORIES_KEY, &persisted)
        .unwrap();

    let report = CatalogBuilder::new(&h.context)
        .build(RefreshLevel::Rebuild)
        .unwrap();

    assert_eq!(report.roots.len(), 3);
    assert_eq!(report.roots[0], library.display().to_string());
    assert!(report.scans[1].skipped);
    assert!(report.failures.is_empty());
    assert_eq!(h.store.entry_count(), 1);

    let saved = h.context.preferences.get(GAME_DIRECTORIES_KEY).unwrap().unwrap();
    assert!(saved.starts_with(&persisted));
}
