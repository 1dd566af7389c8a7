use crate::support::header_bytes;
use discdex::classify::{DiscFormat, ImageFormat};
use discdex::config::{DiscdexConfig, RemoteConfig, StorageConfig};
use discdex::tooling::cli::{CliContext, Commands, LayoutCommands, RootsCommands};
use discdex::{CatalogStore, GameEntry};
use std::fs;
use tempfile::TempDir;

fn cli(temp: &TempDir) -> CliContext {
    let config = DiscdexConfig {
        storage: StorageConfig {
            root: Some(temp.path().join("storage")),
            store_path: Some(temp.path().join("catalog")),
            ..StorageConfig::default()
        },
        remote: RemoteConfig {
            base_url: "http://127.0.0.1:9/api/games".to_string(),
            timeout_secs: 2,
            ..RemoteConfig::default()
        },
        ..DiscdexConfig::default()
    };
    CliContext::from_config(config).unwrap()
}

#[test]
fn list_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let ctx = cli(&temp);
    let entry = GameEntry::new(
        temp.path().join("storage/games/burning.iso"),
        "Burning Rangers",
        DiscFormat::Direct(ImageFormat::Iso),
    )
    .with_product_number("GS-9174");
    ctx.catalog().store.put_entry(&entry).unwrap();

    let output = ctx
        .execute(&Commands::List {
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    let first = &entries[0];
    assert_eq!(first.get("title").and_then(|v| v.as_str()), Some("Burning Rangers"));
    assert_eq!(first.get("product_number").and_then(|v| v.as_str()), Some("GS-9174"));
    assert!(first.get("path").and_then(|v| v.as_str()).is_some());
    assert!(first.get("format").is_some());
    assert!(first.get("regions").and_then(|v| v.as_array()).is_some());
}

#[test]
fn list_rejects_unknown_format() {
    let temp = TempDir::new().unwrap();
    let ctx = cli(&temp);
    assert!(ctx
        .execute(&Commands::List {
            format: "yaml".to_string(),
        })
        .is_err());
}

#[test]
fn rebuild_through_cli_scans_without_remote() {
    let temp = TempDir::new().unwrap();
    let ctx = cli(&temp);
    let games = temp.path().join("storage").join("games");
    fs::create_dir_all(&games).unwrap();
    fs::write(games.join("rally.iso"), header_bytes("GS-9024", "JUE", "SEGA RALLY")).unwrap();

    let output = ctx
        .execute(&Commands::Build {
            level: discdex::RefreshLevel::Rebuild,
            progress: false,
        })
        .unwrap();
    assert!(output.contains("Titles added: 1"));
    assert!(output.contains("failed"));

    let listing = ctx
        .execute(&Commands::List {
            format: "text".to_string(),
        })
        .unwrap();
    assert!(listing.contains("SEGA RALLY"));
}

#[test]
fn layout_show_lists_bios_and_memory_files() {
    let temp = TempDir::new().unwrap();
    let ctx = cli(&temp);
    ctx.execute(&Commands::Layout {
        command: LayoutCommands::Init,
    })
    .unwrap();
    let storage = temp.path().join("storage");
    fs::write(storage.join("bios").join("sega_101.bin"), b"bios").unwrap();
    fs::write(storage.join("memory").join("backup.ram"), b"ram").unwrap();

    let output = ctx
        .execute(&Commands::Layout {
            command: LayoutCommands::Show,
        })
        .unwrap();
    assert!(output.contains("sega_101.bin"));
    assert!(output.contains("backup.ram"));
    assert!(output.contains("screenshots"));
}

#[test]
fn roots_list_shows_default_games_root() {
    let temp = TempDir::new().unwrap();
    let ctx = cli(&temp);
    let output = ctx
        .execute(&Commands::Roots {
            command: RootsCommands::List,
        })
        .unwrap();
    assert!(output.contains("not configured"));
    assert!(output.contains(&temp.path().join("storage").join("games").display().to_string()));
}
