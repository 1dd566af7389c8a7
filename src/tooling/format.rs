//! Format build reports, catalog listings and layout details as text.

use crate::builder::BuildReport;
use crate::layout::{StorageLayout, Subdir};
use crate::scan::ScanReport;
use crate::store::GameEntry;
use crate::sync::SyncReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn scan_status(scan: &ScanReport) -> String {
    if scan.skipped {
        format!("{}", "missing".yellow())
    } else {
        format!("{}", "ok".green())
    }
}

pub fn format_sync_report(report: &SyncReport) -> String {
    format!(
        "  Cursor: {}\n  Received: {}\n  Applied: {}\n  Skipped: {}\n  Entries refreshed: {}\n",
        report.cursor, report.received, report.applied, report.skipped, report.entries_refreshed
    )
}

pub fn format_build_report(report: &BuildReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Catalog build ({})", report.level))
    ));

    out.push_str(&format!("{}\n", format_section_heading("Status sync")));
    match (&report.sync, &report.sync_error) {
        (Some(sync), _) => out.push_str(&format_sync_report(sync)),
        (None, Some(error)) => out.push_str(&format!("  {} {}\n", "failed:".red(), error)),
        (None, None) => out.push_str("  not run\n"),
    }
    out.push('\n');

    if report.aborted {
        out.push_str("Build aborted: status sync failed and refresh level is status-only.\n");
        return out;
    }
    if report.cleared {
        out.push_str("Existing catalog entries cleared.\n\n");
    }

    out.push_str(&format!("{}\n\n", format_section_heading("Roots")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Root", "Containers", "Images", "Misses", "Status"]);
    for scan in &report.scans {
        table.add_row(vec![
            scan.root.display().to_string(),
            scan.containers_added.to_string(),
            scan.images_added.to_string(),
            scan.misses.to_string(),
            scan_status(scan),
        ]);
    }
    for failure in &report.failures {
        table.add_row(vec![
            failure.root.display().to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            format!("{}", "failed".red()),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    for failure in &report.failures {
        out.push_str(&format!("  {}: {}\n", failure.root.display(), failure.error));
    }
    out.push_str(&format!("Titles added: {}\n", report.titles_added()));
    out
}

pub fn format_entries_text(entries: &[GameEntry]) -> String {
    if entries.is_empty() {
        return "Catalog is empty. Run 'discdex build' to scan the game directories.\n".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Title", "Product", "Format", "Regions", "Rating", "Path"]);
    for entry in entries {
        let regions: String = entry.regions.iter().map(|r| r.symbol()).collect();
        table.add_row(vec![
            entry.title.clone(),
            entry.product_number.clone().unwrap_or_else(|| "-".to_string()),
            entry.format.to_string(),
            if regions.is_empty() { "-".to_string() } else { regions },
            entry
                .rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.path.display().to_string(),
        ]);
    }
    format!("{}\n{} titles\n", table, entries.len())
}

pub fn format_entries_json(entries: &[GameEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

pub fn format_roots(roots: &[String], persisted: Option<&str>) -> String {
    let mut out = format!("{}\n", format_section_heading("Scan roots"));
    for (index, root) in roots.iter().enumerate() {
        let exists = std::path::Path::new(root).is_dir();
        let marker = if exists {
            format!("{}", "ok".green())
        } else {
            format!("{}", "missing".yellow())
        };
        out.push_str(&format!("  {}. {} [{}]\n", index + 1, root, marker));
    }
    match persisted {
        Some(value) => out.push_str(&format!("\nPersisted: {}\n", value)),
        None => out.push_str("\nPersisted: (not configured)\n"),
    }
    out
}

pub fn format_layout(layout: &StorageLayout, bios: &[String], memory: &[String]) -> String {
    let mut out = format!("{}\n", format_section_heading("Storage layout"));
    out.push_str(&format!("  Root: {}\n", layout.root().display()));
    for subdir in Subdir::all() {
        let path = layout.subdir(*subdir);
        let state = if path.is_dir() { "" } else { " (not created)" };
        out.push_str(&format!("  {:<12} {}{}\n", subdir.as_str(), path.display(), state));
    }
    match layout.external_games_path() {
        Some(external) => out.push_str(&format!("  {:<12} {}\n", "external", external)),
        None => out.push_str(&format!("  {:<12} -\n", "external")),
    }
    out.push_str(&format!("\n  BIOS images: {}\n", list_or_none(bios)));
    out.push_str(&format!("  Backup memory: {}\n", list_or_none(memory)));
    out
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
