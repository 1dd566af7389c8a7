//! Scan root resolution
//!
//! Merges the persisted, semicolon-joined list of user scan roots with the
//! built-in games directory and the optional external root. Deduplication is
//! by exact string equality and keeps first occurrences in order.

use std::collections::HashSet;

/// Preference key holding the semicolon-joined scan roots.
pub const GAME_DIRECTORIES_KEY: &str = "game_directories";

/// Value stored when the roots have never been configured.
pub const UNCONFIGURED_SENTINEL: &str = "err";

const SEPARATOR: &str = ";";

/// Result of merging persisted and built-in roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootResolution {
    /// Roots to scan, in order
    pub roots: Vec<String>,
    /// New value to persist, if it differs from what was stored
    pub updated: Option<String>,
}

/// Split a persisted value, dropping trailing empty segments.
pub fn split_persisted(value: &str) -> Vec<String> {
    let mut parts: Vec<String> = value.split(SEPARATOR).map(str::to_string).collect();
    while parts.last().map(|p| p.is_empty()).unwrap_or(false) {
        parts.pop();
    }
    parts
}

pub fn join_roots(roots: &[String]) -> String {
    roots.join(SEPARATOR)
}

fn is_configured(persisted: Option<&str>) -> Option<&str> {
    persisted.filter(|value| *value != UNCONFIGURED_SENTINEL)
}

fn dedup_preserving_order(roots: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter(|root| seen.insert(root.clone()))
        .collect()
}

/// Merge the persisted roots with the built-in and external roots.
pub fn resolve(
    persisted: Option<&str>,
    default_game_dir: &str,
    external_root: Option<&str>,
) -> RootResolution {
    let Some(value) = is_configured(persisted) else {
        let mut roots = vec![default_game_dir.to_string()];
        if let Some(external) = external_root {
            roots.push(external.to_string());
        }
        let roots = dedup_preserving_order(roots);
        let updated = Some(join_roots(&roots));
        return RootResolution { roots, updated };
    };

    let stored = split_persisted(value);
    let mut merged = stored.clone();
    merged.push(default_game_dir.to_string());
    if let Some(external) = external_root {
        merged.push(external.to_string());
    }
    let roots = dedup_preserving_order(merged);

    let updated = if roots != stored {
        Some(join_roots(&roots))
    } else {
        None
    };
    RootResolution { roots, updated }
}

/// Append `root` to a persisted value unless already present.
pub fn add_root(persisted: Option<&str>, root: &str) -> String {
    let mut roots = is_configured(persisted)
        .map(split_persisted)
        .unwrap_or_default();
    roots.push(root.to_string());
    join_roots(&dedup_preserving_order(roots))
}

/// Remove every occurrence of `root` from a persisted value.
pub fn remove_root(persisted: Option<&str>, root: &str) -> String {
    let roots: Vec<String> = is_configured(persisted)
        .map(split_persisted)
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r != root)
        .collect();
    join_roots(&roots)
}
