//! Core types for the disc catalog.

use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// PathKey: NFC-normalized absolute path string used to index catalog entries
pub type PathKey = String;

/// ProductNumber: stable remote catalog identifier printed in the disc header
pub type ProductNumber = String;

/// Build the store key for a filesystem path.
///
/// Removable media mounted from other systems may present decomposed Unicode
/// names, so keys are normalized to NFC before comparison.
pub fn path_key(path: &Path) -> PathKey {
    path.to_string_lossy().nfc().collect()
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Member paths written in container sheets are joined onto the container's
/// directory and must compare equal to the clean paths the walker yields.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
