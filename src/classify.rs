//! File classification
//!
//! Decides from a file name alone whether a file is a catalog candidate, and
//! if so whether it is a container (a sheet that names other files as tracks)
//! or a standalone image. Matching is case-insensitive and never touches disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Disc description formats that reference other files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Cue,
    Mds,
    Ccd,
    Chd,
}

/// Disc image formats usable without a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Bin,
    Iso,
    Img,
}

/// Classification of a single file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Container(ContainerFormat),
    Direct(ImageFormat),
    Ignored,
}

/// Format tag stored on catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscFormat {
    Container(ContainerFormat),
    Direct(ImageFormat),
}

impl ContainerFormat {
    pub fn all() -> &'static [ContainerFormat] {
        &[
            ContainerFormat::Cue,
            ContainerFormat::Mds,
            ContainerFormat::Ccd,
            ContainerFormat::Chd,
        ]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Cue => "cue",
            ContainerFormat::Mds => "mds",
            ContainerFormat::Ccd => "ccd",
            ContainerFormat::Chd => "chd",
        }
    }

    /// Parse from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|format| ext.eq_ignore_ascii_case(format.extension()))
    }
}

impl ImageFormat {
    pub fn all() -> &'static [ImageFormat] {
        &[ImageFormat::Bin, ImageFormat::Iso, ImageFormat::Img]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Bin => "bin",
            ImageFormat::Iso => "iso",
            ImageFormat::Img => "img",
        }
    }

    /// Parse from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|format| ext.eq_ignore_ascii_case(format.extension()))
    }
}

impl FileKind {
    pub fn is_candidate(&self) -> bool {
        !matches!(self, FileKind::Ignored)
    }
}

impl fmt::Display for DiscFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscFormat::Container(format) => write!(f, "{}", format.extension()),
            DiscFormat::Direct(format) => write!(f, "{}", format.extension()),
        }
    }
}

/// Text after the last `.` of the final path component, if any.
fn extension_of(filename: &str) -> Option<&str> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Classify a file name by its extension.
pub fn classify(filename: &str) -> FileKind {
    let Some(ext) = extension_of(filename) else {
        return FileKind::Ignored;
    };
    if let Some(format) = ContainerFormat::from_extension(ext) {
        return FileKind::Container(format);
    }
    if let Some(format) = ImageFormat::from_extension(ext) {
        return FileKind::Direct(format);
    }
    FileKind::Ignored
}

/// Classify a path by its file name.
pub fn classify_path(path: &Path) -> FileKind {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => classify(name),
        None => FileKind::Ignored,
    }
}

/// Walk filter: true for any container or direct image.
pub fn is_candidate(filename: &str) -> bool {
    classify(filename).is_candidate()
}

/// BIOS dumps: `.bin` and `.rom`.
pub fn is_bios_file(filename: &str) -> bool {
    matches!(extension_of(filename), Some(ext) if ext.eq_ignore_ascii_case("bin") || ext.eq_ignore_ascii_case("rom"))
}

/// Backup memory images: `.ram`.
pub fn is_memory_file(filename: &str) -> bool {
    matches!(extension_of(filename), Some(ext) if ext.eq_ignore_ascii_case("ram"))
}
