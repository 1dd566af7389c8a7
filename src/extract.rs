//! Metadata extraction
//!
//! Extractors turn a candidate file into a catalog entry, or report a miss.
//! A miss means "not a usable game image" and is never an error.
//!
//! `HeaderExtractor` is the default implementation: it resolves the data files
//! a container refers to and reads the system header at the start of the
//! first data track for the product number and title.

use crate::classify::{ContainerFormat, DiscFormat, ImageFormat};
use crate::store::GameEntry;
use crate::types::normalize_path;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Turns candidate files into catalog entries
pub trait MetadataExtractor: Send + Sync {
    fn from_container(&self, path: &Path, format: ContainerFormat) -> Option<GameEntry>;
    fn from_image(&self, path: &Path, format: ImageFormat) -> Option<GameEntry>;
}

const HEADER_MAGIC: &[u8; 16] = b"SEGA SEGASATURN ";
const HEADER_LEN: usize = 0x100;
/// Raw 2352-byte sectors carry 12 sync bytes and a 4 byte sector header.
const RAW_SECTOR_PREFIX: usize = 0x10;

/// Fields decoded from a disc system header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscHeader {
    pub maker: String,
    pub product_number: String,
    pub version: String,
    pub release_date: String,
    pub area: String,
    pub title: String,
}

fn field(buf: &[u8], start: usize, len: usize) -> String {
    String::from_utf8_lossy(&buf[start..start + len])
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

impl DiscHeader {
    /// Decode a header starting at `buf[0]`.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN || &buf[..HEADER_MAGIC.len()] != HEADER_MAGIC {
            return None;
        }
        Some(Self {
            maker: field(buf, 0x10, 0x10),
            product_number: field(buf, 0x20, 0x0A),
            version: field(buf, 0x2A, 0x06),
            release_date: field(buf, 0x30, 0x08),
            area: field(buf, 0x40, 0x10),
            title: field(buf, 0x60, 0x70),
        })
    }

    /// Read the header from the start of a data track, cooked or raw.
    pub fn probe(path: &Path) -> Option<Self> {
        let mut file = File::open(path).ok()?;
        let mut buf = vec![0u8; RAW_SECTOR_PREFIX + HEADER_LEN];
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(_) => return None,
            }
        }
        buf.truncate(filled);
        Self::parse(&buf).or_else(|| buf.get(RAW_SECTOR_PREFIX..).and_then(Self::parse))
    }

    fn apply(self, entry: &mut GameEntry) {
        if !self.title.is_empty() {
            entry.title = self.title;
        }
        entry.product_number = Some(self.product_number).filter(|p| !p.is_empty());
        entry.maker = Some(self.maker).filter(|m| !m.is_empty());
        entry.version = Some(self.version).filter(|v| !v.is_empty());
        entry.release_date = Some(self.release_date).filter(|d| !d.is_empty());
        entry.area = Some(self.area).filter(|a| !a.is_empty());
    }
}

/// File names referenced by `FILE` lines in a CUE sheet.
pub fn cue_file_references(sheet: &str) -> Vec<String> {
    let mut files = Vec::new();
    for line in sheet.lines() {
        let line = line.trim();
        let Some(keyword) = line.get(..4) else {
            continue;
        };
        if !keyword.eq_ignore_ascii_case("FILE") {
            continue;
        }
        let rest = line[4..].trim_start();
        if rest.len() == line.len() - 4 {
            // No whitespace after the keyword (e.g. FILENAME)
            continue;
        }
        let name = if let Some(quoted) = rest.strip_prefix('"') {
            match quoted.split_once('"') {
                Some((name, _)) => name,
                None => continue,
            }
        } else {
            // Unquoted: everything before the trailing file type token
            match rest.rsplit_once(char::is_whitespace) {
                Some((name, _)) => name.trim_end(),
                None => rest,
            }
        };
        if !name.is_empty() {
            files.push(name.to_string());
        }
    }
    files
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Default extractor
#[derive(Debug, Default, Clone)]
pub struct HeaderExtractor;

impl HeaderExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Data files a container refers to, resolved against the container's
    /// directory.
    fn container_members(path: &Path, format: ContainerFormat) -> Option<Vec<PathBuf>> {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        match format {
            ContainerFormat::Cue => {
                let sheet = std::fs::read(path).ok()?;
                let sheet = String::from_utf8_lossy(&sheet);
                Some(
                    cue_file_references(&sheet)
                        .into_iter()
                        .map(|name| normalize_path(&dir.join(name)))
                        .collect(),
                )
            }
            ContainerFormat::Mds => Some(vec![path.with_extension("mdf")]),
            ContainerFormat::Ccd => {
                let mut members = vec![path.with_extension("img")];
                let sub = path.with_extension("sub");
                if sub.exists() {
                    members.push(sub);
                }
                Some(members)
            }
            ContainerFormat::Chd => Some(Vec::new()),
        }
    }
}

impl MetadataExtractor for HeaderExtractor {
    fn from_container(&self, path: &Path, format: ContainerFormat) -> Option<GameEntry> {
        if !path.is_file() {
            return None;
        }
        let members = Self::container_members(path, format)?;
        if format != ContainerFormat::Chd {
            // A sheet without its first data track is incomplete
            let data_track = members.first()?;
            if !data_track.is_file() {
                tracing::debug!(
                    "Container {} is missing data track {}",
                    path.display(),
                    data_track.display()
                );
                return None;
            }
        }

        let mut entry = GameEntry::new(
            path.to_path_buf(),
            file_stem(path),
            DiscFormat::Container(format),
        );
        if let Some(header) = members.first().and_then(|track| DiscHeader::probe(track)) {
            header.apply(&mut entry);
        }
        Some(entry.with_members(members))
    }

    fn from_image(&self, path: &Path, format: ImageFormat) -> Option<GameEntry> {
        let header = DiscHeader::probe(path)?;
        let mut entry = GameEntry::new(path.to_path_buf(), file_stem(path), DiscFormat::Direct(format));
        header.apply(&mut entry);
        Some(entry)
    }
}
