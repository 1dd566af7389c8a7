use discdex::error::SyncError;
use discdex::extract::HeaderExtractor;
use discdex::progress::ProgressSink;
use discdex::store::{MemoryCatalogStore, MemoryPreferenceStore};
use discdex::sync::{MalformedPolicy, StatusSource};
use discdex::{CatalogContext, StorageLayout};
use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A 2048-byte cooked sector carrying a disc system header.
pub fn header_bytes(product: &str, area: &str, title: &str) -> Vec<u8> {
    let mut buf = vec![b' '; 0x100];
    buf[..16].copy_from_slice(b"SEGA SEGASATURN ");
    let mut put = |offset: usize, len: usize, text: &str| {
        let bytes = text.as_bytes();
        let n = bytes.len().min(len);
        buf[offset..offset + n].copy_from_slice(&bytes[..n]);
    };
    put(0x10, 0x10, "SEGA ENTERPRISES");
    put(0x20, 0x0A, product);
    put(0x2A, 0x06, "V1.000");
    put(0x30, 0x08, "19970101");
    put(0x40, 0x10, area);
    put(0x60, 0x70, title);
    buf.resize(2048, 0);
    buf
}

/// Write `name.cue` + `name.bin` into `dir`.
pub fn write_cue_game(dir: &Path, name: &str, product: &str, title: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{}.bin", name)), header_bytes(product, "JU", title)).unwrap();
    fs::write(
        dir.join(format!("{}.cue", name)),
        format!("FILE \"{}.bin\" BINARY\n  TRACK 01 MODE1/2048\n    INDEX 01 00:00:00\n", name),
    )
    .unwrap();
}

/// Write a standalone ISO into `dir`.
pub fn write_iso_game(dir: &Path, name: &str, product: &str, title: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{}.iso", name)), header_bytes(product, "E", title)).unwrap();
}

/// Serves a fixed payload, or fails when none is set.
pub struct ScriptedSource {
    payload: Mutex<Option<String>>,
    pub cursors: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn serving(payload: &str) -> Self {
        Self {
            payload: Mutex::new(Some(payload.to_string())),
            cursors: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            payload: Mutex::new(None),
            cursors: Mutex::new(Vec::new()),
        }
    }

    pub fn set_payload(&self, payload: Option<&str>) {
        *self.payload.lock() = payload.map(str::to_string);
    }
}

impl StatusSource for ScriptedSource {
    fn fetch_since(&self, cursor: &str) -> Result<String, SyncError> {
        self.cursors.lock().push(cursor.to_string());
        self.payload
            .lock()
            .clone()
            .ok_or(SyncError::RemoteRejected(503))
    }
}

/// Collects progress titles.
#[derive(Default)]
pub struct RecordingProgress {
    pub titles: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingProgress {
    fn on_title_cataloged(&self, title: &str) {
        self.titles.lock().push(title.to_string());
    }
}

pub struct Harness {
    pub context: CatalogContext,
    pub store: Arc<MemoryCatalogStore>,
    pub source: Arc<ScriptedSource>,
    pub progress: Arc<RecordingProgress>,
}

pub fn harness(storage_root: &Path, source: ScriptedSource) -> Harness {
    let store = Arc::new(MemoryCatalogStore::new());
    let source = Arc::new(source);
    let progress = Arc::new(RecordingProgress::default());
    let context = CatalogContext {
        layout: StorageLayout::resolve(storage_root),
        store: store.clone(),
        preferences: Arc::new(MemoryPreferenceStore::new()),
        extractor: Arc::new(HeaderExtractor::new()),
        status_source: source.clone(),
        malformed_policy: MalformedPolicy::Abort,
        progress: progress.clone(),
    };
    Harness {
        context,
        store,
        source,
        progress,
    }
}

pub const STATUS_PAYLOAD: &str = r#"[
    {"product_number": "GS-9046", "image_url": "https://img.example/nights.png",
     "updated_at": "2023-11-02T10:15:00+09:00", "rating": 4},
    {"product_number": "MK-81307", "image_url": "https://img.example/pds.png",
     "updated_at": "2024-01-20T08:00:00", "rating": 5}
]"#;
