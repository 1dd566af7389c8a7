//! Error types
//!
//! Each layer owns a `thiserror` enum. `ApiError` is the seam the CLI and the
//! catalog builder surface to callers.

use std::path::PathBuf;
use thiserror::Error;

/// Catalog and preference store failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Failed to encode or decode record: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

/// Storage layout failures, raised by the accessor that needed the directory.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list directory {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Remote status synchronization failures. None of these touch the catalog.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote rejected status request with HTTP {0}")]
    RemoteRejected(u16),

    #[error("Malformed status payload: {0}")]
    MalformedPayload(String),

    #[error("Storage error during sync: {0}")]
    Storage(#[from] StorageError),
}

/// Failure scanning a single root.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Storage error while scanning {}: {source}", .root.display())]
    Storage {
        root: PathBuf,
        #[source]
        source: StorageError,
    },
}

/// Top-level error surfaced to the CLI and other callers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
