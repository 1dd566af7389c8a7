//! discdex: Disc Image Game Catalog
//!
//! Builds a searchable catalog of disc-image games from one or more scan
//! roots. Container formats (CUE, MDS, CCD, CHD) are cataloged before loose
//! images so a data track owned by a sheet never shows up twice, and per-title
//! status (rating, cover image) is pulled incrementally from a remote service.

pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod logging;
pub mod progress;
pub mod roots;
pub mod scan;
pub mod store;
pub mod sync;
pub mod tooling;
pub mod types;

pub use builder::{BuildReport, CatalogBuilder, CatalogContext, RefreshLevel};
pub use error::ApiError;
pub use layout::StorageLayout;
pub use scan::{CatalogScanner, ScanReport};
pub use store::{CatalogStore, GameEntry, PreferenceStore, RemoteStatus};
pub use sync::{StatusSource, StatusSyncer, SyncReport};
