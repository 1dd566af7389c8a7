//! Configuration
//!
//! Layered with the `config` crate. Precedence, lowest first: built-in
//! defaults, `$XDG_CONFIG_HOME/discdex/config.toml`, an explicit `--config`
//! file, `DISCDEX__SECTION__KEY` environment variables.

pub mod facade;
pub mod remote;

pub mod merge {
    pub mod policy;
    pub mod service;
}

pub mod paths {
    pub mod xdg_root;
}

pub mod sources {
    pub mod environment;
    pub mod global_file;
}

pub mod storage {
    pub mod paths;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use remote::RemoteConfig;
pub use storage::paths::StorageConfig;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscdexConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DiscdexConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
