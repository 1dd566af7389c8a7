//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::DiscdexConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, optionally with an explicit `--config` file.
    pub fn load(explicit: Option<&Path>) -> Result<DiscdexConfig, ConfigError> {
        match explicit {
            Some(path) => MergeService::load_with_file(path),
            None => MergeService::load(),
        }
    }

    /// Load configuration from a specific file over the defaults only.
    pub fn load_from_file(path: &Path) -> Result<DiscdexConfig, ConfigError> {
        let path = path.to_str().ok_or_else(|| {
            ConfigError::Message(format!("Config path is not valid UTF-8: {}", path.display()))
        })?;
        super::merge::policy::builder_with_defaults()?
            .add_source(config::File::new(path, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
