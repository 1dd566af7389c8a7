//! Global config file source: `$XDG_CONFIG_HOME/discdex/config.toml`, optional.

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

/// Add the global config file to builder if its location can be determined.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Ok(path) = xdg::global_config_file() else {
        return Ok(builder);
    };
    let Some(path) = path.to_str() else {
        return Ok(builder);
    };
    Ok(builder.add_source(
        File::new(path, FileFormat::Toml).required(false),
    ))
}
