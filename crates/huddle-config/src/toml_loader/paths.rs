//! Config path resolution and default file creation.

use std::path::{Path, PathBuf};

use huddle_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Environment variable that overrides the default config location.
pub const CONFIG_PATH_ENV: &str = "HUDDLE_CONFIG";

const APP_DIR: &str = "huddle";

/// Where the config lives: `$HUDDLE_CONFIG` if set, otherwise
/// `<config_dir>/huddle/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join(APP_DIR).join("config.toml"))
}

/// Write the documented default config to `path`, creating parent
/// directories. An existing file is left untouched.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, default_config_toml()).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}
