//! Core TOML config loading: read from a path or the platform default.

use std::io::ErrorKind;
use std::path::Path;

use huddle_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::HuddleConfig;
use crate::validation;

/// Parse a TOML document into a config. Missing fields take defaults.
pub fn parse_toml(content: &str) -> Result<HuddleConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))
}

/// Load config from a specific TOML file path.
///
/// A missing file is reported as [`ConfigError::FileNotFound`]. Values that
/// fail validation are logged and kept, so a typo in one field does not
/// throw away the rest of the file.
pub fn load_from_path(path: &Path) -> Result<HuddleConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;

    let config = parse_toml(&content)?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/huddle/config.toml`
/// On Linux: `~/.config/huddle/config.toml`
///
/// If the file does not exist, writes a documented default and returns
/// the defaults.
pub fn load_default() -> Result<HuddleConfig, ConfigError> {
    let path = default_config_path()?;
    load_or_create(&path)
}

/// Load `path`, creating it from the default template when it is absent.
pub fn load_or_create(path: &Path) -> Result<HuddleConfig, ConfigError> {
    match load_from_path(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(path)?;
            Ok(HuddleConfig::default())
        }
        Err(e) => Err(e),
    }
}
