//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::StowageConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "stowage.toml";

/// Loads and validates `stowage.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<StowageConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<StowageConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<StowageConfig, ConfigError> {
    let config: StowageConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that the folder and extensions are usable and do not collide.
fn validate_config(config: &StowageConfig) -> Result<(), ConfigError> {
    let cache = &config.cache;
    if cache.folder.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.folder must not be empty".to_string(),
        ));
    }
    for (field, ext) in [
        ("cache.artifact_ext", cache.artifact_ext()),
        ("cache.metadata_ext", cache.metadata_ext.as_str()),
    ] {
        if ext.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{field} must not be empty"
            )));
        }
        if ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "{field} '{ext}' must not start with a dot or contain path separators"
            )));
        }
    }
    if cache.artifact_ext() == cache.metadata_ext {
        return Err(ConfigError::ValidationError(format!(
            "cache.artifact_ext and cache.metadata_ext are both '{}'",
            cache.metadata_ext
        )));
    }
    Ok(())
}
