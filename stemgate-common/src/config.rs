//! Configuration path resolution
//!
//! Config file location follows the priority order used across Stemgate
//! services:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/stemgate/config.toml`)
//!
//! Durable state (the stem URL cache) lives under the platform data
//! directory unless overridden.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Resolve the config file path.
///
/// Returns None when no path was given and the default file does not exist;
/// services then run on compiled defaults.
pub fn resolve_config_file(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform default, only if present
    let default = default_config_path()?;
    if default.exists() {
        Some(default)
    } else {
        None
    }
}

/// Platform default config file path: `<config_dir>/stemgate/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stemgate").join("config.toml"))
}

/// Platform default location for the durable stem URL cache
pub fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("stemgate").join("stem_url_cache.json"))
        .unwrap_or_else(|| PathBuf::from("./stemgate_data/stem_url_cache.json"))
}

/// Load and deserialize a TOML config file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
}
