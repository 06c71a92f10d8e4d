//! TOML configuration file loading
//!
//! Supports `~/.config/fabric-registry/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct RegistryConfigFile {
    /// Root directory for registries and environment data
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// Environment whose wallets and gateways are listed first
    #[serde(default)]
    pub local_environment_name: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `RegistryConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> RegistryConfigFile {
    config_file_path().map_or_else(RegistryConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from `path`, falling back to defaults
#[must_use]
pub fn load_from(path: &Path) -> RegistryConfigFile {
    if !path.exists() {
        return RegistryConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                RegistryConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            RegistryConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/fabric-registry/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("fabric-registry").join("config.toml"))
}
