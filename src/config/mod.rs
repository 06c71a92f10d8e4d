//! Configuration management for the Fabric registry
//!
//! Precedence is env > TOML file > default.

pub mod file;

use std::path::PathBuf;

use crate::{Error, Result};

/// Env var overriding the storage root
pub const STORAGE_DIR_ENV: &str = "FABRIC_REGISTRY_DIR";

/// Env var overriding the local environment name
pub const LOCAL_ENVIRONMENT_ENV: &str = "FABRIC_LOCAL_ENVIRONMENT";

/// Name of the local environment when none is configured
pub const DEFAULT_LOCAL_ENVIRONMENT: &str = "Local Fabric";

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory holding `environments/`, `wallets/` and `gateways/`
    pub storage_dir: PathBuf,

    /// Environment whose wallets and gateways are listed first
    pub local_environment_name: String,
}

impl Config {
    /// Load configuration from the environment, the config file and defaults
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a configured value is empty
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(
            fc,
            std::env::var(STORAGE_DIR_ENV).ok(),
            std::env::var(LOCAL_ENVIRONMENT_ENV).ok(),
        )
    }

    /// Combine env values and a parsed config file, env first
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a configured value is empty
    pub fn resolve(
        fc: file::RegistryConfigFile,
        storage_dir_env: Option<String>,
        local_environment_env: Option<String>,
    ) -> Result<Self> {
        let storage_dir = storage_dir_env
            .map(PathBuf::from)
            .or(fc.storage_dir)
            .unwrap_or_else(default_storage_dir);
        if storage_dir.as_os_str().is_empty() {
            return Err(Error::Config("storage directory must not be empty".to_string()));
        }

        let local_environment_name = local_environment_env
            .or(fc.local_environment_name)
            .unwrap_or_else(|| DEFAULT_LOCAL_ENVIRONMENT.to_string());
        if local_environment_name.trim().is_empty() {
            return Err(Error::Config(
                "local environment name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            storage_dir,
            local_environment_name,
        })
    }

    /// Replace the storage root, e.g. from a command-line flag
    #[must_use]
    pub fn with_storage_dir(mut self, storage_dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = storage_dir.into();
        self
    }
}

/// Default storage root: `<data dir>/fabric-registry`
fn default_storage_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".fabric-registry"),
        |d| d.data_dir().join("fabric-registry"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use file::RegistryConfigFile;

    #[test]
    fn defaults_apply_without_sources() {
        let config = Config::resolve(RegistryConfigFile::default(), None, None).unwrap();
        assert_eq!(config.local_environment_name, DEFAULT_LOCAL_ENVIRONMENT);
        assert!(config.storage_dir.ends_with("fabric-registry"));
    }

    #[test]
    fn env_overrides_file() {
        let fc = RegistryConfigFile {
            storage_dir: Some(PathBuf::from("/from/file")),
            local_environment_name: Some("File Fabric".to_string()),
        };
        let config = Config::resolve(fc, Some("/from/env".to_string()), None).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/from/env"));
        assert_eq!(config.local_environment_name, "File Fabric");
    }

    #[test]
    fn empty_values_are_rejected() {
        let err = Config::resolve(RegistryConfigFile::default(), Some(String::new()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::resolve(RegistryConfigFile::default(), None, Some("  ".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
