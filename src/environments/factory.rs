//! Select the environment implementation for a registered descriptor

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;

use super::microfab::MicrofabClient;
use super::registry::EnvironmentRegistry;
use super::types::{EnvironmentEntry, EnvironmentFlags};
use super::{
    AnsibleEnvironment, DirectoryEnvironment, Environment, MicrofabEnvironment, NoopEnvironment,
};
use crate::wallets::{FileSystemWalletProvider, WalletProvider};
use crate::{Error, Result};

/// Builds [`Environment`] instances from descriptors
#[derive(Clone)]
pub struct EnvironmentFactory {
    environments_root: PathBuf,
    client: Client,
    wallets: Arc<dyn WalletProvider>,
}

impl std::fmt::Debug for EnvironmentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentFactory")
            .field("environments_root", &self.environments_root)
            .finish_non_exhaustive()
    }
}

impl EnvironmentFactory {
    /// Factory resolving default directories under `environments_root`, with file-system wallets
    #[must_use]
    pub fn new(environments_root: impl Into<PathBuf>) -> Self {
        Self::with_wallet_provider(environments_root, Arc::new(FileSystemWalletProvider))
    }

    /// Factory opening wallet stores through `wallets`
    #[must_use]
    pub fn with_wallet_provider(
        environments_root: impl Into<PathBuf>,
        wallets: Arc<dyn WalletProvider>,
    ) -> Self {
        Self {
            environments_root: environments_root.into(),
            client: Client::new(),
            wallets,
        }
    }

    /// Directory used by environments without an explicit directory
    #[must_use]
    pub fn environments_root(&self) -> &Path {
        &self.environments_root
    }

    /// Build the environment described by `entry`
    ///
    /// Microfab takes precedence over Ansible. Descriptors carrying unknown tag
    /// bits get a placeholder. Everything else, ops-tools included, is a plain
    /// directory environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a Microfab entry has no URL, or an error
    /// if the URL cannot be parsed
    pub fn create(&self, entry: &EnvironmentEntry) -> Result<Arc<dyn Environment>> {
        let path = entry.directory(&self.environments_root);
        let tags = entry.environment_type;

        let environment: Arc<dyn Environment> = if tags.contains(EnvironmentFlags::MICROFAB) {
            let url = entry.url.as_deref().filter(|u| !u.is_empty()).ok_or_else(|| {
                Error::Validation(format!(
                    "microfab environment \"{}\" is missing required field \"url\"",
                    entry.name
                ))
            })?;
            let client = MicrofabClient::new(self.client.clone(), url)?;
            Arc::new(MicrofabEnvironment::new(
                &entry.name,
                path,
                client,
                Arc::clone(&self.wallets),
            ))
        } else if tags.contains(EnvironmentFlags::ANSIBLE) {
            Arc::new(AnsibleEnvironment::new(
                &entry.name,
                path,
                Arc::clone(&self.wallets),
            ))
        } else if tags.has_unknown_tags() {
            tracing::warn!(
                environment = %entry.name,
                environment_type = tags.bits(),
                "unsupported environment type, using placeholder"
            );
            Arc::new(NoopEnvironment::new(&entry.name, path))
        } else {
            Arc::new(DirectoryEnvironment::new(&entry.name, path))
        };

        Ok(environment)
    }

    /// Every registered environment whose wallets and gateways are derived live
    ///
    /// Descriptors that cannot be turned into an environment are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment registry cannot be read
    pub async fn deriving_environments(
        &self,
        registry: &EnvironmentRegistry,
    ) -> Result<Vec<Arc<dyn Environment>>> {
        let mut environments = Vec::new();
        for entry in registry.get_all(&[], &[]).await? {
            if !entry.derives_entries() {
                continue;
            }
            match self.create(&entry) {
                Ok(env) => environments.push(env),
                Err(e) => {
                    tracing::warn!(environment = %entry.name, error = %e, "skipping environment");
                }
            }
        }
        Ok(environments)
    }
}
