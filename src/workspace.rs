//! Registries wired together over one storage root

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Result;
use crate::config::Config;
use crate::environments::{Environment, EnvironmentFactory, EnvironmentRegistry};
use crate::gateways::GatewayRegistry;
use crate::wallets::{FileSystemWalletProvider, WalletProvider, WalletRegistry};

/// Long-lived registry instances sharing a storage root
#[derive(Debug, Clone)]
pub struct Workspace {
    storage_dir: PathBuf,
    environments: Arc<EnvironmentRegistry>,
    factory: Arc<EnvironmentFactory>,
    wallets: Arc<WalletRegistry>,
    gateways: Arc<GatewayRegistry>,
}

impl Workspace {
    /// Wire the registries for `config`, storing identities in file-system wallets
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_wallet_provider(config, Arc::new(FileSystemWalletProvider))
    }

    /// Wire the registries for `config`, opening wallet stores through `wallets`
    #[must_use]
    pub fn with_wallet_provider(config: &Config, wallets: Arc<dyn WalletProvider>) -> Self {
        let storage_dir = config.storage_dir.clone();
        let environments = Arc::new(EnvironmentRegistry::new(&storage_dir));
        let factory = Arc::new(EnvironmentFactory::with_wallet_provider(
            environments.root(),
            wallets,
        ));
        let wallet_registry = Arc::new(WalletRegistry::new(
            &storage_dir,
            Arc::clone(&environments),
            Arc::clone(&factory),
            &config.local_environment_name,
        ));
        let gateway_registry = Arc::new(GatewayRegistry::new(
            &storage_dir,
            Arc::clone(&environments),
            Arc::clone(&factory),
            &config.local_environment_name,
        ));

        tracing::debug!(storage_dir = %storage_dir.display(), "registries initialized");

        Self {
            storage_dir,
            environments,
            factory,
            wallets: wallet_registry,
            gateways: gateway_registry,
        }
    }

    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    #[must_use]
    pub const fn environments(&self) -> &Arc<EnvironmentRegistry> {
        &self.environments
    }

    #[must_use]
    pub const fn factory(&self) -> &Arc<EnvironmentFactory> {
        &self.factory
    }

    #[must_use]
    pub const fn wallets(&self) -> &Arc<WalletRegistry> {
        &self.wallets
    }

    #[must_use]
    pub const fn gateways(&self) -> &Arc<GatewayRegistry> {
        &self.gateways
    }

    /// Build the environment registered as `name`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no such environment is registered, or an
    /// error if the descriptor is invalid
    pub async fn environment(&self, name: &str) -> Result<Arc<dyn Environment>> {
        let entry = self.environments.get(name).await?;
        self.factory.create(&entry)
    }

    /// Remove every stored environment, wallet and gateway
    ///
    /// # Errors
    ///
    /// Returns an error if a registry directory cannot be removed
    pub async fn clear(&self) -> Result<()> {
        self.gateways.clear().await?;
        self.wallets.clear().await?;
        self.environments.clear().await
    }
}
