//! Wallet registry federating stored and environment-derived wallets

use std::path::Path;
use std::sync::Arc;

use super::types::WalletRegistryEntry;
use crate::environments::{EnvironmentFactory, EnvironmentRegistry};
use crate::files::{self, CONFIG_FILE};
use crate::registry::{FileRegistry, RegistryEvent, SubscriptionId, order_for_display, validate_name};
use crate::{Error, Result};

/// Registry name used in error messages
pub const WALLET_REGISTRY: &str = "wallets";

/// Wallets stored under `<root>/wallets` plus those derived from environments
#[derive(Debug)]
pub struct WalletRegistry {
    store: FileRegistry<WalletRegistryEntry>,
    environments: Arc<EnvironmentRegistry>,
    factory: Arc<EnvironmentFactory>,
    local_environment_name: String,
}

impl WalletRegistry {
    #[must_use]
    pub fn new(
        storage_dir: &Path,
        environments: Arc<EnvironmentRegistry>,
        factory: Arc<EnvironmentFactory>,
        local_environment_name: impl Into<String>,
    ) -> Self {
        Self {
            store: FileRegistry::new(WALLET_REGISTRY, storage_dir.join("wallets")),
            environments,
            factory,
            local_environment_name: local_environment_name.into(),
        }
    }

    /// Every wallet, sorted by display name
    ///
    /// With `show_local`, wallets of the local environment come first.
    /// Environments that fail to report their wallets are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored wallets or the environment registry cannot be read
    pub async fn get_all(&self, show_local: bool) -> Result<Vec<WalletRegistryEntry>> {
        let mut entries = self.store.get_all().await?;

        for env in self.factory.deriving_environments(&self.environments).await? {
            match env.get_wallets_and_identities().await {
                Ok(wallets) => entries.extend(wallets.into_iter().map(|w| w.wallet)),
                Err(e) => {
                    tracing::warn!(environment = %env.name(), error = %e, "failed to read wallets from environment");
                }
            }
        }

        let prefix = format!("{} - ", self.local_environment_name);
        Ok(order_for_display(
            entries,
            WalletRegistryEntry::label,
            show_local.then_some(prefix.as_str()),
        ))
    }

    /// Find a wallet by name, optionally restricted to the environment it came from
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` naming the wallet and environment if nothing matches
    pub async fn get(
        &self,
        name: &str,
        from_environment: Option<&str>,
    ) -> Result<WalletRegistryEntry> {
        self.get_all(true)
            .await?
            .into_iter()
            .find(|entry| {
                entry.name == name
                    && from_environment
                        .is_none_or(|env| entry.from_environment.as_deref() == Some(env))
            })
            .ok_or_else(|| Error::not_found(WALLET_REGISTRY, name, from_environment))
    }

    /// Whether a wallet is stored directly in the registry
    ///
    /// # Errors
    ///
    /// Returns an error if the file system cannot be queried
    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(name).await
    }

    /// Store a new wallet
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` if the name is taken
    pub async fn add(&self, entry: &WalletRegistryEntry) -> Result<()> {
        self.store.add(entry).await
    }

    /// Overwrite a wallet
    ///
    /// Derived wallets are written as a `.config.json` sidecar in the owning
    /// environment's wallet directory; other wallets go to the flat store.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the owning environment or the stored wallet does not exist
    pub async fn update(&self, entry: &WalletRegistryEntry) -> Result<()> {
        let Some(env_name) = entry.from_environment.as_deref() else {
            return self.store.update(entry).await;
        };

        validate_name(WALLET_REGISTRY, &entry.name)?;
        let environment = self.environments.get(env_name).await?;
        let sidecar = self
            .environments
            .environment_directory(&environment)
            .join("wallets")
            .join(&entry.name)
            .join(CONFIG_FILE);
        files::write_json(&sidecar, entry).await?;
        tracing::info!(environment = %env_name, wallet = %entry.name, path = %sidecar.display(), "updated wallet config sidecar");
        self.store
            .notify(&RegistryEvent::Updated(entry.name.clone()));
        Ok(())
    }

    /// Remove a stored wallet
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if missing and `ignore_missing` is false
    pub async fn delete(&self, name: &str, ignore_missing: bool) -> Result<()> {
        self.store.delete(name, ignore_missing).await
    }

    /// Remove every stored wallet
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be removed
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Register a change listener
    #[must_use]
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Remove a change listener
    #[must_use]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::environments::{EnvironmentEntry, EnvironmentFlags};

    struct Fixture {
        _dir: tempfile::TempDir,
        root: std::path::PathBuf,
        environments: Arc<EnvironmentRegistry>,
        wallets: WalletRegistry,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let environments = Arc::new(EnvironmentRegistry::new(&root));
        let factory = Arc::new(EnvironmentFactory::new(environments.root()));
        let wallets = WalletRegistry::new(&root, Arc::clone(&environments), factory, "Local Fabric");
        Fixture {
            _dir: dir,
            root,
            environments,
            wallets,
        }
    }

    #[tokio::test]
    async fn get_missing_names_environment() {
        let f = fixture();

        let err = f.wallets.get("X", None).await.unwrap_err();
        assert!(err.to_string().contains("\"X\""));

        let err = f.wallets.get("X", Some("envY")).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"X\""));
        assert!(msg.contains("\"envY\""));
    }

    #[tokio::test]
    async fn stored_and_derived_wallets_are_federated() {
        let f = fixture();
        f.wallets
            .add(&WalletRegistryEntry::new("standalone", f.root.join("w")))
            .await
            .unwrap();
        f.environments
            .add(&EnvironmentEntry::new("ansible", EnvironmentFlags::ANSIBLE))
            .await
            .unwrap();
        std::fs::create_dir_all(f.environments.root().join("ansible/wallets/Org1")).unwrap();

        let all = f.wallets.get_all(true).await.unwrap();
        let labels: Vec<_> = all.iter().map(WalletRegistryEntry::label).collect();
        assert_eq!(labels, vec!["ansible - Org1", "standalone"]);

        let derived = f.wallets.get("Org1", Some("ansible")).await.unwrap();
        assert_eq!(derived.from_environment.as_deref(), Some("ansible"));
        assert!(f.wallets.get("Org1", Some("other")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn derived_update_writes_sidecar() {
        let f = fixture();
        f.environments
            .add(&EnvironmentEntry::new("ansible", EnvironmentFlags::ANSIBLE))
            .await
            .unwrap();
        let wallet_dir = f.environments.root().join("ansible/wallets/Org1");
        std::fs::create_dir_all(&wallet_dir).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _id = f.wallets.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let mut entry = f.wallets.get("Org1", Some("ansible")).await.unwrap();
        entry.display_name = Some("Renamed".to_string());
        f.wallets.update(&entry).await.unwrap();

        assert!(wallet_dir.join(CONFIG_FILE).exists());
        assert!(!f.root.join("wallets").join("Org1").exists());
        let reread = f.wallets.get("Org1", Some("ansible")).await.unwrap();
        assert_eq!(reread.label(), "Renamed");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![RegistryEvent::Updated("Org1".to_string())]
        );
    }

    #[tokio::test]
    async fn derived_update_requires_registered_environment() {
        let f = fixture();
        let entry = WalletRegistryEntry::derived("gone", "Org1", f.root.join("x"));
        assert!(f.wallets.update(&entry).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn derived_update_rejects_escaping_name() {
        let f = fixture();
        f.environments
            .add(&EnvironmentEntry::new("ansible", EnvironmentFlags::ANSIBLE))
            .await
            .unwrap();
        let entry = WalletRegistryEntry::derived("ansible", "../../escape", f.root.join("x"));

        let err = f.wallets.update(&entry).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!f.environments.root().join("escape").exists());
    }

    #[tokio::test]
    async fn flat_update_goes_to_store() {
        let f = fixture();
        let mut entry = WalletRegistryEntry::new("w", f.root.join("w"));
        assert!(f.wallets.update(&entry).await.unwrap_err().is_not_found());

        f.wallets.add(&entry).await.unwrap();
        entry.managed_wallet = true;
        f.wallets.update(&entry).await.unwrap();
        assert!(f.wallets.get("w", None).await.unwrap().managed_wallet);
        assert!(f.wallets.exists("w").await.unwrap());

        f.wallets.clear().await.unwrap();
        assert!(!f.wallets.exists("w").await.unwrap());
    }
}
