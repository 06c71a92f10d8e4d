//! Gateway registry federating stored and environment-derived gateways

use std::path::Path;
use std::sync::Arc;

use super::types::GatewayRegistryEntry;
use crate::environments::{EnvironmentFactory, EnvironmentRegistry};
use crate::files::{self, CONFIG_FILE};
use crate::registry::{FileRegistry, RegistryEvent, SubscriptionId, order_for_display, validate_name};
use crate::{Error, Result};

/// Registry name used in error messages
pub const GATEWAY_REGISTRY: &str = "gateways";

/// File name of a connection profile stored alongside a gateway entry
pub const CONNECTION_PROFILE_FILE: &str = "connection.json";

/// Gateways stored under `<root>/gateways` plus those derived from environments
#[derive(Debug)]
pub struct GatewayRegistry {
    store: FileRegistry<GatewayRegistryEntry>,
    environments: Arc<EnvironmentRegistry>,
    factory: Arc<EnvironmentFactory>,
    local_environment_name: String,
}

impl GatewayRegistry {
    #[must_use]
    pub fn new(
        storage_dir: &Path,
        environments: Arc<EnvironmentRegistry>,
        factory: Arc<EnvironmentFactory>,
        local_environment_name: impl Into<String>,
    ) -> Self {
        Self {
            store: FileRegistry::new(GATEWAY_REGISTRY, storage_dir.join("gateways")),
            environments,
            factory,
            local_environment_name: local_environment_name.into(),
        }
    }

    /// Every gateway, sorted by display name
    ///
    /// With `show_local`, gateways of the local environment come first.
    /// Environments that fail to report their gateways are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored gateways or the environment registry cannot be read
    pub async fn get_all(&self, show_local: bool) -> Result<Vec<GatewayRegistryEntry>> {
        let mut entries = self.store.get_all().await?;

        for env in self.factory.deriving_environments(&self.environments).await? {
            match env.get_gateways().await {
                Ok(gateways) => entries.extend(gateways),
                Err(e) => {
                    tracing::warn!(environment = %env.name(), error = %e, "failed to read gateways from environment");
                }
            }
        }

        let prefix = format!("{} - ", self.local_environment_name);
        Ok(order_for_display(
            entries,
            GatewayRegistryEntry::label,
            show_local.then_some(prefix.as_str()),
        ))
    }

    /// Find a gateway by name, optionally restricted to the environment it came from
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` naming the gateway and environment if nothing matches
    pub async fn get(
        &self,
        name: &str,
        from_environment: Option<&str>,
    ) -> Result<GatewayRegistryEntry> {
        self.get_all(true)
            .await?
            .into_iter()
            .find(|entry| {
                entry.name == name
                    && from_environment
                        .is_none_or(|env| entry.from_environment.as_deref() == Some(env))
            })
            .ok_or_else(|| Error::not_found(GATEWAY_REGISTRY, name, from_environment))
    }

    /// Whether a gateway is stored directly in the registry
    ///
    /// # Errors
    ///
    /// Returns an error if the file system cannot be queried
    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(name).await
    }

    /// Store a new gateway
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` if the name is taken
    pub async fn add(&self, entry: &GatewayRegistryEntry) -> Result<()> {
        self.store.add(entry).await
    }

    /// Store a new gateway together with its connection profile
    ///
    /// The profile is written to `<root>/gateways/<name>/connection.json` and
    /// the stored entry points at it.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` if the name is taken, or an error if a write fails
    pub async fn add_with_profile(
        &self,
        entry: &GatewayRegistryEntry,
        profile: &serde_json::Value,
    ) -> Result<GatewayRegistryEntry> {
        let mut entry = entry.clone();
        entry.connection_profile_path = self
            .store
            .entry_dir(&entry.name)
            .join(CONNECTION_PROFILE_FILE);
        self.store.add(&entry).await?;
        files::write_json(&entry.connection_profile_path, profile).await?;
        Ok(entry)
    }

    /// Read the connection profile an entry points at
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the entry has no profile path, or an
    /// error if the profile cannot be read
    pub async fn get_connection_profile(
        &self,
        entry: &GatewayRegistryEntry,
    ) -> Result<serde_json::Value> {
        if entry.connection_profile_path.as_os_str().is_empty() {
            return Err(Error::Validation(format!(
                "gateway \"{}\" has no connection profile path",
                entry.name
            )));
        }
        files::read_json(&entry.connection_profile_path).await
    }

    /// Overwrite a gateway
    ///
    /// Derived gateways are written as a `.config.json` sidecar under the
    /// owning environment's `gateways/<name>` directory; other gateways go to
    /// the flat store.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the owning environment or the stored gateway does not exist
    pub async fn update(&self, entry: &GatewayRegistryEntry) -> Result<()> {
        let Some(env_name) = entry.from_environment.as_deref() else {
            return self.store.update(entry).await;
        };

        validate_name(GATEWAY_REGISTRY, &entry.name)?;
        let environment = self.environments.get(env_name).await?;
        let sidecar = self
            .environments
            .environment_directory(&environment)
            .join("gateways")
            .join(&entry.name)
            .join(CONFIG_FILE);
        files::write_json(&sidecar, entry).await?;
        tracing::info!(environment = %env_name, gateway = %entry.name, path = %sidecar.display(), "updated gateway config sidecar");
        self.store
            .notify(&RegistryEvent::Updated(entry.name.clone()));
        Ok(())
    }

    /// Remove a stored gateway and its connection profile
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if missing and `ignore_missing` is false
    pub async fn delete(&self, name: &str, ignore_missing: bool) -> Result<()> {
        self.store.delete(name, ignore_missing).await
    }

    /// Remove every stored gateway
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
    use super::*;
    use crate::environments::{EnvironmentEntry, EnvironmentFlags};

    fn registries(root: &Path, local: &str) -> (Arc<EnvironmentRegistry>, GatewayRegistry) {
        let environments = Arc::new(EnvironmentRegistry::new(root));
        let factory = Arc::new(EnvironmentFactory::new(environments.root()));
        let gateways = GatewayRegistry::new(root, Arc::clone(&environments), factory, local);
        (environments, gateways)
    }

    fn write_profile(env_dir: &Path, file: &str, name: &str) {
        let dir = env_dir.join("gateways");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(file),
            serde_json::json!({"name": name, "wallet": "Org1"}).to_string(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn profile_is_stored_next_to_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (_envs, gateways) = registries(dir.path(), "Local Fabric");
        let profile = serde_json::json!({"name": "mygw", "peers": {}});

        let stored = gateways
            .add_with_profile(&GatewayRegistryEntry::new("mygw", "Org1"), &profile)
            .await
            .unwrap();

        assert_eq!(
            stored.connection_profile_path,
            dir.path().join("gateways/mygw/connection.json")
        );
        let entry = gateways.get("mygw", None).await.unwrap();
        assert_eq!(gateways.get_connection_profile(&entry).await.unwrap(), profile);

        gateways.delete("mygw", false).await.unwrap();
        assert!(!stored.connection_profile_path.exists());
    }

    #[tokio::test]
    async fn derived_update_rejects_escaping_name() {
        let dir = tempfile::tempdir().unwrap();
        let (envs, gateways) = registries(dir.path(), "Local Fabric");
        envs.add(&EnvironmentEntry::new("ansible", EnvironmentFlags::ANSIBLE))
            .await
            .unwrap();
        let mut entry = GatewayRegistryEntry::new("../../escape", "Org1");
        entry.from_environment = Some("ansible".to_string());

        let err = gateways.update(&entry).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!envs.root().join("escape").exists());
    }

    #[tokio::test]
    async fn missing_profile_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_envs, gateways) = registries(dir.path(), "Local Fabric");
        let err = gateways
            .get_connection_profile(&GatewayRegistryEntry::new("g", "w"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn local_gateways_come_first_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let (envs, gateways) = registries(dir.path(), "local");
        envs.add(&EnvironmentEntry::new("ansible", EnvironmentFlags::ANSIBLE))
            .await
            .unwrap();
        envs.add(&EnvironmentEntry::new("local", EnvironmentFlags::ANSIBLE | EnvironmentFlags::LOCAL))
            .await
            .unwrap();
        write_profile(&envs.root().join("ansible"), "a.json", "Org1 Gateway");
        write_profile(&envs.root().join("local"), "l.json", "Org1 Gateway");
        gateways
            .add(&GatewayRegistryEntry::new("Alpha", "w"))
            .await
            .unwrap();

        let shown: Vec<_> = gateways
            .get_all(true)
            .await
            .unwrap()
            .iter()
            .map(|g| g.label().to_string())
            .collect();
        assert_eq!(shown, vec!["local - Org1 Gateway", "Alpha", "ansible - Org1 Gateway"]);

        let plain: Vec<_> = gateways
            .get_all(false)
            .await
            .unwrap()
            .iter()
            .map(|g| g.label().to_string())
            .collect();
        assert_eq!(plain, vec!["Alpha", "ansible - Org1 Gateway", "local - Org1 Gateway"]);
    }

    #[tokio::test]
    async fn same_name_resolved_by_environment() {
        let dir = tempfile::tempdir().unwrap();
        let (envs, gateways) = registries(dir.path(), "Local Fabric");
        for name in ["one", "two"] {
            envs.add(&EnvironmentEntry::new(name, EnvironmentFlags::ANSIBLE))
                .await
                .unwrap();
            write_profile(&envs.root().join(name), "g.json", "Org1 Gateway");
        }

        let two = gateways.get("Org1 Gateway", Some("two")).await.unwrap();
        assert_eq!(two.from_environment.as_deref(), Some("two"));
        let first = gateways.get("Org1 Gateway", None).await.unwrap();
        assert_eq!(first.from_environment.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn derived_update_writes_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let (envs, gateways) = registries(dir.path(), "Local Fabric");
        envs.add(&EnvironmentEntry::new("ansible", EnvironmentFlags::ANSIBLE))
            .await
            .unwrap();
        write_profile(&envs.root().join("ansible"), "g.json", "Org1 Gateway");

        let mut entry = gateways.get("Org1 Gateway", Some("ansible")).await.unwrap();
        entry.associated_wallet = "Org2".to_string();
        gateways.update(&entry).await.unwrap();

        let sidecar = envs
            .root()
            .join("ansible/gateways/Org1 Gateway")
            .join(CONFIG_FILE);
        assert!(sidecar.exists());
        let reread = gateways.get("Org1 Gateway", Some("ansible")).await.unwrap();
        assert_eq!(reread.associated_wallet, "Org2");
    }
}
