//! Environment backed by the directory tree Ansible provisioning writes
//!
//! Layout under the environment directory:
//!
//! ```text
//! nodes/**/*.json                  node files
//! wallets/<wallet>/*.json          exported identities
//! wallets/<wallet>/.config.json    optional wallet registry override
//! gateways/**/*.json               connection profiles
//! gateways/<gateway>/.config.json  optional gateway registry override
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::directory::DirectoryEnvironment;
use super::{Environment, discovery};
use crate::files;
use crate::gateways::{Gateway, GatewayRegistryEntry};
use crate::nodes::Node;
use crate::wallets::{Identity, WalletAndIdentities, WalletProvider, reconcile_identities};
use crate::Result;

/// Ansible-provisioned environment
#[derive(Clone)]
pub struct AnsibleEnvironment {
    base: DirectoryEnvironment,
    wallets: Arc<dyn WalletProvider>,
}

impl std::fmt::Debug for AnsibleEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsibleEnvironment")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl AnsibleEnvironment {
    /// Environment `name` rooted at `path`, importing identities through `wallets`
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, wallets: Arc<dyn WalletProvider>) -> Self {
        Self {
            base: DirectoryEnvironment::new(name, path),
            wallets,
        }
    }

    fn gateways_dir(&self) -> PathBuf {
        self.base.path().join("gateways")
    }
}

#[async_trait]
impl Environment for AnsibleEnvironment {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn path(&self) -> &Path {
        self.base.path()
    }

    async fn get_nodes(&self, without_identities: bool, show_all: bool) -> Result<Vec<Node>> {
        self.base.get_nodes(without_identities, show_all).await
    }

    async fn update_node(&self, node: &Node, externally_managed: bool) -> Result<()> {
        self.base.update_node(node, externally_managed).await
    }

    async fn delete_node(&self, node: &Node) -> Result<()> {
        self.base.delete_node(node).await
    }

    async fn get_wallets_and_identities(&self) -> Result<Vec<WalletAndIdentities>> {
        let mut results = Vec::new();
        for wallet_dir in files::list_subdirectories(&self.base.wallets_dir()).await? {
            let Some(wallet_name) = wallet_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let wallet = discovery::wallet_entry(self.name(), wallet_name, &wallet_dir).await?;
            let identities = discovery::read_identities(&wallet_dir).await?;

            let store = self.wallets.open(&wallet);
            let imported = reconcile_identities(store.as_ref(), &identities).await?;
            tracing::debug!(
                environment = %self.name(),
                wallet = %wallet.name,
                identities = identities.len(),
                imported,
                "discovered wallet"
            );

            results.push(WalletAndIdentities { wallet, identities });
        }
        Ok(results)
    }

    async fn get_gateways(&self) -> Result<Vec<GatewayRegistryEntry>> {
        let gateways_dir = self.gateways_dir();
        let mut entries = Vec::new();
        for gateway in self.get_fabric_gateways().await? {
            entries.push(discovery::gateway_entry(self.name(), &gateways_dir, &gateway).await?);
        }
        Ok(entries)
    }

    async fn get_wallet_names(&self) -> Result<Vec<String>> {
        Ok(files::list_subdirectories(&self.base.wallets_dir())
            .await?
            .iter()
            .filter_map(|dir| dir.file_name().and_then(|n| n.to_str()).map(ToString::to_string))
            .collect())
    }

    async fn get_identities(&self, wallet_name: &str) -> Result<Vec<Identity>> {
        self.base.get_identities(wallet_name).await
    }

    async fn get_fabric_gateways(&self) -> Result<Vec<Gateway>> {
        discovery::read_gateways(&self.gateways_dir()).await
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    use super::*;
    use crate::wallets::{FileSystemWallet, FileSystemWalletProvider, WalletStore};

    fn identity_json(name: &str, cert: &str) -> String {
        serde_json::json!({
            "name": name,
            "cert": STANDARD.encode(cert),
            "private_key": STANDARD.encode("KEY"),
            "msp_id": "Org1MSP",
        })
        .to_string()
    }

    fn setup() -> (tempfile::TempDir, AnsibleEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = AnsibleEnvironment::new("ansible", dir.path(), Arc::new(FileSystemWalletProvider));
        let org1 = dir.path().join("wallets").join("Org1");
        std::fs::create_dir_all(&org1).unwrap();
        std::fs::write(org1.join("admin.json"), identity_json("admin", "CERT")).unwrap();
        let gateways = dir.path().join("gateways").join("org1");
        std::fs::create_dir_all(&gateways).unwrap();
        std::fs::write(
            gateways.join("org1gateway.json"),
            r#"{"name":"Org1 Gateway","wallet":"Org1"}"#,
        )
        .unwrap();
        (dir, env)
    }

    #[tokio::test]
    async fn wallets_are_synthesized_and_imported() {
        let (dir, env) = setup();

        let wallets = env.get_wallets_and_identities().await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].wallet.display_name.as_deref(), Some("ansible - Org1"));
        assert_eq!(wallets[0].identities.len(), 1);

        let store = FileSystemWallet::new(dir.path().join("wallets").join("Org1"));
        let stored = store.get_identities().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].cert, "CERT");
    }

    #[tokio::test]
    async fn repeated_discovery_does_not_reimport() {
        let (dir, env) = setup();
        env.get_wallets_and_identities().await.unwrap();
        let id_file = dir.path().join("wallets").join("Org1").join("admin.id");
        std::fs::write(&id_file, std::fs::read_to_string(&id_file).unwrap() + "\n").unwrap();
        let before = std::fs::read_to_string(&id_file).unwrap();

        env.get_wallets_and_identities().await.unwrap();

        assert_eq!(std::fs::read_to_string(&id_file).unwrap(), before);
    }

    #[tokio::test]
    async fn gateways_are_derived_from_profiles() {
        let (_dir, env) = setup();

        let gateways = env.get_gateways().await.unwrap();
        assert_eq!(gateways.len(), 1);
        assert_eq!(gateways[0].name, "Org1 Gateway");
        assert_eq!(gateways[0].associated_wallet, "Org1");
        assert_eq!(gateways[0].from_environment.as_deref(), Some("ansible"));
        assert_eq!(env.get_wallet_names().await.unwrap(), vec!["Org1"]);
    }

    #[tokio::test]
    async fn identities_listed_per_wallet() {
        let (_dir, env) = setup();
        let identities = env.get_identities("Org1").await.unwrap();
        assert_eq!(identities[0].name, "admin");
        assert!(env.get_identities("Org2").await.unwrap().is_empty());
    }
}
