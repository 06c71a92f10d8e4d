//! Placeholder environment for backends that cannot be reached or are not supported

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::Environment;
use crate::Result;
use crate::gateways::{Gateway, GatewayRegistryEntry};
use crate::nodes::Node;
use crate::wallets::{Identity, WalletAndIdentities};

/// Environment that reports nothing and ignores changes
#[derive(Debug, Clone)]
pub struct NoopEnvironment {
    name: String,
    path: PathBuf,
}

impl NoopEnvironment {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl Environment for NoopEnvironment {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn get_nodes(&self, _without_identities: bool, _show_all: bool) -> Result<Vec<Node>> {
        Ok(Vec::new())
    }

    async fn get_all_organization_names(&self, _show_orderer: bool) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn update_node(&self, _node: &Node, _externally_managed: bool) -> Result<()> {
        Ok(())
    }

    async fn delete_node(&self, _node: &Node) -> Result<()> {
        Ok(())
    }

    async fn require_setup(&self) -> Result<bool> {
        Ok(false)
    }

    async fn get_wallets_and_identities(&self) -> Result<Vec<WalletAndIdentities>> {
        Ok(Vec::new())
    }

    async fn get_gateways(&self) -> Result<Vec<GatewayRegistryEntry>> {
        Ok(Vec::new())
    }

    async fn get_wallet_names(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn get_identities(&self, _wallet_name: &str) -> Result<Vec<Identity>> {
        Ok(Vec::new())
    }

    async fn get_fabric_gateways(&self) -> Result<Vec<Gateway>> {
        Ok(Vec::new())
    }
}
