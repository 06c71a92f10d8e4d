//! Environment backed by a hand-curated directory of node files

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Environment, discovery, filter_nodes};
use crate::files;
use crate::gateways::{Gateway, GatewayRegistryEntry};
use crate::nodes::{Node, NodeUpdatePlan, plan_node_update};
use crate::wallets::{Identity, WalletAndIdentities};
use crate::{Error, Result};

/// Environment whose nodes live as JSON files under `<path>/nodes/`
#[derive(Debug, Clone)]
pub struct DirectoryEnvironment {
    name: String,
    path: PathBuf,
}

impl DirectoryEnvironment {
    /// Environment `name` rooted at `path`
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Directory holding node files
    #[must_use]
    pub fn nodes_dir(&self) -> PathBuf {
        self.path.join("nodes")
    }

    /// Directory holding wallet directories
    #[must_use]
    pub fn wallets_dir(&self) -> PathBuf {
        self.path.join("wallets")
    }

    /// Default location of a node file not yet on disk
    fn node_path(&self, name: &str) -> PathBuf {
        self.nodes_dir().join(format!("{name}.json"))
    }

    /// Every node, hidden ones included
    ///
    /// # Errors
    ///
    /// Returns an error if a node file cannot be read or fails validation
    pub async fn load_nodes(&self) -> Result<Vec<Node>> {
        discovery::load_nodes(&self.nodes_dir()).await
    }

    /// Plan and apply a node update, returning the plan that was applied
    ///
    /// Writes are issued one at a time; a failure part way leaves earlier
    /// writes in place and the update can be retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is invalid, the rename fails, or a write fails
    pub async fn apply_node_update(&self, node: &Node, externally_managed: bool) -> Result<NodeUpdatePlan> {
        node.validate()?;
        let stored = discovery::load_node_files(&self.nodes_dir()).await?;
        let mut paths: HashMap<String, PathBuf> = stored
            .iter()
            .map(|file| (file.node.name.clone(), file.path.clone()))
            .collect();
        let current: Vec<Node> = stored.into_iter().map(|file| file.node).collect();
        let plan = plan_node_update(&current, node, externally_managed);

        if let Some((old, new)) = &plan.rename {
            let from = paths.remove(old).unwrap_or_else(|| self.node_path(old));
            let to = from.with_file_name(format!("{new}.json"));
            files::move_file(&from, &to).await?;
            tracing::info!(environment = %self.name, from = %old, to = %new, "renamed node");
            paths.insert(new.clone(), to);
        }

        for updated in &plan.writes {
            let path = paths
                .get(&updated.name)
                .cloned()
                .unwrap_or_else(|| self.node_path(&updated.name));
            files::write_json(&path, updated).await?;
            tracing::debug!(environment = %self.name, node = %updated.name, "wrote node");
        }

        Ok(plan)
    }

    /// Remove the file holding `node`, wherever it is nested
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no node file has that name
    pub async fn remove_node(&self, node: &Node) -> Result<()> {
        let stored = discovery::load_node_files(&self.nodes_dir()).await?;
        let Some(file) = stored.into_iter().find(|file| file.node.name == node.name) else {
            return Err(Error::not_found("nodes", &node.name, Some(&self.name)));
        };
        tokio::fs::remove_file(&file.path).await?;
        tracing::info!(environment = %self.name, node = %node.name, path = %file.path.display(), "deleted node");
        Ok(())
    }
}

#[async_trait]
impl Environment for DirectoryEnvironment {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn get_nodes(&self, without_identities: bool, show_all: bool) -> Result<Vec<Node>> {
        let nodes = self.load_nodes().await?;
        Ok(filter_nodes(nodes, without_identities, show_all))
    }

    async fn update_node(&self, node: &Node, externally_managed: bool) -> Result<()> {
        self.apply_node_update(node, externally_managed).await.map(|_| ())
    }

    async fn delete_node(&self, node: &Node) -> Result<()> {
        self.remove_node(node).await
    }

    async fn get_wallets_and_identities(&self) -> Result<Vec<WalletAndIdentities>> {
        Ok(Vec::new())
    }

    async fn get_gateways(&self) -> Result<Vec<GatewayRegistryEntry>> {
        Ok(Vec::new())
    }

    async fn get_wallet_names(&self) -> Result<Vec<String>> {
        let nodes = self.load_nodes().await?;
        Ok(nodes
            .into_iter()
            .filter_map(|n| n.wallet)
            .filter(|w| !w.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    async fn get_identities(&self, wallet_name: &str) -> Result<Vec<Identity>> {
        discovery::read_identities(&self.wallets_dir().join(wallet_name)).await
    }

    async fn get_fabric_gateways(&self) -> Result<Vec<Gateway>> {
        Ok(Vec::new())
    }
}
