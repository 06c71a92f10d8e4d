//! Environments: named deployments of nodes, wallets and gateways
//!
//! Every backing store implements [`Environment`]. The concrete type for a
//! registered descriptor is chosen by [`EnvironmentFactory`] from its tags:
//!
//! - [`DirectoryEnvironment`]: hand-curated `nodes/` directory
//! - [`AnsibleEnvironment`]: directory tree written by Ansible provisioning
//! - [`MicrofabEnvironment`]: live Microfab component directory over HTTP
//! - [`NoopEnvironment`]: placeholder for unsupported or unreachable backends

mod ansible;
mod directory;
mod discovery;
mod factory;
pub mod microfab;
mod noop;
pub mod registry;
pub mod types;

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

pub use ansible::AnsibleEnvironment;
pub use directory::DirectoryEnvironment;
pub use factory::EnvironmentFactory;
pub use microfab::MicrofabEnvironment;
pub use noop::NoopEnvironment;
pub use registry::EnvironmentRegistry;
pub use types::{EnvironmentEntry, EnvironmentFlags};

use crate::Result;
use crate::gateways::{Gateway, GatewayRegistryEntry};
use crate::nodes::{Node, NodeType};
use crate::wallets::{Identity, WalletAndIdentities};

/// Capabilities every environment backend provides
#[async_trait]
pub trait Environment: std::fmt::Debug + Send + Sync {
    /// Environment name
    fn name(&self) -> &str;

    /// Directory owned by the environment
    fn path(&self) -> &Path;

    /// Nodes in the environment
    ///
    /// Hidden nodes are only returned with `show_all`. With
    /// `without_identities`, only nodes lacking a wallet or identity are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or a node is invalid
    async fn get_nodes(&self, without_identities: bool, show_all: bool) -> Result<Vec<Node>>;

    /// Distinct MSP IDs of the visible nodes, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes cannot be loaded
    async fn get_all_organization_names(&self, show_orderer: bool) -> Result<Vec<String>> {
        let nodes = self.get_nodes(false, false).await?;
        Ok(organization_names(&nodes, show_orderer))
    }

    /// Store a changed node, propagating cluster-wide fields
    ///
    /// # Errors
    ///
    /// Returns an error if the node is invalid, a write fails, or the
    /// environment is read-only
    async fn update_node(&self, node: &Node, externally_managed: bool) -> Result<()>;

    /// Remove a node
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails or the environment is read-only
    async fn delete_node(&self, node: &Node) -> Result<()>;

    /// Whether any visible node still needs a wallet and identity
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes cannot be loaded
    async fn require_setup(&self) -> Result<bool> {
        let nodes = self.get_nodes(false, false).await?;
        Ok(nodes.iter().any(|n| !n.has_identity()))
    }

    /// Wallets derived from the environment, with their identities reconciled into the wallet stores
    ///
    /// # Errors
    ///
    /// Returns an error if wallets cannot be read or identities cannot be imported
    async fn get_wallets_and_identities(&self) -> Result<Vec<WalletAndIdentities>>;

    /// Gateway registry entries derived from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if connection profiles cannot be read
    async fn get_gateways(&self) -> Result<Vec<GatewayRegistryEntry>>;

    /// Names of the wallets the environment knows about
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read
    async fn get_wallet_names(&self) -> Result<Vec<String>>;

    /// Identities exported for `wallet_name`
    ///
    /// # Errors
    ///
    /// Returns an error if the identities cannot be read
    async fn get_identities(&self, wallet_name: &str) -> Result<Vec<Identity>>;

    /// Connection profiles owned by the environment
    ///
    /// # Errors
    ///
    /// Returns an error if connection profiles cannot be read
    async fn get_fabric_gateways(&self) -> Result<Vec<Gateway>>;
}

/// Apply visibility and identity filters to a node list
#[must_use]
pub fn filter_nodes(nodes: Vec<Node>, without_identities: bool, show_all: bool) -> Vec<Node> {
    nodes
        .into_iter()
        .filter(|n| show_all || !n.hidden)
        .filter(|n| !without_identities || !n.has_identity())
        .collect()
}

/// Distinct sorted MSP IDs, optionally skipping orderers
#[must_use]
pub fn organization_names(nodes: &[Node], show_orderer: bool) -> Vec<String> {
    nodes
        .iter()
        .filter(|n| show_orderer || n.node_type != NodeType::Orderer)
        .filter_map(|n| n.msp_id.clone())
        .filter(|msp| !msp.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
