//! Environment backed by a live Microfab instance
//!
//! Nodes, wallets and gateways all come from the component directory. The
//! environment is read-only: nodes cannot be updated or deleted, and there is
//! no setup step. Identities are reconciled into wallet stores under
//! `<path>/wallets/<wallet>` and connection profiles are cached under
//! `<path>/gateways/<id>.json`.

mod client;

pub use client::{
    CaComponent, Component, GatewayComponent, IdentityComponent, MicrofabClient, NodeComponent,
};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{Environment, discovery, filter_nodes};
use crate::files;
use crate::gateways::{Gateway, GatewayRegistryEntry};
use crate::nodes::Node;
use crate::wallets::{Identity, WalletAndIdentities, WalletProvider, reconcile_identities};
use crate::{Error, Result};

/// Read-only environment served by Microfab
#[derive(Clone)]
pub struct MicrofabEnvironment {
    name: String,
    path: PathBuf,
    client: MicrofabClient,
    wallets: Arc<dyn WalletProvider>,
}

impl std::fmt::Debug for MicrofabEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrofabEnvironment")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("url", &self.client.base_url().as_str())
            .finish_non_exhaustive()
    }
}

impl MicrofabEnvironment {
    /// Environment `name` caching into `path`, reading from `client`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        client: MicrofabClient,
        wallets: Arc<dyn WalletProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            client,
            wallets,
        }
    }

    /// Client for the component directory
    #[must_use]
    pub const fn client(&self) -> &MicrofabClient {
        &self.client
    }

    /// Whether the Microfab instance is reachable
    pub async fn is_alive(&self) -> bool {
        self.client.is_alive().await
    }

    fn wallets_dir(&self) -> PathBuf {
        self.path.join("wallets")
    }

    fn gateways_dir(&self) -> PathBuf {
        self.path.join("gateways")
    }

    async fn identity_components(&self) -> Result<Vec<IdentityComponent>> {
        Ok(self
            .client
            .components()
            .await?
            .into_iter()
            .filter_map(|c| match c {
                Component::Identity(identity) => Some(identity),
                _ => None,
            })
            .collect())
    }

    /// Write a gateway profile to the cache only when its content changed
    async fn cache_profile(&self, path: &Path, profile: &serde_json::Value) -> Result<()> {
        let content = serde_json::to_vec_pretty(profile)?;
        match tokio::fs::read(path).await {
            Ok(existing) if existing == content => {
                tracing::debug!(path = %path.display(), "connection profile unchanged");
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        files::write_bytes(path, &content).await?;
        tracing::info!(environment = %self.name, path = %path.display(), "cached connection profile");
        Ok(())
    }
}

fn to_identity(component: &IdentityComponent) -> Identity {
    Identity {
        name: component.display_name.clone(),
        cert: component.cert.clone(),
        private_key: component.private_key.clone(),
        msp_id: component.msp_id.clone(),
    }
}

fn to_node(component: &Component) -> Option<Node> {
    match component {
        Component::Peer(peer) => {
            let mut node = Node::peer(
                &peer.id,
                &peer.display_name,
                &peer.api_url,
                Some(&peer.wallet),
                Some(&peer.identity),
                &peer.msp_id,
            );
            node.api_options.clone_from(&peer.api_options);
            node.chaincode_url.clone_from(&peer.chaincode_url);
            Some(node)
        }
        Component::Orderer(orderer) => {
            let mut node = Node::orderer(
                &orderer.id,
                &orderer.display_name,
                &orderer.api_url,
                Some(&orderer.wallet),
                Some(&orderer.identity),
                &orderer.msp_id,
                Some(&orderer.wallet),
            );
            node.api_options.clone_from(&orderer.api_options);
            Some(node)
        }
        Component::CertificateAuthority(ca) => {
            let mut node = Node::certificate_authority(
                &ca.id,
                &ca.display_name,
                &ca.api_url,
                ca.ca_name.as_deref().unwrap_or(&ca.id),
                Some(&ca.wallet),
                Some(&ca.identity),
                ca.msp_id.as_deref(),
            );
            node.api_options.clone_from(&ca.api_options);
            Some(node)
        }
        Component::Identity(_) | Component::Gateway(_) | Component::Unknown => None,
    }
}

#[async_trait]
impl Environment for MicrofabEnvironment {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn get_nodes(&self, without_identities: bool, show_all: bool) -> Result<Vec<Node>> {
        let components = self.client.components().await?;
        let nodes = components.iter().filter_map(to_node).collect();
        Ok(filter_nodes(nodes, without_identities, show_all))
    }

    async fn update_node(&self, _node: &Node, _externally_managed: bool) -> Result<()> {
        Err(Error::unsupported("update_node", &self.name))
    }

    async fn delete_node(&self, _node: &Node) -> Result<()> {
        Err(Error::unsupported("delete_node", &self.name))
    }

    async fn require_setup(&self) -> Result<bool> {
        Ok(false)
    }

    async fn get_wallets_and_identities(&self) -> Result<Vec<WalletAndIdentities>> {
        let mut by_wallet: BTreeMap<String, Vec<Identity>> = BTreeMap::new();
        for component in self.identity_components().await? {
            by_wallet
                .entry(component.wallet.clone())
                .or_default()
                .push(to_identity(&component));
        }

        let mut results = Vec::new();
        for (wallet_name, identities) in by_wallet {
            let wallet_dir = self.wallets_dir().join(&wallet_name);
            let wallet = discovery::wallet_entry(&self.name, &wallet_name, &wallet_dir).await?;

            let store = self.wallets.open(&wallet);
            let imported = reconcile_identities(store.as_ref(), &identities).await?;
            tracing::debug!(
                environment = %self.name,
                wallet = %wallet_name,
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
            entries.push(discovery::gateway_entry(&self.name, &gateways_dir, &gateway).await?);
        }
        Ok(entries)
    }

    async fn get_wallet_names(&self) -> Result<Vec<String>> {
        Ok(self
            .identity_components()
            .await?
            .into_iter()
            .map(|c| c.wallet)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    async fn get_identities(&self, wallet_name: &str) -> Result<Vec<Identity>> {
        Ok(self
            .identity_components()
            .await?
            .iter()
            .filter(|c| c.wallet == wallet_name)
            .map(to_identity)
            .collect())
    }

    async fn get_fabric_gateways(&self) -> Result<Vec<Gateway>> {
        let mut gateways = Vec::new();
        for component in self.client.components().await? {
            let Component::Gateway(gateway) = component else {
                continue;
            };
            let path = self.gateways_dir().join(format!("{}.json", gateway.id));
            let profile = serde_json::Value::Object(gateway.profile);
            self.cache_profile(&path, &profile).await?;
            gateways.push(Gateway {
                name: gateway.display_name,
                path,
                connection_profile: profile,
            });
        }
        Ok(gateways)
    }
}
