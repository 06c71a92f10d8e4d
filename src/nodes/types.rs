//! Node descriptor types

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Role of a network node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Ledger-hosting peer
    #[serde(rename = "fabric-peer")]
    Peer,
    /// Ordering service node
    #[serde(rename = "fabric-orderer")]
    Orderer,
    /// Certificate authority
    #[serde(rename = "fabric-ca")]
    CertificateAuthority,
    /// `CouchDB` state database
    #[serde(rename = "couchdb")]
    CouchDb,
}

impl NodeType {
    /// Wire tag used in node files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Peer => "fabric-peer",
            Self::Orderer => "fabric-orderer",
            Self::CertificateAuthority => "fabric-ca",
            Self::CouchDb => "couchdb",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network node as stored in `nodes/**/*.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub short_name: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub api_url: String,
    /// Client options passed through to the network client (TLS overrides etc)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_options: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chaincode_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_root_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msp_id: Option<String>,
    /// Orderers sharing a cluster name share one admin identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl Node {
    fn base(name: &str, node_type: NodeType, api_url: &str) -> Self {
        Self {
            short_name: name.to_string(),
            name: name.to_string(),
            display_name: None,
            node_type,
            api_url: api_url.to_string(),
            api_options: None,
            chaincode_url: None,
            ca_name: None,
            pem: None,
            tls_ca_root_cert: None,
            wallet: None,
            identity: None,
            msp_id: None,
            cluster_name: None,
            hidden: false,
        }
    }

    /// Create a peer node
    #[must_use]
    pub fn peer(
        short_name: &str,
        name: &str,
        api_url: &str,
        wallet: Option<&str>,
        identity: Option<&str>,
        msp_id: &str,
    ) -> Self {
        Self {
            short_name: short_name.to_string(),
            wallet: wallet.map(ToString::to_string),
            identity: identity.map(ToString::to_string),
            msp_id: Some(msp_id.to_string()),
            ..Self::base(name, NodeType::Peer, api_url)
        }
    }

    /// Create an orderer node
    #[must_use]
    pub fn orderer(
        short_name: &str,
        name: &str,
        api_url: &str,
        wallet: Option<&str>,
        identity: Option<&str>,
        msp_id: &str,
        cluster_name: Option<&str>,
    ) -> Self {
        Self {
            short_name: short_name.to_string(),
            wallet: wallet.map(ToString::to_string),
            identity: identity.map(ToString::to_string),
            msp_id: Some(msp_id.to_string()),
            cluster_name: cluster_name.map(ToString::to_string),
            ..Self::base(name, NodeType::Orderer, api_url)
        }
    }

    /// Create a certificate authority node
    #[must_use]
    pub fn certificate_authority(
        short_name: &str,
        name: &str,
        api_url: &str,
        ca_name: &str,
        wallet: Option<&str>,
        identity: Option<&str>,
        msp_id: Option<&str>,
    ) -> Self {
        Self {
            short_name: short_name.to_string(),
            ca_name: Some(ca_name.to_string()),
            wallet: wallet.map(ToString::to_string),
            identity: identity.map(ToString::to_string),
            msp_id: msp_id.map(ToString::to_string),
            ..Self::base(name, NodeType::CertificateAuthority, api_url)
        }
    }

    /// Create a `CouchDB` node
    #[must_use]
    pub fn couchdb(short_name: &str, name: &str, api_url: &str) -> Self {
        Self {
            short_name: short_name.to_string(),
            ..Self::base(name, NodeType::CouchDb, api_url)
        }
    }

    /// Parse a node from raw JSON and validate required fields
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` naming the missing field, or a serialization error
    /// if the document is not a node
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if value.get("type").is_none_or(serde_json::Value::is_null) {
            let name = value
                .get("name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<unnamed>");
            return Err(Error::Validation(format!(
                "node \"{name}\" is missing required field \"type\""
            )));
        }
        for field in ["name", "api_url"] {
            if value.get(field).is_none_or(serde_json::Value::is_null) {
                return Err(Error::Validation(format!(
                    "{} node is missing required field \"{field}\"",
                    value["type"].as_str().unwrap_or("unknown")
                )));
            }
        }

        let mut node: Self = serde_json::from_value(value)?;
        if node.short_name.is_empty() {
            node.short_name.clone_from(&node.name);
        }
        node.validate()?;
        Ok(node)
    }

    /// Check that type-specific required fields are present
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` naming the missing field and node type
    pub fn validate(&self) -> Result<()> {
        let missing = |field: &str| {
            Err(Error::Validation(format!(
                "{} node \"{}\" is missing required field \"{field}\"",
                self.node_type, self.name
            )))
        };

        if self.name.is_empty() {
            return missing("name");
        }
        if self.api_url.is_empty() {
            return missing("api_url");
        }
        match self.node_type {
            NodeType::Peer | NodeType::Orderer if is_blank(self.msp_id.as_deref()) => {
                missing("msp_id")
            }
            NodeType::CertificateAuthority if is_blank(self.ca_name.as_deref()) => {
                missing("ca_name")
            }
            _ => Ok(()),
        }
    }

    /// Whether the node has both a wallet and an identity associated
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !is_blank(self.wallet.as_deref()) && !is_blank(self.identity.as_deref())
    }

    /// Cluster this node belongs to, if it is a clustered orderer
    #[must_use]
    pub fn orderer_cluster(&self) -> Option<&str> {
        if self.node_type != NodeType::Orderer {
            return None;
        }
        self.cluster_name.as_deref().filter(|c| !c.is_empty())
    }

    /// File name used to persist this node
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}
