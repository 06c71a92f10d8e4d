//! Gateway registry and connection profile types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryEntry;

/// Where transaction data for a smart contract on a channel is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDataDirectory {
    pub chaincode_name: String,
    pub channel_name: String,
    pub transaction_data_path: PathBuf,
}

/// A gateway known to the registry, either stored directly or derived from an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRegistryEntry {
    pub name: String,
    #[serde(default)]
    pub connection_profile_path: PathBuf,
    #[serde(default)]
    pub associated_wallet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Owning environment for derived entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transaction_data_directories: Vec<TransactionDataDirectory>,
}

impl GatewayRegistryEntry {
    /// Entry for a gateway stored directly in the registry
    #[must_use]
    pub fn new(name: impl Into<String>, associated_wallet: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection_profile_path: PathBuf::new(),
            associated_wallet: associated_wallet.into(),
            display_name: None,
            from_environment: None,
            environment_group: None,
            transaction_data_directories: Vec::new(),
        }
    }

    /// Entry derived from a connection profile owned by an environment
    #[must_use]
    pub fn derived(environment: &str, gateway: &Gateway) -> Self {
        Self {
            name: gateway.name.clone(),
            connection_profile_path: gateway.path.clone(),
            associated_wallet: gateway.wallet().unwrap_or_default().to_string(),
            display_name: Some(format!("{environment} - {}", gateway.name)),
            from_environment: Some(environment.to_string()),
            environment_group: Some(environment.to_string()),
            transaction_data_directories: Vec::new(),
        }
    }

    /// Display name, falling back to the name
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl RegistryEntry for GatewayRegistryEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A connection profile and where it is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub name: String,
    pub path: PathBuf,
    pub connection_profile: serde_json::Value,
}

impl Gateway {
    /// Wallet named by the profile, if any
    #[must_use]
    pub fn wallet(&self) -> Option<&str> {
        self.connection_profile
            .get("wallet")
            .and_then(serde_json::Value::as_str)
    }
}
