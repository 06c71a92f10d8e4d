//! Wallet registry and identity types

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::registry::RegistryEntry;
use crate::{Error, Result};

/// A wallet known to the registry, either stored directly or derived from an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRegistryEntry {
    pub name: String,
    pub wallet_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub managed_wallet: bool,
    /// Owning environment for derived entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_environment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_groups: Vec<String>,
}

impl WalletRegistryEntry {
    /// Entry for a wallet stored directly in the registry
    #[must_use]
    pub fn new(name: impl Into<String>, wallet_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            wallet_path: wallet_path.into(),
            display_name: None,
            managed_wallet: false,
            from_environment: None,
            environment_groups: Vec::new(),
        }
    }

    /// Entry derived from a wallet directory owned by an environment
    #[must_use]
    pub fn derived(environment: &str, name: &str, wallet_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            wallet_path: wallet_path.into(),
            display_name: Some(format!("{environment} - {name}")),
            managed_wallet: false,
            from_environment: Some(environment.to_string()),
            environment_groups: vec![environment.to_string()],
        }
    }

    /// Display name, falling back to the name
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl RegistryEntry for WalletRegistryEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Identity as exported by an environment: base64 certificate and key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub cert: String,
    pub private_key: String,
    pub msp_id: String,
}

impl Identity {
    /// Decoded certificate bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate is not valid base64
    pub fn decoded_cert(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(self.cert.trim())?)
    }

    /// Decode into the form stored by wallet stores
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate or key is not base64-encoded UTF-8 text
    pub fn to_wallet_identity(&self) -> Result<WalletIdentity> {
        let cert = pem_text(&self.name, "cert", self.decoded_cert()?)?;
        let private_key = pem_text(
            &self.name,
            "private_key",
            STANDARD.decode(self.private_key.trim())?,
        )?;
        Ok(WalletIdentity {
            name: self.name.clone(),
            msp_id: self.msp_id.clone(),
            cert,
            private_key,
        })
    }
}

fn pem_text(identity: &str, field: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| {
        Error::Validation(format!(
            "identity \"{identity}\" has a non-text \"{field}\""
        ))
    })
}

/// Identity as held inside a wallet store: PEM certificate and key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    pub name: String,
    pub msp_id: String,
    pub cert: String,
    pub private_key: String,
}

/// A wallet entry together with the identities it was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletAndIdentities {
    pub wallet: WalletRegistryEntry,
    pub identities: Vec<Identity>,
}
