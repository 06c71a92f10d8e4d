//! Wallet stores holding imported identities

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{WalletIdentity, WalletRegistryEntry};
use crate::{Result, files};

/// A named store of identities usable for signing
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Store an identity, replacing any identity with the same name
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be written
    async fn import_identity(&self, identity: &WalletIdentity) -> Result<()>;

    /// Whether an identity named `name` is stored
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Every identity in the store
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    async fn get_identities(&self) -> Result<Vec<WalletIdentity>>;
}

/// Opens the wallet store behind a registry entry
pub trait WalletProvider: Send + Sync {
    /// Open the store for `entry`
    fn open(&self, entry: &WalletRegistryEntry) -> Arc<dyn WalletStore>;
}

/// Provider of [`FileSystemWallet`] stores at each entry's `walletPath`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemWalletProvider;

impl WalletProvider for FileSystemWalletProvider {
    fn open(&self, entry: &WalletRegistryEntry) -> Arc<dyn WalletStore> {
        Arc::new(FileSystemWallet::new(&entry.wallet_path))
    }
}

/// Wallet storing one `<name>.id` file per identity
#[derive(Debug, Clone)]
pub struct FileSystemWallet {
    dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityFile {
    credentials: Credentials,
    msp_id: String,
    #[serde(rename = "type")]
    kind: String,
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Credentials {
    certificate: String,
    private_key: String,
}

const IDENTITY_EXTENSION: &str = "id";

impl FileSystemWallet {
    /// Wallet rooted at `dir`; the directory is created on first import
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn identity_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{IDENTITY_EXTENSION}"))
    }
}

#[async_trait]
impl WalletStore for FileSystemWallet {
    async fn import_identity(&self, identity: &WalletIdentity) -> Result<()> {
        let file = IdentityFile {
            credentials: Credentials {
                certificate: identity.cert.clone(),
                private_key: identity.private_key.clone(),
            },
            msp_id: identity.msp_id.clone(),
            kind: "X.509".to_string(),
            version: 1,
        };
        files::write_json(&self.identity_path(&identity.name), &file).await?;
        tracing::info!(
            wallet = %self.dir.display(),
            identity = %identity.name,
            "imported identity"
        );
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.identity_path(name)).await?)
    }

    async fn get_identities(&self) -> Result<Vec<WalletIdentity>> {
        let mut identities = Vec::new();
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(identities);
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == IDENTITY_EXTENSION) && !files::is_hidden(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let file: IdentityFile = files::read_json(&path).await?;
            identities.push(WalletIdentity {
                name: name.to_string(),
                msp_id: file.msp_id,
                cert: file.credentials.certificate,
                private_key: file.credentials.private_key,
            });
        }
        Ok(identities)
    }
}
