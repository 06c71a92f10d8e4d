//! Identity reconciliation between environment exports and wallet stores

use super::store::WalletStore;
use super::types::{Identity, WalletIdentity};
use crate::Result;

/// Whether `stored` is the same identity as `candidate`
///
/// Identities match on name, MSP ID and the exact decoded certificate bytes.
#[must_use]
pub fn same_identity(stored: &WalletIdentity, candidate: &Identity, candidate_cert: &[u8]) -> bool {
    stored.name == candidate.name
        && stored.msp_id == candidate.msp_id
        && stored.cert.as_bytes() == candidate_cert
}

/// Select the candidates that have no matching identity in `existing`
///
/// # Errors
///
/// Returns an error if a candidate certificate is not valid base64
pub fn identities_to_import<'a>(
    existing: &[WalletIdentity],
    candidates: &'a [Identity],
) -> Result<Vec<&'a Identity>> {
    let mut missing = Vec::new();
    for candidate in candidates {
        let cert = candidate.decoded_cert()?;
        if !existing.iter().any(|stored| same_identity(stored, candidate, &cert)) {
            missing.push(candidate);
        }
    }
    Ok(missing)
}

/// Import every candidate the store does not already hold, returning how many were imported
///
/// # Errors
///
/// Returns an error if the store cannot be read, an identity cannot be decoded,
/// or an import fails
pub async fn reconcile_identities(store: &dyn WalletStore, candidates: &[Identity]) -> Result<usize> {
    let existing = store.get_identities().await?;
    let missing = identities_to_import(&existing, candidates)?;

    for identity in &missing {
        store.import_identity(&identity.to_wallet_identity()?).await?;
    }

    if !missing.is_empty() {
        tracing::debug!(count = missing.len(), "reconciled wallet identities");
    }
    Ok(missing.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    use super::*;

    #[derive(Default)]
    struct RecordingWallet {
        stored: Mutex<Vec<WalletIdentity>>,
        imports: Mutex<Vec<WalletIdentity>>,
    }

    #[async_trait]
    impl WalletStore for RecordingWallet {
        async fn import_identity(&self, identity: &WalletIdentity) -> Result<()> {
            self.imports.lock().unwrap().push(identity.clone());
            Ok(())
        }

        async fn exists(&self, name: &str) -> Result<bool> {
            Ok(self.stored.lock().unwrap().iter().any(|i| i.name == name))
        }

        async fn get_identities(&self) -> Result<Vec<WalletIdentity>> {
            Ok(self.stored.lock().unwrap().clone())
        }
    }

    fn exported(name: &str, cert: &str, msp_id: &str) -> Identity {
        Identity {
            name: name.to_string(),
            cert: STANDARD.encode(cert),
            private_key: STANDARD.encode("KEY"),
            msp_id: msp_id.to_string(),
        }
    }

    fn stored(name: &str, cert: &str, msp_id: &str) -> WalletIdentity {
        WalletIdentity {
            name: name.to_string(),
            msp_id: msp_id.to_string(),
            cert: cert.to_string(),
            private_key: "KEY".to_string(),
        }
    }

    #[tokio::test]
    async fn matching_identity_is_not_imported() {
        let wallet = RecordingWallet::default();
        wallet.stored.lock().unwrap().push(stored("admin", "CERT", "Org1MSP"));

        let imported = reconcile_identities(&wallet, &[exported("admin", "CERT", "Org1MSP")])
            .await
            .unwrap();

        assert_eq!(imported, 0);
        assert!(wallet.imports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn changed_cert_is_imported_once() {
        let wallet = RecordingWallet::default();
        wallet.stored.lock().unwrap().push(stored("admin", "CERT", "Org1MSP"));

        let imported = reconcile_identities(&wallet, &[exported("admin", "CERT2", "Org1MSP")])
            .await
            .unwrap();

        assert_eq!(imported, 1);
        let imports = wallet.imports.lock().unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].cert, "CERT2");
        assert_eq!(imports[0].private_key, "KEY");
    }

    #[test]
    fn msp_or_name_difference_requires_import() {
        let existing = vec![stored("admin", "CERT", "Org1MSP")];
        let candidates = vec![
            exported("admin", "CERT", "Org2MSP"),
            exported("user1", "CERT", "Org1MSP"),
            exported("admin", "CERT", "Org1MSP"),
        ];

        let missing = identities_to_import(&existing, &candidates).unwrap();
        let names: Vec<_> = missing.iter().map(|i| (i.name.as_str(), i.msp_id.as_str())).collect();
        assert_eq!(names, vec![("admin", "Org2MSP"), ("user1", "Org1MSP")]);
    }
}
