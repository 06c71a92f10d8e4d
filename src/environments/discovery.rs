//! Discovery helpers shared by directory-backed and HTTP-backed environments

use std::path::{Path, PathBuf};

use crate::files::{self, CONFIG_FILE};
use crate::gateways::{GATEWAY_REGISTRY, Gateway, GatewayRegistryEntry};
use crate::nodes::Node;
use crate::registry::validate_name;
use crate::wallets::{Identity, WalletRegistryEntry};
use crate::Result;

/// Node together with the file it was read from
#[derive(Debug, Clone)]
pub(super) struct NodeFile {
    pub path: PathBuf,
    pub node: Node,
}

/// Load every node file under `nodes_dir`, keeping each file's path
pub(super) async fn load_node_files(nodes_dir: &Path) -> Result<Vec<NodeFile>> {
    let mut nodes = Vec::new();
    for path in files::collect_json_files(nodes_dir).await? {
        let content = tokio::fs::read(&path).await?;
        let node = Node::from_json(&content).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid node file");
        })?;
        nodes.push(NodeFile { path, node });
    }
    Ok(nodes)
}

/// Load every node file under `nodes_dir`
pub(super) async fn load_nodes(nodes_dir: &Path) -> Result<Vec<Node>> {
    Ok(load_node_files(nodes_dir)
        .await?
        .into_iter()
        .map(|file| file.node)
        .collect())
}

/// Identity files directly inside a wallet directory
pub(super) async fn read_identities(wallet_dir: &Path) -> Result<Vec<Identity>> {
    let mut identities = Vec::new();
    for path in files::list_json_files(wallet_dir).await? {
        identities.push(files::read_json::<Identity>(&path).await?);
    }
    Ok(identities)
}

/// Wallet entry for an environment-owned wallet directory
///
/// A `.config.json` sidecar in the directory is authoritative; otherwise an
/// entry is synthesized from the environment and wallet names.
pub(super) async fn wallet_entry(
    environment: &str,
    wallet_name: &str,
    wallet_dir: &Path,
) -> Result<WalletRegistryEntry> {
    let sidecar = wallet_dir.join(CONFIG_FILE);
    if tokio::fs::try_exists(&sidecar).await? {
        let mut entry: WalletRegistryEntry = files::read_json(&sidecar).await?;
        if entry.from_environment.is_none() {
            entry.from_environment = Some(environment.to_string());
        }
        tracing::debug!(path = %sidecar.display(), "using wallet config sidecar");
        return Ok(entry);
    }
    Ok(WalletRegistryEntry::derived(environment, wallet_name, wallet_dir))
}

/// Gateway entry for an environment-owned connection profile
///
/// A sidecar at `<gateways_dir>/<name>/.config.json` is authoritative.
pub(super) async fn gateway_entry(
    environment: &str,
    gateways_dir: &Path,
    gateway: &Gateway,
) -> Result<GatewayRegistryEntry> {
    if validate_name(GATEWAY_REGISTRY, &gateway.name).is_err() {
        tracing::debug!(gateway = %gateway.name, "gateway name is not a directory name, skipping sidecar");
        return Ok(GatewayRegistryEntry::derived(environment, gateway));
    }
    let sidecar = gateways_dir.join(&gateway.name).join(CONFIG_FILE);
    if tokio::fs::try_exists(&sidecar).await? {
        let mut entry: GatewayRegistryEntry = files::read_json(&sidecar).await?;
        if entry.from_environment.is_none() {
            entry.from_environment = Some(environment.to_string());
        }
        tracing::debug!(path = %sidecar.display(), "using gateway config sidecar");
        return Ok(entry);
    }
    Ok(GatewayRegistryEntry::derived(environment, gateway))
}

/// Connection profiles found recursively under `gateways_dir`
///
/// Gateways are named by the profile's `name` field, or the file stem when absent.
pub(super) async fn read_gateways(gateways_dir: &Path) -> Result<Vec<Gateway>> {
    let mut gateways = Vec::new();
    for path in files::collect_json_files(gateways_dir).await? {
        let profile: serde_json::Value = files::read_json(&path).await?;
        let name = profile
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(ToString::to_string)
            })
            .unwrap_or_default();
        gateways.push(Gateway {
            name,
            path,
            connection_profile: profile,
        });
    }
    Ok(gateways)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn node_files_keep_their_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Org1");
        std::fs::create_dir_all(&nested).unwrap();
        let peer = Node::peer("p", "peer0", "grpc://p0", None, None, "Org1MSP");
        std::fs::write(nested.join("peer0.json"), serde_json::to_vec(&peer).unwrap()).unwrap();

        let files = load_node_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, nested.join("peer0.json"));
        assert_eq!(files[0].node, peer);
    }

    #[tokio::test]
    async fn synthesizes_wallet_entry_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let wallet_dir = dir.path().join("wallets").join("Org1");

        let entry = wallet_entry("ansible", "Org1", &wallet_dir).await.unwrap();
        assert_eq!(entry.display_name.as_deref(), Some("ansible - Org1"));
        assert_eq!(entry.wallet_path, wallet_dir);
    }

    #[tokio::test]
    async fn sidecar_overrides_wallet_entry() {
        let dir = tempfile::tempdir().unwrap();
        let wallet_dir = dir.path().join("Org1");
        std::fs::create_dir_all(&wallet_dir).unwrap();
        std::fs::write(
            wallet_dir.join(CONFIG_FILE),
            r#"{"name":"Org1","walletPath":"/custom","displayName":"Custom Org1"}"#,
        )
        .unwrap();

        let entry = wallet_entry("ansible", "Org1", &wallet_dir).await.unwrap();
        assert_eq!(entry.display_name.as_deref(), Some("Custom Org1"));
        assert_eq!(entry.wallet_path, Path::new("/custom"));
        assert_eq!(entry.from_environment.as_deref(), Some("ansible"));
    }

    #[tokio::test]
    async fn escaping_gateway_name_skips_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let gateways_dir = dir.path().join("env").join("gateways");
        std::fs::create_dir_all(&gateways_dir).unwrap();
        std::fs::write(
            dir.path().join("env").join(CONFIG_FILE),
            r#"{"name":"outside","associatedWallet":"Org9","displayName":"Outside"}"#,
        )
        .unwrap();
        let gateway = Gateway {
            name: "..".to_string(),
            path: gateways_dir.join("g.json"),
            connection_profile: serde_json::json!({"name": "..", "wallet": "Org1"}),
        };

        let entry = gateway_entry("ansible", &gateways_dir, &gateway).await.unwrap();
        assert_eq!(entry.name, "..");
        assert_eq!(entry.from_environment.as_deref(), Some("ansible"));
        assert_ne!(entry.display_name.as_deref(), Some("Outside"));
    }

    #[tokio::test]
    async fn gateways_named_by_profile_or_stem() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("org2");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"name":"Org1 Gateway","wallet":"Org1"}"#).unwrap();
        std::fs::write(nested.join("org2gateway.json"), r#"{"version":"1.0"}"#).unwrap();

        let gateways = read_gateways(dir.path()).await.unwrap();
        let names: Vec<_> = gateways.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Org1 Gateway", "org2gateway"]);
        assert_eq!(gateways[0].wallet(), Some("Org1"));
    }
}
