//! Client for the Microfab component directory
//!
//! Read-only access to `/ak/api/v1/components` and `/ak/api/v1/health`.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

const COMPONENTS_PATH: &str = "ak/api/v1/components";
const HEALTH_PATH: &str = "ak/api/v1/health";

/// Component listed by Microfab, distinguished by its `type` tag
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    #[serde(rename = "identity")]
    Identity(IdentityComponent),
    #[serde(rename = "fabric-peer")]
    Peer(NodeComponent),
    #[serde(rename = "fabric-orderer")]
    Orderer(NodeComponent),
    #[serde(rename = "fabric-ca")]
    CertificateAuthority(CaComponent),
    #[serde(rename = "gateway")]
    Gateway(GatewayComponent),
    /// Component types this registry does not model
    #[serde(other)]
    Unknown,
}

/// Exported identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityComponent {
    pub id: String,
    pub display_name: String,
    pub cert: String,
    pub private_key: String,
    pub msp_id: String,
    pub wallet: String,
}

/// Peer or orderer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeComponent {
    pub id: String,
    pub display_name: String,
    pub api_url: String,
    #[serde(default)]
    pub api_options: Option<serde_json::Value>,
    #[serde(default)]
    pub chaincode_url: Option<String>,
    pub msp_id: String,
    pub wallet: String,
    pub identity: String,
}

/// Certificate authority
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaComponent {
    pub id: String,
    pub display_name: String,
    pub api_url: String,
    #[serde(default)]
    pub api_options: Option<serde_json::Value>,
    #[serde(default)]
    pub ca_name: Option<String>,
    #[serde(default)]
    pub msp_id: Option<String>,
    pub wallet: String,
    pub identity: String,
}

/// Gateway whose remaining fields form the connection profile
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayComponent {
    pub id: String,
    pub display_name: String,
    #[serde(flatten)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

/// HTTP client for one Microfab instance
#[derive(Debug, Clone)]
pub struct MicrofabClient {
    client: Client,
    base_url: Url,
}

impl MicrofabClient {
    /// Client for the instance at `base_url`, sharing `client`'s connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    /// Base URL of the instance
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Every component the instance exposes
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid
    pub async fn components(&self) -> Result<Vec<Component>> {
        let url = self.base_url.join(COMPONENTS_PATH)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "Microfab components request failed: {status} - {body}"
            )));
        }

        Ok(response.json().await?)
    }

    /// A single component by ID
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown ID, or an error if the request fails
    pub async fn component(&self, id: &str) -> Result<Component> {
        let url = self.base_url.join(&format!("{COMPONENTS_PATH}/{id}"))?;
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found("components", id, None));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "Microfab component request failed: {status} - {body}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Whether the instance answers its health check
    pub async fn is_alive(&self) -> bool {
        let Ok(url) = self.base_url.join(HEALTH_PATH) else {
            return false;
        };
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %self.base_url, error = %e, "microfab health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_components() {
        let json = serde_json::json!([
            {
                "id": "org1admin",
                "display_name": "Org1 Admin",
                "type": "identity",
                "cert": "Q0VSVA==",
                "private_key": "S0VZ",
                "ca": "Q0E=",
                "msp_id": "Org1MSP",
                "wallet": "Org1",
                "hide": false
            },
            {
                "id": "org1peer",
                "display_name": "Org1 Peer",
                "type": "fabric-peer",
                "api_url": "http://org1peer-api.127-0-0-1.nip.io:8080",
                "api_options": {"grpc.default_authority": "org1peer-api.127-0-0-1.nip.io:8080"},
                "chaincode_url": "http://org1peer-chaincode.127-0-0-1.nip.io:8080",
                "msp_id": "Org1MSP",
                "wallet": "Org1",
                "identity": "Org1 Admin"
            },
            {
                "id": "org1gateway",
                "display_name": "Org1 Gateway",
                "type": "gateway",
                "name": "Org1 Gateway",
                "version": "1.0",
                "wallet": "Org1",
                "client": {"organization": "Org1"}
            },
            {
                "id": "couchdb",
                "display_name": "CouchDB",
                "type": "couchdb"
            }
        ]);

        let components: Vec<Component> = serde_json::from_value(json).unwrap();
        assert_eq!(components.len(), 4);
        assert!(matches!(&components[0], Component::Identity(i) if i.wallet == "Org1"));
        assert!(matches!(&components[1], Component::Peer(p) if p.identity == "Org1 Admin"));
        let Component::Gateway(gateway) = &components[2] else {
            panic!("expected gateway");
        };
        assert_eq!(gateway.profile["wallet"], "Org1");
        assert!(gateway.profile.get("id").is_none());
        assert!(gateway.profile.get("type").is_none());
        assert_eq!(components[3], Component::Unknown);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = MicrofabClient::new(Client::new(), "http://console.127-0-0-1.nip.io:8080/prefix").unwrap();
        assert_eq!(client.base_url().as_str(), "http://console.127-0-0-1.nip.io:8080/prefix/");
    }
}
