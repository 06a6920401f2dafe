use std::fmt::Write as _;
use std::path::PathBuf;

use lnaudit_core::RunConfig;
use reqwest::blocking::Client;
use reqwest::Certificate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::index::{ChannelMetadataSource, ChannelSummary, MetadataFetchError};

/// Header carrying the hex-encoded macaroon on every REST call.
pub const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";
const ERROR_BODY_PREVIEW_CHARS: usize = 240;

/// Error returned when client credentials or transport settings are unusable.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read macaroon {}: {source}", .path.display())]
    Macaroon {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read tls certificate {}: {source}", .path.display())]
    TrustAnchorUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tls certificate: {source}")]
    TrustAnchor {
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build lnd rest client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Connection settings for the lnd REST endpoint.
#[derive(Debug, Clone)]
pub struct LndRestConfig {
    pub base_url: String,
    pub macaroon_hex: String,
    /// PEM certificate the server must chain to. `None` keeps the default
    /// trust store, which only suits plain-http test servers.
    pub trust_anchor_pem: Option<Vec<u8>>,
}

impl LndRestConfig {
    /// Loads the macaroon and TLS certificate named by `config`.
    pub fn from_run_config(config: &RunConfig) -> Result<Self, CredentialError> {
        let macaroon =
            std::fs::read(&config.macaroon_path).map_err(|source| CredentialError::Macaroon {
                path: config.macaroon_path.clone(),
                source,
            })?;
        let trust_anchor = std::fs::read(&config.tls_cert_path).map_err(|source| {
            CredentialError::TrustAnchorUnreadable {
                path: config.tls_cert_path.clone(),
                source,
            }
        })?;
        Ok(Self {
            base_url: config.rest_base_url(),
            macaroon_hex: encode_hex(&macaroon),
            trust_anchor_pem: Some(trust_anchor),
        })
    }
}

/// Lowercase hex encoding.
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

#[derive(Debug, Deserialize)]
struct ListChannelsResponse {
    #[serde(default)]
    channels: Vec<ChannelSummary>,
}

#[derive(Debug, Deserialize)]
struct NodeInfoResponse {
    node: Option<LightningNode>,
}

#[derive(Debug, Deserialize)]
struct LightningNode {
    #[serde(default)]
    alias: String,
}

/// Blocking client for the two read-only lnd REST calls the audit needs.
#[derive(Debug, Clone)]
pub struct LndRestClient {
    http: Client,
    base_url: String,
    macaroon_hex: String,
}

impl LndRestClient {
    pub fn new(config: LndRestConfig) -> Result<Self, CredentialError> {
        let mut builder = Client::builder();
        if let Some(pem) = config.trust_anchor_pem.as_deref() {
            let certificate = Certificate::from_pem(pem)
                .map_err(|source| CredentialError::TrustAnchor { source })?;
            builder = builder.add_root_certificate(certificate);
        }
        let http = builder
            .build()
            .map_err(|source| CredentialError::ClientBuild { source })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            macaroon_hex: config.macaroon_hex,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MetadataFetchError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(MACAROON_HEADER, &self.macaroon_hex)
            .send()
            .map_err(|source| MetadataFetchError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|source| MetadataFetchError::Transport {
                url: url.clone(),
                source,
            })?;
        if !status.is_success() {
            return Err(MetadataFetchError::Status {
                url,
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            });
        }
        serde_json::from_str(&body).map_err(|source| MetadataFetchError::Decode { url, source })
    }
}

impl ChannelMetadataSource for LndRestClient {
    fn list_channels(&self) -> Result<Vec<ChannelSummary>, MetadataFetchError> {
        let response: ListChannelsResponse = self.get_json("/v1/channels")?;
        Ok(response.channels)
    }

    fn node_alias(&self, pubkey: &str) -> Result<Option<String>, MetadataFetchError> {
        let response: NodeInfoResponse = self.get_json(&format!("/v1/graph/node/{pubkey}"))?;
        Ok(response.node.map(|node| node.alias))
    }
}
