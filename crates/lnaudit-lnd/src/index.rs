//! Channel metadata index keyed by channel point.
//!
//! The index is built once per run from the node's channel list plus one
//! alias lookup per channel. A failed channel list aborts the build; a failed
//! alias lookup only leaves that channel without an alias. There is no
//! batching, so building costs one round trip per open channel.

use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Error returned when the management API cannot supply metadata.
#[derive(Debug, Error)]
pub enum MetadataFetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One open channel as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelSummary {
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub chan_id: u64,
    pub channel_point: String,
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub capacity: u64,
    #[serde(default)]
    pub remote_pubkey: String,
}

/// Read-only view of the management API needed to build the index.
pub trait ChannelMetadataSource {
    fn list_channels(&self) -> Result<Vec<ChannelSummary>, MetadataFetchError>;

    /// Returns the advertised alias of `pubkey`, or `None` when the node is
    /// not in the graph.
    fn node_alias(&self, pubkey: &str) -> Result<Option<String>, MetadataFetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelMetadata {
    pub channel_point: String,
    pub chan_id: u64,
    pub capacity_sat: u64,
    pub remote_pubkey: String,
    pub peer_alias: Option<String>,
}

impl ChannelMetadata {
    /// Peer alias, falling back to the channel point.
    pub fn display_name(&self) -> &str {
        self.peer_alias.as_deref().unwrap_or(&self.channel_point)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelMetadataIndex {
    channels: HashMap<String, ChannelMetadata>,
}

impl ChannelMetadataIndex {
    pub fn build(source: &dyn ChannelMetadataSource) -> Result<Self, MetadataFetchError> {
        let channels = source.list_channels()?;
        let mut index = HashMap::with_capacity(channels.len());
        for channel in channels {
            let peer_alias = match source.node_alias(&channel.remote_pubkey) {
                Ok(alias) => alias.filter(|alias| !alias.trim().is_empty()),
                Err(error) => {
                    tracing::warn!(
                        pubkey = %channel.remote_pubkey,
                        channel_point = %channel.channel_point,
                        %error,
                        "failed to look up peer alias; falling back to channel point"
                    );
                    None
                }
            };
            index.insert(
                channel.channel_point.clone(),
                ChannelMetadata {
                    channel_point: channel.channel_point,
                    chan_id: channel.chan_id,
                    capacity_sat: channel.capacity,
                    remote_pubkey: channel.remote_pubkey,
                    peer_alias,
                },
            );
        }
        Ok(Self { channels: index })
    }

    pub fn from_channels(channels: impl IntoIterator<Item = ChannelMetadata>) -> Self {
        Self {
            channels: channels
                .into_iter()
                .map(|channel| (channel.channel_point.clone(), channel))
                .collect(),
        }
    }

    pub fn get(&self, channel_point: &str) -> Option<&ChannelMetadata> {
        self.channels.get(channel_point)
    }

    pub fn contains(&self, channel_point: &str) -> bool {
        self.channels.contains_key(channel_point)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

// lnd encodes 64-bit integers as JSON strings.
fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawU64 {
        Number(u64),
        Text(String),
    }

    match RawU64::deserialize(deserializer)? {
        RawU64::Number(value) => Ok(value),
        RawU64::Text(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|error| D::Error::custom(format!("invalid integer '{raw}': {error}"))),
    }
}
