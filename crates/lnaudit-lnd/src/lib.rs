//! lnd management API access and the channel metadata index built from it.

pub mod client;
pub mod index;

pub use client::{encode_hex, CredentialError, LndRestClient, LndRestConfig, MACAROON_HEADER};
pub use index::{
    ChannelMetadata, ChannelMetadataIndex, ChannelMetadataSource, ChannelSummary,
    MetadataFetchError,
};
