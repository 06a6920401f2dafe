use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::RunConfigError;

/// Enumerates the audit reports the tool can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    BandwidthFailures,
    RemoteFailures,
    WatchtowerPeers,
    WtclientFailures,
}

impl ReportKind {
    pub const ALL: [Self; 4] = [
        Self::BandwidthFailures,
        Self::RemoteFailures,
        Self::WatchtowerPeers,
        Self::WtclientFailures,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BandwidthFailures => "bandwidth-failures",
            Self::RemoteFailures => "remote-failures",
            Self::WatchtowerPeers => "watchtower-peers",
            Self::WtclientFailures => "wtclient-failures",
        }
    }

    /// Returns true when rows are keyed by channel and must be joined against
    /// the channel metadata index.
    pub fn requires_channel_metadata(self) -> bool {
        matches!(self, Self::BandwidthFailures | Self::RemoteFailures)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = RunConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw.trim())
            .ok_or_else(|| RunConfigError::UnknownReport(raw.to_string()))
    }
}
