//! Typed events extracted from individual log lines.

use lnaudit_core::ReportKind;
use regex::{Captures, Regex};
use serde::Serialize;

const BANDWIDTH_FAILURE_PATTERN: &str =
    r"ChannelLink\(([^)]+)\): insufficient bandwidth to route htlc: (\d+) mSAT";
const REMOTE_FAILURE_PATTERN: &str = r"ChannelLink\(([^)]+)\): Failed to send (\d+) mSAT";
const WATCHTOWER_PEER_PATTERN: &str = r"WTWR: Accepted incoming peer .+@(.+):\d+";
const WTCLIENT_FAILURE_PATTERN: &str =
    r"WTCL: .+ unable to dial tower at any available Addresses:.+->(\S+?:\d+): (.+)";

/// An HTLC that a channel link could not forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingFailureEvent {
    pub channel_point: String,
    pub amount_msat: u64,
}

/// A peer that connected to the local watchtower server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerConnectEvent {
    /// Peer host, without the port.
    pub address: String,
}

/// The watchtower client failing to reach a tower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialFailureEvent {
    /// Tower `host:port`.
    pub address: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    RoutingFailure(RoutingFailureEvent),
    PeerConnect(PeerConnectEvent),
    DialFailure(DialFailureEvent),
}

impl AuditEvent {
    /// Identifier events are grouped by.
    pub fn correlation_key(&self) -> &str {
        match self {
            Self::RoutingFailure(event) => &event.channel_point,
            Self::PeerConnect(event) => &event.address,
            Self::DialFailure(event) => &event.address,
        }
    }
}

/// Matches lines against the single pattern of one report kind.
#[derive(Debug, Clone)]
pub struct EventExtractor {
    kind: ReportKind,
    pattern: Regex,
}

impl EventExtractor {
    pub fn new(kind: ReportKind) -> Result<Self, regex::Error> {
        let pattern = match kind {
            ReportKind::BandwidthFailures => BANDWIDTH_FAILURE_PATTERN,
            ReportKind::RemoteFailures => REMOTE_FAILURE_PATTERN,
            ReportKind::WatchtowerPeers => WATCHTOWER_PEER_PATTERN,
            ReportKind::WtclientFailures => WTCLIENT_FAILURE_PATTERN,
        };
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
        })
    }

    /// Returns the event on `line`, if any. Only the first match counts.
    pub fn extract(&self, line: &str) -> Option<AuditEvent> {
        let captures = self.pattern.captures(line)?;
        match self.kind {
            ReportKind::BandwidthFailures | ReportKind::RemoteFailures => {
                let amount = group(&captures, 2)?;
                let Ok(amount_msat) = amount.parse::<u64>() else {
                    tracing::debug!(amount, "ignoring routing failure with out-of-range amount");
                    return None;
                };
                Some(AuditEvent::RoutingFailure(RoutingFailureEvent {
                    channel_point: group(&captures, 1)?.to_string(),
                    amount_msat,
                }))
            }
            ReportKind::WatchtowerPeers => Some(AuditEvent::PeerConnect(PeerConnectEvent {
                address: group(&captures, 1)?.to_string(),
            })),
            ReportKind::WtclientFailures => Some(AuditEvent::DialFailure(DialFailureEvent {
                address: group(&captures, 1)?.to_string(),
                error: group(&captures, 2)?.to_string(),
            })),
        }
    }
}

fn group<'h>(captures: &Captures<'h>, index: usize) -> Option<&'h str> {
    captures.get(index).map(|matched| matched.as_str())
}
