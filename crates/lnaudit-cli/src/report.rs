//! Report assembly: runs the scan for one report kind and turns the
//! aggregation into sorted rows joined against channel metadata.

use std::cmp::Reverse;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use lnaudit_core::{ReportKind, RunConfig};
use lnaudit_lnd::{ChannelMetadataIndex, LndRestClient, LndRestConfig};
use lnaudit_logs::{
    aggregate, scan_events, AggregateStat, Aggregation, AggregationMode, EventExtractor,
    OccurrenceKey, ReverseLogReader, ScanSummary,
};

const MSAT_PER_SAT: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingFailureRow {
    pub peer_alias: String,
    pub count: u64,
    pub total_sat: u64,
    pub average_sat: u64,
    pub min_sat: u64,
    pub max_sat: u64,
    pub capacity_sat: u64,
    pub chan_id: u64,
    pub channel_point: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerConnectionRow {
    pub peer: String,
    pub connections: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialFailureRow {
    pub address: String,
    pub error: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum ReportRows {
    RoutingFailures(Vec<RoutingFailureRow>),
    WatchtowerPeers(Vec<PeerConnectionRow>),
    DialFailures(Vec<DialFailureRow>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            Self::RoutingFailures(rows) => rows.len(),
            Self::WatchtowerPeers(rows) => rows.len(),
            Self::DialFailures(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The scan ran out of retained logs before reaching the cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionWarning {
    pub lookback_days: u32,
    pub oldest_timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub report: ReportKind,
    pub rows: ReportRows,
    pub retention_warning: Option<RetentionWarning>,
    pub scan: ScanSummary,
}

/// Fetches channel metadata from the lnd REST endpoint named by `config`.
pub fn load_channel_metadata(config: &RunConfig) -> Result<ChannelMetadataIndex> {
    let rest = LndRestConfig::from_run_config(config)?;
    let client = LndRestClient::new(rest)?;
    ChannelMetadataIndex::build(&client).context("failed to fetch channel list from lnd")
}

/// Scans the corpus for `config.report` and builds the report.
///
/// Routing reports need `metadata`; events for channels missing from it are
/// dropped. Peer reports ignore it.
pub fn run_audit(
    config: &RunConfig,
    metadata: Option<&ChannelMetadataIndex>,
) -> Result<AuditReport> {
    let extractor =
        EventExtractor::new(config.report).context("failed to compile event pattern")?;
    let mut reader =
        ReverseLogReader::open(config).context("failed to compile log timestamp pattern")?;

    let aggregation = if config.report.requires_channel_metadata() {
        let Some(index) = metadata else {
            bail!("{} requires channel metadata", config.report);
        };
        let is_attributable = |channel_point: &str| index.contains(channel_point);
        aggregate(
            scan_events(&mut reader, &extractor),
            AggregationMode::Stat {
                is_attributable: &is_attributable,
            },
        )
    } else {
        aggregate(
            scan_events(&mut reader, &extractor),
            AggregationMode::Occurrence,
        )
    };

    let scan = reader.summary().clone();
    let rows = build_rows(config.report, aggregation, metadata);
    let retention_warning = scan.exhausted.then(|| RetentionWarning {
        lookback_days: config.lookback_days,
        oldest_timestamp: scan.oldest_timestamp,
    });
    Ok(AuditReport {
        report: config.report,
        rows,
        retention_warning,
        scan,
    })
}

fn build_rows(
    report: ReportKind,
    aggregation: Aggregation,
    metadata: Option<&ChannelMetadataIndex>,
) -> ReportRows {
    match (report, aggregation) {
        (_, Aggregation::Stats(stats)) => {
            let mut rows = stats
                .into_iter()
                .filter_map(|(channel_point, stat)| {
                    let channel = metadata?.get(&channel_point)?;
                    Some(routing_row(
                        channel.display_name().to_string(),
                        channel.capacity_sat,
                        channel.chan_id,
                        channel_point,
                        stat,
                    ))
                })
                .collect::<Vec<_>>();
            rows.sort_by(|left, right| {
                (Reverse(left.count), &left.peer_alias, &left.channel_point).cmp(&(
                    Reverse(right.count),
                    &right.peer_alias,
                    &right.channel_point,
                ))
            });
            ReportRows::RoutingFailures(rows)
        }
        (ReportKind::WtclientFailures, Aggregation::Occurrences(counts)) => {
            let mut rows = counts
                .into_iter()
                .map(|(OccurrenceKey { key, detail }, count)| DialFailureRow {
                    address: key,
                    error: detail.unwrap_or_default(),
                    count,
                })
                .collect::<Vec<_>>();
            rows.sort_by(|left, right| {
                (Reverse(left.count), &left.address, &left.error).cmp(&(
                    Reverse(right.count),
                    &right.address,
                    &right.error,
                ))
            });
            ReportRows::DialFailures(rows)
        }
        (_, Aggregation::Occurrences(counts)) => {
            let mut rows = counts
                .into_iter()
                .map(|(OccurrenceKey { key, .. }, connections)| PeerConnectionRow {
                    peer: key,
                    connections,
                })
                .collect::<Vec<_>>();
            rows.sort_by(|left, right| {
                (Reverse(left.connections), &left.peer)
                    .cmp(&(Reverse(right.connections), &right.peer))
            });
            ReportRows::WatchtowerPeers(rows)
        }
    }
}

fn routing_row(
    peer_alias: String,
    capacity_sat: u64,
    chan_id: u64,
    channel_point: String,
    stat: AggregateStat,
) -> RoutingFailureRow {
    let total_sat = stat.total_msat / MSAT_PER_SAT;
    RoutingFailureRow {
        peer_alias,
        count: stat.count,
        total_sat,
        average_sat: total_sat.checked_div(stat.count).unwrap_or(0),
        min_sat: stat.min_msat().unwrap_or(0) / MSAT_PER_SAT,
        max_sat: stat.max_msat().unwrap_or(0) / MSAT_PER_SAT,
        capacity_sat,
        chan_id,
        channel_point,
    }
}
