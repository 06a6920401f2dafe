use std::{io::Write, path::Path};

use chrono::NaiveDateTime;
use flate2::{write::GzEncoder, Compression};
use httpmock::prelude::*;
use lnaudit_cli::{render_table, run_audit, ReportRows};
use lnaudit_core::{
    OutputFormat, ReportKind, RotationOrder, RunConfig, TimeCutoff, LOG_TIMESTAMP_FORMAT,
};
use lnaudit_lnd::{ChannelMetadataIndex, LndRestClient, LndRestConfig};
use lnaudit_logs::rotated_archive_path;
use serde_json::json;

const NOW: &str = "2024-06-10 12:00:00";

fn timestamp(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, LOG_TIMESTAMP_FORMAT).expect("timestamp")
}

fn run_config(
    dir: &Path,
    report: ReportKind,
    days: u32,
    rotation_order: RotationOrder,
) -> RunConfig {
    RunConfig {
        report,
        lookback_days: days,
        window: TimeCutoff::from_lookback_days(timestamp(NOW), days).expect("cutoff"),
        log_dir: dir.to_path_buf(),
        log_file_name: "lnd.log".to_string(),
        rotation_order,
        rest_server: "localhost:8080".to_string(),
        tls_cert_path: dir.join("tls.cert"),
        macaroon_path: dir.join("admin.macaroon"),
        output: OutputFormat::Table,
    }
}

fn log_body(lines: &[&str]) -> Vec<u8> {
    lines
        .iter()
        .map(|line| format!("{line}\n"))
        .collect::<String>()
        .into_bytes()
}

fn write_primary(dir: &Path, lines: &[&str]) {
    std::fs::write(dir.join("lnd.log"), log_body(lines)).expect("write primary");
}

fn write_archive(dir: &Path, index: u64, lines: &[&str]) {
    let file = std::fs::File::create(rotated_archive_path(dir, "lnd.log", index))
        .expect("create archive");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(&log_body(lines)).expect("write archive");
    encoder.finish().expect("finish archive");
}

fn bandwidth(timestamp: &str, channel_point: &str, amount_msat: u64) -> String {
    format!(
        "{timestamp}.512 [WRN] HSWC: ChannelLink({channel_point}): insufficient bandwidth to route htlc: {amount_msat} mSAT is larger than 0 mSAT"
    )
}

fn mock_lnd(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/v1/channels")
            .header("grpc-metadata-macaroon", "abcd");
        then.status(200).json_body(json!({
            "channels": [{
                "chan_id": "870000000000000001",
                "channel_point": "fundingtx:1",
                "capacity": "250000",
                "remote_pubkey": "02peer"
            }]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/graph/node/02peer");
        then.status(200)
            .json_body(json!({"node": {"alias": "RoutingPeer", "pub_key": "02peer"}}));
    });
}

fn metadata_from(server: &MockServer) -> ChannelMetadataIndex {
    let client = LndRestClient::new(LndRestConfig {
        base_url: server.base_url(),
        macaroon_hex: "abcd".to_string(),
        trust_anchor_pem: None,
    })
    .expect("client");
    ChannelMetadataIndex::build(&client).expect("metadata")
}

#[test]
fn integration_bandwidth_report_spans_archives_and_stops_at_cutoff() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    write_archive(
        dir,
        1,
        &[
            &bandwidth("2024-06-05 10:00:00", "fundingtx:1", 9_000_000),
            &bandwidth("2024-06-07 13:00:00", "fundingtx:1", 4_000),
        ],
    );
    write_archive(
        dir,
        2,
        &[
            &bandwidth("2024-06-08 09:00:00", "unlisted:0", 2_000),
            &bandwidth("2024-06-08 10:00:00", "fundingtx:1", 1_500),
            "    goroutine trace continuation",
        ],
    );
    write_primary(
        dir,
        &[
            &bandwidth("2024-06-09 08:00:00", "fundingtx:1", 2_500),
            "2024-06-09 25:61:00.000 [WRN] HSWC: clock went sideways",
        ],
    );

    let server = MockServer::start();
    mock_lnd(&server);
    let metadata = metadata_from(&server);

    let report = run_audit(
        &run_config(dir, ReportKind::BandwidthFailures, 3, RotationOrder::HigherIsNewer),
        Some(&metadata),
    )
    .expect("report");

    let ReportRows::RoutingFailures(rows) = &report.rows else {
        panic!("expected routing rows");
    };
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.peer_alias, "RoutingPeer");
    assert_eq!(row.count, 3);
    assert_eq!(row.total_sat, 8);
    assert_eq!(row.average_sat, 2);
    assert_eq!(row.min_sat, 1);
    assert_eq!(row.max_sat, 4);
    assert_eq!(row.capacity_sat, 250_000);
    assert_eq!(row.chan_id, 870_000_000_000_000_001);
    assert_eq!(report.retention_warning, None);
    assert_eq!(report.scan.segments_read, 3);
    assert_eq!(report.scan.malformed_lines, 1);

    let table = render_table(&report);
    assert!(table.contains("RoutingPeer"));
    assert!(table.contains("250,000"));
}

#[test]
fn integration_short_retention_raises_warning_for_peer_report() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    write_archive(
        dir,
        1,
        &["2024-06-01 06:00:00.000 [INF] WTWR: Accepted incoming peer 02aa@198.51.100.7:41000"],
    );
    write_primary(
        dir,
        &[
            "2024-06-05 06:00:00.000 [INF] WTWR: Accepted incoming peer 03bb@203.0.113.9:41001",
            "2024-06-09 06:00:00.000 [INF] WTWR: Accepted incoming peer 02aa@198.51.100.7:41002",
        ],
    );

    let report = run_audit(
        &run_config(dir, ReportKind::WatchtowerPeers, 30, RotationOrder::HigherIsNewer),
        None,
    )
    .expect("report");

    let warning = report.retention_warning.as_ref().expect("warning");
    assert_eq!(warning.lookback_days, 30);
    assert_eq!(
        warning.oldest_timestamp,
        Some(timestamp("2024-06-01 06:00:00"))
    );
    let ReportRows::WatchtowerPeers(rows) = &report.rows else {
        panic!("expected peer rows");
    };
    assert_eq!(rows[0].peer, "198.51.100.7");
    assert_eq!(rows[0].connections, 2);
    assert_eq!(rows[1].peer, "203.0.113.9");
}

#[test]
fn integration_lower_is_newer_rotation_reads_low_indices_first() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    let dial = |timestamp: &str, error: &str| {
        format!(
            "{timestamp}.000 [ERR] WTCL: (legacy) unable to dial tower at any available Addresses: 03fe@10.0.0.5:9911->10.0.0.5:9911: {error}"
        )
    };
    write_archive(dir, 1, &[&dial("2024-06-09 06:00:00", "i/o timeout")]);
    write_archive(dir, 2, &[&dial("2024-06-01 06:00:00", "connection refused")]);
    write_primary(dir, &[&dial("2024-06-10 06:00:00", "i/o timeout")]);

    let report = run_audit(
        &run_config(dir, ReportKind::WtclientFailures, 2, RotationOrder::LowerIsNewer),
        None,
    )
    .expect("report");

    let ReportRows::DialFailures(rows) = &report.rows else {
        panic!("expected dial rows");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].address, "10.0.0.5:9911");
    assert_eq!(rows[0].error, "i/o timeout");
    assert_eq!(rows[0].count, 2);
    assert_eq!(report.retention_warning, None);
}

#[test]
fn integration_repeated_runs_over_unchanged_corpus_are_identical() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();
    write_primary(
        dir,
        &[
            &bandwidth("2024-06-10 09:00:00", "fundingtx:1", 12_000),
            &bandwidth("2024-06-10 10:00:00", "fundingtx:1", 3_000),
        ],
    );
    let server = MockServer::start();
    mock_lnd(&server);
    let metadata = metadata_from(&server);
    let config = run_config(dir, ReportKind::BandwidthFailures, 1, RotationOrder::HigherIsNewer);

    let first = run_audit(&config, Some(&metadata)).expect("first");
    let second = run_audit(&config, Some(&metadata)).expect("second");
    assert_eq!(first, second);
    assert_eq!(render_table(&first), render_table(&second));
}
