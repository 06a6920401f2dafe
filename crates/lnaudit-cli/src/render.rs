use comfy_table::presets::ASCII_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use serde_json::json;

use crate::report::{AuditReport, ReportRows, RetentionWarning};

type ColumnSpec = (&'static str, CellAlignment);

const ROUTING_COLUMNS: &[ColumnSpec] = &[
    ("Peer alias", CellAlignment::Left),
    ("Count", CellAlignment::Right),
    ("Total sats", CellAlignment::Right),
    ("Average tx", CellAlignment::Right),
    ("Min tx", CellAlignment::Right),
    ("Max tx", CellAlignment::Right),
    ("Capacity", CellAlignment::Right),
    ("Channel ID", CellAlignment::Center),
];
const PEER_COLUMNS: &[ColumnSpec] = &[
    ("Peer", CellAlignment::Left),
    ("Connections", CellAlignment::Right),
];
const DIAL_COLUMNS: &[ColumnSpec] = &[
    ("Address", CellAlignment::Left),
    ("Error", CellAlignment::Left),
    ("Count", CellAlignment::Right),
];

/// Renders the report as an ASCII table framed by blank lines.
pub fn render_table(report: &AuditReport) -> String {
    let (columns, rows): (&[ColumnSpec], Vec<Vec<String>>) = match &report.rows {
        ReportRows::RoutingFailures(rows) => (
            ROUTING_COLUMNS,
            rows.iter()
                .map(|row| {
                    vec![
                        row.peer_alias.clone(),
                        group_thousands(row.count),
                        group_thousands(row.total_sat),
                        group_thousands(row.average_sat),
                        group_thousands(row.min_sat),
                        group_thousands(row.max_sat),
                        group_thousands(row.capacity_sat),
                        row.chan_id.to_string(),
                    ]
                })
                .collect(),
        ),
        ReportRows::WatchtowerPeers(rows) => (
            PEER_COLUMNS,
            rows.iter()
                .map(|row| vec![row.peer.clone(), group_thousands(row.connections)])
                .collect(),
        ),
        ReportRows::DialFailures(rows) => (
            DIAL_COLUMNS,
            rows.iter()
                .map(|row| {
                    vec![
                        row.address.clone(),
                        row.error.clone(),
                        group_thousands(row.count),
                    ]
                })
                .collect(),
        ),
    };
    format!("\n{}\n\n", build_table(columns, rows))
}

fn build_table(columns: &[ColumnSpec], rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL_CONDENSED).set_header(
        columns
            .iter()
            .map(|(title, _)| Cell::new(title).set_alignment(CellAlignment::Center)),
    );
    for (position, (_, alignment)) in columns.iter().enumerate() {
        if let Some(column) = table.column_mut(position) {
            column.set_cell_alignment(*alignment);
        }
    }
    for row in rows {
        table.add_row(row);
    }
    table
}

/// Formats `value` with comma thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Renders the report as a single JSON document.
pub fn render_json(report: &AuditReport) -> serde_json::Result<String> {
    let rows = match &report.rows {
        ReportRows::RoutingFailures(rows) => serde_json::to_value(rows)?,
        ReportRows::WatchtowerPeers(rows) => serde_json::to_value(rows)?,
        ReportRows::DialFailures(rows) => serde_json::to_value(rows)?,
    };
    serde_json::to_string_pretty(&json!({
        "report": report.report,
        "rows": rows,
        "retention_warning": report.retention_warning,
    }))
}

pub fn render_retention_warning(warning: &RetentionWarning) -> String {
    let oldest = warning
        .oldest_timestamp
        .map(|timestamp| format!(" (oldest entry {timestamp})"))
        .unwrap_or_default();
    format!(
        "warning: logs do not cover the full {} day lookback{oldest}; \
         raise maxlogfiles or maxlogfilesize in lnd.conf to retain more history",
        warning.lookback_days
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use lnaudit_core::ReportKind;
    use lnaudit_logs::ScanSummary;

    use super::{group_thousands, render_json, render_retention_warning, render_table};
    use crate::report::{
        AuditReport, DialFailureRow, PeerConnectionRow, ReportRows, RetentionWarning,
        RoutingFailureRow,
    };

    fn report(report: ReportKind, rows: ReportRows) -> AuditReport {
        AuditReport {
            report,
            rows,
            retention_warning: None,
            scan: ScanSummary::default(),
        }
    }

    #[test]
    fn unit_group_thousands_inserts_commas() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(100_000), "100,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn functional_routing_table_aligns_and_groups_amounts() {
        let rendered = render_table(&report(
            ReportKind::BandwidthFailures,
            ReportRows::RoutingFailures(vec![RoutingFailureRow {
                peer_alias: "NodeX".to_string(),
                count: 3,
                total_sat: 3,
                average_sat: 1,
                min_sat: 0,
                max_sat: 2,
                capacity_sat: 100_000,
                chan_id: 42,
                channel_point: "chan-a:0".to_string(),
            }]),
        ));
        let cells = rendered
            .lines()
            .filter(|line| line.starts_with('|'))
            .collect::<Vec<_>>();
        assert_eq!(
            cells,
            vec![
                "| Peer alias | Count | Total sats | Average tx | Min tx | Max tx | Capacity | Channel ID |",
                "| NodeX      |     3 |          3 |          1 |      0 |      2 |  100,000 |     42     |",
            ]
        );
    }

    #[test]
    fn regression_table_is_framed_by_blank_lines() {
        let rendered = render_table(&report(
            ReportKind::WatchtowerPeers,
            ReportRows::WatchtowerPeers(Vec::new()),
        ));
        assert!(rendered.starts_with("\n+"));
        assert!(rendered.ends_with("+\n\n"));
        let cells = rendered
            .lines()
            .filter(|line| line.starts_with('|'))
            .collect::<Vec<_>>();
        assert_eq!(cells, vec!["| Peer | Connections |"]);
    }

    #[test]
    fn functional_dial_table_lists_address_error_and_count() {
        let rendered = render_table(&report(
            ReportKind::WtclientFailures,
            ReportRows::DialFailures(vec![DialFailureRow {
                address: "1.2.3.4:9911".to_string(),
                error: "i/o timeout".to_string(),
                count: 2,
            }]),
        ));
        assert!(rendered.contains("| 1.2.3.4:9911 | i/o timeout |     2 |"));
    }

    #[test]
    fn functional_json_output_carries_report_rows_and_warning() {
        let mut audit = report(
            ReportKind::WatchtowerPeers,
            ReportRows::WatchtowerPeers(vec![PeerConnectionRow {
                peer: "203.0.113.9".to_string(),
                connections: 4,
            }]),
        );
        audit.retention_warning = Some(RetentionWarning {
            lookback_days: 30,
            oldest_timestamp: None,
        });

        let value: serde_json::Value =
            serde_json::from_str(&render_json(&audit).expect("json")).expect("parse");
        assert_eq!(value["report"], "watchtower-peers");
        assert_eq!(value["rows"][0]["peer"], "203.0.113.9");
        assert_eq!(value["rows"][0]["connections"], 4);
        assert_eq!(value["retention_warning"]["lookback_days"], 30);
    }

    #[test]
    fn unit_retention_warning_names_lookback_and_oldest_entry() {
        let oldest = NaiveDate::from_ymd_opt(2024, 5, 23)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .expect("timestamp");
        let text = render_retention_warning(&RetentionWarning {
            lookback_days: 30,
            oldest_timestamp: Some(oldest),
        });
        assert!(text.contains("30 day lookback"));
        assert!(text.contains("2024-05-23 08:00:00"));
        assert!(text.contains("maxlogfiles"));
    }
}
