//! Log ingestion and event aggregation for lnd audit reports.
//!
//! Walks the live log and its gzip-rotated archives newest-first, stops at the
//! run's time cutoff, extracts typed events from matching lines, and folds them
//! into per-key statistics.

pub mod aggregate;
pub mod events;
pub mod line_class;
pub mod reader;
pub mod rev_lines;
pub mod segments;

pub use aggregate::{aggregate, AggregateStat, Aggregation, AggregationMode, OccurrenceKey};
pub use events::{
    AuditEvent, DialFailureEvent, EventExtractor, PeerConnectEvent, RoutingFailureEvent,
};
pub use line_class::{LineClass, LineClassifier};
pub use reader::{LogLine, ReverseLogReader, ScanSummary};
pub use rev_lines::ReverseLines;
pub use segments::{discover_segments, rotated_archive_path, LogSegment};

/// Drives `reader` to completion through `extractor`, yielding matched events.
pub fn scan_events<'a>(
    reader: &'a mut ReverseLogReader,
    extractor: &'a EventExtractor,
) -> impl Iterator<Item = AuditEvent> + 'a {
    reader.filter_map(move |line| {
        let event = extractor.extract(&line.text)?;
        if line.timestamp.is_none() {
            tracing::debug!(
                line = %line.text,
                "counting event from a line whose record header was not recovered"
            );
        }
        Some(event)
    })
}
