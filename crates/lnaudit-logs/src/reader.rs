//! Newest-first reading of the whole log corpus, bounded by the run cutoff.
//!
//! The live file is walked backward first, then each rotated archive from the
//! most recently rotated to the oldest. Reading stops at the first record
//! older than the cutoff. When every segment is consumed without reaching the
//! cutoff the scan is marked exhausted so callers can warn that retention is
//! shorter than the requested window.
//!
//! Records may span several physical lines. Unstamped lines are held back
//! until the record header above them is seen, then released together with
//! that header, or dropped with it when the header is outside the window.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use flate2::read::MultiGzDecoder;
use lnaudit_core::{RotationOrder, RunConfig, TimeCutoff};
use serde::Serialize;

use crate::line_class::{LineClass, LineClassifier};
use crate::rev_lines::ReverseLines;
use crate::segments::{discover_segments, LogSegment};

type SegmentLines = Box<dyn Iterator<Item = io::Result<String>>>;

/// One line of the corpus in newest-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    /// The record timestamp. Continuations inherit their header's timestamp
    /// when the header is known and valid; `None` otherwise.
    pub timestamp: Option<NaiveDateTime>,
}

/// Counters describing a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Every segment was consumed without reaching the cutoff.
    pub exhausted: bool,
    /// Oldest in-window record timestamp that was emitted.
    pub oldest_timestamp: Option<NaiveDateTime>,
    pub lines_emitted: u64,
    pub malformed_lines: u64,
    pub segments_read: usize,
    pub skipped_segments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning,
    Satisfied,
    Exhausted,
}

/// Lazy newest-first iterator over the lines of a log corpus.
pub struct ReverseLogReader {
    classifier: LineClassifier,
    window: TimeCutoff,
    segments: VecDeque<LogSegment>,
    current: Option<(PathBuf, SegmentLines)>,
    pending_continuations: Vec<String>,
    ready: VecDeque<LogLine>,
    state: ScanState,
    summary: ScanSummary,
}

impl ReverseLogReader {
    /// Builds a reader over the corpus described by `config`.
    pub fn open(config: &RunConfig) -> Result<Self, regex::Error> {
        Self::from_directory(
            &config.log_dir,
            &config.log_file_name,
            config.rotation_order,
            config.window,
        )
    }

    pub fn from_directory(
        log_dir: &Path,
        file_name: &str,
        order: RotationOrder,
        window: TimeCutoff,
    ) -> Result<Self, regex::Error> {
        let segments = match discover_segments(log_dir, file_name, order) {
            Ok(segments) => segments,
            Err(error) => {
                tracing::warn!(
                    path = %log_dir.display(),
                    %error,
                    "failed to list log directory; scanning nothing"
                );
                Vec::new()
            }
        };
        Self::from_segments(segments, window)
    }

    /// Builds a reader over `segments`, which must already be newest first.
    pub fn from_segments(
        segments: Vec<LogSegment>,
        window: TimeCutoff,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            classifier: LineClassifier::new()?,
            window,
            segments: segments.into(),
            current: None,
            pending_continuations: Vec::new(),
            ready: VecDeque::new(),
            state: ScanState::Scanning,
            summary: ScanSummary::default(),
        })
    }

    /// Scan counters. `exhausted` is only final once iteration has ended.
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    fn next_raw_line(&mut self) -> Option<String> {
        loop {
            if let Some((path, lines)) = self.current.as_mut() {
                match lines.next() {
                    Some(Ok(line)) => return Some(line),
                    Some(Err(error)) => {
                        tracing::warn!(
                            path = %path.display(),
                            %error,
                            "failed to read log segment; skipping the rest of it"
                        );
                        self.summary.skipped_segments += 1;
                        self.current = None;
                        self.release_continuations(None);
                    }
                    None => self.current = None,
                }
                continue;
            }

            let segment = self.segments.pop_front()?;
            match open_segment(&segment) {
                Ok(lines) => {
                    self.summary.segments_read += 1;
                    self.current = Some((segment.path().to_path_buf(), lines));
                }
                Err(error) if segment.is_primary() && error.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(path = %segment.path().display(), "no live log file");
                }
                Err(error) => {
                    tracing::warn!(
                        path = %segment.path().display(),
                        %error,
                        "failed to open log segment; skipping it"
                    );
                    self.summary.skipped_segments += 1;
                    // The header of any held continuation may be in the lost segment.
                    self.release_continuations(None);
                }
            }
        }
    }

    fn release_continuations(&mut self, timestamp: Option<NaiveDateTime>) {
        self.ready
            .extend(self.pending_continuations.drain(..).map(|text| LogLine {
                text,
                timestamp,
            }));
    }

    fn accept(&mut self, line: String) {
        match self.classifier.classify(&line) {
            LineClass::Continuation => self.pending_continuations.push(line),
            LineClass::Malformed => {
                tracing::warn!(line = %line, "skipping log line with malformed timestamp");
                self.summary.malformed_lines += 1;
                self.release_continuations(None);
            }
            LineClass::Timestamped(timestamp) if !self.window.includes(timestamp) => {
                self.pending_continuations.clear();
                self.segments.clear();
                self.current = None;
                self.state = ScanState::Satisfied;
            }
            LineClass::Timestamped(timestamp) => {
                self.release_continuations(Some(timestamp));
                self.summary.oldest_timestamp = Some(
                    self.summary
                        .oldest_timestamp
                        .map_or(timestamp, |oldest| oldest.min(timestamp)),
                );
                self.ready.push_back(LogLine {
                    text: line,
                    timestamp: Some(timestamp),
                });
            }
        }
    }
}

impl Iterator for ReverseLogReader {
    type Item = LogLine;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                self.summary.lines_emitted += 1;
                return Some(line);
            }
            if self.state != ScanState::Scanning {
                return None;
            }
            match self.next_raw_line() {
                Some(line) => self.accept(line),
                None => {
                    // Orphaned continuations have no header anywhere in the corpus.
                    self.release_continuations(None);
                    self.state = ScanState::Exhausted;
                    self.summary.exhausted = true;
                }
            }
        }
    }
}

fn open_segment(segment: &LogSegment) -> io::Result<SegmentLines> {
    match segment {
        LogSegment::Primary(path) => {
            let file = File::open(path)?;
            Ok(Box::new(ReverseLines::new(file)?))
        }
        LogSegment::Archive { path, .. } => {
            // gzip streams only decode forward; the archive is inflated whole.
            let mut decoded = Vec::new();
            MultiGzDecoder::new(File::open(path)?).read_to_end(&mut decoded)?;
            Ok(Box::new(ReverseLines::new(Cursor::new(decoded))?))
        }
    }
}
