//! Discovery of the live log file and its gzip-rotated archives.

use std::io;
use std::path::{Path, PathBuf};

use lnaudit_core::RotationOrder;

/// One file of the log corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSegment {
    /// The uncompressed file the node is currently writing.
    Primary(PathBuf),
    /// A compressed rotated segment and its rotation index.
    Archive { index: u64, path: PathBuf },
}

impl LogSegment {
    pub fn path(&self) -> &Path {
        match self {
            Self::Primary(path) => path,
            Self::Archive { path, .. } => path,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary(_))
    }
}

/// Path of the archive with rotation `index` for the primary file `file_name`.
pub fn rotated_archive_path(log_dir: &Path, file_name: &str, index: u64) -> PathBuf {
    log_dir.join(format!("{file_name}.{index}.gz"))
}

/// Parses the rotation index out of `<file_name>.<N>.gz`.
pub fn archive_index(entry_name: &str, file_name: &str) -> Option<u64> {
    let rest = entry_name.strip_prefix(file_name)?.strip_prefix('.')?;
    let digits = rest.strip_suffix(".gz")?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Lists the segments of the corpus newest first: the primary file, then the
/// archives ordered by `order`.
///
/// A missing directory yields no segments. The primary file is listed
/// whenever the directory exists; the reader decides what a missing primary
/// means.
pub fn discover_segments(
    log_dir: &Path,
    file_name: &str,
    order: RotationOrder,
) -> io::Result<Vec<LogSegment>> {
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error),
    };

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry?;
        let entry_name = entry.file_name();
        let Some(entry_name) = entry_name.to_str() else {
            continue;
        };
        if let Some(index) = archive_index(entry_name, file_name) {
            archives.push((index, entry.path()));
        }
    }
    match order {
        RotationOrder::HigherIsNewer => archives.sort_by(|left, right| right.0.cmp(&left.0)),
        RotationOrder::LowerIsNewer => archives.sort_by(|left, right| left.0.cmp(&right.0)),
    }

    let mut segments = Vec::with_capacity(archives.len() + 1);
    segments.push(LogSegment::Primary(log_dir.join(file_name)));
    segments.extend(
        archives
            .into_iter()
            .map(|(index, path)| LogSegment::Archive { index, path }),
    );
    Ok(segments)
}
