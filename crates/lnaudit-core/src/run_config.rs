use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{ReportKind, TimeCutoff};

pub const DEFAULT_LOG_DIR: &str = "~/.lnd/logs/bitcoin/mainnet";
pub const DEFAULT_LOG_FILE_NAME: &str = "lnd.log";
pub const DEFAULT_REST_SERVER: &str = "localhost:8080";
pub const DEFAULT_TLS_CERT_PATH: &str = "~/.lnd/tls.cert";
pub const DEFAULT_MACAROON_PATH: &str = "~/.lnd/data/chain/bitcoin/mainnet/admin.macaroon";

/// Error returned when run configuration input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunConfigError {
    #[error("Invalid command: {0}")]
    UnknownReport(String),
    #[error("lookback of {lookback_days} days is outside the supported time range")]
    LookbackOutOfRange { lookback_days: u32 },
}

/// How archived segment indices map to recency.
///
/// lnd's rotator increments the index on every rotation, so the highest index
/// holds the most recently rotated data. Other rotators shift older files to
/// higher indices instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationOrder {
    #[default]
    HigherIsNewer,
    LowerIsNewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Immutable settings for a single audit invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub report: ReportKind,
    pub lookback_days: u32,
    pub window: TimeCutoff,
    pub log_dir: PathBuf,
    pub log_file_name: String,
    pub rotation_order: RotationOrder,
    pub rest_server: String,
    pub tls_cert_path: PathBuf,
    pub macaroon_path: PathBuf,
    pub output: OutputFormat,
}

impl RunConfig {
    /// Base URL of the lnd REST endpoint. A bare `host:port` is served over https.
    pub fn rest_base_url(&self) -> String {
        let trimmed = self.rest_server.trim().trim_end_matches('/');
        if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        }
    }
}

/// Expands a leading `~` against `$HOME`. Other paths are returned unchanged.
pub fn expand_home_path(raw: &str) -> PathBuf {
    expand_home_path_with(raw, std::env::var_os("HOME").map(PathBuf::from).as_deref())
}

fn expand_home_path_with(raw: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(raw);
    };
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}
