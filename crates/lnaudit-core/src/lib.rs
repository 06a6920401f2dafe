//! Foundational types shared across lnaudit crates.
//!
//! Provides the report selector, the immutable per-run configuration, and the
//! time-window helpers every scan is evaluated against.

pub mod report_kind;
pub mod run_config;
pub mod time_utils;

pub use report_kind::ReportKind;
pub use run_config::{
    expand_home_path, OutputFormat, RotationOrder, RunConfig, RunConfigError,
    DEFAULT_LOG_DIR, DEFAULT_LOG_FILE_NAME, DEFAULT_MACAROON_PATH, DEFAULT_REST_SERVER,
    DEFAULT_TLS_CERT_PATH,
};
pub use time_utils::{current_local_timestamp, TimeCutoff, LOG_TIMESTAMP_FORMAT};
