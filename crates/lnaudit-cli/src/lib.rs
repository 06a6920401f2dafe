//! Command-line front end for the lnd log audit.

pub mod bootstrap;
pub mod cli_args;
pub mod cli_types;
pub mod render;
pub mod report;

pub use bootstrap::init_tracing;
pub use cli_args::Cli;
pub use cli_types::CliRotationOrder;
pub use render::{group_thousands, render_json, render_retention_warning, render_table};
pub use report::{
    load_channel_metadata, run_audit, AuditReport, DialFailureRow, PeerConnectionRow,
    ReportRows, RetentionWarning, RoutingFailureRow,
};
