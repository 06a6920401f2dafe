use chrono::NaiveDateTime;
use clap::Parser;

use lnaudit_core::{
    expand_home_path, OutputFormat, ReportKind, RunConfig, RunConfigError, TimeCutoff,
    DEFAULT_LOG_DIR, DEFAULT_LOG_FILE_NAME, DEFAULT_MACAROON_PATH, DEFAULT_REST_SERVER,
    DEFAULT_TLS_CERT_PATH,
};

use crate::CliRotationOrder;

fn parse_positive_u32(value: &str) -> Result<u32, String> {
    let parsed = value
        .parse::<u32>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "lnaudit",
    about = "Audit lnd logs for recurring routing and watchtower failures",
    version
)]
pub struct Cli {
    #[arg(
        value_name = "COMMAND",
        help = "Report to produce: bandwidth-failures, remote-failures, watchtower-peers, wtclient-failures"
    )]
    pub command: String,

    #[arg(
        long,
        env = "LNAUDIT_DAYS",
        default_value_t = 1,
        value_parser = parse_positive_u32,
        help = "Days back to search the log"
    )]
    pub days: u32,

    #[arg(
        long,
        env = "LNAUDIT_LOGDIR",
        default_value = DEFAULT_LOG_DIR,
        value_name = "/path/to/logdir",
        help = "lnd log directory"
    )]
    pub logdir: String,

    #[arg(
        long = "log-file-name",
        env = "LNAUDIT_LOG_FILE_NAME",
        default_value = DEFAULT_LOG_FILE_NAME,
        help = "Name of the live log file; rotated archives are <name>.<N>.gz"
    )]
    pub log_file_name: String,

    #[arg(
        long = "rotation-order",
        env = "LNAUDIT_ROTATION_ORDER",
        value_enum,
        default_value_t = CliRotationOrder::HigherIsNewer,
        help = "Which end of the archive index range holds the most recently rotated segment"
    )]
    pub rotation_order: CliRotationOrder,

    #[arg(
        long,
        env = "LNAUDIT_RESTSERVER",
        default_value = DEFAULT_REST_SERVER,
        value_name = "host:port",
        help = "lnd REST server"
    )]
    pub restserver: String,

    #[arg(
        long,
        env = "LNAUDIT_TLSCERT",
        default_value = DEFAULT_TLS_CERT_PATH,
        value_name = "/path/to/tls.cert",
        help = "lnd TLS certificate"
    )]
    pub tlscert: String,

    #[arg(
        long,
        env = "LNAUDIT_MACAROON",
        default_value = DEFAULT_MACAROON_PATH,
        value_name = "/path/to/macaroon",
        help = "lnd macaroon used to authenticate REST calls"
    )]
    pub macaroon: String,

    #[arg(long, help = "Print the report as JSON instead of a table")]
    pub json: bool,
}

impl Cli {
    /// Freezes the parsed flags into the configuration for one run.
    pub fn to_run_config(&self, now: NaiveDateTime) -> Result<RunConfig, RunConfigError> {
        let report = self.command.parse::<ReportKind>()?;
        Ok(RunConfig {
            report,
            lookback_days: self.days,
            window: TimeCutoff::from_lookback_days(now, self.days)?,
            log_dir: expand_home_path(&self.logdir),
            log_file_name: self.log_file_name.clone(),
            rotation_order: self.rotation_order.into(),
            rest_server: self.restserver.clone(),
            tls_cert_path: expand_home_path(&self.tlscert),
            macaroon_path: expand_home_path(&self.macaroon),
            output: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Table
            },
        })
    }
}
