use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use lnaudit_cli::{
    init_tracing, load_channel_metadata, render_json, render_retention_warning, render_table,
    run_audit, Cli,
};
use lnaudit_core::{current_local_timestamp, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_run_config(current_local_timestamp())?;
    tracing::debug!(
        report = %config.report,
        lookback_days = config.lookback_days,
        log_dir = %config.log_dir.display(),
        "starting audit"
    );

    let metadata = if config.report.requires_channel_metadata() {
        Some(load_channel_metadata(&config)?)
    } else {
        None
    };
    let report = run_audit(&config, metadata.as_ref())?;
    tracing::debug!(
        rows = report.rows.len(),
        lines = report.scan.lines_emitted,
        segments = report.scan.segments_read,
        "audit complete"
    );

    if let Some(warning) = &report.retention_warning {
        eprintln!("{}", render_retention_warning(warning));
    }
    match config.output {
        OutputFormat::Table => print!("{}", render_table(&report)),
        OutputFormat::Json => {
            println!("{}", render_json(&report).context("failed to encode report")?)
        }
    }
    Ok(())
}
