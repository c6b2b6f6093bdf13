use crate::{
    args::Cli,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::{Parser, error::ErrorKind};
use connectors::sql::mysql::MySqlRowSource;
use engine_runtime::execution::TransferExecutor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod args;
mod error;
mod logging;
mod shutdown;

fn main() {
    std::process::exit(run().as_i32());
}

fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
                _ => ExitCode::GeneralError,
            };
        }
    };

    if let Err(err) = logging::init(&cli.loglevel) {
        eprintln!("{err}");
        return ExitCode::GeneralError;
    }

    match transfer(&cli) {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "Upload failed");
            ExitCode::GeneralError
        }
    }
}

fn transfer(cli: &Cli) -> Result<ExitCode, CliError> {
    let settings = cli.to_settings();
    settings.validate()?;

    // Hosts the MySQL driver and the signal listener; the pipeline itself
    // runs on this thread and the upload worker threads.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("tablepush-io")
        .enable_all()
        .build()?;

    let sinks = Arc::new(settings.sink_config());
    let executor = TransferExecutor::new(settings.clone(), sinks)?;

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers(runtime.handle(), executor.abort_handle());

    let mut source = MySqlRowSource::connect(&settings.mysql_url, runtime.handle().clone())?;
    let report = executor.execute(&mut source)?;

    if let Err(err) = source.disconnect() {
        warn!(error = %err, "Failed to close MySQL connection");
    }
    shutdown.close();

    info!(
        rows_read = report.metrics.rows_read,
        rows_uploaded = report.metrics.rows_uploaded,
        batches = report.metrics.batches_delivered,
        failed_attempts = report.metrics.failed_attempts,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Transfer summary"
    );

    if shutdown.is_shutdown_requested() {
        return Ok(ExitCode::ShutdownRequested);
    }
    Ok(if report.success {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    })
}
