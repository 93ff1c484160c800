//! Schema listing tool.
//!
//! Connects to SQL Server, runs `SELECT name FROM sys.schemas` and prints
//! one schema name per line between a start and an end banner.
//!
//! # Exit status
//! - 0 after the end banner
//! - 1 on any connect, prepare, query or scan failure, with a one-line
//!   diagnostic on standard error

use schema_lister::Cli;
use schema_lister_core::driver::tds::TdsDriver;
use schema_lister_core::{init_logging, list_schemas};
use std::io;
use std::process::ExitCode;
use tracing::{debug, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let config = cli.configuration();
    debug!("Configuration: {:?}", config);

    let driver = TdsDriver::new();
    let mut stdout = io::stdout().lock();

    match list_schemas(&config, &driver, &mut stdout).await {
        Ok(report) => {
            info!("✓ Listed {} schemas", report.schemas_printed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            drop(stdout);
            debug!(stage = e.stage(), "Schema listing aborted");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
