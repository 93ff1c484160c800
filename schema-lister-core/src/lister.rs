//! The schema listing pipeline.
//!
//! connect → prepare → execute → iterate → report, strictly in sequence.
//! Any stage failure ends the run with a [`ListerError`] naming the stage;
//! the caller decides how to report it. Handles acquired before the failure
//! are closed on the way out, cursor first and connection last.

use crate::config::Configuration;
use crate::descriptor::ConnectionDescriptor;
use crate::driver::{Connection, Cursor, Driver, Statement};
use crate::error::{DriverResult, ListerError, Result};
use std::io::Write;
use tracing::{debug, info, warn};

/// The metadata query the lister runs
pub const SCHEMA_QUERY: &str = "SELECT name FROM sys.schemas";

/// First line of the report
pub const START_BANNER: &str = "Starting program to print all MSSQL schemas:";

/// Last line of the report
pub const END_BANNER: &str = "Ending program";

/// Summary of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingReport {
    /// Number of schema names printed
    pub schemas_printed: usize,
}

/// Runs the whole listing against `driver`, writing the report to `out`.
///
/// Output order: start banner, the debug block when enabled, one line per
/// schema in the order the server returned them, end banner. Rows printed
/// before a failure stay printed.
///
/// # Errors
/// Returns the first stage failure (connect, prepare, query or scan), or an
/// output error if `out` cannot be written
///
/// # Example
/// ```rust
/// use schema_lister_core::driver::memory::MemoryDriver;
/// use schema_lister_core::{Configuration, list_schemas};
///
/// # fn main() -> Result<(), schema_lister_core::ListerError> {
/// # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # runtime.block_on(async {
/// let driver = MemoryDriver::new().with_text_rows(["dbo", "sys"]);
/// let mut out = Vec::new();
/// let report = list_schemas(&Configuration::default(), &driver, &mut out).await?;
///
/// assert_eq!(report.schemas_printed, 2);
/// assert!(String::from_utf8_lossy(&out).contains("dbo\nsys\n"));
/// # Ok::<(), schema_lister_core::ListerError>(())
/// # })
/// # }
/// ```
pub async fn list_schemas<D, W>(
    config: &Configuration,
    driver: &D,
    out: &mut W,
) -> Result<ListingReport>
where
    D: Driver,
    W: Write,
{
    // Arguments are already parsed here, so `--help` and flag errors never
    // print the banner.
    writeln!(out, "{START_BANNER}\n").map_err(ListerError::output)?;

    if config.debug() {
        write_debug_block(config, out)?;
    }

    let descriptor = ConnectionDescriptor::from_config(config);
    if config.debug() {
        writeln!(out, " connString:{descriptor}").map_err(ListerError::output)?;
    }
    out.flush().map_err(ListerError::output)?;

    debug!(
        "Opening {} connection: {}",
        driver.name(),
        descriptor.redacted()
    );
    let mut connection = driver
        .open(descriptor.as_str())
        .await
        .map_err(ListerError::Connection)?;
    info!("Connected to {}:{}", config.server(), config.port());

    let outcome = run_query(&mut connection, out).await;
    release("connection", connection.close().await);
    let schemas_printed = outcome?;

    writeln!(out, "\n{END_BANNER}").map_err(ListerError::output)?;
    out.flush().map_err(ListerError::output)?;

    Ok(ListingReport { schemas_printed })
}

/// Prints every configuration value verbatim, password included.
fn write_debug_block<W: Write>(config: &Configuration, out: &mut W) -> Result<()> {
    writeln!(out, " debug:{}", config.debug()).map_err(ListerError::output)?;
    writeln!(out, " password:{}", config.password()).map_err(ListerError::output)?;
    writeln!(out, " port:{}", config.port()).map_err(ListerError::output)?;
    writeln!(out, " server:{}", config.server()).map_err(ListerError::output)?;
    writeln!(out, " user:{}", config.user()).map_err(ListerError::output)?;
    Ok(())
}

async fn run_query<C, W>(connection: &mut C, out: &mut W) -> Result<usize>
where
    C: Connection,
    W: Write,
{
    debug!("Preparing statement: {}", SCHEMA_QUERY);
    let mut statement = connection
        .prepare(SCHEMA_QUERY)
        .await
        .map_err(ListerError::Prepare)?;

    let outcome = execute_statement(&mut statement, out).await;
    release("statement", statement.close().await);
    outcome
}

async fn execute_statement<S, W>(statement: &mut S, out: &mut W) -> Result<usize>
where
    S: Statement,
    W: Write,
{
    let mut cursor = statement.execute().await.map_err(ListerError::Query)?;

    let outcome = print_rows(&mut cursor, out).await;
    release("cursor", cursor.close().await);
    outcome
}

async fn print_rows<R, W>(cursor: &mut R, out: &mut W) -> Result<usize>
where
    R: Cursor,
    W: Write,
{
    let mut printed: usize = 0;
    while cursor.advance().await.map_err(ListerError::Scan)? {
        let schema_name = cursor.scan_text().map_err(ListerError::Scan)?;
        writeln!(out, "{schema_name}").map_err(ListerError::output)?;
        printed = printed.saturating_add(1);
    }
    debug!("Cursor exhausted after {} rows", printed);
    Ok(printed)
}

/// Logs a failed release. The run's own outcome is unaffected.
fn release(resource: &str, result: DriverResult<()>) {
    match result {
        Ok(()) => debug!("Released {}", resource),
        Err(e) => warn!("Failed to release {}: {}", resource, e),
    }
}
