//! Core of the schema lister.
//!
//! Connects to a SQL Server instance, runs `SELECT name FROM sys.schemas`
//! and prints one schema name per line. The pieces:
//!
//! - [`config`]: the immutable run configuration
//! - [`descriptor`]: the `key=value;...` connection descriptor
//! - [`driver`]: the driver seam plus the TDS and in-memory drivers
//! - [`lister`]: the connect → prepare → execute → iterate → report pipeline
//! - [`error`]: stage-tagged errors
//! - [`logging`]: tracing setup for the binary
//!
//! # Security
//! The password is held in zeroizing buffers and masked in every `Debug`
//! implementation and log line. It only reaches standard output through the
//! opt-in debug block of the report.

pub mod config;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod lister;
pub mod logging;

// Re-export commonly used types
pub use config::Configuration;
pub use descriptor::ConnectionDescriptor;
pub use driver::{Connection, Cursor, Driver, Statement};
pub use error::{DriverError, DriverResult, ListerError, Result};
pub use lister::{ListingReport, SCHEMA_QUERY, list_schemas};
pub use logging::init_logging;
