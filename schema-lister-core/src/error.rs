//! Error types for the schema listing pipeline.
//!
//! Driver failures carry the driver's own message verbatim. The pipeline
//! wraps each one in a [`ListerError`] variant naming the stage that failed,
//! and the `Display` form of that variant is the one-line diagnostic the
//! binary prints before exiting.

use thiserror::Error;

/// Opaque failure reported by a database driver.
///
/// Drivers do not classify their failures; the message is whatever text the
/// underlying library produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
}

impl DriverError {
    /// Creates a driver error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The driver's message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for DriverError {
    fn from(error: std::io::Error) -> Self {
        Self::new(error.to_string())
    }
}

#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for DriverError {
    fn from(error: tiberius::error::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Convenience type alias for driver results
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Main error type for the schema lister.
///
/// Every stage failure is fatal to the run; none of these are retried.
#[derive(Debug, Error)]
pub enum ListerError {
    /// Opening the connection failed
    #[error("Open connection failed: {0}")]
    Connection(#[source] DriverError),

    /// Preparing the statement failed
    #[error("Prepare failed: {0}")]
    Prepare(#[source] DriverError),

    /// Executing the statement failed
    #[error("Query failed: {0}")]
    Query(#[source] DriverError),

    /// Advancing the cursor or decoding a row failed
    #[error("Row scan failed: {0}")]
    Scan(#[source] DriverError),

    /// Writing the report failed
    #[error("Failed to write output: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },

    /// Configuration or environment setup error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results with `ListerError`
pub type Result<T> = std::result::Result<T, ListerError>;

impl ListerError {
    /// Creates an output error from a failed write
    pub fn output(source: std::io::Error) -> Self {
        Self::Output { source }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Short name of the stage that failed, for structured logs
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connect",
            Self::Prepare(_) => "prepare",
            Self::Query(_) => "query",
            Self::Scan(_) => "scan",
            Self::Output { .. } => "output",
            Self::Configuration { .. } => "configuration",
        }
    }

    /// The wrapped driver error, if this failure came from the driver
    pub const fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::Connection(e) | Self::Prepare(e) | Self::Query(e) | Self::Scan(e) => Some(e),
            Self::Output { .. } | Self::Configuration { .. } => None,
        }
    }
}
