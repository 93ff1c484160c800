//! Scripted in-memory driver.
//!
//! Replays a fixed list of rows and can be told to fail at any stage. Every
//! open, prepare, execute and close is written to a shared journal so callers
//! can check what was acquired and in which order it was released.

use super::{Connection, Cursor, Driver, Statement};
use crate::error::{DriverError, DriverResult};
use std::sync::{Arc, Mutex, PoisonError};

/// One scripted row as the cursor will deliver it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryRow {
    /// A text value
    Text(String),
    /// An integer value, which cannot be scanned as text
    Integer(i64),
    /// SQL NULL
    Null,
    /// Advancing onto this row fails with the given message
    Error(String),
}

/// Handle kinds recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A connection
    Connection,
    /// A prepared statement
    Statement,
    /// A cursor
    Cursor,
}

/// Journal entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// A connection was opened with this descriptor
    Opened {
        /// Descriptor passed to `open`
        descriptor: String,
    },
    /// A statement was prepared
    Prepared {
        /// Statement text
        text: String,
    },
    /// A statement was executed
    Executed,
    /// A handle was released
    Closed(Resource),
}

#[derive(Debug, Clone, Default)]
struct MemoryScript {
    rows: Vec<MemoryRow>,
    open_error: Option<String>,
    prepare_error: Option<String>,
    execute_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Journal(Arc<Mutex<Vec<DriverEvent>>>);

impl Journal {
    fn record(&self, event: DriverEvent) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn snapshot(&self) -> Vec<DriverEvent> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Driver that serves a scripted result set.
///
/// # Example
/// ```rust
/// use schema_lister_core::driver::memory::MemoryDriver;
///
/// let driver = MemoryDriver::new().with_text_rows(["dbo", "guest"]);
/// assert!(driver.events().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    script: Arc<MemoryScript>,
    journal: Journal,
}

impl MemoryDriver {
    /// Creates a driver whose query returns no rows
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the scripted rows
    #[must_use]
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = MemoryRow>) -> Self {
        Arc::make_mut(&mut self.script).rows = rows.into_iter().collect();
        self
    }

    /// Replaces the scripted rows with text values
    #[must_use]
    pub fn with_text_rows<S: Into<String>>(self, rows: impl IntoIterator<Item = S>) -> Self {
        self.with_rows(rows.into_iter().map(|row| MemoryRow::Text(row.into())))
    }

    /// Makes `open` fail with `message`
    #[must_use]
    pub fn fail_open(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.script).open_error = Some(message.into());
        self
    }

    /// Makes `prepare` fail with `message`
    #[must_use]
    pub fn fail_prepare(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.script).prepare_error = Some(message.into());
        self
    }

    /// Makes `execute` fail with `message`
    #[must_use]
    pub fn fail_execute(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.script).execute_error = Some(message.into());
        self
    }

    /// Everything recorded so far, oldest first
    pub fn events(&self) -> Vec<DriverEvent> {
        self.journal.snapshot()
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn open(&self, descriptor: &str) -> DriverResult<MemoryConnection> {
        if let Some(message) = &self.script.open_error {
            return Err(DriverError::new(message.clone()));
        }

        self.journal.record(DriverEvent::Opened {
            descriptor: descriptor.to_string(),
        });

        Ok(MemoryConnection {
            script: Arc::clone(&self.script),
            journal: self.journal.clone(),
        })
    }
}

/// Connection handed out by [`MemoryDriver`]
#[derive(Debug)]
pub struct MemoryConnection {
    script: Arc<MemoryScript>,
    journal: Journal,
}

impl Connection for MemoryConnection {
    type Statement<'c>
        = MemoryStatement<'c>
    where
        Self: 'c;

    async fn prepare(&mut self, text: &str) -> DriverResult<MemoryStatement<'_>> {
        if let Some(message) = &self.script.prepare_error {
            return Err(DriverError::new(message.clone()));
        }

        self.journal.record(DriverEvent::Prepared {
            text: text.to_string(),
        });

        Ok(MemoryStatement { connection: &*self })
    }

    async fn close(self) -> DriverResult<()> {
        self.journal.record(DriverEvent::Closed(Resource::Connection));
        Ok(())
    }
}

/// Statement borrowed from a [`MemoryConnection`]
#[derive(Debug)]
pub struct MemoryStatement<'c> {
    connection: &'c MemoryConnection,
}

impl Statement for MemoryStatement<'_> {
    type Cursor<'s>
        = MemoryCursor<'s>
    where
        Self: 's;

    async fn execute(&mut self) -> DriverResult<MemoryCursor<'_>> {
        let script = &self.connection.script;
        if let Some(message) = &script.execute_error {
            return Err(DriverError::new(message.clone()));
        }

        self.connection.journal.record(DriverEvent::Executed);

        Ok(MemoryCursor {
            rows: script.rows.iter(),
            current: None,
            journal: self.connection.journal.clone(),
        })
    }

    async fn close(self) -> DriverResult<()> {
        self.connection
            .journal
            .record(DriverEvent::Closed(Resource::Statement));
        Ok(())
    }
}

/// Cursor over the scripted rows
#[derive(Debug)]
pub struct MemoryCursor<'s> {
    rows: std::slice::Iter<'s, MemoryRow>,
    current: Option<&'s MemoryRow>,
    journal: Journal,
}

impl Cursor for MemoryCursor<'_> {
    async fn advance(&mut self) -> DriverResult<bool> {
        self.current = None;
        match self.rows.next() {
            None => Ok(false),
            Some(MemoryRow::Error(message)) => Err(DriverError::new(message.clone())),
            Some(row) => {
                self.current = Some(row);
                Ok(true)
            }
        }
    }

    fn scan_text(&self) -> DriverResult<String> {
        match self.current {
            Some(MemoryRow::Text(value)) => Ok(value.clone()),
            Some(MemoryRow::Null) => Err(DriverError::new(
                "converting NULL to string is unsupported",
            )),
            Some(MemoryRow::Integer(value)) => Err(DriverError::new(format!(
                "cannot convert integer value {value} to text"
            ))),
            Some(MemoryRow::Error(_)) | None => Err(DriverError::new("no current row")),
        }
    }

    async fn close(self) -> DriverResult<()> {
        self.journal.record(DriverEvent::Closed(Resource::Cursor));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_replay_in_order() {
        let driver = MemoryDriver::new().with_text_rows(["a", "b"]);
        let mut connection = driver.open("server=x").await.unwrap();
        let mut statement = connection.prepare("SELECT 1").await.unwrap();
        let mut cursor = statement.execute().await.unwrap();

        assert!(cursor.advance().await.unwrap());
        assert_eq!(cursor.scan_text().unwrap(), "a");
        assert!(cursor.advance().await.unwrap());
        assert_eq!(cursor.scan_text().unwrap(), "b");
        assert!(!cursor.advance().await.unwrap());
        assert!(cursor.scan_text().is_err());
    }

    #[tokio::test]
    async fn test_scan_rejects_non_text() {
        let driver = MemoryDriver::new().with_rows([MemoryRow::Null, MemoryRow::Integer(7)]);
        let mut connection = driver.open("").await.unwrap();
        let mut statement = connection.prepare("SELECT 1").await.unwrap();
        let mut cursor = statement.execute().await.unwrap();

        assert!(cursor.advance().await.unwrap());
        let error = cursor.scan_text().unwrap_err();
        assert!(error.message().contains("NULL"));

        assert!(cursor.advance().await.unwrap());
        assert!(cursor.scan_text().unwrap_err().message().contains('7'));
    }

    #[tokio::test]
    async fn test_failed_open_records_nothing() {
        let driver = MemoryDriver::new().fail_open("unreachable");
        let error = driver.open("server=x").await.unwrap_err();

        assert_eq!(error.message(), "unreachable");
        assert!(driver.events().is_empty());
    }

    #[tokio::test]
    async fn test_journal_records_lifecycle() {
        let driver = MemoryDriver::new();
        let mut connection = driver.open("server=x").await.unwrap();
        {
            let mut statement = connection.prepare("SELECT 1").await.unwrap();
            let cursor = statement.execute().await.unwrap();
            cursor.close().await.unwrap();
            statement.close().await.unwrap();
        }
        connection.close().await.unwrap();

        assert_eq!(
            driver.events(),
            vec![
                DriverEvent::Opened {
                    descriptor: "server=x".to_string()
                },
                DriverEvent::Prepared {
                    text: "SELECT 1".to_string()
                },
                DriverEvent::Executed,
                DriverEvent::Closed(Resource::Cursor),
                DriverEvent::Closed(Resource::Statement),
                DriverEvent::Closed(Resource::Connection),
            ]
        );
    }
}
