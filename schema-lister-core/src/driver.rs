//! Database driver seam.
//!
//! The listing pipeline only talks to these traits. Each handle borrows its
//! parent (a statement borrows its connection, a cursor borrows its
//! statement), so a child can never outlive the handle it came from and
//! release order is always cursor, statement, connection.
//!
//! Two drivers ship with the crate:
//! - [`tds::TdsDriver`] speaks to SQL Server through `tiberius` (feature `mssql`)
//! - [`memory::MemoryDriver`] replays a scripted result set, for tests and demos

// The pipeline runs on a current-thread runtime and never spawns, so the
// futures returned by these traits carry no `Send` bound.
#![allow(async_fn_in_trait)]

use crate::error::DriverResult;

pub mod memory;
#[cfg(feature = "mssql")]
pub mod tds;

/// Entry point of a driver: turns a descriptor into a live connection.
pub trait Driver {
    /// Connection handle produced by [`Driver::open`]
    type Connection: Connection;

    /// Short driver name for logs
    fn name(&self) -> &'static str;

    /// Opens a session described by `descriptor`.
    ///
    /// # Errors
    /// Returns the driver's error if the descriptor is malformed or the
    /// server cannot be reached or refuses the login
    async fn open(&self, descriptor: &str) -> DriverResult<Self::Connection>;
}

/// Exclusively owned session with the server.
pub trait Connection {
    /// Statement handle scoped to a borrow of this connection
    type Statement<'c>: Statement
    where
        Self: 'c;

    /// Prepares `text` for execution. No parameters are supported.
    ///
    /// # Errors
    /// Returns the driver's error if the statement cannot be prepared
    async fn prepare(&mut self, text: &str) -> DriverResult<Self::Statement<'_>>;

    /// Ends the session.
    ///
    /// # Errors
    /// Returns the driver's error if the session did not shut down cleanly
    async fn close(self) -> DriverResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Prepared statement.
pub trait Statement {
    /// Cursor handle scoped to a borrow of this statement
    type Cursor<'s>: Cursor
    where
        Self: 's;

    /// Runs the statement and returns a forward-only cursor over its rows.
    ///
    /// # Errors
    /// Returns the driver's error if the server rejects the statement
    async fn execute(&mut self) -> DriverResult<Self::Cursor<'_>>;

    /// Releases the statement.
    ///
    /// # Errors
    /// Returns the driver's error if the release failed
    async fn close(self) -> DriverResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Lazy, finite, forward-only row stream.
pub trait Cursor {
    /// Moves to the next row. `Ok(false)` means the rows are exhausted.
    ///
    /// # Errors
    /// Returns the driver's error if the next row could not be read
    async fn advance(&mut self) -> DriverResult<bool>;

    /// Reads the first column of the current row as text.
    ///
    /// # Errors
    /// Returns the driver's error if there is no current row or the value
    /// is NULL or not text
    fn scan_text(&self) -> DriverResult<String>;

    /// Releases the cursor, discarding unread rows.
    ///
    /// # Errors
    /// Returns the driver's error if the remaining rows could not be discarded
    async fn close(self) -> DriverResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}
