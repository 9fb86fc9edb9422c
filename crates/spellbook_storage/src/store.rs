//! The record store contract consumed by the durable backend.
//!
//! Stores are tabular: schema-defined tables, parameterized statements, and
//! row cursors. Creating tables is the caller's job; Spellbook only issues
//! statements against tables that already exist.

use spellbook_foundation::{Result, Value};

/// Outcome of a statement that does not return rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Execution {
    /// Rows inserted, updated, or deleted.
    pub rows_affected: u64,
    /// Identifier assigned by the most recent insert.
    pub last_insert_id: i64,
}

/// A tabular record store.
///
/// Literal values are always passed as positional `?` arguments, never
/// spliced into statement text.
pub trait RecordStore {
    /// Runs a statement that does not return rows.
    ///
    /// # Errors
    ///
    /// Returns a store error for malformed statements or constraint
    /// violations.
    fn execute(&self, statement: &str, args: &[Value]) -> Result<Execution>;

    /// Runs a statement that returns rows.
    ///
    /// # Errors
    ///
    /// Returns a store error if the statement cannot be prepared or run.
    fn query(&self, statement: &str, args: &[Value]) -> Result<Box<dyn RowCursor + '_>>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn execute(&self, statement: &str, args: &[Value]) -> Result<Execution> {
        (**self).execute(statement, args)
    }

    fn query(&self, statement: &str, args: &[Value]) -> Result<Box<dyn RowCursor + '_>> {
        (**self).query(statement, args)
    }
}

/// A cursor over the rows of a query.
pub trait RowCursor {
    /// Returns the result column names in order.
    fn column_names(&self) -> &[String];

    /// Moves to the next row and copies its values into `buffer`.
    ///
    /// Returns `false` once the rows are exhausted.
    ///
    /// # Errors
    ///
    /// Returns a store error if the row cannot be read.
    fn scan_row_into(&mut self, buffer: &mut Vec<Value>) -> Result<bool>;

    /// Releases the cursor. Must be idempotent.
    ///
    /// # Errors
    ///
    /// Returns a store error if the underlying resource fails to release.
    fn close(&mut self) -> Result<()>;
}

/// Quotes an identifier for use in statement text.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
