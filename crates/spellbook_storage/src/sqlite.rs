//! SQLite record store backed by `rusqlite`.

use std::path::Path;

use ouroboros::self_referencing;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, Rows, Statement, params_from_iter};
use spellbook_foundation::{Error, Result, Value};

use crate::store::{Execution, RecordStore, RowCursor};

/// A [`RecordStore`] over a SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wraps an existing connection as-is.
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens a private in-memory database with foreign keys enforced.
    ///
    /// # Errors
    ///
    /// Returns a store error if the database cannot be opened.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::store)?;
        Self::with_foreign_keys(conn)
    }

    /// Opens (or creates) a database file with foreign keys enforced.
    ///
    /// # Errors
    ///
    /// Returns a store error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::store)?;
        Self::with_foreign_keys(conn)
    }

    fn with_foreign_keys(conn: Connection) -> Result<Self> {
        // Entity deletion reaches durable component rows through ON DELETE CASCADE
        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(Error::store)?;
        Ok(Self { conn })
    }

    /// Runs a batch of statements with no arguments, e.g. schema creation.
    ///
    /// # Errors
    ///
    /// Returns a store error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(Error::store)
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordStore for SqliteStore {
    fn execute(&self, statement: &str, args: &[Value]) -> Result<Execution> {
        let mut stmt = self.conn.prepare(statement).map_err(Error::store)?;
        let rows_affected = stmt
            .execute(params_from_iter(args.iter().map(Arg)))
            .map_err(Error::store)?;
        Ok(Execution {
            rows_affected: rows_affected as u64,
            last_insert_id: self.conn.last_insert_rowid(),
        })
    }

    fn query(&self, statement: &str, args: &[Value]) -> Result<Box<dyn RowCursor + '_>> {
        let stmt = self.conn.prepare(statement).map_err(Error::store)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let live = LiveRows::try_new(stmt, |stmt| {
            stmt.query(params_from_iter(args.iter().map(Arg)))
        })
        .map_err(Error::store)?;

        Ok(Box::new(SqliteRows {
            columns,
            live: Some(live),
        }))
    }
}

/// A prepared statement together with the rows it is stepping through.
#[self_referencing]
struct LiveRows<'c> {
    stmt: Statement<'c>,
    #[borrows(mut stmt)]
    #[not_covariant]
    rows: Rows<'this>,
}

/// Row cursor over a SQLite result set.
///
/// Each call to `scan_row_into` steps the statement once. The statement is
/// finalized on exhaustion, on `close`, or when the cursor is dropped.
struct SqliteRows<'c> {
    columns: Vec<String>,
    live: Option<LiveRows<'c>>,
}

impl RowCursor for SqliteRows<'_> {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn scan_row_into(&mut self, buffer: &mut Vec<Value>) -> Result<bool> {
        buffer.clear();
        let Some(live) = self.live.as_mut() else {
            return Ok(false);
        };
        let width = self.columns.len();
        let stepped = live.with_rows_mut(|rows| -> Result<bool> {
            let Some(row) = rows.next().map_err(Error::store)? else {
                return Ok(false);
            };
            for i in 0..width {
                buffer.push(from_sql(row.get_ref(i).map_err(Error::store)?)?);
            }
            Ok(true)
        });
        if !matches!(stepped, Ok(true)) {
            self.live = None;
        }
        stepped
    }

    fn close(&mut self) -> Result<()> {
        self.live = None;
        Ok(())
    }
}

/// Binds a [`Value`] as a statement argument.
struct Arg<'a>(&'a Value);

impl ToSql for Arg<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Int(n) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
            Value::Float(n) => ToSqlOutput::Owned(SqlValue::Real(*n)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(n) => Ok(Value::Int(n)),
        ValueRef::Real(n) => Ok(Value::Float(n)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(Value::from)
            .map_err(Error::store),
        ValueRef::Blob(_) => Err(Error::type_mismatch("scalar", "blob")),
    }
}
