//! The iteration protocol shared by both backends.
//!
//! A [`Cursor`] walks zero or more items with an explicit lifecycle:
//! `advance` moves to the next item, `current` borrows it, `last_error`
//! reports why iteration stopped early, and `close` releases whatever the
//! cursor holds. `close` is idempotent.
//!
//! Calling `current` before the first `advance`, or after `close`, records an
//! [`ErrorKind::IteratorMisuse`](spellbook_foundation::ErrorKind) error and
//! returns `None` instead of stale data.

use std::mem;
use std::vec;

use spellbook_foundation::{Error, Result, Value};

use crate::binder::Record;
use crate::component::Component;
use crate::store::RowCursor;

const BEFORE_ADVANCE: &str = "current() called before advance()";
const AFTER_CLOSE: &str = "iterator already closed";

/// A closeable cursor over query results.
pub trait Cursor {
    /// The item type yielded.
    type Item;

    /// Moves to the next item. Returns `false` when exhausted, closed, or
    /// failed; check [`last_error`](Self::last_error) to tell them apart.
    fn advance(&mut self) -> bool;

    /// Borrows the item the last `advance` moved to.
    fn current(&mut self) -> Option<&Self::Item>;

    /// Returns the error that stopped iteration, if any.
    fn last_error(&self) -> Option<&Error>;

    /// Releases held resources. Repeated calls succeed.
    ///
    /// # Errors
    ///
    /// Returns a store error if a live cursor fails to release.
    fn close(&mut self) -> Result<()>;
}

/// Records a misuse error when `current` is called out of protocol.
fn check_current(started: bool, closed: bool, error: &mut Option<Error>) -> bool {
    let reason = if closed {
        AFTER_CLOSE
    } else if !started {
        BEFORE_ADVANCE
    } else {
        return true;
    };
    *error = Some(Error::iterator_misuse(reason));
    false
}

/// A cursor over a precomputed list. Holds no backend resource.
#[derive(Debug)]
pub struct SliceCursor<T> {
    items: vec::IntoIter<T>,
    current: Option<T>,
    started: bool,
    closed: bool,
    error: Option<Error>,
}

impl<T> SliceCursor<T> {
    /// Creates a cursor over `items`, in order.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
            current: None,
            started: false,
            closed: false,
            error: None,
        }
    }

    /// Returns the number of items not yet visited.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    fn take_next(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        self.started = true;
        self.items.next()
    }
}

impl<T> Cursor for SliceCursor<T> {
    type Item = T;

    fn advance(&mut self) -> bool {
        self.current = self.take_next();
        self.current.is_some()
    }

    fn current(&mut self) -> Option<&T> {
        if check_current(self.started, self.closed, &mut self.error) {
            self.current.as_ref()
        } else {
            None
        }
    }

    fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.current = None;
        self.items = Vec::new().into_iter();
        Ok(())
    }
}

impl<T> Iterator for SliceCursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.take_next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.closed {
            (0, Some(0))
        } else {
            self.items.size_hint()
        }
    }
}

type Bind<'s, T> = Box<dyn FnMut(Record) -> Result<T> + 's>;

/// A cursor over a live store row cursor, binding one row per advance.
///
/// The row cursor is released on `close`, on `Drop`, or both; dropping an
/// unfinished cursor never leaks it.
pub struct StoreCursor<'s, T> {
    rows: Box<dyn RowCursor + 's>,
    columns: Vec<String>,
    bind: Bind<'s, T>,
    buffer: Vec<Value>,
    current: Option<T>,
    started: bool,
    done: bool,
    closed: bool,
    error: Option<Error>,
}

impl<'s, T> StoreCursor<'s, T> {
    /// Wraps a row cursor with a per-row bind step.
    pub fn new(
        rows: Box<dyn RowCursor + 's>,
        bind: impl FnMut(Record) -> Result<T> + 's,
    ) -> Self {
        let columns = rows.column_names().to_vec();
        let buffer = Vec::with_capacity(columns.len());
        Self {
            rows,
            columns,
            bind: Box::new(bind),
            buffer,
            current: None,
            started: false,
            done: false,
            closed: false,
            error: None,
        }
    }

    /// Returns the result column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Reads and binds the next row. Stops for good after exhaustion or the
    /// first error.
    fn fetch(&mut self) -> Option<Result<T>> {
        if self.closed || self.done {
            return None;
        }
        self.started = true;
        self.buffer.clear();
        let item = match self.rows.scan_row_into(&mut self.buffer) {
            Ok(false) => None,
            Ok(true) => {
                let record = Record::from_row(&self.columns, mem::take(&mut self.buffer));
                Some((self.bind)(record))
            }
            Err(e) => Some(Err(e)),
        };
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

impl<T> Cursor for StoreCursor<'_, T> {
    type Item = T;

    fn advance(&mut self) -> bool {
        self.current = None;
        match self.fetch() {
            Some(Ok(item)) => {
                self.current = Some(item);
                true
            }
            Some(Err(e)) => {
                self.error = Some(e);
                false
            }
            None => false,
        }
    }

    fn current(&mut self) -> Option<&T> {
        if check_current(self.started, self.closed, &mut self.error) {
            self.current.as_ref()
        } else {
            None
        }
    }

    fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.current = None;
        self.rows.close()
    }
}

impl<T> Iterator for StoreCursor<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        self.fetch()
    }
}

impl<T> Drop for StoreCursor<'_, T> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.rows.close() {
                tracing::warn!(target: "spellbook.cursor", error = %e, "failed to release store cursor");
            }
        }
    }
}

/// The result of a component query.
///
/// Transient queries are materialized up front; durable queries bind rows
/// lazily from a live store cursor.
pub enum Components<'s, C> {
    /// Precomputed matches.
    Buffered(SliceCursor<Component<C>>),
    /// Live store rows.
    Live(StoreCursor<'s, Component<C>>),
}

impl<C> Components<'_, C> {
    /// Returns true if results come from a live store cursor.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl<C> Cursor for Components<'_, C> {
    type Item = Component<C>;

    fn advance(&mut self) -> bool {
        match self {
            Self::Buffered(cursor) => cursor.advance(),
            Self::Live(cursor) => cursor.advance(),
        }
    }

    fn current(&mut self) -> Option<&Component<C>> {
        match self {
            Self::Buffered(cursor) => cursor.current(),
            Self::Live(cursor) => cursor.current(),
        }
    }

    fn last_error(&self) -> Option<&Error> {
        match self {
            Self::Buffered(cursor) => cursor.last_error(),
            Self::Live(cursor) => cursor.last_error(),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            Self::Buffered(cursor) => cursor.close(),
            Self::Live(cursor) => cursor.close(),
        }
    }
}

impl<C> Iterator for Components<'_, C> {
    type Item = Result<Component<C>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Buffered(cursor) => cursor.next().map(Ok),
            Self::Live(cursor) => cursor.next(),
        }
    }
}
