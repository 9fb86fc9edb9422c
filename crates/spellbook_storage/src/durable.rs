//! Durable component storage: one table per component, one row per entity.
//!
//! Statement text is generated from the descriptor's field list. Table and
//! column names are quoted identifiers; every literal travels as a `?`
//! argument.

use spellbook_foundation::{EntityId, Error, ErrorContext, Result, Value};

use crate::binder::Record;
use crate::cursor::StoreCursor;
use crate::query::Predicate;
use crate::registry::Descriptor;
use crate::schema::FieldSchema;
use crate::store::{RecordStore, quote_ident};

/// `SELECT * FROM t WHERE 1 = 0`, used to learn a table's columns.
pub(crate) fn probe_statement(table: &str) -> String {
    format!("SELECT * FROM {} WHERE 1 = 0", quote_ident(table))
}

fn select_statement(table: &str, key: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(key)
    )
}

fn exists_statement(table: &str, key: &str) -> String {
    format!(
        "SELECT {key} FROM {} WHERE {key} = ?",
        quote_ident(table),
        key = quote_ident(key)
    )
}

fn insert_statement(table: &str, key: &str, fields: &[FieldSchema]) -> String {
    let columns: Vec<String> = fields
        .iter()
        .map(|f| quote_ident(&f.name))
        .chain(std::iter::once(quote_ident(key)))
        .collect();
    let params = vec!["?"; columns.len()];
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        params.join(", ")
    )
}

fn update_statement(table: &str, key: &str, fields: &[FieldSchema]) -> String {
    let assignments: Vec<String> = fields
        .iter()
        .map(|f| format!("{} = ?", quote_ident(&f.name)))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(table),
        assignments.join(", "),
        quote_ident(key)
    )
}

fn delete_statement(table: &str, key: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(key)
    )
}

fn scan_statement(table: &str, predicates: &[Predicate]) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut args = Vec::with_capacity(predicates.len());
    for (i, predicate) in predicates.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&quote_ident(&predicate.field));
        sql.push(' ');
        sql.push_str(predicate.op.as_sql());
        sql.push_str(" ?");
        args.push(predicate.literal.clone());
    }
    (sql, args)
}

/// Checks that `table` exists and carries the key column plus exactly the
/// declared fields. Reads no rows and writes nothing.
pub(crate) fn probe<S: RecordStore>(
    store: &S,
    component: &str,
    table: &str,
    key: &str,
    fields: &[FieldSchema],
) -> Result<()> {
    let context = || {
        ErrorContext::new()
            .with_operation("register")
            .with_component(component)
    };
    let mut cursor = store
        .query(&probe_statement(table), &[])
        .map_err(|e| e.within(context()))?;
    let columns = cursor.column_names().to_vec();
    cursor.close().map_err(|e| e.within(context()))?;

    let declared = |column: &str| column == key || fields.iter().any(|f| f.name == column);
    if let Some(extra) = columns.iter().find(|c| !declared(c.as_str())) {
        return Err(Error::field_mismatch(component, extra.as_str()).within(context()));
    }
    let present = |name: &str| columns.iter().any(|c| c == name);
    if let Some(missing) = std::iter::once(key)
        .chain(fields.iter().map(|f| f.name.as_str()))
        .find(|name| !present(name))
    {
        return Err(Error::field_mismatch(component, missing).within(context()));
    }
    Ok(())
}

/// Durable operations for one registered component.
pub struct DurableBackend<'s, S> {
    store: &'s S,
    descriptor: &'s Descriptor,
    table: &'s str,
    key: &'s str,
}

impl<'s, S: RecordStore> DurableBackend<'s, S> {
    /// Binds a store to a durable descriptor stored in `table`.
    pub fn new(store: &'s S, descriptor: &'s Descriptor, table: &'s str, key: &'s str) -> Self {
        Self {
            store,
            descriptor,
            table,
            key,
        }
    }

    fn context(&self, operation: &'static str, entity: EntityId) -> ErrorContext {
        ErrorContext::new()
            .with_operation(operation)
            .with_component(self.descriptor.name())
            .with_entity(entity)
    }

    /// Checks whether the entity has a row.
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup fails.
    pub fn exists(&self, entity: EntityId) -> Result<bool> {
        let sql = exists_statement(self.table, self.key);
        let lookup = || -> Result<bool> {
            let mut cursor = self.store.query(&sql, &[Value::Int(entity.raw())])?;
            let mut buffer = Vec::new();
            let found = cursor.scan_row_into(&mut buffer)?;
            cursor.close()?;
            Ok(found)
        };
        lookup().map_err(|e| e.within(self.context("exists", entity)))
    }

    /// Fails with a duplicate error if the entity already has a row.
    ///
    /// # Errors
    ///
    /// Returns a duplicate-component error or a store error.
    pub fn ensure_absent(&self, entity: EntityId) -> Result<()> {
        if self.exists(entity)? {
            Err(Error::duplicate_component(self.descriptor.name(), entity))
        } else {
            Ok(())
        }
    }

    /// Reads the entity's row, key column included.
    ///
    /// # Errors
    ///
    /// Returns a no-component error if there is no row, or a store error.
    pub fn fetch(&self, entity: EntityId) -> Result<Record> {
        let sql = select_statement(self.table, self.key);
        let read = || -> Result<Option<Record>> {
            let mut cursor = self.store.query(&sql, &[Value::Int(entity.raw())])?;
            let mut buffer = Vec::new();
            let row = if cursor.scan_row_into(&mut buffer)? {
                Some(Record::from_row(cursor.column_names(), buffer))
            } else {
                None
            };
            cursor.close()?;
            Ok(row)
        };
        read()
            .map_err(|e| e.within(self.context("fetch", entity)))?
            .ok_or_else(|| Error::no_component(self.descriptor.name(), entity))
    }

    /// Writes the component's fields.
    ///
    /// A new instance is inserted with every declared field plus the key. An
    /// existing one is updated in place; if its row is gone the update
    /// affects nothing and this fails with a no-component error. A tag
    /// component has nothing to update, so saving an existing one only
    /// checks that its row is still there.
    ///
    /// # Errors
    ///
    /// Returns a no-component error as described, or a store error.
    pub fn save(&self, entity: EntityId, is_new: bool, record: &Record) -> Result<()> {
        let fields = self.descriptor.fields();
        let mut args: Vec<Value> = record.values().cloned().collect();
        args.push(Value::Int(entity.raw()));

        if is_new {
            let sql = insert_statement(self.table, self.key, fields);
            tracing::trace!(target: "spellbook.durable", %entity, component = self.descriptor.name(), sql = %sql, "insert");
            self.store
                .execute(&sql, &args)
                .map_err(|e| e.within(self.context("save", entity)))?;
            return Ok(());
        }

        let affected = if fields.is_empty() {
            u64::from(self.exists(entity)?)
        } else {
            let sql = update_statement(self.table, self.key, fields);
            tracing::trace!(target: "spellbook.durable", %entity, component = self.descriptor.name(), sql = %sql, "update");
            self.store
                .execute(&sql, &args)
                .map_err(|e| e.within(self.context("save", entity)))?
                .rows_affected
        };
        if affected == 0 {
            return Err(Error::no_component(self.descriptor.name(), entity));
        }
        Ok(())
    }

    /// Deletes the entity's row.
    ///
    /// # Errors
    ///
    /// Returns a no-component error if no row was deleted, or a store error.
    pub fn remove(&self, entity: EntityId) -> Result<()> {
        let sql = delete_statement(self.table, self.key);
        tracing::trace!(target: "spellbook.durable", %entity, component = self.descriptor.name(), "delete");
        let execution = self
            .store
            .execute(&sql, &[Value::Int(entity.raw())])
            .map_err(|e| e.within(self.context("remove", entity)))?;
        if execution.rows_affected == 0 {
            return Err(Error::no_component(self.descriptor.name(), entity));
        }
        Ok(())
    }

    /// Starts a scan of every row matching all predicates. Rows are bound
    /// lazily, one per advance.
    ///
    /// # Errors
    ///
    /// Returns a store error if the statement cannot start.
    pub fn scan<T>(
        &self,
        predicates: &[Predicate],
        bind: impl FnMut(Record) -> Result<T> + 's,
    ) -> Result<StoreCursor<'s, T>> {
        let (sql, args) = scan_statement(self.table, predicates);
        tracing::trace!(target: "spellbook.durable", component = self.descriptor.name(), sql = %sql, "scan");
        let rows = self.store.query(&sql, &args).map_err(|e| {
            e.within(
                ErrorContext::new()
                    .with_operation("scan")
                    .with_component(self.descriptor.name()),
            )
        })?;
        Ok(StoreCursor::new(rows, bind))
    }
}
