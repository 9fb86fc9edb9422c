//! The entity directory, backed by the store's entities table.

use spellbook_foundation::{EntityId, Error, ErrorContext, Result, Type, Value};

use crate::binder::Record;
use crate::config::ManagerConfig;
use crate::cursor::StoreCursor;
use crate::store::{RecordStore, quote_ident};

/// A live cursor over every entity in the directory.
pub type Entities<'s> = StoreCursor<'s, EntityId>;

/// Creates, deletes and lists entity identifiers.
pub struct EntityDirectory<'s, S> {
    store: &'s S,
    table: &'s str,
    id_column: &'s str,
}

impl<'s, S: RecordStore> EntityDirectory<'s, S> {
    /// Binds the directory described by `config` to a store.
    pub fn new(store: &'s S, config: &'s ManagerConfig) -> Self {
        Self {
            store,
            table: &config.entities_table,
            id_column: &config.entity_id_column,
        }
    }

    fn context(operation: &'static str) -> ErrorContext {
        ErrorContext::new().with_operation(operation)
    }

    /// Inserts a new entity and returns the identifier the store assigned.
    ///
    /// # Errors
    ///
    /// Returns a store error if the insert fails.
    pub fn create(&self) -> Result<EntityId> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (NULL)",
            quote_ident(self.table),
            quote_ident(self.id_column)
        );
        let execution = self
            .store
            .execute(&sql, &[])
            .map_err(|e| e.within(Self::context("new_entity")))?;
        let entity = EntityId::new(execution.last_insert_id);
        tracing::debug!(target: "spellbook.entity", %entity, "created");
        Ok(entity)
    }

    /// Deletes an entity. Durable component rows follow the store's
    /// referential rules.
    ///
    /// # Errors
    ///
    /// Returns an entity-not-found error if nothing was deleted, or a store
    /// error.
    pub fn delete(&self, entity: EntityId) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_ident(self.table),
            quote_ident(self.id_column)
        );
        let execution = self
            .store
            .execute(&sql, &[Value::Int(entity.raw())])
            .map_err(|e| e.within(Self::context("delete_entity").with_entity(entity)))?;
        if execution.rows_affected == 0 {
            return Err(Error::entity_not_found(entity));
        }
        tracing::debug!(target: "spellbook.entity", %entity, "deleted");
        Ok(())
    }

    /// Checks whether the entity is in the directory.
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup fails.
    pub fn exists(&self, entity: EntityId) -> Result<bool> {
        let sql = format!(
            "SELECT {id} FROM {} WHERE {id} = ?",
            quote_ident(self.table),
            id = quote_ident(self.id_column)
        );
        let lookup = || -> Result<bool> {
            let mut cursor = self.store.query(&sql, &[Value::Int(entity.raw())])?;
            let found = cursor.scan_row_into(&mut Vec::new())?;
            cursor.close()?;
            Ok(found)
        };
        lookup().map_err(|e| e.within(Self::context("entity_exists").with_entity(entity)))
    }

    /// Lists every entity through a live cursor, in store order.
    ///
    /// # Errors
    ///
    /// Returns a store error if the listing cannot start.
    pub fn list(&self) -> Result<Entities<'s>> {
        let sql = format!(
            "SELECT {} FROM {}",
            quote_ident(self.id_column),
            quote_ident(self.table)
        );
        let rows = self
            .store
            .query(&sql, &[])
            .map_err(|e| e.within(Self::context("entities")))?;
        Ok(StoreCursor::new(rows, |record: Record| {
            match record.values().next() {
                Some(Value::Int(id)) => Ok(EntityId::new(*id)),
                Some(other) => Err(Error::type_mismatch(Type::I64, other.value_type())),
                None => Err(Error::type_mismatch(Type::I64, Type::Null)),
            }
        }))
    }
}
