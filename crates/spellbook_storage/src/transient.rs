//! In-memory component storage.
//!
//! Each transient component name owns one [`TransientStore`]: a persistent
//! ordered map from entity to the component's flattened record. Scans walk
//! the map in entity order and evaluate predicates with the same
//! [`Value::compare`](spellbook_foundation::Value::compare) the durable
//! backend's store applies.

use im::OrdMap;
use spellbook_foundation::EntityId;

use crate::binder::Record;
use crate::query::Predicate;

/// Records of one transient component, keyed by entity.
#[derive(Clone, Debug, Default)]
pub struct TransientStore {
    rows: OrdMap<EntityId, Record>,
}

impl TransientStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the entity has a record.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Gets the entity's record.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&Record> {
        self.rows.get(&entity)
    }

    /// Inserts or replaces the entity's record. Returns the previous one.
    pub fn put(&mut self, entity: EntityId, record: Record) -> Option<Record> {
        tracing::trace!(target: "spellbook.transient", %entity, "put");
        self.rows.insert(entity, record)
    }

    /// Removes the entity's record.
    pub fn remove(&mut self, entity: EntityId) -> Option<Record> {
        tracing::trace!(target: "spellbook.transient", %entity, "remove");
        self.rows.remove(&entity)
    }

    /// Returns every record matching all predicates, in entity order.
    ///
    /// Predicates are assumed to have been validated against the descriptor.
    #[must_use]
    pub fn scan(&self, predicates: &[Predicate]) -> Vec<(EntityId, Record)> {
        self.rows
            .iter()
            .filter(|(_, record)| predicates.iter().all(|p| p.matches_record(record)))
            .map(|(entity, record)| (*entity, record.clone()))
            .collect()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
