//! Configuration for the component manager.

/// What deleting an entity does to its transient components.
///
/// Durable component rows follow the record store's own referential rules
/// (e.g. `ON DELETE CASCADE`); transient stores have no such rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OnEntityDelete {
    /// Leave transient entries in place. Callers clean up explicitly.
    #[default]
    Orphan,
    /// Remove the entity's entry from every transient store.
    Cascade,
}

/// Configuration for a [`Manager`](crate::Manager).
///
/// Names the store locations the manager reads and writes but never creates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Table holding the entity directory.
    pub entities_table: String,
    /// Auto-assigned identifier column of the entity directory.
    pub entity_id_column: String,
    /// Key column present in every durable component table.
    pub component_key_column: String,
    /// Transient cleanup policy on entity deletion.
    pub on_entity_delete: OnEntityDelete,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            entities_table: "entities".to_string(),
            entity_id_column: "id".to_string(),
            component_key_column: "entity_id".to_string(),
            on_entity_delete: OnEntityDelete::Orphan,
        }
    }
}

impl ManagerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the entity directory table.
    #[must_use]
    pub fn with_entities_table(mut self, table: impl Into<String>) -> Self {
        self.entities_table = table.into();
        self
    }

    /// Builder method to set the entity directory identifier column.
    #[must_use]
    pub fn with_entity_id_column(mut self, column: impl Into<String>) -> Self {
        self.entity_id_column = column.into();
        self
    }

    /// Builder method to set the durable component key column.
    #[must_use]
    pub fn with_component_key_column(mut self, column: impl Into<String>) -> Self {
        self.component_key_column = column.into();
        self
    }

    /// Builder method to set the transient cleanup policy.
    #[must_use]
    pub fn with_on_entity_delete(mut self, policy: OnEntityDelete) -> Self {
        self.on_entity_delete = policy;
        self
    }
}
