//! The component manager: the explicit context owning the registry, the
//! record store handle, and every transient store.
//!
//! The manager does no internal locking. Mutating operations take
//! `&mut self`, so sharing a manager across threads means wrapping it in the
//! caller's own lock.

use std::collections::HashMap;

use spellbook_foundation::{EntityId, Error, ErrorContext, ErrorKind, Result};

use crate::binder::Binder;
use crate::component::{Component, ComponentData};
use crate::config::{ManagerConfig, OnEntityDelete};
use crate::cursor::{Components, SliceCursor};
use crate::durable::{self, DurableBackend};
use crate::entity::{Entities, EntityDirectory};
use crate::query::{Predicate, Query};
use crate::registry::{Backend, Descriptor, Registry};
use crate::store::RecordStore;
use crate::transient::TransientStore;

/// Registers components and routes every component operation to the
/// backend its descriptor names.
#[derive(Debug)]
pub struct Manager<S> {
    store: S,
    config: ManagerConfig,
    registry: Registry,
    transient: HashMap<String, TransientStore>,
}

impl<S: RecordStore> Manager<S> {
    /// Creates a manager with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ManagerConfig::default())
    }

    /// Creates a manager with an explicit configuration.
    pub fn with_config(store: S, config: ManagerConfig) -> Self {
        Self {
            store,
            config,
            registry: Registry::new(),
            transient: HashMap::new(),
        }
    }

    /// Returns the record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Consumes the manager, returning the record store. Transient data is
    /// dropped.
    pub fn into_store(self) -> S {
        self.store
    }

    fn directory(&self) -> EntityDirectory<'_, S> {
        EntityDirectory::new(&self.store, &self.config)
    }

    fn durable<'a>(&'a self, descriptor: &'a Descriptor, table: &'a str) -> DurableBackend<'a, S> {
        DurableBackend::new(
            &self.store,
            descriptor,
            table,
            &self.config.component_key_column,
        )
    }

    fn transient_store(&self, name: &str) -> Result<&TransientStore> {
        self.transient
            .get(name)
            .ok_or_else(|| Error::not_registered(name))
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Registers a component stored in the existing table `table`.
    ///
    /// The table is probed with a zero-row select; it must carry the key
    /// column and exactly the declared fields. Nothing is registered if the
    /// probe fails.
    ///
    /// # Errors
    ///
    /// Returns an already-registered error for a taken name, a store error
    /// if the table cannot be queried, and a field mismatch if its columns
    /// do not match the shape.
    pub fn register_durable<C: ComponentData>(
        &mut self,
        name: &str,
        table: &str,
        dependencies: &[&str],
    ) -> Result<()> {
        if self.registry.contains(name) {
            return Err(Error::already_registered(name));
        }
        let descriptor = Descriptor::new::<C>(
            name,
            Backend::Durable {
                table: table.to_string(),
            },
            dependencies,
        );
        durable::probe(
            &self.store,
            name,
            table,
            &self.config.component_key_column,
            descriptor.fields(),
        )?;
        self.registry.insert(descriptor)?;
        tracing::debug!(target: "spellbook.registry", component = name, table, "registered durable component");
        Ok(())
    }

    /// Registers a component kept in memory by this manager.
    ///
    /// # Errors
    ///
    /// Returns an already-registered error for a taken name.
    pub fn register_transient<C: ComponentData>(
        &mut self,
        name: &str,
        dependencies: &[&str],
    ) -> Result<()> {
        self.registry
            .insert(Descriptor::new::<C>(name, Backend::Transient, dependencies))?;
        self.transient.insert(name.to_string(), TransientStore::new());
        tracing::debug!(target: "spellbook.registry", component = name, "registered transient component");
        Ok(())
    }

    /// Returns every registered component name, sorted.
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Looks up a descriptor.
    ///
    /// # Errors
    ///
    /// Returns a not-registered error for an unknown name.
    pub fn descriptor(&self, name: &str) -> Result<&Descriptor> {
        self.registry.get(name)
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity.
    ///
    /// # Errors
    ///
    /// Returns a store error if the entity table rejects the insert.
    pub fn new_entity(&self) -> Result<EntityId> {
        self.directory().create()
    }

    /// Deletes an entity.
    ///
    /// Durable components go with it if the store cascades. Transient
    /// components are left alone unless the configuration asks for
    /// [`OnEntityDelete::Cascade`].
    ///
    /// # Errors
    ///
    /// Returns an entity-not-found error for an unknown entity, or a store
    /// error.
    pub fn delete_entity(&mut self, entity: EntityId) -> Result<()> {
        self.directory().delete(entity)?;
        if self.config.on_entity_delete == OnEntityDelete::Cascade {
            for (name, store) in &mut self.transient {
                if store.remove(entity).is_some() {
                    tracing::debug!(target: "spellbook.transient", %entity, component = name.as_str(), "cascaded entity delete");
                }
            }
        }
        Ok(())
    }

    /// Checks whether an entity is in the directory.
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup fails.
    pub fn entity_exists(&self, entity: EntityId) -> Result<bool> {
        self.directory().exists(entity)
    }

    /// Lists every entity through a live cursor.
    ///
    /// # Errors
    ///
    /// Returns a store error if the listing cannot start.
    pub fn entities(&self) -> Result<Entities<'_>> {
        self.directory().list()
    }

    // =========================================================================
    // Components
    // =========================================================================

    fn has(&self, descriptor: &Descriptor, entity: EntityId) -> Result<bool> {
        match descriptor.backend() {
            Backend::Durable { table } => self.durable(descriptor, table).exists(entity),
            Backend::Transient => Ok(self.transient_store(descriptor.name())?.contains(entity)),
        }
    }

    /// Checks whether the entity has an instance of the named component.
    ///
    /// # Errors
    ///
    /// Returns a not-registered error for an unknown name, or a store error.
    pub fn has_component(&self, name: &str, entity: EntityId) -> Result<bool> {
        self.has(self.registry.get(name)?, entity)
    }

    fn missing_dependencies(&self, descriptor: &Descriptor, entity: EntityId) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for dependency in descriptor.dependencies() {
            match self.has_component(dependency, entity) {
                Ok(true) => {}
                Ok(false) => missing.push(dependency.clone()),
                Err(e) if matches!(e.kind, ErrorKind::ComponentNotRegistered(_)) => {
                    missing.push(dependency.clone());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(missing)
    }

    /// Creates an unsaved, zero-valued instance of a component on an entity.
    ///
    /// Every dependency must already be present on the entity, and the
    /// entity must not already have the component. Nothing is written until
    /// [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns a not-registered error, a type mismatch if `C` is not the
    /// registered type, an unsatisfied-dependencies error, a duplicate
    /// error, or a store error.
    pub fn new_component<C: ComponentData>(
        &self,
        name: &str,
        entity: EntityId,
    ) -> Result<Component<C>> {
        let descriptor = self.registry.get(name)?;
        Binder::<C>::new(descriptor)?;

        let missing = self.missing_dependencies(descriptor, entity)?;
        if !missing.is_empty() {
            return Err(Error::unsatisfied_dependencies(name, entity, missing));
        }
        match descriptor.backend() {
            Backend::Durable { table } => self.durable(descriptor, table).ensure_absent(entity)?,
            Backend::Transient => {
                if self.transient_store(name)?.contains(entity) {
                    return Err(Error::duplicate_component(name, entity));
                }
            }
        }
        Ok(Component::fresh(entity, name, C::default()))
    }

    /// Loads the entity's instance of a component.
    ///
    /// # Errors
    ///
    /// Returns a not-registered error, a type mismatch if `C` is not the
    /// registered type, a no-component error, binder errors for rows that do
    /// not fit the shape, or a store error.
    pub fn get_component<C: ComponentData>(
        &self,
        name: &str,
        entity: EntityId,
    ) -> Result<Component<C>> {
        let descriptor = self.registry.get(name)?;
        let binder = Binder::<C>::new(descriptor)?;
        let data = match descriptor.backend() {
            Backend::Durable { table } => {
                let row = self.durable(descriptor, table).fetch(entity)?;
                binder.bind_row(&self.config.component_key_column, row)?.1
            }
            Backend::Transient => {
                let record = self
                    .transient_store(name)?
                    .get(entity)
                    .ok_or_else(|| Error::no_component(name, entity))?;
                binder.from_record(record.clone()).map_err(|e| {
                    e.within(ErrorContext::new().with_entity(entity))
                })?
            }
        };
        Ok(Component::loaded(entity, name, data))
    }

    /// Writes an instance to its backend and marks it saved.
    ///
    /// Durable instances are inserted when new and updated otherwise.
    /// Transient instances replace whatever the store held for the entity.
    ///
    /// # Errors
    ///
    /// Returns a not-registered error, a type mismatch if `C` is not the
    /// registered type (before any store call), a no-component error if a
    /// durable row vanished, or a store error. The instance stays unsaved on
    /// error.
    pub fn save<C: ComponentData>(&mut self, component: &mut Component<C>) -> Result<()> {
        let entity = component.entity();
        let descriptor = self.registry.get(component.name())?;
        let record = Binder::<C>::new(descriptor)?
            .to_record(component.data())
            .map_err(|e| e.within(ErrorContext::new().with_entity(entity)))?;
        match descriptor.backend() {
            Backend::Durable { table } => {
                DurableBackend::new(
                    &self.store,
                    descriptor,
                    table,
                    &self.config.component_key_column,
                )
                .save(entity, component.is_new(), &record)?;
            }
            Backend::Transient => {
                self.transient
                    .get_mut(descriptor.name())
                    .ok_or_else(|| Error::not_registered(descriptor.name()))?
                    .put(entity, record);
            }
        }
        component.mark_saved();
        Ok(())
    }

    /// Removes the entity's instance of a component.
    ///
    /// Other components that listed this one as a dependency are not
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns a not-registered error, a no-component error if there was
    /// nothing to remove, or a store error.
    pub fn remove_component(&mut self, name: &str, entity: EntityId) -> Result<()> {
        let descriptor = self.registry.get(name)?;
        match descriptor.backend() {
            Backend::Durable { table } => self.durable(descriptor, table).remove(entity),
            Backend::Transient => self
                .transient
                .get_mut(name)
                .and_then(|store| store.remove(entity))
                .map(|_| ())
                .ok_or_else(|| Error::no_component(name, entity)),
        }
    }

    /// Returns the names of every component the entity has, sorted.
    ///
    /// # Errors
    ///
    /// Returns a store error if a durable lookup fails.
    pub fn components_of(&self, entity: EntityId) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for descriptor in self.registry.iter() {
            if self.has(descriptor, entity)? {
                names.push(descriptor.name().to_string());
            }
        }
        Ok(names)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Starts a query against a component.
    ///
    /// # Errors
    ///
    /// Returns a not-registered error for an unknown name, or a type
    /// mismatch if `C` is not the registered type.
    pub fn query<C: ComponentData>(&self, name: &str) -> Result<Query<'_, S, C>> {
        let descriptor = self.registry.get(name)?;
        Binder::<C>::new(descriptor)?;
        Ok(Query::new(self, descriptor))
    }

    /// Iterates every instance of a component.
    ///
    /// # Errors
    ///
    /// Same as [`query`](Self::query) followed by `run`.
    pub fn components<C: ComponentData>(&self, name: &str) -> Result<Components<'_, C>> {
        self.query(name)?.run()
    }

    pub(crate) fn scan<'m, C: ComponentData>(
        &'m self,
        descriptor: &'m Descriptor,
        predicates: &[Predicate],
    ) -> Result<Components<'m, C>> {
        let binder = Binder::<C>::new(descriptor)?;
        let name = descriptor.name();
        match descriptor.backend() {
            Backend::Durable { table } => {
                let key = self.config.component_key_column.as_str();
                let cursor = self.durable(descriptor, table).scan(predicates, move |row| {
                    let (entity, data) = binder.bind_row(key, row)?;
                    Ok(Component::loaded(entity, name, data))
                })?;
                Ok(Components::Live(cursor))
            }
            Backend::Transient => {
                let matches = self
                    .transient_store(name)?
                    .scan(predicates)
                    .into_iter()
                    .map(|(entity, record)| -> Result<Component<C>> {
                        let data = binder
                            .from_record(record)
                            .map_err(|e| e.within(ErrorContext::new().with_entity(entity)))?;
                        Ok(Component::loaded(entity, name, data))
                    })
                    .collect::<Result<Vec<_>>>()?;
                tracing::trace!(target: "spellbook.transient", component = name, matches = matches.len(), "scan");
                Ok(Components::Buffered(SliceCursor::new(matches)))
            }
        }
    }
}
