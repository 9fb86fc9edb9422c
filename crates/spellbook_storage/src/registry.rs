//! Component descriptors and the registry that owns them.
//!
//! Durable and transient descriptors share one namespace. A descriptor is
//! immutable once registered.

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;

use spellbook_foundation::{Error, Result};

use crate::component::ComponentData;
use crate::schema::{FieldSchema, Shape};

/// Where instances of a component live.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// One row per entity in a record store table.
    Durable {
        /// The component's table.
        table: String,
    },
    /// An in-process map owned by the manager.
    Transient,
}

impl Backend {
    /// Returns true for durable components.
    #[must_use]
    pub const fn is_durable(&self) -> bool {
        matches!(self, Self::Durable { .. })
    }
}

/// The registered schema of a component name.
pub struct Descriptor {
    name: String,
    fields: Vec<FieldSchema>,
    backend: Backend,
    dependencies: Vec<String>,
    type_name: &'static str,
    shape: Box<dyn Any>,
}

impl Descriptor {
    /// Builds a descriptor for component type `C`, deriving its shape once.
    #[must_use]
    pub fn new<C: ComponentData>(
        name: impl Into<String>,
        backend: Backend,
        dependencies: &[&str],
    ) -> Self {
        let shape = C::shape();
        Self {
            name: name.into(),
            fields: shape.schemas(),
            backend,
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            type_name: type_name::<C>(),
            shape: Box::new(shape),
        }
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Looks up a declared field by exact (case-sensitive) name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the backend kind.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Returns the names of components required before this one is created.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Returns the Rust type name the component was registered with.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the cached shape, checking that `C` is the registered type.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the component was registered with a
    /// different Rust type.
    pub fn shape<C: ComponentData>(&self) -> Result<&Shape<C>> {
        self.shape
            .downcast_ref::<Shape<C>>()
            .ok_or_else(|| Error::type_mismatch(self.type_name, type_name::<C>()))
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("backend", &self.backend)
            .field("dependencies", &self.dependencies)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// All registered descriptors, keyed by name.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: BTreeMap<String, Descriptor>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered; the registry is
    /// left unchanged.
    pub fn insert(&mut self, descriptor: Descriptor) -> Result<()> {
        if self.descriptors.contains_key(descriptor.name()) {
            return Err(Error::already_registered(descriptor.name()));
        }
        self.descriptors
            .insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    /// Checks if a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Gets a descriptor by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not registered.
    pub fn get(&self, name: &str) -> Result<&Descriptor> {
        self.descriptors
            .get(name)
            .ok_or_else(|| Error::not_registered(name))
    }

    /// Returns all registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.descriptors.keys().cloned().collect()
    }

    /// Iterates descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.values()
    }

    /// Returns the number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
