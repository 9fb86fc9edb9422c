//! Typed component values attached to entities.

use spellbook_foundation::EntityId;

use crate::schema::Shape;

/// A Rust type usable as a component.
///
/// Implementors declare their fields once through [`Shape`]; the default
/// value is the zero-valued instance handed out by component creation.
pub trait ComponentData: Default + 'static {
    /// Declares the ordered field list of this component type.
    fn shape() -> Shape<Self>;
}

/// A component instance: typed data attached to one entity under one name.
///
/// Instances are plain values owned by the caller. Changes reach the backend
/// only through an explicit save.
#[derive(Clone, Debug, PartialEq)]
pub struct Component<C> {
    entity: EntityId,
    name: String,
    is_new: bool,
    data: C,
}

impl<C> Component<C> {
    /// Creates an instance that has not been observed in its backend yet.
    pub(crate) fn fresh(entity: EntityId, name: impl Into<String>, data: C) -> Self {
        Self {
            entity,
            name: name.into(),
            is_new: true,
            data,
        }
    }

    /// Creates an instance read back from its backend.
    pub(crate) fn loaded(entity: EntityId, name: impl Into<String>, data: C) -> Self {
        Self {
            entity,
            name: name.into(),
            is_new: false,
            data,
        }
    }

    pub(crate) fn mark_saved(&mut self) {
        self.is_new = false;
    }

    /// Returns the entity this instance is attached to.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Returns the registered component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true until the instance has been saved or was loaded.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Returns the component data.
    #[must_use]
    pub fn data(&self) -> &C {
        &self.data
    }

    /// Returns the component data for mutation.
    pub fn data_mut(&mut self) -> &mut C {
        &mut self.data
    }

    /// Consumes the instance, returning its data.
    #[must_use]
    pub fn into_data(self) -> C {
        self.data
    }
}
