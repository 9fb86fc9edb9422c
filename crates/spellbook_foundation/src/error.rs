//! Error types for the Spellbook system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every error is returned to the immediate caller; nothing in the system
//! retries or falls back.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;

/// Result alias used throughout Spellbook.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Spellbook operations.
#[derive(Debug)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Fills in context fields this error does not already carry.
    ///
    /// Inner layers set the most specific context (a field name, say) and
    /// outer layers add the component and entity on the way out.
    #[must_use]
    pub fn within(mut self, outer: ErrorContext) -> Self {
        let merged = match self.context.take() {
            Some(inner) => ErrorContext {
                operation: inner.operation.or(outer.operation),
                component: inner.component.or(outer.component),
                entity: inner.entity.or(outer.entity),
                field: inner.field.or(outer.field),
            },
            None => outer,
        };
        self.context = Some(merged);
        self
    }

    /// Creates a component-not-registered error.
    #[must_use]
    pub fn not_registered(component: impl Into<String>) -> Self {
        Self::new(ErrorKind::ComponentNotRegistered(component.into()))
    }

    /// Creates a component-already-registered error.
    #[must_use]
    pub fn already_registered(component: impl Into<String>) -> Self {
        Self::new(ErrorKind::ComponentAlreadyRegistered(component.into()))
    }

    /// Creates a missing-component error.
    #[must_use]
    pub fn no_component(component: impl Into<String>, entity: EntityId) -> Self {
        Self::new(ErrorKind::NoComponent {
            component: component.into(),
            entity,
        })
    }

    /// Creates a duplicate-component error.
    #[must_use]
    pub fn duplicate_component(component: impl Into<String>, entity: EntityId) -> Self {
        Self::new(ErrorKind::DuplicateComponent {
            component: component.into(),
            entity,
        })
    }

    /// Creates an unsatisfied-dependencies error.
    #[must_use]
    pub fn unsatisfied_dependencies(
        component: impl Into<String>,
        entity: EntityId,
        missing: Vec<String>,
    ) -> Self {
        Self::new(ErrorKind::UnsatisfiedDependencies {
            component: component.into(),
            entity,
            missing,
        })
    }

    /// Creates a field mismatch error.
    #[must_use]
    pub fn field_mismatch(component: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldMismatch {
            component: component.into(),
            field: field.into(),
        })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }

    /// Creates an iterator misuse error.
    #[must_use]
    pub fn iterator_misuse(reason: &'static str) -> Self {
        Self::new(ErrorKind::IteratorMisuse(reason))
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Wraps a record store failure.
    #[must_use]
    pub fn store(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::new(ErrorKind::Store(source.into()))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// An operation referenced an unknown component name.
    #[error("component not registered: {0}")]
    ComponentNotRegistered(String),

    /// A registration used a name already taken.
    #[error("component already registered: {0}")]
    ComponentAlreadyRegistered(String),

    /// Fetch or remove found no instance for the entity.
    #[error("no component {component} on {entity}")]
    NoComponent {
        /// The component name.
        component: String,
        /// The entity that was queried.
        entity: EntityId,
    },

    /// Create found an instance already present.
    #[error("duplicate component {component} on {entity}")]
    DuplicateComponent {
        /// The component name.
        component: String,
        /// The entity that already has it.
        entity: EntityId,
    },

    /// Create attempted without all prerequisite components present.
    #[error("{entity} lacks dependencies of {component}: {}", .missing.join(", "))]
    UnsatisfiedDependencies {
        /// The component being created.
        component: String,
        /// The entity it was being created on.
        entity: EntityId,
        /// Dependency names not present on the entity.
        missing: Vec<String>,
    },

    /// A store row or predicate referenced a field absent from the shape.
    #[error("field mismatch: {field} is not a field of {component}")]
    FieldMismatch {
        /// The component whose shape was consulted.
        component: String,
        /// The offending field or column name.
        field: String,
    },

    /// A runtime value does not match the declared type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: String,
        /// The actual type encountered.
        actual: String,
    },

    /// A cursor was used out of protocol.
    #[error("iterator misuse: {0}")]
    IteratorMisuse(&'static str),

    /// Entity was not found in the directory.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The record store reported a failure.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g. `save`, `scan`).
    pub operation: Option<&'static str>,
    /// The component involved.
    pub component: Option<String>,
    /// The entity involved.
    pub entity: Option<EntityId>,
    /// The field involved.
    pub field: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operation.
    #[must_use]
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets the component name.
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the entity.
    #[must_use]
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Sets the field name.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(operation) = self.operation {
            write!(f, "during {operation}")?;
            sep = ", ";
        }
        if let Some(component) = &self.component {
            write!(f, "{sep}component {component}")?;
            sep = ", ";
        }
        if let Some(field) = &self.field {
            write!(f, "{sep}field {field}")?;
            sep = ", ";
        }
        if let Some(entity) = self.entity {
            write!(f, "{sep}{entity}")?;
        }
        Ok(())
    }
}
