//! Entity identifiers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque entity identifier.
///
/// Identifiers are assigned by the entity directory's backing store and carry
/// no data of their own. They are unique among live entities; reuse after
/// deletion is up to the store.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(i64);

impl EntityId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw store identifier.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
