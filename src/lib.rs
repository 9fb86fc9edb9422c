//! Spellbook - Typed components on integer entities
//!
//! This crate re-exports all layers of the Spellbook system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: spellbook_storage    - Registry, durable/transient backends, queries
//! Layer 0: spellbook_foundation - Core types (Value, EntityId, Error)
//! ```

pub use spellbook_foundation as foundation;
pub use spellbook_storage as storage;
