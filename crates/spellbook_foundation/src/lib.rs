//! Core types, scalar values, and errors for Spellbook.
//!
//! This crate provides:
//! - [`EntityId`] - Opaque store-assigned entity identifiers
//! - [`Type`] - Scalar type descriptors for component fields
//! - [`Value`] - The scalar value type exchanged with record stores
//! - [`Error`] - Error kinds with component/entity context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod entity;
mod error;
mod types;
mod value;

pub use entity::EntityId;
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use types::Type;
pub use value::Value;
