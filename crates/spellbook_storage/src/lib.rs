//! Component registry, durable and transient backends, and queries for
//! Spellbook.
//!
//! This crate provides:
//! - [`Manager`] - The context object owning the registry and transient stores
//! - [`RecordStore`] - The tabular store contract durable components use
//! - [`Shape`] - Declared, typed field lists replacing runtime reflection
//! - [`Query`] - Conjunctive field predicates routed to the owning backend
//! - [`Cursor`] - The closeable iteration protocol shared by both backends

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod binder;
mod component;
mod config;
mod cursor;
mod durable;
mod entity;
mod manager;
mod query;
mod registry;
mod schema;
#[cfg(feature = "sqlite")]
mod sqlite;
mod store;
mod transient;

pub use binder::{Binder, Record};
pub use component::{Component, ComponentData};
pub use config::{ManagerConfig, OnEntityDelete};
pub use cursor::{Components, Cursor, SliceCursor, StoreCursor};
pub use durable::DurableBackend;
pub use entity::{Entities, EntityDirectory};
pub use manager::Manager;
pub use query::{Op, Predicate, Query, UnknownOp};
pub use registry::{Backend, Descriptor, Registry};
pub use schema::{Field, FieldSchema, Scalar, Shape};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use store::{Execution, RecordStore, RowCursor, quote_ident};
pub use transient::TransientStore;
