//! Integration tests for the entity directory
//!
//! Tests entity creation, listing, deletion, and what deletion does to
//! durable and transient components.

use std::collections::HashSet;

use spellbook_foundation::{EntityId, ErrorKind, Result};
use spellbook_storage::{Cursor, Manager, ManagerConfig, OnEntityDelete};

use crate::fixtures::{Xyz, attach, manager, store};

// =============================================================================
// Creation and Listing
// =============================================================================

#[test]
fn new_entities_are_distinct() {
    let m = manager();
    let ids: HashSet<EntityId> = (0..20).map(|_| m.new_entity().unwrap()).collect();
    assert_eq!(ids.len(), 20);
}

#[test]
fn list_entities() {
    let m = manager();
    let created: Vec<_> = (0..3).map(|_| m.new_entity().unwrap()).collect();

    let mut listed = Vec::new();
    let mut cursor = m.entities().unwrap();
    while cursor.advance() {
        listed.push(*cursor.current().unwrap());
    }
    assert!(cursor.last_error().is_none());
    cursor.close().unwrap();

    listed.sort();
    assert_eq!(listed, created);
}

#[test]
fn list_entities_as_iterator() {
    let m = manager();
    let e = m.new_entity().unwrap();
    let listed = m.entities().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(listed, [e]);
}

#[test]
fn entity_exists() {
    let m = manager();
    let e = m.new_entity().unwrap();
    assert!(m.entity_exists(e).unwrap());
    assert!(!m.entity_exists(EntityId::new(e.raw() + 100)).unwrap());
}

// =============================================================================
// Deletion
// =============================================================================

#[test]
fn delete_empty_entity() {
    let mut m = manager();
    let e = m.new_entity().unwrap();
    m.delete_entity(e).unwrap();

    let mut cursor = m.entities().unwrap();
    assert!(!cursor.advance());
    cursor.close().unwrap();
}

#[test]
fn delete_unknown_entity() {
    let mut m = manager();
    let err = m.delete_entity(EntityId::new(404)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
}

#[test]
fn delete_cascades_to_durable_rows() {
    let mut m = manager();
    let e = m.new_entity().unwrap();
    attach(&mut m, "xyz!", e, Xyz::new(1, 2, 3));

    m.delete_entity(e).unwrap();

    assert!(!m.has_component("xyz!", e).unwrap());
    let err = m.get_component::<Xyz>("xyz!", e).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoComponent { .. }));
    assert_eq!(m.components::<Xyz>("xyz!").unwrap().count(), 0);
}

#[test]
fn delete_orphans_transient_components_by_default() {
    let mut m = manager();
    let e = m.new_entity().unwrap();
    attach(&mut m, "xyz~", e, Xyz::new(1, 2, 3));

    m.delete_entity(e).unwrap();

    assert_eq!(m.components_of(e).unwrap(), ["xyz~"]);
    assert_eq!(
        m.get_component::<Xyz>("xyz~", e).unwrap().data(),
        &Xyz::new(1, 2, 3)
    );
}

#[test]
fn delete_cascades_to_transient_when_configured() {
    let mut m = Manager::with_config(
        store(),
        ManagerConfig::new().with_on_entity_delete(OnEntityDelete::Cascade),
    );
    m.register_transient::<Xyz>("xyz~", &[]).unwrap();
    let keep = m.new_entity().unwrap();
    let gone = m.new_entity().unwrap();
    attach(&mut m, "xyz~", keep, Xyz::new(1, 1, 1));
    attach(&mut m, "xyz~", gone, Xyz::new(2, 2, 2));

    m.delete_entity(gone).unwrap();

    assert!(m.components_of(gone).unwrap().is_empty());
    assert_eq!(m.components_of(keep).unwrap(), ["xyz~"]);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn custom_directory_table() {
    let store = store();
    store
        .execute_batch(
            "CREATE TABLE actors (actor_id INTEGER NOT NULL PRIMARY KEY);
             CREATE TABLE pos (owner INTEGER NOT NULL PRIMARY KEY REFERENCES actors(actor_id) ON DELETE CASCADE,
                               X INTEGER NOT NULL, Y INTEGER NOT NULL, Z INTEGER NOT NULL);",
        )
        .unwrap();
    let config = ManagerConfig::new()
        .with_entities_table("actors")
        .with_entity_id_column("actor_id")
        .with_component_key_column("owner");
    let mut m = Manager::with_config(store, config);
    m.register_durable::<Xyz>("pos", "pos", &[]).unwrap();

    let e = m.new_entity().unwrap();
    attach(&mut m, "pos", e, Xyz::new(4, 5, 6));
    assert_eq!(
        m.get_component::<Xyz>("pos", e).unwrap().into_data(),
        Xyz::new(4, 5, 6)
    );

    m.delete_entity(e).unwrap();
    assert!(!m.has_component("pos", e).unwrap());
}
