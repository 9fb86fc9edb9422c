//! Integration tests for component registration
//!
//! Tests durable table probing, the shared name space, and descriptors.

use spellbook_foundation::{ErrorKind, Type};
use spellbook_storage::{Backend, Cursor, FieldSchema};

use crate::fixtures::{Nd, Stats, Tag, Xyz, empty_manager};

// =============================================================================
// Empty Manager
// =============================================================================

#[test]
fn empty_manager_has_nothing() {
    let m = empty_manager();
    assert!(m.component_names().is_empty());

    let mut entities = m.entities().unwrap();
    assert!(!entities.advance());
    assert!(entities.last_error().is_none());
    entities.close().unwrap();
}

// =============================================================================
// Durable Registration
// =============================================================================

#[test]
fn register_durable_component() {
    let mut m = empty_manager();
    m.register_durable::<Xyz>("xyz!", "xyz", &[]).unwrap();

    assert_eq!(m.component_names(), ["xyz!"]);
    let descriptor = m.descriptor("xyz!").unwrap();
    assert_eq!(
        descriptor.backend(),
        &Backend::Durable {
            table: "xyz".to_string()
        }
    );
    assert_eq!(
        descriptor.fields(),
        [
            FieldSchema::new("X", Type::I64),
            FieldSchema::new("Y", Type::I64),
            FieldSchema::new("Z", Type::I64),
        ]
    );
}

#[test]
fn register_missing_table_fails_without_entry() {
    let mut m = empty_manager();
    let err = m
        .register_durable::<Xyz>("xyz!", "no_such_table", &[])
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Store(_)));
    assert!(m.component_names().is_empty());
    assert!(m.descriptor("xyz!").is_err());
}

#[test]
fn register_against_incompatible_table_is_field_mismatch() {
    let mut m = empty_manager();
    let err = m.register_durable::<Nd>("N?", "xyz", &[]).unwrap_err();

    assert!(matches!(err.kind, ErrorKind::FieldMismatch { .. }));
    assert!(m.component_names().is_empty());
}

#[test]
fn register_requires_key_column() {
    let mut m = empty_manager();
    // The entities table has an id column but no entity_id
    let err = m.register_durable::<Tag>("tag", "entities", &[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::FieldMismatch { .. }));
}

#[test]
fn register_tag_and_mixed_types() {
    let mut m = empty_manager();
    m.register_durable::<Tag>("tag", "tags", &[]).unwrap();
    m.register_durable::<Stats>("stats", "stats", &["tag"]).unwrap();

    assert_eq!(m.component_names(), ["stats", "tag"]);
    assert_eq!(m.descriptor("stats").unwrap().dependencies(), ["tag"]);
    assert!(m.descriptor("tag").unwrap().fields().is_empty());
}

#[test]
fn field_names_are_case_sensitive() {
    use spellbook_storage::{ComponentData, Shape};

    #[derive(Default)]
    struct Lower {
        x: i64,
    }

    impl ComponentData for Lower {
        fn shape() -> Shape<Self> {
            Shape::<Self>::new().field("n", |c: &Self| c.x, |c: &mut Self, v| c.x = v)
        }
    }

    let mut m = empty_manager();
    let err = m.register_durable::<Lower>("lower", "nd", &[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::FieldMismatch { .. }));
}

// =============================================================================
// Duplicate Names
// =============================================================================

#[test]
fn duplicate_durable_name() {
    let mut m = empty_manager();
    m.register_durable::<Xyz>("xyz!", "xyz", &[]).unwrap();
    let err = m.register_durable::<Nd>("xyz!", "nd", &[]).unwrap_err();

    assert!(matches!(err.kind, ErrorKind::ComponentAlreadyRegistered(_)));
    assert_eq!(m.component_names(), ["xyz!"]);
    // The first descriptor is untouched
    assert_eq!(m.descriptor("xyz!").unwrap().fields().len(), 3);
}

#[test]
fn duplicate_across_backends_either_order() {
    let mut m = empty_manager();
    m.register_durable::<Xyz>("a", "xyz", &[]).unwrap();
    m.register_transient::<Nd>("b", &[]).unwrap();

    let err = m.register_transient::<Xyz>("a", &[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ComponentAlreadyRegistered(_)));

    let err = m.register_durable::<Nd>("b", "nd", &[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ComponentAlreadyRegistered(_)));

    assert_eq!(m.component_names(), ["a", "b"]);
    assert!(m.descriptor("a").unwrap().backend().is_durable());
    assert!(!m.descriptor("b").unwrap().backend().is_durable());
}

#[test]
fn unknown_descriptor_is_not_registered() {
    let m = empty_manager();
    let err = m.descriptor("ghost").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ComponentNotRegistered(_)));
}
