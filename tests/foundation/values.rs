//! Integration tests for Value, Type, and EntityId
//!
//! Tests conversions, comparison semantics, and type compatibility.

use std::cmp::Ordering;

use spellbook_foundation::{EntityId, Type, Value};

// =============================================================================
// Conversions
// =============================================================================

#[test]
fn integers_widen_to_int() {
    assert_eq!(Value::from(7_i8), Value::Int(7));
    assert_eq!(Value::from(-7_i16), Value::Int(-7));
    assert_eq!(Value::from(70_000_i32), Value::Int(70_000));
    assert_eq!(Value::from(i64::MAX).value_type(), Type::I64);
}

#[test]
fn text_from_str_and_string() {
    assert_eq!(Value::from("e1"), Value::from(String::from("e1")));
    assert_eq!(Value::from("e1").as_str(), Some("e1"));
}

#[test]
fn accessors_reject_other_kinds() {
    assert_eq!(Value::from(true).as_int(), None);
    assert_eq!(Value::from(1_i64).as_str(), None);
    assert!(Value::Null.is_null());
}

// =============================================================================
// Comparison
// =============================================================================

#[test]
fn compare_numbers_across_kinds() {
    assert_eq!(Value::Int(2).compare(&Value::Float(2.0)), Some(Ordering::Equal));
    assert_eq!(Value::Float(1.5).compare(&Value::Int(2)), Some(Ordering::Less));
}

#[test]
fn compare_text_bytewise() {
    assert_eq!(
        Value::from("Zebra").compare(&Value::from("apple")),
        Some(Ordering::Less)
    );
    assert_eq!(
        Value::from("ab").compare(&Value::from("abc")),
        Some(Ordering::Less)
    );
}

#[test]
fn compare_across_kinds_is_none() {
    assert_eq!(Value::from("5").compare(&Value::Int(5)), None);
    assert_eq!(Value::Bool(true).compare(&Value::Int(1)), None);
    assert_eq!(Value::Null.compare(&Value::Null), None);
}

#[test]
fn nan_never_compares() {
    assert_eq!(Value::Float(f64::NAN).compare(&Value::Float(1.0)), None);
}

// =============================================================================
// Type Compatibility
// =============================================================================

#[test]
fn integer_fields_accept_any_integer() {
    assert!(Type::I8.accepts(Type::I64));
    assert!(Type::I64.accepts(Type::I16));
    assert!(!Type::I32.accepts(Type::F64));
}

#[test]
fn float_fields_accept_numbers() {
    assert!(Type::F32.accepts(Type::I64));
    assert!(Type::F64.accepts(Type::F64));
    assert!(!Type::F64.accepts(Type::Text));
}

#[test]
fn text_and_bool_are_exact() {
    assert!(Type::Text.accepts(Type::Text));
    assert!(!Type::Text.accepts(Type::I64));
    assert!(!Type::Bool.accepts(Type::I64));
    assert!(!Type::Bool.accepts(Type::Null));
}

// =============================================================================
// EntityId
// =============================================================================

#[test]
fn entity_id_round_trips_raw() {
    let id = EntityId::new(17);
    assert_eq!(id.raw(), 17);
    assert_eq!(EntityId::from(17), id);
}

#[test]
fn entity_id_formats() {
    let id = EntityId::new(4);
    assert_eq!(format!("{id}"), "Entity(4)");
    assert_eq!(format!("{id:?}"), "EntityId(4)");
}

#[test]
fn entity_ids_order_numerically() {
    let mut ids = vec![EntityId::new(10), EntityId::new(2), EntityId::new(7)];
    ids.sort();
    assert_eq!(ids, [EntityId::new(2), EntityId::new(7), EntityId::new(10)]);
}
