//! Integration tests for component queries
//!
//! Tests predicate semantics, conjunction, validation, and parameter binding
//! on both backends.

use std::collections::BTreeSet;

use spellbook_foundation::{EntityId, ErrorKind, Result};
use spellbook_storage::{Component, Manager, Op, SqliteStore};

use crate::fixtures::{Nd, Xyz, attach, manager};

const BACKENDS: [&str; 2] = ["xyz!", "xyz~"];

/// Five entities with `Y` in {2, 5, 5, 5, 5}; every `Y = 5` entity has
/// `Z >= 7`.
fn five_entities() -> (Manager<SqliteStore>, Vec<EntityId>) {
    let mut m = manager();
    let rows = [(1, 2, 0), (2, 5, 7), (3, 5, 8), (4, 5, 9), (5, 5, 10)];
    let mut entities = Vec::new();
    for (x, y, z) in rows {
        let e = m.new_entity().unwrap();
        for name in BACKENDS {
            attach(&mut m, name, e, Xyz::new(x, y, z));
        }
        entities.push(e);
    }
    (m, entities)
}

fn entities_of(results: Vec<Component<Xyz>>) -> BTreeSet<EntityId> {
    results.iter().map(Component::entity).collect()
}

// =============================================================================
// Predicate Semantics
// =============================================================================

#[test]
fn equality_returns_exact_subset() {
    let (m, entities) = five_entities();
    for name in BACKENDS {
        let results = m
            .query::<Xyz>(name)
            .unwrap()
            .eq("Y", 5)
            .run()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(results.len(), 4, "{name}");
        assert!(results.iter().all(|c| c.data().z >= 7));
        assert!(results.iter().all(|c| !c.is_new()));
        assert_eq!(entities_of(results), entities[1..].iter().copied().collect::<BTreeSet<_>>());
    }
}

#[test]
fn each_operator() {
    let (m, _) = five_entities();
    let cases: [(Op, i64, usize); 6] = [
        (Op::Eq, 8, 1),
        (Op::Ne, 8, 4),
        (Op::Lt, 8, 2),
        (Op::Le, 8, 3),
        (Op::Gt, 8, 2),
        (Op::Ge, 8, 3),
    ];
    for name in BACKENDS {
        for (op, literal, expected) in cases {
            let count = m
                .query::<Xyz>(name)
                .unwrap()
                .filter("Z", op, literal)
                .run()
                .unwrap()
                .count();
            assert_eq!(count, expected, "{name} Z {op} {literal}");
        }
    }
}

#[test]
fn convenience_wrappers() {
    let (m, _) = five_entities();
    for name in BACKENDS {
        let q = || m.query::<Xyz>(name).unwrap();
        assert_eq!(q().neq("Y", 5).run().unwrap().count(), 1);
        assert_eq!(q().lt("X", 3).run().unwrap().count(), 2);
        assert_eq!(q().lte("X", 3).run().unwrap().count(), 3);
        assert_eq!(q().gt("X", 3).run().unwrap().count(), 2);
        assert_eq!(q().gte("X", 3).run().unwrap().count(), 3);
    }
}

#[test]
fn predicates_conjoin_in_order() {
    let (m, entities) = five_entities();
    for name in BACKENDS {
        let query = m.query::<Xyz>(name).unwrap().eq("Y", 5).lt("Z", 9).gt("X", 2);
        assert_eq!(query.predicates().len(), 3);
        assert_eq!(query.predicates()[1].field, "Z");

        let results = query.run().unwrap().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(entities_of(results), BTreeSet::from([entities[2]]));
    }
}

#[test]
fn operators_parse_from_strings() {
    let (m, _) = five_entities();
    let op: Op = "<>".parse().unwrap();
    let count = m
        .query::<Xyz>("xyz!")
        .unwrap()
        .filter("Y", op, 5)
        .run()
        .unwrap()
        .count();
    assert_eq!(count, 1);
}

#[test]
fn no_predicates_returns_everything() {
    let (m, _) = five_entities();
    for name in BACKENDS {
        assert_eq!(m.components::<Xyz>(name).unwrap().count(), 5);
    }
}

#[test]
fn text_compares_lexicographically() {
    let mut m = manager();
    for n in ["apple", "Banana", "cherry"] {
        let e = m.new_entity().unwrap();
        attach(&mut m, "N?", e, Nd { n: n.into() });
    }

    let names: BTreeSet<String> = m
        .query::<Nd>("N?")
        .unwrap()
        .lt("N", "b")
        .run()
        .unwrap()
        .map(|c| c.unwrap().into_data().n)
        .collect();
    // Uppercase sorts before lowercase
    assert_eq!(names, BTreeSet::from(["Banana".to_string(), "apple".to_string()]));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn unknown_field_fails_at_run() {
    let (m, _) = five_entities();
    for name in BACKENDS {
        let err = m.query::<Xyz>(name).unwrap().eq("W", 1).run().err().unwrap();
        assert!(matches!(err.kind, ErrorKind::FieldMismatch { .. }));
    }
}

#[test]
fn wrong_literal_kind_fails_at_run() {
    let (m, _) = five_entities();
    for name in BACKENDS {
        let err = m
            .query::<Xyz>(name)
            .unwrap()
            .eq("Y", 5)
            .eq("X", "five")
            .run()
            .err()
            .unwrap();
        assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    }
}

#[test]
fn unregistered_query() {
    let m = manager();
    let err = m.query::<Xyz>("ghost").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ComponentNotRegistered(_)));
}

#[test]
fn literals_are_never_spliced_into_statements() {
    let mut m = manager();
    let e = m.new_entity().unwrap();
    attach(&mut m, "N?", e, Nd { n: "plain".into() });

    let hostile = "x' OR '1' = '1";
    let count = m
        .query::<Nd>("N?")
        .unwrap()
        .eq("N", hostile)
        .run()
        .unwrap()
        .count();
    assert_eq!(count, 0);

    let dropper = "'; DROP TABLE nd; --";
    assert_eq!(
        m.query::<Nd>("N?").unwrap().eq("N", dropper).run().unwrap().count(),
        0
    );
    assert_eq!(m.components::<Nd>("N?").unwrap().count(), 1);
}
