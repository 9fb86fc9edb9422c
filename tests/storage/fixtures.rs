//! Shared schema and component types for storage tests.

use spellbook_foundation::EntityId;
use spellbook_storage::{ComponentData, Manager, Shape, SqliteStore};

pub const SCHEMA: &str = "
    CREATE TABLE entities (id INTEGER NOT NULL PRIMARY KEY);
    CREATE TABLE xyz (
        entity_id INTEGER NOT NULL PRIMARY KEY REFERENCES entities(id) ON DELETE CASCADE,
        X INTEGER NOT NULL,
        Y INTEGER NOT NULL,
        Z INTEGER NOT NULL
    );
    CREATE TABLE nd (
        entity_id INTEGER NOT NULL PRIMARY KEY REFERENCES entities(id) ON DELETE CASCADE,
        N TEXT NOT NULL
    );
    CREATE TABLE tags (
        entity_id INTEGER NOT NULL PRIMARY KEY REFERENCES entities(id) ON DELETE CASCADE
    );
    CREATE TABLE stats (
        entity_id INTEGER NOT NULL PRIMARY KEY REFERENCES entities(id) ON DELETE CASCADE,
        hp INTEGER NOT NULL,
        speed REAL NOT NULL,
        alive INTEGER NOT NULL,
        name TEXT NOT NULL
    );
";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Xyz {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Xyz {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl ComponentData for Xyz {
    fn shape() -> Shape<Self> {
        Shape::<Self>::new()
            .field("X", |c: &Self| c.x, |c: &mut Self, v| c.x = v)
            .field("Y", |c: &Self| c.y, |c: &mut Self, v| c.y = v)
            .field("Z", |c: &Self| c.z, |c: &mut Self, v| c.z = v)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Nd {
    pub n: String,
}

impl ComponentData for Nd {
    fn shape() -> Shape<Self> {
        Shape::<Self>::new().field("N", |c: &Self| c.n.clone(), |c: &mut Self, v| c.n = v)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tag;

impl ComponentData for Tag {
    fn shape() -> Shape<Self> {
        Shape::new()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub hp: i16,
    pub speed: f32,
    pub alive: bool,
    pub name: String,
}

impl ComponentData for Stats {
    fn shape() -> Shape<Self> {
        Shape::<Self>::new()
            .field("hp", |c: &Self| c.hp, |c: &mut Self, v| c.hp = v)
            .field("speed", |c: &Self| c.speed, |c: &mut Self, v| c.speed = v)
            .field("alive", |c: &Self| c.alive, |c: &mut Self, v| c.alive = v)
            .field("name", |c: &Self| c.name.clone(), |c: &mut Self, v| c.name = v)
    }
}

/// A fresh in-memory store with the test schema.
pub fn store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.execute_batch(SCHEMA).unwrap();
    store
}

/// A manager with nothing registered.
pub fn empty_manager() -> Manager<SqliteStore> {
    Manager::new(store())
}

/// A manager with `xyz!` and `N?` durable and `xyz~` transient.
pub fn manager() -> Manager<SqliteStore> {
    let mut m = empty_manager();
    m.register_durable::<Xyz>("xyz!", "xyz", &[]).unwrap();
    m.register_durable::<Nd>("N?", "nd", &[]).unwrap();
    m.register_transient::<Xyz>("xyz~", &[]).unwrap();
    m
}

/// Creates and saves a component in one step.
pub fn attach<C: ComponentData>(
    m: &mut Manager<SqliteStore>,
    name: &str,
    entity: EntityId,
    data: C,
) {
    let mut c = m.new_component::<C>(name, entity).unwrap();
    *c.data_mut() = data;
    m.save(&mut c).unwrap();
}
