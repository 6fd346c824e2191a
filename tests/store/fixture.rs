//! Shared catalog for the store tests.

use std::sync::Arc;

use elemental_foundation::{ElementType, Value, ValueType};
use elemental_metadata::{Catalog, Entity, Implementation, Property, Selector};

pub const ROLE: ElementType = ElementType::new("Role");

#[derive(Debug, Default)]
pub struct RoleRow {
    id: Option<i64>,
    name: Option<Arc<str>>,
    scope: Option<Arc<str>>,
}

pub struct Fixture {
    pub catalog: Arc<Catalog>,
    pub meta: Arc<dyn Implementation>,
}

impl Fixture {
    pub fn role(&self, id: i64, name: &str, scope: &str) -> Entity {
        let mut b = self.catalog.builder(ROLE, "RoleRow").unwrap();
        b.set("id", id)
            .unwrap()
            .set("name", name)
            .unwrap()
            .set("scope", scope)
            .unwrap();
        b.build(None).unwrap()
    }

    pub fn selector(&self, name: &str) -> Selector {
        self.catalog
            .definition(ROLE)
            .unwrap()
            .selector(name)
            .unwrap()
            .clone()
    }
}

/// `Role { id (required), name (mutable, required), scope (mutable) }` with
/// unique selectors `id` and `byName`, and a multi-valued `scope` selector.
pub fn fixture() -> Fixture {
    let mut catalog = Catalog::new();
    let id = Property::new(ROLE, "id", ValueType::Int).required();
    let name = Property::new(ROLE, "name", ValueType::String)
        .mutable()
        .required();
    let scope = Property::new(ROLE, "scope", ValueType::String).mutable();
    let mut b = catalog.define(ROLE);
    b.add_property(id.clone())
        .unwrap()
        .add_property(name.clone())
        .unwrap()
        .add_property(scope.clone())
        .unwrap()
        .add_selector(Selector::of(ROLE, &id, true))
        .unwrap()
        .add_selector(Selector::unique(ROLE, "byName", [name]))
        .unwrap()
        .add_selector(Selector::of(ROLE, &scope, false))
        .unwrap();
    catalog.register(b).unwrap();

    let binding = catalog
        .bind(ROLE, "RoleRow", RoleRow::default)
        .unwrap()
        .property("id", |r| r.id.map(Value::Int), |r, v| {
            r.id = v.and_then(|v| v.as_int());
        })
        .unwrap()
        .property("name", |r| r.name.clone().map(Value::String), |r, v| {
            r.name = v.and_then(|v| v.as_shared_str());
        })
        .unwrap()
        .property("scope", |r| r.scope.clone().map(Value::String), |r, v| {
            r.scope = v.and_then(|v| v.as_shared_str());
        })
        .unwrap();
    let meta = catalog.implement(binding).unwrap();
    Fixture {
        catalog: Arc::new(catalog),
        meta,
    }
}
