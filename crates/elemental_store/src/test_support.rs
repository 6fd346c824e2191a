//! Shared fixture for store unit tests.

use std::sync::Arc;

use elemental_foundation::{ElementType, Value, ValueType};
use elemental_metadata::{Catalog, Definition, Entity, Implementation, Property, Selector};

pub(crate) const ROLE: ElementType = ElementType::new("Role");

#[derive(Debug, Default)]
pub(crate) struct RoleData {
    id: Option<i64>,
    name: Option<Arc<str>>,
    kind: Option<Arc<str>>,
}

pub(crate) struct Fixture {
    pub catalog: Arc<Catalog>,
    pub definition: Arc<Definition>,
    pub meta: Arc<dyn Implementation>,
}

impl Fixture {
    pub fn role(&self, id: i64, name: &str) -> Entity {
        let mut builder = self.catalog.builder(ROLE, "RoleData").unwrap();
        builder.set("id", id).unwrap().set("name", name).unwrap();
        builder.build(None).unwrap()
    }

    pub fn role_of_kind(&self, id: i64, name: &str, kind: &str) -> Entity {
        let mut builder = self.catalog.builder(ROLE, "RoleData").unwrap();
        builder
            .set("id", id)
            .unwrap()
            .set("name", name)
            .unwrap()
            .set("kind", kind)
            .unwrap();
        builder.build(None).unwrap()
    }

    pub fn selector(&self, name: &str) -> Selector {
        self.definition.selector(name).unwrap().clone()
    }
}

pub(crate) fn fixture() -> Fixture {
    let mut catalog = Catalog::new();
    let id = Property::new(ROLE, "id", ValueType::Int).required();
    let name = Property::new(ROLE, "name", ValueType::String)
        .mutable()
        .required();
    let kind = Property::new(ROLE, "kind", ValueType::String).mutable();

    let mut b = catalog.define(ROLE);
    b.add_property(id.clone())
        .unwrap()
        .add_property(name.clone())
        .unwrap()
        .add_property(kind.clone())
        .unwrap()
        .add_selector(Selector::of(ROLE, &id, true))
        .unwrap()
        .add_selector(Selector::of(ROLE, &name, true))
        .unwrap()
        .add_selector(Selector::of(ROLE, &kind, false))
        .unwrap();
    let definition = catalog.register(b).unwrap();

    let binding = catalog
        .bind(ROLE, "RoleData", RoleData::default)
        .unwrap()
        .property("id", |r| r.id.map(Value::Int), |r, v| {
            r.id = v.and_then(|v| v.as_int());
        })
        .unwrap()
        .property("name", |r| r.name.clone().map(Value::String), |r, v| {
            r.name = v.and_then(|v| v.as_shared_str());
        })
        .unwrap()
        .property("kind", |r| r.kind.clone().map(Value::String), |r, v| {
            r.kind = v.and_then(|v| v.as_shared_str());
        })
        .unwrap();
    let meta = catalog.implement(binding).unwrap();

    Fixture {
        catalog: Arc::new(catalog),
        definition,
        meta,
    }
}
