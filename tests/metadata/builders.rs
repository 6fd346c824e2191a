//! Integration tests for element builders
//!
//! Tests building new instances, in-place updates, replacement instances
//! and validation on both paths.

use std::sync::Arc;

use elemental_foundation::{ElementType, ErrorKind, Value, ValueType};
use elemental_metadata::{Catalog, ElementBuilder, Entity, Property, Selector};

const ROLE: ElementType = ElementType::new("Role");

#[derive(Debug, Default)]
struct RoleRecord {
    id: Option<i64>,
    name: Option<Arc<str>>,
    notes: Option<Arc<str>>,
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    let id = Property::new(ROLE, "id", ValueType::Int).required();
    let name = Property::new(ROLE, "name", ValueType::String)
        .mutable()
        .required();
    let notes = Property::new(ROLE, "notes", ValueType::String).mutable();
    let mut b = catalog.define(ROLE);
    b.add_property(id)
        .unwrap()
        .add_property(name.clone())
        .unwrap()
        .add_property(notes)
        .unwrap()
        .add_selector(Selector::unique(ROLE, "byName", [name]))
        .unwrap();
    catalog.register(b).unwrap();

    let binding = catalog
        .bind(ROLE, "RoleRecord", RoleRecord::default)
        .unwrap()
        .property("id", |r| r.id.map(Value::Int), |r, v| {
            r.id = v.and_then(|v| v.as_int());
        })
        .unwrap()
        .property("name", |r| r.name.clone().map(Value::String), |r, v| {
            r.name = v.and_then(|v| v.as_shared_str());
        })
        .unwrap()
        .property("notes", |r| r.notes.clone().map(Value::String), |r, v| {
            r.notes = v.and_then(|v| v.as_shared_str());
        })
        .unwrap();
    catalog.implement(binding).unwrap();
    catalog
}

fn builder(catalog: &Catalog) -> ElementBuilder {
    catalog.builder(ROLE, "RoleRecord").unwrap()
}

fn student(catalog: &Catalog) -> Entity {
    let mut b = builder(catalog);
    b.set("id", 1).unwrap().set("name", "student").unwrap();
    b.build(None).unwrap()
}

// =============================================================================
// New Instances
// =============================================================================

#[test]
fn build_without_existing_creates_instance() {
    let catalog = catalog();
    let role = student(&catalog);
    assert_eq!(role.element_type(), ROLE);
    assert_eq!(role.value("name").unwrap(), Some(Value::from("student")));
    assert_eq!(role.value("notes").unwrap(), None);
}

#[test]
fn build_without_required_value_fails() {
    let catalog = catalog();
    let mut b = builder(&catalog);
    b.set("name", "student").unwrap();
    let err = b.build(None).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Validation { ref property, .. } if property == "id"));
}

#[test]
fn builder_rejects_wrong_value_type() {
    let catalog = catalog();
    let mut b = builder(&catalog);
    let err = b.set("id", "one").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let err = b.set("colour", "red").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownProperty { .. }));
}

// =============================================================================
// Updates
// =============================================================================

#[test]
fn unchanged_builder_returns_existing() {
    let catalog = catalog();
    let role = student(&catalog);
    let mut b = builder(&catalog);
    b.load(&role).unwrap();
    assert!(b.build(Some(&role)).unwrap().ptr_eq(&role));
}

#[test]
fn mutable_change_keeps_reference() {
    let catalog = catalog();
    let role = student(&catalog);
    let handle = role.clone();
    let mut b = builder(&catalog);
    b.load(&role).unwrap().set("name", "learner").unwrap();
    let updated = b.build(Some(&role)).unwrap();
    assert!(updated.ptr_eq(&role));
    assert_eq!(handle.value("name").unwrap(), Some(Value::from("learner")));
}

#[test]
fn immutable_change_builds_replacement() {
    let catalog = catalog();
    let role = student(&catalog);
    let mut b = builder(&catalog);
    b.load(&role).unwrap().set("id", 2).unwrap();
    let replacement = b.build(Some(&role)).unwrap();
    assert!(!replacement.ptr_eq(&role));
    assert_eq!(role.value("id").unwrap(), Some(Value::Int(1)));
    assert_eq!(replacement.value("id").unwrap(), Some(Value::Int(2)));
    assert_eq!(replacement.value("name").unwrap(), Some(Value::from("student")));
}

#[test]
fn clearing_required_value_fails_in_place() {
    let catalog = catalog();
    let role = student(&catalog);
    let name = catalog.definition(ROLE).unwrap().property("name").unwrap().clone();
    let mut b = builder(&catalog);
    b.load(&role).unwrap().clear_property(&name).unwrap();
    let err = b.build(Some(&role)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Validation { .. }));
    assert_eq!(role.value("name").unwrap(), Some(Value::from("student")));
}

#[test]
fn optional_value_can_be_cleared() {
    let catalog = catalog();
    let mut b = builder(&catalog);
    b.set("id", 5)
        .unwrap()
        .set("name", "tutor")
        .unwrap()
        .set("notes", "part time")
        .unwrap();
    let role = b.build(None).unwrap();

    let notes = catalog.definition(ROLE).unwrap().property("notes").unwrap().clone();
    let mut edit = builder(&catalog);
    edit.load(&role).unwrap().clear_property(&notes).unwrap();
    assert!(edit.build(Some(&role)).unwrap().ptr_eq(&role));
    assert_eq!(role.value("notes").unwrap(), None);
}

#[test]
fn builder_can_be_reused_after_clear() {
    let catalog = catalog();
    let mut b = builder(&catalog);
    b.set("id", 1).unwrap().set("name", "a").unwrap();
    let first = b.build(None).unwrap();
    b.clear();
    b.set("id", 2).unwrap().set("name", "b").unwrap();
    let second = b.build(None).unwrap();
    assert!(!first.ptr_eq(&second));
    assert_eq!(first.value("name").unwrap(), Some(Value::from("a")));
}
