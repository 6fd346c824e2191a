//! Integration tests for loaders, managers and loader dispatch
//!
//! Tests the Role scenario end to end through a shared store.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use elemental_foundation::{ErrorKind, Value};
use elemental_metadata::{GeneratorKind, Profile};
use elemental_store::{
    Bindings, Loader, LoaderCache, LoaderRegistry, Manager, MemStore, SharedStore,
    StoreQuery, shared,
};

use crate::fixture::{Fixture, ROLE, fixture};

fn manager(f: &Fixture, store: &SharedStore) -> Manager {
    Manager::new(Loader::new(
        Arc::clone(&f.catalog),
        Arc::clone(store),
        Arc::clone(&f.meta),
    ))
    .unwrap()
}

fn insert(manager: &Manager, name: &str) -> elemental_metadata::Entity {
    let mut b = manager.builder();
    b.set("name", name).unwrap();
    manager.insert(&mut b).unwrap()
}

// =============================================================================
// Role Scenario
// =============================================================================

#[test]
fn role_scenario() {
    let f = fixture();
    let store = shared(MemStore::default());
    let roles = manager(&f, &store);

    let student = insert(&roles, "student");
    let loader = roles.loader();
    let found = loader
        .fetch_unique("byName", &Bindings::new().with("name", "student"))
        .unwrap();
    assert_eq!(found, Some(student.clone()));

    // Mutable, non-indexed field: same reference, keys unchanged.
    let mut edit = roles.builder();
    edit.load(&student).unwrap().set("scope", "site").unwrap();
    assert!(roles.update(&student, &edit).unwrap().ptr_eq(&student));
    assert_eq!(
        loader
            .fetch_unique("byName", &Bindings::new().with("name", "student"))
            .unwrap(),
        Some(student.clone())
    );

    // Mutable, indexed field: same reference, key moved.
    let mut rename = roles.builder();
    rename.load(&student).unwrap().set("name", "learner").unwrap();
    assert!(roles.update(&student, &rename).unwrap().ptr_eq(&student));
    assert!(
        loader
            .fetch_unique("byName", &Bindings::new().with("name", "student"))
            .unwrap()
            .is_none()
    );
    assert_eq!(
        loader
            .fetch_unique("byName", &Bindings::new().with("name", "learner"))
            .unwrap(),
        Some(student)
    );
}

#[test]
fn identifiers_continue_after_stored_ones() {
    let f = fixture();
    let mut mem = MemStore::default();
    for (id, name) in [(3, "a"), (7, "b"), (5, "c")] {
        mem.insert(f.role(id, name, "course")).unwrap();
    }
    let store = shared(mem);
    let roles = manager(&f, &store);
    let next = insert(&roles, "d");
    assert_eq!(next.value("id").unwrap(), Some(Value::Int(8)));
    assert_eq!(roles.loader().fetch_by_id(8).unwrap(), Some(next));
}

#[test]
fn immutable_change_replaces_member() {
    let f = fixture();
    let store = shared(MemStore::default());
    let roles = manager(&f, &store);
    let student = insert(&roles, "student");

    let mut edit = roles.builder();
    edit.load(&student).unwrap().set("id", 100).unwrap();
    let replacement = roles.update(&student, &edit).unwrap();
    assert!(!replacement.ptr_eq(&student));
    assert!(roles.loader().fetch_by_id(1).unwrap().is_none());
    assert_eq!(roles.loader().fetch_by_id(100).unwrap(), Some(replacement));
}

#[test]
fn failed_replacement_restores_original() {
    let f = fixture();
    let store = shared(MemStore::default());
    let roles = manager(&f, &store);
    let student = insert(&roles, "student");
    let tutor = insert(&roles, "tutor");

    let mut edit = roles.builder();
    edit.load(&student).unwrap().set("id", 2).unwrap();
    let err = roles.update(&student, &edit).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateKey { .. }));

    let loader = roles.loader();
    assert!(store.read().contains(&student));
    assert_eq!(student.value("id").unwrap(), Some(Value::Int(1)));
    assert_eq!(loader.fetch_by_id(1).unwrap(), Some(student.clone()));
    assert_eq!(loader.fetch_by_id(2).unwrap(), Some(tutor));
    assert_eq!(
        loader
            .fetch_unique("byName", &Bindings::new().with("name", "student"))
            .unwrap(),
        Some(student)
    );
    assert_eq!(loader.fetch_all().unwrap().len(), 2);
}

#[test]
fn managers_on_one_store_draw_from_one_sequence() {
    let f = fixture();
    let store = shared(MemStore::default());
    let first = manager(&f, &store);
    let second = manager(&f, &store);
    let student = insert(&first, "student");
    let tutor = insert(&second, "tutor");
    let admin = insert(&first, "admin");
    assert_eq!(student.value("id").unwrap(), Some(Value::Int(1)));
    assert_eq!(tutor.value("id").unwrap(), Some(Value::Int(2)));
    assert_eq!(admin.value("id").unwrap(), Some(Value::Int(3)));

    let other = shared(MemStore::default());
    let elsewhere = insert(&manager(&f, &other), "student");
    assert_eq!(elsewhere.value("id").unwrap(), Some(Value::Int(1)));
}

#[test]
fn update_of_non_member_fails() {
    let f = fixture();
    let store = shared(MemStore::default());
    let roles = manager(&f, &store);
    let stray = f.role(1, "stray", "course");
    let mut edit = roles.builder();
    edit.load(&stray).unwrap();
    let err = roles.update(&stray, &edit).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Identity(_)));
}

#[test]
fn pass_through_profile_requires_ids() {
    let f = fixture();
    let profile = Profile::builder("import")
        .with_generator(ROLE, GeneratorKind::PassThrough)
        .build()
        .unwrap();
    let store = shared(MemStore::new(profile));
    let roles = manager(&f, &store);
    let mut b = roles.builder();
    b.set("name", "student").unwrap();
    assert!(matches!(
        roles.insert(&mut b).unwrap_err().kind,
        ErrorKind::Validation { .. }
    ));
    b.set("id", 42).unwrap();
    let role = roles.insert(&mut b).unwrap();
    assert_eq!(role.value("id").unwrap(), Some(Value::Int(42)));
}

#[test]
fn concurrent_readers_share_a_store() {
    let f = fixture();
    let store = shared(MemStore::default());
    let roles = manager(&f, &store);
    for n in 0..50 {
        insert(&roles, &format!("role-{n}"));
    }
    let loader = roles.loader().clone();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let loader = loader.clone();
            thread::spawn(move || loader.fetch_all().unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 50);
    }
    let all = store
        .read()
        .query_all(&f.selector("all"), &Bindings::new())
        .unwrap();
    assert_eq!(all.len(), 50);
}

// =============================================================================
// Dispatch
// =============================================================================

#[derive(Debug)]
struct RoleFinder(Loader);

#[test]
fn loader_cache_builds_typed_loaders() {
    let f = fixture();
    let mut registry = LoaderRegistry::new();
    registry
        .register(ROLE, "RoleRow", |loader| Arc::new(RoleFinder(loader)))
        .unwrap();
    let cache = LoaderCache::new(
        Arc::clone(&f.catalog),
        Arc::new(registry),
        NonZeroUsize::new(8).unwrap(),
    );

    let store = shared(MemStore::default());
    store.write().insert(f.role(1, "student", "course")).unwrap();
    let finder = cache.get::<RoleFinder>(&store, ROLE).unwrap();
    assert!(finder.0.fetch_by_id(1).unwrap().is_some());
    assert!(Arc::ptr_eq(&finder, &cache.get::<RoleFinder>(&store, ROLE).unwrap()));

    let mut registry = LoaderRegistry::new();
    registry
        .register(ROLE, "RoleRow", |loader| Arc::new(RoleFinder(loader)))
        .unwrap();
    let err = registry
        .register(ROLE, "RoleRow", |loader| Arc::new(RoleFinder(loader)))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Conflict(_)));
}
