//! Profiles choosing implementations and generators per store.

use elemental_domain::{
    COURSE, CourseData, CourseLoader, DEFAULT_LOADER_CAPACITY, Domain, LegacyCourse, ROLE,
    RoleLoader, Semester, USER, role, user,
};
use elemental_foundation::{ErrorKind, Value};
use elemental_metadata::{GeneratorKind, Profile};
use elemental_store::{ID_PROPERTY, MemStore, RANDOM_SEED_PARAMETER, shared};

fn domain() -> Domain {
    Domain::new(DEFAULT_LOADER_CAPACITY).unwrap()
}

// =============================================================================
// Implementations
// =============================================================================

#[test]
fn loaders_see_only_the_selected_implementation() {
    let domain = domain();
    let profile = Profile::builder("archive")
        .with_implementation(COURSE, LegacyCourse::IMPLEMENTATION)
        .build()
        .unwrap();
    let archive = shared(MemStore::new(profile));
    let legacy = LegacyCourse::new(4, "CIS*1000", Semester::Summer, 2012)
        .into_entity(domain.catalog())
        .unwrap();
    archive.write().insert(legacy.clone()).unwrap();

    let loader = domain.loader::<CourseLoader>(&archive, COURSE).unwrap();
    assert_eq!(
        loader.loader().implementation().name(),
        LegacyCourse::IMPLEMENTATION
    );
    assert_eq!(
        loader
            .fetch_by_offering("CIS*1000", Semester::Summer, 2012)
            .unwrap(),
        Some(legacy.clone())
    );

    // The same store seen through the default implementation.
    let current = shared(MemStore::default());
    current.write().insert(legacy).unwrap();
    let loader = domain.loader::<CourseLoader>(&current, COURSE).unwrap();
    assert_eq!(
        loader.loader().implementation().name(),
        CourseData::IMPLEMENTATION
    );
    assert!(loader.loader().fetch_all().unwrap().is_empty());
}

#[test]
fn read_only_store_rejects_managed_inserts() {
    let domain = domain();
    let store = shared(MemStore::new(Profile::read_only("reports")));
    let roles = domain.manager(&store, ROLE).unwrap();
    let mut b = roles.builder();
    b.set(role::NAME, "student").unwrap();
    let err = roles.insert(&mut b).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ReadOnlyStore));
}

#[test]
fn restored_profile_configures_a_new_store() {
    let domain = domain();
    let profile = Profile::builder("archive")
        .with_implementation(COURSE, LegacyCourse::IMPLEMENTATION)
        .build()
        .unwrap();
    let restored = Profile::from_bytes(&profile.to_bytes().unwrap()).unwrap();
    let store = shared(MemStore::new(restored));
    let loader = domain.loader::<CourseLoader>(&store, COURSE).unwrap();
    assert_eq!(
        loader.loader().implementation().name(),
        LegacyCourse::IMPLEMENTATION
    );
}

// =============================================================================
// Identifiers
// =============================================================================

#[test]
fn seeded_random_user_ids_repeat_across_stores() {
    let domain = domain();
    let profile = Profile::builder("import")
        .with_generator(USER, GeneratorKind::Random)
        .with_parameter(RANDOM_SEED_PARAMETER, "2015")
        .build()
        .unwrap();

    let ids: Vec<Vec<Value>> = (0..2)
        .map(|_| {
            let store = shared(MemStore::new(profile.clone()));
            let users = domain.manager(&store, USER).unwrap();
            ["ada", "grace", "alan"]
                .into_iter()
                .enumerate()
                .map(|(n, username)| {
                    let mut b = users.builder();
                    b.set(user::USERNAME, username)
                        .unwrap()
                        .set(user::ID_NUMBER, i64::try_from(n).unwrap())
                        .unwrap()
                        .set(user::FIRSTNAME, username)
                        .unwrap()
                        .set(user::LASTNAME, "Test")
                        .unwrap();
                    users
                        .insert(&mut b)
                        .unwrap()
                        .value(ID_PROPERTY)
                        .unwrap()
                        .unwrap()
                })
                .collect()
        })
        .collect();
    assert_eq!(ids[0], ids[1]);
    assert!(ids[0].iter().all(|id| id.as_int().is_some_and(|n| n >= 0)));
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn loader_cache_is_per_store_and_evictable() {
    let domain = domain();
    let first = shared(MemStore::default());
    let second = shared(MemStore::default());

    let a = domain.loader::<RoleLoader>(&first, ROLE).unwrap();
    let b = domain.loader::<RoleLoader>(&second, ROLE).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&a, &b));
    assert!(std::sync::Arc::ptr_eq(
        &a,
        &domain.loader::<RoleLoader>(&first, ROLE).unwrap()
    ));
    assert_eq!(domain.loaders().len(), 2);

    let first_id = first.read().id();
    domain.loaders().evict_store(first_id);
    assert_eq!(domain.loaders().len(), 1);

    let err = domain.loader::<CourseLoader>(&first, ROLE).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotRegistered(_)));
}
