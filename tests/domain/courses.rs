//! Course and enrolment scenarios through managers and typed loaders.

use elemental_domain::{
    COURSE, CourseLoader, DEFAULT_LOADER_CAPACITY, Domain, ENROLMENT, EnrolmentData,
    EnrolmentLoader, ROLE, RoleLoader, Semester, course, enrolment, role,
};
use elemental_foundation::{ErrorKind, Value};
use elemental_metadata::Entity;
use elemental_store::{ID_PROPERTY, Manager, MemStore, SharedStore, shared};

fn setup() -> (Domain, SharedStore) {
    let domain = Domain::new(DEFAULT_LOADER_CAPACITY).unwrap();
    (domain, shared(MemStore::default()))
}

fn add_role(roles: &Manager, name: &str) -> Entity {
    let mut b = roles.builder();
    b.set(role::NAME, name).unwrap();
    roles.insert(&mut b).unwrap()
}

fn add_course(courses: &Manager, name: &str, semester: Semester, year: i64) -> Entity {
    let mut b = courses.builder();
    b.set(course::NAME, name)
        .unwrap()
        .set(course::SEMESTER, semester)
        .unwrap()
        .set(course::YEAR, year)
        .unwrap();
    courses.insert(&mut b).unwrap()
}

fn id_of(entity: &Entity) -> i64 {
    entity
        .value(ID_PROPERTY)
        .unwrap()
        .and_then(|v| v.as_int())
        .unwrap()
}

fn enrol(enrolments: &Manager, course: &Entity, role: &Entity) -> Entity {
    let mut b = enrolments.builder();
    b.set(enrolment::COURSE_REF, Value::Id(id_of(course)))
        .unwrap()
        .set(enrolment::ROLE_REF, Value::Id(id_of(role)))
        .unwrap()
        .set(enrolment::USABLE, true)
        .unwrap();
    enrolments.insert(&mut b).unwrap()
}

// =============================================================================
// Roles
// =============================================================================

#[test]
fn renamed_role_is_found_under_new_name() {
    let (domain, store) = setup();
    let roles = domain.manager(&store, ROLE).unwrap();
    let student = add_role(&roles, "student");

    let mut edit = roles.builder();
    edit.load(&student).unwrap().set(role::NAME, "learner").unwrap();
    assert!(roles.update(&student, &edit).unwrap().ptr_eq(&student));

    let loader = domain.loader::<RoleLoader>(&store, ROLE).unwrap();
    assert!(loader.fetch_by_name("student").unwrap().is_none());
    assert_eq!(loader.fetch_by_name("learner").unwrap(), Some(student));
}

// =============================================================================
// Enrolments
// =============================================================================

#[test]
fn grading_an_enrolment_updates_in_place() {
    let (domain, store) = setup();
    let roles = domain.manager(&store, ROLE).unwrap();
    let courses = domain.manager(&store, COURSE).unwrap();
    let enrolments = domain.manager(&store, ENROLMENT).unwrap();

    let student = add_role(&roles, "student");
    let cis = add_course(&courses, "CIS*1500", Semester::Fall, 2014);
    let record = enrol(&enrolments, &cis, &student);
    assert_eq!(record.inspect(EnrolmentData::final_grade), Some(None));

    let mut grade = enrolments.builder();
    grade
        .load(&record)
        .unwrap()
        .set(enrolment::FINAL_GRADE, 87)
        .unwrap();
    let graded = enrolments.update(&record, &grade).unwrap();
    assert!(graded.ptr_eq(&record));
    assert_eq!(record.inspect(EnrolmentData::final_grade), Some(Some(87)));

    let loader = domain.loader::<EnrolmentLoader>(&store, ENROLMENT).unwrap();
    assert_eq!(loader.fetch_by_course(&cis).unwrap(), [record]);
}

#[test]
fn moving_an_enrolment_to_another_course_replaces_it() {
    let (domain, store) = setup();
    let roles = domain.manager(&store, ROLE).unwrap();
    let courses = domain.manager(&store, COURSE).unwrap();
    let enrolments = domain.manager(&store, ENROLMENT).unwrap();

    let student = add_role(&roles, "student");
    let fall = add_course(&courses, "CIS*1500", Semester::Fall, 2014);
    let winter = add_course(&courses, "CIS*1500", Semester::Winter, 2015);
    let record = enrol(&enrolments, &fall, &student);

    let mut move_to = enrolments.builder();
    move_to
        .load(&record)
        .unwrap()
        .set(enrolment::COURSE_REF, Value::Id(id_of(&winter)))
        .unwrap();
    let moved = enrolments.update(&record, &move_to).unwrap();
    assert!(!moved.ptr_eq(&record));

    let loader = domain.loader::<EnrolmentLoader>(&store, ENROLMENT).unwrap();
    assert!(loader.fetch_by_course(&fall).unwrap().is_empty());
    assert_eq!(loader.fetch_by_course(&winter).unwrap(), [moved]);
}

// =============================================================================
// References
// =============================================================================

#[test]
fn course_with_enrolments_cannot_be_removed() {
    let (domain, store) = setup();
    let roles = domain.manager(&store, ROLE).unwrap();
    let courses = domain.manager(&store, COURSE).unwrap();
    let enrolments = domain.manager(&store, ENROLMENT).unwrap();

    let student = add_role(&roles, "student");
    let cis = add_course(&courses, "CIS*1500", Semester::Fall, 2014);
    let record = enrol(&enrolments, &cis, &student);

    let err = courses.remove(&cis).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Relationship(_)));
    let loader = domain.loader::<CourseLoader>(&store, COURSE).unwrap();
    assert_eq!(loader.loader().fetch_all().unwrap(), [cis.clone()]);

    enrolments.remove(&record).unwrap();
    courses.remove(&cis).unwrap();
    assert!(loader.loader().fetch_all().unwrap().is_empty());
}

#[test]
fn enrolment_for_unknown_role_is_rejected() {
    let (domain, store) = setup();
    let courses = domain.manager(&store, COURSE).unwrap();
    let enrolments = domain.manager(&store, ENROLMENT).unwrap();
    let cis = add_course(&courses, "CIS*1500", Semester::Fall, 2014);

    let mut b = enrolments.builder();
    b.set(enrolment::COURSE_REF, Value::Id(id_of(&cis)))
        .unwrap()
        .set(enrolment::ROLE_REF, Value::Id(9))
        .unwrap()
        .set(enrolment::USABLE, true)
        .unwrap();
    let err = enrolments.insert(&mut b).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Relationship(_)));
    let context = err.context.unwrap();
    assert_eq!(context.element, Some(ENROLMENT));
    assert_eq!(context.stack, ["insert"]);
    assert!(enrolments.loader().fetch_all().unwrap().is_empty());
}

#[test]
fn renumbering_a_referenced_course_is_refused() {
    let (domain, store) = setup();
    let roles = domain.manager(&store, ROLE).unwrap();
    let courses = domain.manager(&store, COURSE).unwrap();
    let enrolments = domain.manager(&store, ENROLMENT).unwrap();

    let student = add_role(&roles, "student");
    let cis = add_course(&courses, "CIS*1500", Semester::Fall, 2014);
    enrol(&enrolments, &cis, &student);

    let mut edit = courses.builder();
    edit.load(&cis).unwrap().set(ID_PROPERTY, 77).unwrap();
    let err = courses.update(&cis, &edit).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Relationship(_)));
    assert!(store.read().contains(&cis));
    let loader = domain.loader::<EnrolmentLoader>(&store, ENROLMENT).unwrap();
    assert_eq!(loader.fetch_by_course(&cis).unwrap().len(), 1);
}

// =============================================================================
// Transactions
// =============================================================================

#[test]
fn rolled_back_term_leaves_no_courses() {
    let (domain, store) = setup();
    let courses = domain.manager(&store, COURSE).unwrap();
    let kept = add_course(&courses, "CIS*1000", Semester::Summer, 2014);

    store.write().begin().unwrap();
    add_course(&courses, "CIS*1500", Semester::Fall, 2014);
    add_course(&courses, "CIS*2500", Semester::Fall, 2014);
    store.write().rollback().unwrap();

    let loader = domain.loader::<CourseLoader>(&store, COURSE).unwrap();
    assert_eq!(loader.loader().fetch_all().unwrap(), [kept]);
    assert!(
        loader
            .fetch_by_offering("CIS*1500", Semester::Fall, 2014)
            .unwrap()
            .is_none()
    );
}

#[test]
fn duplicate_offering_inside_transaction_can_be_abandoned() {
    let (domain, store) = setup();
    let courses = domain.manager(&store, COURSE).unwrap();

    store.write().begin().unwrap();
    add_course(&courses, "CIS*3750", Semester::Winter, 2015);
    let mut dup = courses.builder();
    dup.set(course::NAME, "CIS*3750")
        .unwrap()
        .set(course::SEMESTER, Semester::Winter)
        .unwrap()
        .set(course::YEAR, 2015)
        .unwrap();
    let err = courses.insert(&mut dup).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateKey { .. }));
    store.write().set_rollback_only().unwrap();

    let err = store.write().commit().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Transaction(_)));
    let loader = domain.loader::<CourseLoader>(&store, COURSE).unwrap();
    assert!(loader.loader().fetch_all().unwrap().is_empty());
}
