//! Integration tests for store profiles
//!
//! Tests profile construction, editing through the builder, and encoding.

use elemental_foundation::{ElementType, ErrorKind};
use elemental_metadata::{GeneratorKind, Profile, ProfileBuilder};

const COURSE: ElementType = ElementType::new("Course");
const USER: ElementType = ElementType::new("User");

fn archive() -> Profile {
    Profile::builder("archive")
        .with_mutable(false)
        .with_parameter("path", "/var/lib/courses")
        .with_implementation(COURSE, "LegacyCourse")
        .with_generator(USER, GeneratorKind::Random)
        .build()
        .unwrap()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn builder_sets_every_field() {
    let profile = archive();
    assert_eq!(profile.name(), "archive");
    assert!(!profile.is_mutable());
    assert_eq!(profile.parameter("path"), Some("/var/lib/courses"));
    assert_eq!(profile.implementation_of(COURSE), Some("LegacyCourse"));
    assert_eq!(profile.implementation_of(USER), None);
    assert_eq!(profile.generator_of(USER), GeneratorKind::Random);
    assert_eq!(profile.generator_of(COURSE), GeneratorKind::Sequential);
}

#[test]
fn empty_name_is_rejected() {
    let err = ProfileBuilder::new("").build().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDefinition(_)));
}

#[test]
fn presets() {
    assert!(Profile::writable("scratch").is_mutable());
    assert!(!Profile::read_only("reports").is_mutable());
}

// =============================================================================
// Editing
// =============================================================================

#[test]
fn load_then_edit_leaves_source_alone() {
    let source = archive();
    let mut b = ProfileBuilder::new("copy");
    b.load(&source)
        .set_name("copy")
        .set_mutable(true)
        .remove_implementation(COURSE);
    let copy = b.build().unwrap();

    assert_eq!(copy.name(), "copy");
    assert!(copy.is_mutable());
    assert_eq!(copy.implementation_of(COURSE), None);
    assert_eq!(copy.generator_of(USER), GeneratorKind::Random);
    assert_eq!(source.implementation_of(COURSE), Some("LegacyCourse"));
}

#[test]
fn clear_keeps_name() {
    let mut b = ProfileBuilder::new("x");
    b.load(&archive()).clear();
    let cleared = b.build().unwrap();
    assert_eq!(cleared.name(), "archive");
    assert!(cleared.parameters().is_empty());
    assert_eq!(cleared.implementation_of(COURSE), None);
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn profile_survives_encoding() {
    let profile = archive();
    let bytes = profile.to_bytes().unwrap();
    assert_eq!(Profile::from_bytes(&bytes).unwrap(), profile);
}

#[test]
fn garbage_is_a_serialization_error() {
    let err = Profile::from_bytes(&[0xc1, 0x00, 0xff]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));
}
