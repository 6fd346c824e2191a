//! Integration tests for identifier generators
//!
//! Tests the sequential and random strategies and their seeding from stored
//! identifiers.

use std::collections::HashSet;

use elemental_foundation::ErrorKind;
use elemental_metadata::GeneratorKind;
use elemental_store::{IdGenerator, RandomIdGenerator, SequentialIdGenerator, generator};

// =============================================================================
// Sequential
// =============================================================================

#[test]
fn sequential_continues_after_largest_stored_id() {
    let mut g = generator(GeneratorKind::Sequential, [3, 7, 5], None);
    assert_eq!(g.next_id().unwrap(), Some(8));
    assert_eq!(g.next_id().unwrap(), Some(9));
}

#[test]
fn sequential_without_stored_ids_starts_at_one() {
    let mut g = SequentialIdGenerator::from_existing(std::iter::empty());
    assert_eq!(g.next_id().unwrap(), Some(1));
}

#[test]
fn sequential_overflow_is_an_error() {
    let mut g = SequentialIdGenerator::from_existing([i64::MAX]);
    let err = g.next_id().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IdSpaceExhausted(_)));
}

// =============================================================================
// Random
// =============================================================================

#[test]
fn random_ids_are_distinct_non_negative_and_avoid_seeds() {
    let seeded: Vec<i64> = (0..100).collect();
    let mut g = RandomIdGenerator::new(seeded.iter().copied());
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let id = g.next_id().unwrap().unwrap();
        assert!(id >= 0);
        assert!(!seeded.contains(&id));
        assert!(seen.insert(id));
    }
}

#[test]
fn random_with_seed_repeats_its_sequence() {
    let run = || {
        let mut g = generator(GeneratorKind::Random, std::iter::empty(), Some(2015));
        (0..20).map(|_| g.next_id().unwrap()).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

// =============================================================================
// Null and pass-through
// =============================================================================

#[test]
fn null_and_pass_through_never_produce_ids() {
    for kind in [GeneratorKind::Null, GeneratorKind::PassThrough] {
        let mut g = generator(kind, [1, 2, 3], None);
        assert_eq!(g.kind(), kind);
        assert_eq!(g.next_id().unwrap(), None);
    }
}
