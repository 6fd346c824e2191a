//! Integration tests for Layer 1: Metadata
//!
//! Tests for definitions and the catalog, implementation bindings, builders
//! and profiles.

mod builders;
mod profiles;
