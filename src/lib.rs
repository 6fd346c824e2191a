//! Elemental - Metadata-driven data mapping
//!
//! This crate re-exports all layers of the Elemental system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: elemental_domain     - Course-management contracts, implementations, typed loaders
//! Layer 2: elemental_store      - Store contract, memory and null stores, id generators, dispatch
//! Layer 1: elemental_metadata   - Definitions, catalog, bindings, entities, builders, profiles
//! Layer 0: elemental_foundation - Core types (Value, ValueType, ElementType, Error)
//! ```

pub use elemental_domain as domain;
pub use elemental_foundation as foundation;
pub use elemental_metadata as metadata;
pub use elemental_store as store;
