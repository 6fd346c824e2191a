//! Stores, identifier generation and loader dispatch for Elemental.
//!
//! This crate provides:
//! - [`StoreQuery`] and [`DataStore`] - The contract every store implements
//! - [`MemStore`] - An in-memory store with unique-selector indexes and transactions
//! - [`NullStore`] - A store that holds nothing
//! - [`IdGenerator`] - Null, pass-through, sequential and random identifier strategies
//! - [`Loader`] and [`Manager`] - Reads and writes for one implementation
//! - [`relation`] - Reference checks applied by managers
//! - [`LoaderRegistry`] and [`LoaderCache`] - Typed loader construction and caching

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod dispatch;
pub mod idgen;
pub mod loader;
pub mod memory;
pub mod null;
pub mod query;
pub mod relation;
pub mod store;

#[cfg(test)]
mod test_support;

pub use dispatch::{AnyLoader, LoaderCache, LoaderFactory, LoaderRegistry};
pub use idgen::{
    GeneratorSet, IdGenerator, NullIdGenerator, PassThroughIdGenerator, RandomIdGenerator,
    SequentialIdGenerator, generator,
};
pub use loader::{Loader, Manager};
pub use memory::{IndexKey, MemStore};
pub use null::NullStore;
pub use query::{Bindings, Query, StoreQuery};
pub use store::{DataStore, ID_PROPERTY, RANDOM_SEED_PARAMETER, SharedStore, StoreId, shared};
