//! Element definitions, implementation bindings, builders and profiles.
//!
//! This crate provides:
//! - [`Property`], [`Selector`] and [`Definition`] - The shape of an element contract
//! - [`Catalog`] - The registry of definitions, implementations and relationships
//! - [`Relationship`] - References between element types
//! - [`MetaData`] and [`Implementation`] - Bindings to concrete types
//! - [`Entity`] - Shared handles to instances
//! - [`ElementBuilder`] - Staging values and producing instances
//! - [`Profile`] - Store configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod catalog;
pub mod definition;
pub mod entity;
pub mod metadata;
pub mod profile;
pub mod property;
pub mod relationship;
pub mod selector;

pub use builder::ElementBuilder;
pub use catalog::Catalog;
pub use definition::{Definition, DefinitionBuilder};
pub use entity::{Entity, EntityKey};
pub use metadata::{Getter, Implementation, MetaData, MetaDataBuilder, Setter};
pub use profile::{GeneratorKind, Profile, ProfileBuilder};
pub use property::Property;
pub use relationship::Relationship;
pub use selector::{ALL, Selector, SelectorId};
