//! Kinds of course activity, named within the system that produced them.

use std::sync::Arc;

use elemental_foundation::{ElementType, Result, Value, ValueType};
use elemental_metadata::{Catalog, Definition, Entity, Property, Selector};
use elemental_store::{AnyLoader, Bindings, ID_PROPERTY, Loader};

/// The `ActivityType` contract.
pub const ACTIVITY_TYPE: ElementType = ElementType::new("ActivityType");

/// Name of the activity type name property.
pub const NAME: &str = "name";
/// Name of the producing system property.
pub const SOURCE: &str = "source";

/// The default `ActivityType` implementation.
#[derive(Clone, Debug, Default)]
pub struct ActivityTypeData {
    id: Option<i64>,
    name: Option<Arc<str>>,
    source: Option<Arc<str>>,
}

impl ActivityTypeData {
    /// Implementation name registered in the catalog.
    pub const IMPLEMENTATION: &'static str = "ActivityTypeData";

    /// The activity type's name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The producing system.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

pub(crate) fn define(catalog: &mut Catalog) -> Result<Arc<Definition>> {
    let id = Property::new(ACTIVITY_TYPE, ID_PROPERTY, ValueType::Int).required();
    let name = Property::new(ACTIVITY_TYPE, NAME, ValueType::String).required();
    let source = Property::new(ACTIVITY_TYPE, SOURCE, ValueType::String).required();

    let mut builder = catalog.define(ACTIVITY_TYPE);
    builder
        .add_property(id.clone())?
        .add_property(name.clone())?
        .add_property(source.clone())?
        .add_selector(Selector::of(ACTIVITY_TYPE, &id, true))?
        .add_selector(Selector::unique(ACTIVITY_TYPE, NAME, [source.clone(), name]))?
        .add_selector(Selector::of(ACTIVITY_TYPE, &source, false))?;
    catalog.register(builder)
}

pub(crate) fn implement(catalog: &mut Catalog) -> Result<()> {
    let binding = catalog
        .bind(ACTIVITY_TYPE, ActivityTypeData::IMPLEMENTATION, ActivityTypeData::default)?
        .property(ID_PROPERTY, |a| a.id.map(Value::Int), |a, v| {
            a.id = v.and_then(|v| v.as_int());
        })?
        .property(NAME, |a| a.name.clone().map(Value::String), |a, v| {
            a.name = v.and_then(|v| v.as_shared_str());
        })?
        .property(SOURCE, |a| a.source.clone().map(Value::String), |a, v| {
            a.source = v.and_then(|v| v.as_shared_str());
        })?;
    catalog.implement(binding)?;
    Ok(())
}

/// Typed reads of activity types.
#[derive(Clone, Debug)]
pub struct ActivityTypeLoader {
    loader: Loader,
}

impl ActivityTypeLoader {
    /// Wraps a generic loader.
    #[must_use]
    pub fn new(loader: Loader) -> Self {
        Self { loader }
    }

    pub(crate) fn factory(loader: Loader) -> AnyLoader {
        Arc::new(Self::new(loader))
    }

    /// The underlying generic loader.
    #[must_use]
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Fetches the activity type with a name within a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn fetch_by_name(&self, source: &str, name: &str) -> Result<Option<Entity>> {
        let bindings = Bindings::new().with(SOURCE, source).with(NAME, name);
        self.loader.fetch_unique(NAME, &bindings)
    }

    /// Fetches every activity type from a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn fetch_by_source(&self, source: &str) -> Result<Vec<Entity>> {
        self.loader
            .fetch(SOURCE, &Bindings::new().with(SOURCE, source))
    }
}
