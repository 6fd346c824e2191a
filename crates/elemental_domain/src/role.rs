//! Roles a user holds in a course, such as `student` or `instructor`.

use std::sync::Arc;

use elemental_foundation::{ElementType, Result, Value, ValueType};
use elemental_metadata::{Catalog, Definition, Entity, Property, Selector};
use elemental_store::{AnyLoader, Bindings, ID_PROPERTY, Loader};

/// The `Role` contract.
pub const ROLE: ElementType = ElementType::new("Role");

/// Name of the role's display name property.
pub const NAME: &str = "name";

/// The default `Role` implementation.
#[derive(Clone, Debug, Default)]
pub struct RoleData {
    id: Option<i64>,
    name: Option<Arc<str>>,
}

impl RoleData {
    /// Implementation name registered in the catalog.
    pub const IMPLEMENTATION: &'static str = "RoleData";

    /// The role's identifier.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// The role's name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

pub(crate) fn define(catalog: &mut Catalog) -> Result<Arc<Definition>> {
    let id = Property::new(ROLE, ID_PROPERTY, ValueType::Int).required();
    let name = Property::new(ROLE, NAME, ValueType::String).mutable().required();

    let mut builder = catalog.define(ROLE);
    builder
        .add_property(id.clone())?
        .add_property(name.clone())?
        .add_selector(Selector::of(ROLE, &id, true))?
        .add_selector(Selector::of(ROLE, &name, true))?;
    catalog.register(builder)
}

pub(crate) fn implement(catalog: &mut Catalog) -> Result<()> {
    let binding = catalog
        .bind(ROLE, RoleData::IMPLEMENTATION, RoleData::default)?
        .property(ID_PROPERTY, |r| r.id.map(Value::Int), |r, v| {
            r.id = v.and_then(|v| v.as_int());
        })?
        .property(NAME, |r| r.name.clone().map(Value::String), |r, v| {
            r.name = v.and_then(|v| v.as_shared_str());
        })?;
    catalog.implement(binding)?;
    Ok(())
}

/// Typed reads of roles.
#[derive(Clone, Debug)]
pub struct RoleLoader {
    loader: Loader,
}

impl RoleLoader {
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

    /// Fetches the role with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn fetch_by_name(&self, name: &str) -> Result<Option<Entity>> {
        self.loader
            .fetch_unique(NAME, &Bindings::new().with(NAME, name))
    }
}
