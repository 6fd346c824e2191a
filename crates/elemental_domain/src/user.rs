//! People known to the system.

use std::sync::Arc;

use elemental_foundation::{ElementType, Result, Value, ValueType};
use elemental_metadata::{Catalog, Definition, Entity, Property, Selector};
use elemental_store::{AnyLoader, Bindings, ID_PROPERTY, Loader};

/// The `User` contract.
pub const USER: ElementType = ElementType::new("User");

/// Name of the institutional id number property.
pub const ID_NUMBER: &str = "idnumber";
/// Name of the login name property.
pub const USERNAME: &str = "username";
/// Name of the given name property.
pub const FIRSTNAME: &str = "firstname";
/// Name of the family name property.
pub const LASTNAME: &str = "lastname";

/// The default `User` implementation.
#[derive(Clone, Debug, Default)]
pub struct UserData {
    id: Option<i64>,
    idnumber: Option<i64>,
    username: Option<Arc<str>>,
    firstname: Option<Arc<str>>,
    lastname: Option<Arc<str>>,
}

impl UserData {
    /// Implementation name registered in the catalog.
    pub const IMPLEMENTATION: &'static str = "UserData";

    /// The user's identifier.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// The login name.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Given and family name, separated by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) fn define(catalog: &mut Catalog) -> Result<Arc<Definition>> {
    let id = Property::new(USER, ID_PROPERTY, ValueType::Int).required();
    let idnumber = Property::new(USER, ID_NUMBER, ValueType::Int).required();
    let username = Property::new(USER, USERNAME, ValueType::String)
        .mutable()
        .required();
    let firstname = Property::new(USER, FIRSTNAME, ValueType::String)
        .mutable()
        .required();
    let lastname = Property::new(USER, LASTNAME, ValueType::String)
        .mutable()
        .required();

    let mut builder = catalog.define(USER);
    builder
        .add_property(id.clone())?
        .add_property(idnumber.clone())?
        .add_property(username.clone())?
        .add_property(firstname)?
        .add_property(lastname)?
        .add_selector(Selector::of(USER, &id, true))?
        .add_selector(Selector::of(USER, &idnumber, true))?
        .add_selector(Selector::of(USER, &username, true))?;
    catalog.register(builder)
}

pub(crate) fn implement(catalog: &mut Catalog) -> Result<()> {
    let binding = catalog
        .bind(USER, UserData::IMPLEMENTATION, UserData::default)?
        .property(ID_PROPERTY, |u| u.id.map(Value::Int), |u, v| {
            u.id = v.and_then(|v| v.as_int());
        })?
        .property(ID_NUMBER, |u| u.idnumber.map(Value::Int), |u, v| {
            u.idnumber = v.and_then(|v| v.as_int());
        })?
        .property(USERNAME, |u| u.username.clone().map(Value::String), |u, v| {
            u.username = v.and_then(|v| v.as_shared_str());
        })?
        .property(FIRSTNAME, |u| u.firstname.clone().map(Value::String), |u, v| {
            u.firstname = v.and_then(|v| v.as_shared_str());
        })?
        .property(LASTNAME, |u| u.lastname.clone().map(Value::String), |u, v| {
            u.lastname = v.and_then(|v| v.as_shared_str());
        })?;
    catalog.implement(binding)?;
    Ok(())
}

/// Typed reads of users.
#[derive(Clone, Debug)]
pub struct UserLoader {
    loader: Loader,
}

impl UserLoader {
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

    /// Fetches the user with the given login name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn fetch_by_username(&self, username: &str) -> Result<Option<Entity>> {
        self.loader
            .fetch_unique(USERNAME, &Bindings::new().with(USERNAME, username))
    }

    /// Fetches the user with the given institutional id number.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn fetch_by_idnumber(&self, idnumber: i64) -> Result<Option<Entity>> {
        self.loader
            .fetch_unique(ID_NUMBER, &Bindings::new().with(ID_NUMBER, idnumber))
    }
}
