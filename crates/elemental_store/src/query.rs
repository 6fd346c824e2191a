//! The query contract every store implements.
//!
//! Queries are expressed as a [`Selector`] plus [`Bindings`], one value per
//! selector property. Unique selectors answer through [`StoreQuery::query`];
//! every selector answers through [`StoreQuery::query_all`].

use std::collections::BTreeMap;
use std::sync::Arc;

use elemental_foundation::{Error, ErrorKind, Result, Value};
use elemental_metadata::{Definition, Entity, Implementation, Selector};

/// Values bound to selector properties, keyed by property name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to bind a value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds a value, replacing any earlier binding of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up a bound value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Binds every selector property to the instance's current value.
    ///
    /// Properties without a value stay unbound.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance cannot read a selector property.
    pub fn from_entity(selector: &Selector, entity: &Entity) -> Result<Self> {
        let mut bindings = Self::new();
        for property in selector.properties() {
            if let Some(value) = entity.get(property)? {
                bindings.insert(property.name(), value);
            }
        }
        Ok(bindings)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Self::new();
        for (k, v) in iter {
            bindings.insert(k, v);
        }
        bindings
    }
}

/// Query and membership operations shared by every store.
pub trait StoreQuery {
    /// Returns the single instance matching a unique selector.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotUnique`] for a non-unique selector and
    /// [`ErrorKind::MissingBinding`] if a selector property is unbound.
    fn query(&self, selector: &Selector, bindings: &Bindings) -> Result<Option<Entity>>;

    /// Returns every instance matching a selector.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingBinding`] if a selector property is unbound.
    fn query_all(&self, selector: &Selector, bindings: &Bindings) -> Result<Vec<Entity>>;

    /// Returns true if this exact instance is a member.
    fn contains(&self, entity: &Entity) -> bool;

    /// Adds an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Identity`] if the instance is already a member and
    /// [`ErrorKind::DuplicateKey`] if another member holds the same unique key.
    fn insert(&mut self, entity: Entity) -> Result<()>;

    /// Removes an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Identity`] if the instance is not a member.
    fn remove(&mut self, entity: &Entity) -> Result<()>;

    /// Recomputes the unique keys of a member after it changed in place.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Identity`] if the instance is not a member and
    /// [`ErrorKind::DuplicateKey`] if its new key is already taken.
    fn reindex(&mut self, entity: &Entity) -> Result<()>;

    /// Removes every member and index entry. The store stays open.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ReadOnlyStore`] for a read-only store.
    fn clear(&mut self) -> Result<()>;
}

/// Resolves the bindings into selector key order.
///
/// Bindings for names outside the selector are ignored with a warning.
///
/// # Errors
///
/// Returns [`ErrorKind::MissingBinding`] for an unbound selector property and
/// [`ErrorKind::TypeMismatch`] for a value of the wrong type.
pub fn key_values(selector: &Selector, bindings: &Bindings) -> Result<Vec<Value>> {
    for (name, _) in bindings.iter() {
        if !selector.properties().iter().any(|p| p.name() == name) {
            tracing::warn!(
                selector = %selector.id(),
                property = name,
                "ignoring binding for a property outside the selector"
            );
        }
    }
    selector
        .properties()
        .iter()
        .map(|property| {
            let value = bindings.get(property.name()).ok_or_else(|| {
                Error::new(ErrorKind::MissingBinding {
                    selector: selector.id().to_string(),
                    property: property.name().to_string(),
                })
            })?;
            if property.accepts(value) {
                Ok(value.clone())
            } else {
                Err(Error::type_mismatch(
                    property.name(),
                    property.value_type(),
                    value.type_name(),
                ))
            }
        })
        .collect()
}

/// Returns true if the instance's selector properties equal the key values.
///
/// # Errors
///
/// Returns an error if the instance cannot read a selector property.
pub fn matches(entity: &Entity, selector: &Selector, values: &[Value]) -> Result<bool> {
    for (property, expected) in selector.properties().iter().zip(values) {
        if entity.get(property)?.as_ref() != Some(expected) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Reduces a result list to at most one instance.
///
/// # Errors
///
/// Returns [`ErrorKind::Ambiguous`] if more than one instance matched.
pub fn single(selector: &Selector, mut results: Vec<Entity>) -> Result<Option<Entity>> {
    match results.len() {
        0 | 1 => Ok(results.pop()),
        count => Err(Error::new(ErrorKind::Ambiguous {
            selector: selector.id().to_string(),
            count,
        })),
    }
}

/// A query scoped to one contract and optionally one implementation.
///
/// Obtained from [`DataStore::get_query`](crate::DataStore::get_query).
pub struct Query<'s> {
    store: &'s dyn StoreQuery,
    contract: Arc<Definition>,
    implementation: Option<Arc<dyn Implementation>>,
}

impl<'s> Query<'s> {
    /// Scopes a store to a contract and, optionally, an implementation.
    #[must_use]
    pub fn new(
        store: &'s dyn StoreQuery,
        contract: Arc<Definition>,
        implementation: Option<Arc<dyn Implementation>>,
    ) -> Self {
        Self {
            store,
            contract,
            implementation,
        }
    }

    /// The contract results belong to.
    #[must_use]
    pub fn contract(&self) -> &Arc<Definition> {
        &self.contract
    }

    /// Looks up a selector visible on the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownSelector`] if no such selector is visible.
    pub fn selector(&self, name: &str) -> Result<Selector> {
        self.contract
            .selector(name)
            .cloned()
            .ok_or_else(|| Error::unknown_selector(self.contract.element(), name))
    }

    fn check(&self, selector: &Selector) -> Result<()> {
        if self.contract.is_a(selector.element()) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::WrongElementType {
                expected: self.contract.element(),
                actual: selector.element(),
            }))
        }
    }

    fn admits(&self, entity: &Entity) -> bool {
        entity.is_a(self.contract.element())
            && self.implementation.as_ref().is_none_or(|meta| {
                let other = entity.implementation();
                other.element_type() == meta.element_type() && other.name() == meta.name()
            })
    }

    /// Returns the single matching instance of this scope.
    ///
    /// # Errors
    ///
    /// As [`StoreQuery::query`], plus [`ErrorKind::WrongElementType`] if the
    /// selector is not visible on the contract.
    pub fn query(&self, selector: &Selector, bindings: &Bindings) -> Result<Option<Entity>> {
        self.check(selector)?;
        if !selector.is_unique() {
            return Err(Error::new(ErrorKind::NotUnique(selector.id().to_string())));
        }
        let found = self.store.query(selector, bindings)?;
        Ok(found.filter(|entity| self.admits(entity)))
    }

    /// Returns every matching instance of this scope.
    ///
    /// # Errors
    ///
    /// As [`StoreQuery::query_all`], plus [`ErrorKind::WrongElementType`] if
    /// the selector is not visible on the contract.
    pub fn query_all(&self, selector: &Selector, bindings: &Bindings) -> Result<Vec<Entity>> {
        self.check(selector)?;
        let mut found = self.store.query_all(selector, bindings)?;
        found.retain(|entity| self.admits(entity));
        Ok(found)
    }

    /// Returns the single instance of this scope matching any selector.
    ///
    /// # Errors
    ///
    /// As [`query_all`](Self::query_all), plus [`ErrorKind::Ambiguous`] if more
    /// than one instance matched.
    pub fn query_one(&self, selector: &Selector, bindings: &Bindings) -> Result<Option<Entity>> {
        single(selector, self.query_all(selector, bindings)?)
    }

    /// Every instance of this scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    pub fn all(&self) -> Result<Vec<Entity>> {
        self.query_all(&self.contract.all(), &Bindings::new())
    }
}
