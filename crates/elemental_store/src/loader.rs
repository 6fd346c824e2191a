//! Loaders and managers: the read and write entry points for one contract.
//!
//! A [`Loader`] answers fetches for one implementation of a contract from a
//! shared store. A [`Manager`] adds writes: it assigns identifiers, runs the
//! builder and keeps the store's indexes in step with the result.

use std::fmt;
use std::sync::Arc;

use elemental_foundation::{ElementType, Error, ErrorContext, Result, Value};
use elemental_metadata::{
    Catalog, Definition, ElementBuilder, Entity, Implementation, Property, Selector,
};

use crate::query::{Bindings, Query, single};
use crate::relation;
use crate::store::{ID_PROPERTY, SharedStore, StoreId};

/// Read access to one implementation of a contract in one store.
#[derive(Clone)]
pub struct Loader {
    catalog: Arc<Catalog>,
    store: SharedStore,
    store_id: StoreId,
    meta: Arc<dyn Implementation>,
}

impl Loader {
    /// Creates a loader.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, store: SharedStore, meta: Arc<dyn Implementation>) -> Self {
        let store_id = store.read().id();
        Self {
            catalog,
            store,
            store_id,
            meta,
        }
    }

    /// The contract loaded.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.meta.element_type()
    }

    /// The contract definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<Definition> {
        self.meta.definition()
    }

    /// The implementation loaded.
    #[must_use]
    pub fn implementation(&self) -> &Arc<dyn Implementation> {
        &self.meta
    }

    /// The catalog the loader resolves against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The store the loader reads.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Identity of the store the loader reads.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    /// Tags errors leaving this loader with the store, the contract and the
    /// operation.
    pub(crate) fn annotate(&self, operation: &'static str) -> impl Fn(Error) -> Error + '_ {
        move |err| {
            let err = if err.context.is_some() {
                err
            } else {
                err.with_context(
                    ErrorContext::new()
                        .with_store(self.store_id.to_string())
                        .with_element(self.element_type()),
                )
            };
            err.with_frame(operation)
        }
    }

    /// Looks up a selector visible on the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownSelector`](elemental_foundation::ErrorKind::UnknownSelector)
    /// if no such selector is visible.
    pub fn selector(&self, name: &str) -> Result<Selector> {
        self.definition()
            .selector(name)
            .cloned()
            .ok_or_else(|| Error::unknown_selector(self.element_type(), name))
    }

    /// Creates an empty builder for this implementation.
    #[must_use]
    pub fn builder(&self) -> ElementBuilder {
        ElementBuilder::new(Arc::clone(&self.meta))
    }

    fn run<R>(&self, f: impl FnOnce(&Query<'_>) -> Result<R>) -> Result<R> {
        let store = self.store.read();
        let query = store.get_query(Arc::clone(self.definition()), Some(Arc::clone(&self.meta)));
        f(&query)
    }

    /// Fetches the instance with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the contract has no `id` selector or the store
    /// is closed.
    pub fn fetch_by_id(&self, id: i64) -> Result<Option<Entity>> {
        let selector = self.selector(ID_PROPERTY).map_err(self.annotate("fetch_by_id"))?;
        self.run(|q| q.query(&selector, &Bindings::new().with(ID_PROPERTY, Value::Int(id))))
            .map_err(self.annotate("fetch_by_id"))
    }

    /// Fetches every instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    pub fn fetch_all(&self) -> Result<Vec<Entity>> {
        self.run(|q| q.all()).map_err(self.annotate("fetch_all"))
    }

    /// Fetches every instance matching a named selector.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is unknown or a binding is missing.
    pub fn fetch(&self, selector: &str, bindings: &Bindings) -> Result<Vec<Entity>> {
        let selector = self.selector(selector).map_err(self.annotate("fetch"))?;
        self.run(|q| q.query_all(&selector, bindings))
            .map_err(self.annotate("fetch"))
    }

    /// Fetches the single instance matching a named selector.
    ///
    /// Unique selectors are answered from the index; other selectors fail
    /// if more than one instance matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is unknown, a binding is missing,
    /// or more than one instance matches.
    pub fn fetch_unique(&self, selector: &str, bindings: &Bindings) -> Result<Option<Entity>> {
        let selector = self.selector(selector).map_err(self.annotate("fetch_unique"))?;
        let found = if selector.is_unique() {
            self.run(|q| q.query(&selector, bindings))
        } else {
            self.run(|q| q.query_all(&selector, bindings))
                .and_then(|all| single(&selector, all))
        };
        found.map_err(self.annotate("fetch_unique"))
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("element", &self.element_type())
            .field("implementation", &self.meta.name())
            .field("store", &self.store_id)
            .finish()
    }
}

/// Write access to one implementation of a contract in one store.
///
/// Identifiers come from the store's generator for the contract, so every
/// manager writing to the same store shares one sequence.
pub struct Manager {
    loader: Loader,
    id: Option<Property>,
}

impl Manager {
    /// Creates a manager, seeding the store's identifier generator for the
    /// contract if it has none yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store's identifiers cannot be read.
    pub fn new(loader: Loader) -> Result<Self> {
        let id = loader.definition().property(ID_PROPERTY).cloned();
        if id.is_some() {
            let mut store = loader.store.write();
            let kind = store.generator(loader.definition())?.kind();
            tracing::debug!(element = %loader.element_type(), ?kind, "created manager");
        }
        Ok(Self { loader, id })
    }

    /// The loader this manager writes through.
    #[must_use]
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Creates an empty builder for this implementation.
    #[must_use]
    pub fn builder(&self) -> ElementBuilder {
        self.loader.builder()
    }

    /// Assigns an identifier if needed, builds a new instance and stores it.
    ///
    /// # Errors
    ///
    /// Returns an error if identifier assignment, validation or insertion
    /// fails, or a reference names no stored instance.
    pub fn insert(&self, builder: &mut ElementBuilder) -> Result<Entity> {
        self.create(builder).map_err(self.loader.annotate("insert"))
    }

    fn create(&self, builder: &mut ElementBuilder) -> Result<Entity> {
        let mut store = self.loader.store.write();
        if let Some(id) = &self.id {
            store.generator(self.loader.definition())?.assign(builder, id)?;
        }
        let entity = builder.build(None)?;
        relation::check_references(&*store, &self.loader.catalog, &entity)?;
        store.insert(entity.clone())?;
        tracing::debug!(?entity, "inserted");
        Ok(entity)
    }

    /// Applies a builder to a stored instance.
    ///
    /// In-place changes are re-indexed; a replacement instance takes the
    /// original's place in the store. If the store rejects the result, the
    /// store and the original instance are left as they were. When the key
    /// other instances refer to changes, their references are cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not stored, validation fails, the
    /// result collides with another member's unique key, or a reference
    /// cannot be resolved or released.
    pub fn update(&self, existing: &Entity, builder: &ElementBuilder) -> Result<Entity> {
        self.apply(existing, builder)
            .map_err(self.loader.annotate("update"))
    }

    fn apply(&self, existing: &Entity, builder: &ElementBuilder) -> Result<Entity> {
        let catalog = &self.loader.catalog;
        let mut store = self.loader.store.write();
        if !store.contains(existing) {
            return Err(Error::identity(format!("{existing:?} is not stored")));
        }
        let mut undo = ElementBuilder::new(Arc::clone(existing.implementation()));
        undo.load(existing)?;
        let keys = relation::target_ids(catalog, existing)?;
        let dependents = relation::dependents(&*store, catalog, existing)?;

        let result = builder.build(Some(existing))?;
        let moved = !dependents.is_empty() && relation::target_ids(catalog, &result)? != keys;
        if result.ptr_eq(existing) {
            let checked = relation::check_references(&*store, catalog, existing)
                .and_then(|()| {
                    if moved {
                        relation::ensure_detachable(existing, &dependents)
                    } else {
                        Ok(())
                    }
                })
                .and_then(|()| store.reindex(existing));
            if let Err(err) = checked {
                undo.build(Some(existing))?;
                return Err(err);
            }
            tracing::debug!(entity = ?existing, "updated in place");
        } else {
            relation::check_references(&*store, catalog, &result)?;
            if moved {
                relation::ensure_detachable(existing, &dependents)?;
            }
            store.remove(existing)?;
            if let Err(err) = store.insert(result.clone()) {
                store.insert(existing.clone())?;
                return Err(err);
            }
            tracing::debug!(old = ?existing, new = ?result, "replaced");
        }
        if moved {
            relation::detach(&mut *store, &dependents)?;
        }
        Ok(result)
    }

    /// Removes a stored instance, clearing the references other instances
    /// hold to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not stored, or another instance
    /// refers to it through a reference that cannot be cleared.
    pub fn remove(&self, entity: &Entity) -> Result<()> {
        self.delete(entity).map_err(self.loader.annotate("remove"))
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        let mut store = self.loader.store.write();
        if !store.contains(entity) {
            return Err(Error::identity(format!("{entity:?} is not stored")));
        }
        let released = relation::release(&mut *store, &self.loader.catalog, entity)?;
        store.remove(entity)?;
        tracing::debug!(?entity, released, "removed");
        Ok(())
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generator = self
            .loader
            .store
            .read()
            .profile()
            .generator_of(self.loader.element_type());
        f.debug_struct("Manager")
            .field("loader", &self.loader)
            .field("generator", &generator)
            .finish()
    }
}
