//! Loader dispatch: typed loader construction and caching.
//!
//! A [`LoaderRegistry`] maps (contract, implementation name) to a factory
//! that wraps a generic [`Loader`] in a typed one. A [`LoaderCache`]
//! resolves the implementation a store's profile selects, builds the typed
//! loader once and keeps it in a bounded LRU. Evicted loaders are rebuilt on
//! the next request, so callers must not rely on loader identity.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use elemental_foundation::{ElementType, Error, ErrorKind, Result};
use elemental_metadata::Catalog;
use lru::LruCache;
use parking_lot::Mutex;

use crate::loader::Loader;
use crate::store::{SharedStore, StoreId};

/// A type-erased typed loader.
pub type AnyLoader = Arc<dyn Any + Send + Sync>;

/// Wraps a generic loader in a typed one.
pub type LoaderFactory = fn(Loader) -> AnyLoader;

/// Factories for typed loaders, keyed by contract and implementation name.
#[derive(Default)]
pub struct LoaderRegistry {
    factories: HashMap<(ElementType, &'static str), LoaderFactory>,
}

impl LoaderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory for one implementation of a contract.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Conflict`] if a factory is already registered
    /// for the pair.
    pub fn register(
        &mut self,
        element: ElementType,
        implementation: &'static str,
        factory: LoaderFactory,
    ) -> Result<&mut Self> {
        if self.factories.contains_key(&(element, implementation)) {
            return Err(Error::conflict(format!(
                "loader for {element}/{implementation} is already registered"
            )));
        }
        tracing::debug!(%element, implementation, "registered loader");
        self.factories.insert((element, implementation), factory);
        Ok(self)
    }

    /// Looks up the factory for one implementation of a contract.
    #[must_use]
    pub fn factory(
        &self,
        element: ElementType,
        implementation: &'static str,
    ) -> Option<LoaderFactory> {
        self.factories.get(&(element, implementation)).copied()
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

type CacheKey = (StoreId, ElementType, &'static str);

/// Bounded cache of typed loaders per store.
pub struct LoaderCache {
    catalog: Arc<Catalog>,
    registry: Arc<LoaderRegistry>,
    cache: Mutex<LruCache<CacheKey, AnyLoader>>,
}

impl LoaderCache {
    /// Creates a cache holding at most `capacity` loaders.
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        registry: Arc<LoaderRegistry>,
        capacity: NonZeroUsize,
    ) -> Self {
        Self {
            catalog,
            registry,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The catalog loaders resolve against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the typed loader for a contract in a store.
    ///
    /// The implementation is the one the store's profile selects.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotRegistered`] if the contract has no
    /// implementation or loader, or if the registered loader is not an `L`.
    pub fn get<L: Any + Send + Sync>(
        &self,
        store: &SharedStore,
        element: ElementType,
    ) -> Result<Arc<L>> {
        let (store_id, meta) = {
            let guard = store.read();
            let meta = Arc::clone(self.catalog.resolve(element, guard.profile())?);
            (guard.id(), meta)
        };
        let key = (store_id, element, meta.name());

        let cached = self.cache.lock().get(&key).cloned();
        let loader = match cached {
            Some(loader) => loader,
            None => {
                let factory = self.registry.factory(element, meta.name()).ok_or_else(|| {
                    Error::new(ErrorKind::NotRegistered(format!(
                        "loader for {element}/{}",
                        meta.name()
                    )))
                })?;
                tracing::debug!(
                    store = %store_id,
                    %element,
                    implementation = meta.name(),
                    "building loader"
                );
                let loader = factory(Loader::new(
                    Arc::clone(&self.catalog),
                    Arc::clone(store),
                    meta,
                ));
                self.cache.lock().put(key, Arc::clone(&loader));
                loader
            }
        };

        loader.downcast::<L>().map_err(|_| {
            Error::new(ErrorKind::NotRegistered(format!(
                "loader for {element}/{} is not a {}",
                key.2,
                std::any::type_name::<L>()
            )))
        })
    }

    /// Drops every loader cached for a store.
    pub fn evict_store(&self, store: StoreId) {
        let mut cache = self.cache.lock();
        let stale: Vec<CacheKey> = cache
            .iter()
            .map(|(key, _)| *key)
            .filter(|key| key.0 == store)
            .collect();
        for key in stale {
            cache.pop(&key);
        }
    }

    /// Drops every cached loader.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached loaders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl fmt::Debug for LoaderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("LoaderCache")
            .field("registry", &self.registry)
            .field("cached", &cache.len())
            .field("capacity", &cache.cap())
            .finish()
    }
}
