//! Course-management domain model for Elemental.
//!
//! This crate provides:
//! - Contracts [`ROLE`], [`USER`], [`COURSE`], [`ENROLMENT`] and [`ACTIVITY_TYPE`]
//! - Their default implementations, plus [`LegacyCourse`], a read-only
//!   second implementation of `Course`
//! - Typed loaders such as [`RoleLoader`] and [`CourseLoader`]
//! - [`catalog`] and [`loaders`] - The registries for all of the above
//! - [`Domain`] - A catalog plus a loader cache, ready for use with stores

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod activity_type;
pub mod course;
pub mod enrolment;
pub mod role;
pub mod user;

use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::Arc;

use elemental_foundation::{ElementType, Result};
use elemental_metadata::Catalog;
use elemental_store::{Loader, LoaderCache, LoaderRegistry, Manager, SharedStore};

pub use activity_type::{ACTIVITY_TYPE, ActivityTypeData, ActivityTypeLoader};
pub use course::{COURSE, CourseData, CourseLoader, LegacyCourse, Semester};
pub use enrolment::{ENROLMENT, EnrolmentData, EnrolmentLoader};
pub use role::{ROLE, RoleData, RoleLoader};
pub use user::{USER, UserData, UserLoader};

/// Loader cache capacity used by [`Domain::new`].
pub const DEFAULT_LOADER_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(63);

/// Builds the catalog of every domain contract and implementation.
///
/// # Errors
///
/// Returns an error if a registration fails.
pub fn catalog() -> Result<Catalog> {
    let mut catalog = Catalog::new();
    role::define(&mut catalog)?;
    user::define(&mut catalog)?;
    course::define(&mut catalog)?;
    enrolment::define(&mut catalog)?;
    activity_type::define(&mut catalog)?;

    role::implement(&mut catalog)?;
    user::implement(&mut catalog)?;
    course::implement(&mut catalog)?;
    enrolment::implement(&mut catalog)?;
    activity_type::implement(&mut catalog)?;

    enrolment::relate(&mut catalog)?;

    tracing::debug!(
        contracts = catalog.element_types().count(),
        "built domain catalog"
    );
    Ok(catalog)
}

/// Builds the registry of typed loaders for every domain implementation.
///
/// # Errors
///
/// Returns an error if a registration fails.
pub fn loaders() -> Result<LoaderRegistry> {
    let mut registry = LoaderRegistry::new();
    registry
        .register(ROLE, RoleData::IMPLEMENTATION, RoleLoader::factory)?
        .register(USER, UserData::IMPLEMENTATION, UserLoader::factory)?
        .register(COURSE, CourseData::IMPLEMENTATION, CourseLoader::factory)?
        .register(COURSE, LegacyCourse::IMPLEMENTATION, CourseLoader::factory)?
        .register(ENROLMENT, EnrolmentData::IMPLEMENTATION, EnrolmentLoader::factory)?
        .register(
            ACTIVITY_TYPE,
            ActivityTypeData::IMPLEMENTATION,
            ActivityTypeLoader::factory,
        )?;
    Ok(registry)
}

/// The domain catalog together with a cache of typed loaders.
#[derive(Debug)]
pub struct Domain {
    catalog: Arc<Catalog>,
    loaders: LoaderCache,
}

impl Domain {
    /// Builds the catalog and a loader cache of the given capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if a registration fails.
    pub fn new(capacity: NonZeroUsize) -> Result<Self> {
        let catalog = Arc::new(catalog()?);
        let loaders = LoaderCache::new(Arc::clone(&catalog), Arc::new(loaders()?), capacity);
        Ok(Self { catalog, loaders })
    }

    /// The domain catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The loader cache.
    #[must_use]
    pub fn loaders(&self) -> &LoaderCache {
        &self.loaders
    }

    /// Returns the typed loader for a contract in a store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store's profile selects an implementation
    /// with no loader of type `L`.
    pub fn loader<L: Any + Send + Sync>(
        &self,
        store: &SharedStore,
        element: ElementType,
    ) -> Result<Arc<L>> {
        self.loaders.get(store, element)
    }

    /// Creates a manager for a contract in a store.
    ///
    /// The implementation is the one the store's profile selects.
    ///
    /// # Errors
    ///
    /// Returns an error if no implementation is registered or the store's
    /// identifiers cannot be read.
    pub fn manager(&self, store: &SharedStore, element: ElementType) -> Result<Manager> {
        let meta = Arc::clone(self.catalog.resolve(element, store.read().profile())?);
        Manager::new(Loader::new(Arc::clone(&self.catalog), Arc::clone(store), meta))
    }
}
