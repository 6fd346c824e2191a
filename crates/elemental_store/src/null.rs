//! A store that holds nothing.
//!
//! Queries validate their arguments and return no results; inserts are
//! accepted and discarded. Useful as a placeholder backend and for
//! exercising loaders without data.

use std::sync::Arc;

use elemental_foundation::{Error, ErrorKind, Result};
use elemental_metadata::{Definition, Entity, Implementation, Profile, Selector};

use crate::idgen::GeneratorSet;
use crate::query::{Bindings, Query, StoreQuery, key_values};
use crate::store::{DataStore, StoreId, TransactionState};

/// A store with no members.
#[derive(Debug)]
pub struct NullStore {
    id: StoreId,
    profile: Profile,
    open: bool,
    transaction: TransactionState,
    generators: GeneratorSet,
}

impl NullStore {
    /// Opens the store.
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        Self {
            id: StoreId::next(),
            profile,
            open: true,
            transaction: TransactionState::default(),
            generators: GeneratorSet::new(),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::StoreClosed))
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}

impl StoreQuery for NullStore {
    fn query(&self, selector: &Selector, bindings: &Bindings) -> Result<Option<Entity>> {
        self.ensure_open()?;
        if !selector.is_unique() {
            return Err(Error::new(ErrorKind::NotUnique(selector.id().to_string())));
        }
        key_values(selector, bindings)?;
        Ok(None)
    }

    fn query_all(&self, selector: &Selector, bindings: &Bindings) -> Result<Vec<Entity>> {
        self.ensure_open()?;
        key_values(selector, bindings)?;
        Ok(Vec::new())
    }

    fn contains(&self, _entity: &Entity) -> bool {
        false
    }

    fn insert(&mut self, entity: Entity) -> Result<()> {
        self.ensure_open()?;
        if !self.profile.is_mutable() {
            return Err(Error::new(ErrorKind::ReadOnlyStore));
        }
        tracing::trace!(store = %self.id, ?entity, "discarded insert");
        Ok(())
    }

    fn remove(&mut self, entity: &Entity) -> Result<()> {
        self.ensure_open()?;
        Err(Error::identity(format!("{entity:?} is not a member")))
    }

    fn reindex(&mut self, entity: &Entity) -> Result<()> {
        self.ensure_open()?;
        Err(Error::identity(format!("{entity:?} is not a member")))
    }

    fn clear(&mut self) -> Result<()> {
        self.ensure_open()
    }
}

impl DataStore for NullStore {
    fn id(&self) -> StoreId {
        self.id
    }

    fn profile(&self) -> &Profile {
        &self.profile
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<()> {
        if self.transaction.is_active() {
            return Err(Error::transaction("cannot close during a transaction"));
        }
        self.generators.clear();
        self.open = false;
        Ok(())
    }

    fn generators(&mut self) -> &mut GeneratorSet {
        &mut self.generators
    }

    fn get_query(
        &self,
        contract: Arc<Definition>,
        implementation: Option<Arc<dyn Implementation>>,
    ) -> Query<'_> {
        Query::new(self, contract, implementation)
    }

    fn begin(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.transaction.begin()
    }

    fn commit(&mut self) -> Result<()> {
        if self.transaction.finish()? {
            Ok(())
        } else {
            Err(Error::transaction("transaction was marked rollback-only"))
        }
    }

    fn rollback(&mut self) -> Result<()> {
        self.transaction.finish().map(|_| ())
    }

    fn is_active(&self) -> bool {
        self.transaction.is_active()
    }

    fn set_rollback_only(&mut self) -> Result<()> {
        self.transaction.set_rollback_only()
    }

    fn is_rollback_only(&self) -> Result<bool> {
        self.transaction.is_rollback_only()
    }
}
