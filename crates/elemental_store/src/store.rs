//! The store abstraction: identity, profile, lifecycle and transactions.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use elemental_foundation::{Error, Result};
use elemental_metadata::{Definition, Implementation, Profile};
use parking_lot::RwLock;

use crate::idgen::{GeneratorSet, IdGenerator, generator};
use crate::query::{Bindings, Query, StoreQuery};

/// Name of the property that carries an element's identifier.
pub const ID_PROPERTY: &str = "id";

/// Profile parameter holding a fixed seed for random identifier generation.
pub const RANDOM_SEED_PARAMETER: &str = "random_seed";

/// Process-unique identity of a store instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identity.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

/// A backend holding element instances.
pub trait DataStore: StoreQuery + Send + Sync + fmt::Debug {
    /// The store's identity.
    fn id(&self) -> StoreId;

    /// The configuration the store was opened with.
    fn profile(&self) -> &Profile;

    /// Returns true until [`close`](Self::close) succeeds.
    fn is_open(&self) -> bool;

    /// Releases the store's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction is active.
    fn close(&mut self) -> Result<()>;

    /// Scopes queries to a contract and, optionally, one implementation.
    fn get_query(
        &self,
        contract: Arc<Definition>,
        implementation: Option<Arc<dyn Implementation>>,
    ) -> Query<'_>;

    /// Identifiers of every stored instance of a contract.
    ///
    /// Instances without an identifier are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn ids(&self, contract: &Definition) -> Result<Vec<i64>> {
        let Some(id) = contract.property(ID_PROPERTY) else {
            return Ok(Vec::new());
        };
        let mut ids = Vec::new();
        for entity in self.query_all(&contract.all(), &Bindings::new())? {
            if let Some(value) = entity.get(id)?.and_then(|v| v.as_int()) {
                ids.push(value);
            }
        }
        Ok(ids)
    }

    /// The store's identifier generators.
    fn generators(&mut self) -> &mut GeneratorSet;

    /// The identifier generator for a contract.
    ///
    /// Created on first use from the profile's strategy and the identifiers
    /// already stored, then shared by every writer to this store. Generators
    /// are not rolled back with a transaction, so a rollback can leave gaps.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn generator(&mut self, contract: &Definition) -> Result<&mut (dyn IdGenerator + 'static)> {
        let element = contract.element();
        if !self.generators().contains(element) {
            let kind = self.profile().generator_of(element);
            let seed = self
                .profile()
                .parameter(RANDOM_SEED_PARAMETER)
                .and_then(|s| s.parse::<u64>().ok());
            let existing = self.ids(contract)?;
            tracing::debug!(
                store = %self.id(),
                %element,
                ?kind,
                stored = existing.len(),
                "created identifier generator"
            );
            self.generators().insert(element, generator(kind, existing, seed));
        }
        self.generators()
            .get_mut(element)
            .ok_or_else(|| Error::internal(format!("no identifier generator for {element}")))
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or a transaction is active.
    fn begin(&mut self) -> Result<()>;

    /// Makes the active transaction's changes permanent.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active, or rolls back and
    /// returns an error if the transaction was marked rollback-only.
    fn commit(&mut self) -> Result<()>;

    /// Discards the active transaction's membership changes.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active.
    fn rollback(&mut self) -> Result<()>;

    /// Returns true while a transaction is active.
    fn is_active(&self) -> bool;

    /// Marks the active transaction so that it can only roll back.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active.
    fn set_rollback_only(&mut self) -> Result<()>;

    /// Returns true if the active transaction can only roll back.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active.
    fn is_rollback_only(&self) -> Result<bool>;
}

/// A store shared between loaders.
pub type SharedStore = Arc<RwLock<dyn DataStore>>;

/// Wraps a store for sharing.
#[must_use]
pub fn shared<S: DataStore + 'static>(store: S) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// Transaction flags shared by the bundled stores.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TransactionState {
    active: bool,
    rollback_only: bool,
}

impl TransactionState {
    pub fn is_active(self) -> bool {
        self.active
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.active {
            return Err(Error::transaction(
                "a transaction is already active",
            ));
        }
        *self = Self {
            active: true,
            rollback_only: false,
        };
        Ok(())
    }

    pub fn require_active(self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(Error::transaction(
                "no transaction is active",
            ))
        }
    }

    pub fn set_rollback_only(&mut self) -> Result<()> {
        self.require_active()?;
        self.rollback_only = true;
        Ok(())
    }

    pub fn is_rollback_only(self) -> Result<bool> {
        self.require_active()?;
        Ok(self.rollback_only)
    }

    /// Ends the transaction, returning whether it may commit.
    pub fn finish(&mut self) -> Result<bool> {
        self.require_active()?;
        let may_commit = !self.rollback_only;
        *self = Self::default();
        Ok(may_commit)
    }
}
