//! In-memory store with unique-selector indexes.
//!
//! Membership and indexes live in persistent maps, so beginning a
//! transaction is an O(1) snapshot and rollback restores it. Rollback
//! restores membership and index entries only; property values changed in
//! place on shared instances stay changed.

use std::fmt;
use std::sync::Arc;

use elemental_foundation::{Error, ErrorKind, Result, Value};
use elemental_metadata::{
    Definition, Entity, EntityKey, Implementation, Profile, Selector, SelectorId,
};
use im::{HashMap, OrdMap};

use crate::idgen::GeneratorSet;
use crate::query::{Bindings, Query, StoreQuery, key_values, matches};
use crate::store::{DataStore, StoreId, TransactionState};

/// Key of one unique-selector index entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexKey {
    /// The unique selector.
    pub selector: SelectorId,
    /// The selector's property values, in key order.
    pub values: Vec<Value>,
}

#[derive(Clone, Default)]
struct Contents {
    next_seq: u64,
    /// Members in insertion order.
    entries: OrdMap<u64, Entity>,
    members: HashMap<EntityKey, u64>,
    index: HashMap<IndexKey, Entity>,
    /// Index keys currently held by each member.
    keys: HashMap<EntityKey, Vec<IndexKey>>,
}

/// A store that keeps every instance in memory.
pub struct MemStore {
    id: StoreId,
    profile: Profile,
    open: bool,
    contents: Contents,
    snapshot: Option<Contents>,
    transaction: TransactionState,
    generators: GeneratorSet,
}

impl MemStore {
    /// Opens an empty store.
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        let id = StoreId::next();
        tracing::debug!(%id, profile = profile.name(), "opened memory store");
        Self {
            id,
            profile,
            open: true,
            contents: Contents::default(),
            snapshot: None,
            transaction: TransactionState::default(),
            generators: GeneratorSet::new(),
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.entries.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.entries.is_empty()
    }

    /// Every member, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.contents.entries.values()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::StoreClosed))
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        if self.profile.is_mutable() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::ReadOnlyStore))
        }
    }

    fn index_keys(entity: &Entity) -> Result<Vec<IndexKey>> {
        let mut keys = Vec::new();
        for selector in entity.definition().unique_selectors() {
            let mut values = Vec::with_capacity(selector.properties().len());
            for property in selector.properties() {
                match entity.get(property)? {
                    Some(value) => values.push(value),
                    None => break,
                }
            }
            if values.len() == selector.properties().len() {
                keys.push(IndexKey {
                    selector: selector.id().clone(),
                    values,
                });
            }
        }
        Ok(keys)
    }

    fn check_free(&self, entity: &Entity, keys: &[IndexKey]) -> Result<()> {
        for key in keys {
            if let Some(holder) = self.contents.index.get(key) {
                if !holder.ptr_eq(entity) {
                    return Err(Error::new(ErrorKind::DuplicateKey {
                        selector: key.selector.to_string(),
                    }));
                }
            }
        }
        Ok(())
    }

    fn unindex(&mut self, entity: &Entity) -> Vec<IndexKey> {
        let held = self
            .contents
            .keys
            .remove(&entity.key())
            .unwrap_or_default();
        for key in &held {
            if self
                .contents
                .index
                .get(key)
                .is_some_and(|holder| holder.ptr_eq(entity))
            {
                self.contents.index.remove(key);
            }
        }
        held
    }

    fn index(&mut self, entity: &Entity, keys: Vec<IndexKey>) {
        for key in &keys {
            self.contents.index.insert(key.clone(), entity.clone());
        }
        self.contents.keys.insert(entity.key(), keys);
    }

    fn not_member(entity: &Entity) -> Error {
        Error::identity(format!("{entity:?} is not a member"))
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}

impl fmt::Debug for MemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemStore")
            .field("id", &self.id)
            .field("profile", &self.profile.name())
            .field("open", &self.open)
            .field("members", &self.len())
            .field("indexed", &self.contents.index.len())
            .field("transaction", &self.transaction.is_active())
            .field("generators", &self.generators.len())
            .finish()
    }
}

impl StoreQuery for MemStore {
    fn query(&self, selector: &Selector, bindings: &Bindings) -> Result<Option<Entity>> {
        self.ensure_open()?;
        if !selector.is_unique() {
            return Err(Error::new(ErrorKind::NotUnique(selector.id().to_string())));
        }
        let key = IndexKey {
            selector: selector.id().clone(),
            values: key_values(selector, bindings)?,
        };
        Ok(self.contents.index.get(&key).cloned())
    }

    fn query_all(&self, selector: &Selector, bindings: &Bindings) -> Result<Vec<Entity>> {
        self.ensure_open()?;
        if selector.is_unique() {
            return Ok(self.query(selector, bindings)?.into_iter().collect());
        }
        let values = key_values(selector, bindings)?;
        let mut found = Vec::new();
        for entity in self.contents.entries.values() {
            if entity.is_a(selector.element()) && matches(entity, selector, &values)? {
                found.push(entity.clone());
            }
        }
        Ok(found)
    }

    fn contains(&self, entity: &Entity) -> bool {
        self.contents.members.contains_key(&entity.key())
    }

    fn insert(&mut self, entity: Entity) -> Result<()> {
        self.ensure_writable()?;
        if self.contains(&entity) {
            return Err(Error::identity(format!("{entity:?} is already a member")));
        }
        let keys = Self::index_keys(&entity)?;
        self.check_free(&entity, &keys)?;

        let seq = self.contents.next_seq;
        self.contents.next_seq += 1;
        self.contents.entries.insert(seq, entity.clone());
        self.contents.members.insert(entity.key(), seq);
        tracing::trace!(store = %self.id, ?entity, keys = keys.len(), "inserted");
        self.index(&entity, keys);
        Ok(())
    }

    fn remove(&mut self, entity: &Entity) -> Result<()> {
        self.ensure_writable()?;
        let seq = self
            .contents
            .members
            .remove(&entity.key())
            .ok_or_else(|| Self::not_member(entity))?;
        self.contents.entries.remove(&seq);
        self.unindex(entity);
        tracing::trace!(store = %self.id, ?entity, "removed");
        Ok(())
    }

    fn reindex(&mut self, entity: &Entity) -> Result<()> {
        self.ensure_writable()?;
        if !self.contains(entity) {
            return Err(Self::not_member(entity));
        }
        let keys = Self::index_keys(entity)?;
        self.check_free(entity, &keys)?;
        self.unindex(entity);
        self.index(entity, keys);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let dropped = self.len();
        self.contents = Contents::default();
        tracing::debug!(store = %self.id, dropped, "cleared memory store");
        Ok(())
    }
}

impl DataStore for MemStore {
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
        self.contents = Contents::default();
        self.generators.clear();
        self.open = false;
        tracing::debug!(store = %self.id, "closed memory store");
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
        self.transaction.begin()?;
        self.snapshot = Some(self.contents.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.transaction.finish()? {
            self.snapshot = None;
            Ok(())
        } else {
            if let Some(snapshot) = self.snapshot.take() {
                self.contents = snapshot;
            }
            Err(Error::transaction("transaction was marked rollback-only"))
        }
    }

    fn rollback(&mut self) -> Result<()> {
        self.transaction.finish()?;
        if let Some(snapshot) = self.snapshot.take() {
            self.contents = snapshot;
        }
        tracing::debug!(store = %self.id, "rolled back");
        Ok(())
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
