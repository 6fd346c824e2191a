//! Relationship integrity for writes made through a [`Manager`](crate::Manager).
//!
//! A reference must name a stored instance of its target when it is written.
//! Before a target leaves the store, or moves to a different key, its
//! dependents are detached: an optional, mutable reference is cleared in
//! place, anything else blocks the change. Writes made directly on a store
//! are not checked.

use std::sync::Arc;

use elemental_foundation::{Error, ErrorKind, Result};
use elemental_metadata::{Catalog, ElementBuilder, Entity, Relationship};

use crate::query::Bindings;
use crate::store::DataStore;

/// A stored instance referring to a target, with the relationship it
/// refers through.
pub type Dependent = (Arc<Relationship>, Entity);

/// Fails unless every reference held by `entity` names a member of `store`.
///
/// # Errors
///
/// Returns [`ErrorKind::Relationship`] for the first reference with no
/// target, or the store's error if a lookup fails.
pub fn check_references(
    store: &dyn DataStore,
    catalog: &Catalog,
    entity: &Entity,
) -> Result<()> {
    for relationship in catalog.relationships_from(entity.definition()) {
        let Some(id) = relationship.referenced_id(entity)? else {
            continue;
        };
        let bindings = Bindings::new().with(
            relationship.key_property().name(),
            Relationship::key_value(id),
        );
        if store.query(relationship.key(), &bindings)?.is_none() {
            return Err(Error::relationship(format!(
                "{} = {id} names no stored {}",
                relationship.property(),
                relationship.target()
            )));
        }
    }
    Ok(())
}

/// The stored instances whose references point at `target`.
///
/// # Errors
///
/// Returns the store's error if a lookup fails.
pub fn dependents(
    store: &dyn DataStore,
    catalog: &Catalog,
    target: &Entity,
) -> Result<Vec<Dependent>> {
    let mut found = Vec::new();
    for relationship in catalog.relationships_to(target.definition()) {
        let Some(id) = relationship.target_id(target)? else {
            continue;
        };
        let bindings = Bindings::new().with(
            relationship.property().name(),
            Relationship::reference_value(id),
        );
        for dependent in store.query_all(relationship.inverse(), &bindings)? {
            found.push((Arc::clone(relationship), dependent));
        }
    }
    Ok(found)
}

/// The key values dependents use to refer to `target`, one per
/// relationship pointing at its contract.
///
/// # Errors
///
/// Returns an error if a key property cannot be read.
pub fn target_ids(catalog: &Catalog, target: &Entity) -> Result<Vec<Option<i64>>> {
    catalog
        .relationships_to(target.definition())
        .into_iter()
        .map(|relationship| relationship.target_id(target))
        .collect()
}

/// Fails if any dependent's reference cannot be cleared in place.
///
/// # Errors
///
/// Returns [`ErrorKind::Relationship`] naming the first blocking dependent.
pub fn ensure_detachable(target: &Entity, dependents: &[Dependent]) -> Result<()> {
    for (relationship, dependent) in dependents {
        let property = relationship.property();
        let clearable = !property.is_required()
            && property.is_mutable()
            && dependent.implementation().is_writable(property);
        if !clearable {
            return Err(Error::relationship(format!(
                "{dependent:?} still refers to {target:?} through {property}"
            )));
        }
    }
    Ok(())
}

/// Clears the references held by `dependents` and re-indexes them.
///
/// Call [`ensure_detachable`] first; this only fails part way through if the
/// store rejects a re-index.
///
/// # Errors
///
/// Returns [`ErrorKind::ReadOnlyStore`] before changing anything if the
/// store is read-only.
pub fn detach(store: &mut dyn DataStore, dependents: &[Dependent]) -> Result<()> {
    if dependents.is_empty() {
        return Ok(());
    }
    if !store.profile().is_mutable() {
        return Err(Error::new(ErrorKind::ReadOnlyStore));
    }
    for (relationship, dependent) in dependents {
        let mut builder = ElementBuilder::new(Arc::clone(dependent.implementation()));
        builder.clear_property(relationship.property())?;
        builder.build(Some(dependent))?;
        store.reindex(dependent)?;
        tracing::debug!(
            ?dependent,
            property = %relationship.property(),
            "cleared reference"
        );
    }
    Ok(())
}

/// Detaches every dependent of `target` so that it can leave the store.
///
/// Returns the number of references cleared. Nothing changes if any
/// dependent blocks.
///
/// # Errors
///
/// Returns [`ErrorKind::Relationship`] if a dependent's reference is
/// required or cannot be cleared in place.
pub fn release(
    store: &mut dyn DataStore,
    catalog: &Catalog,
    target: &Entity,
) -> Result<usize> {
    let dependents = dependents(store, catalog, target)?;
    ensure_detachable(target, &dependents)?;
    detach(store, &dependents)?;
    Ok(dependents.len())
}
