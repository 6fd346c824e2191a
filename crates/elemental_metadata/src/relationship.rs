//! References from one element type to another.
//!
//! A [`Relationship`] ties an identifier property on a source contract to the
//! unique key of its target contract. The inverse side is answered through a
//! selector on the source over the reference property, so the target never
//! stores its dependents.

use std::fmt;

use elemental_foundation::{ElementType, Error, ErrorKind, Result, Value, ValueType};

use crate::definition::Definition;
use crate::entity::Entity;
use crate::property::Property;
use crate::selector::Selector;

/// A reference property and the selectors that resolve both of its ends.
#[derive(Clone)]
pub struct Relationship {
    property: Property,
    inverse: Selector,
    key: Selector,
}

impl Relationship {
    /// Resolves a relationship from a source and a target definition.
    ///
    /// `property` must be an identifier property of the source naming the
    /// target contract, `inverse` a selector on the source over exactly that
    /// property, and `key` a unique selector on the target over a single
    /// integer property.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first part that is missing or malformed.
    pub fn resolve(
        source: &Definition,
        property: &str,
        inverse: &str,
        target: &Definition,
        key: &str,
    ) -> Result<Self> {
        let property = source
            .property(property)
            .ok_or_else(|| Error::unknown_property(source.element(), property))?
            .clone();
        if property.value_type() != ValueType::Id(target.element()) {
            return Err(Error::new(ErrorKind::InvalidDefinition(format!(
                "{property} does not reference {}",
                target.element()
            ))));
        }

        let inverse = source
            .selector(inverse)
            .ok_or_else(|| Error::unknown_selector(source.element(), inverse))?
            .clone();
        if inverse.properties().len() != 1 || !inverse.contains(&property) {
            return Err(Error::new(ErrorKind::InvalidDefinition(format!(
                "selector {} must select on {property} alone",
                inverse.id()
            ))));
        }

        let key = target
            .selector(key)
            .ok_or_else(|| Error::unknown_selector(target.element(), key))?
            .clone();
        let keyed_by_int = matches!(key.properties(), [p] if p.value_type() == ValueType::Int);
        if !key.is_unique() || !keyed_by_int {
            return Err(Error::new(ErrorKind::InvalidDefinition(format!(
                "selector {} is not a unique integer key",
                key.id()
            ))));
        }

        Ok(Self {
            property,
            inverse,
            key,
        })
    }

    /// The contract holding the reference.
    #[must_use]
    pub fn source(&self) -> ElementType {
        self.property.element()
    }

    /// The contract referenced.
    #[must_use]
    pub fn target(&self) -> ElementType {
        self.key.element()
    }

    /// The reference property on the source.
    #[must_use]
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// The source selector that finds the dependents of a target.
    #[must_use]
    pub fn inverse(&self) -> &Selector {
        &self.inverse
    }

    /// The target selector that resolves a reference.
    #[must_use]
    pub fn key(&self) -> &Selector {
        &self.key
    }

    /// The key property on the target.
    #[must_use]
    pub fn key_property(&self) -> &Property {
        &self.key.properties()[0]
    }

    /// The identifier a source instance refers to, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not of the source contract.
    pub fn referenced_id(&self, source: &Entity) -> Result<Option<i64>> {
        Ok(source.get(&self.property)?.and_then(|v| v.as_id()))
    }

    /// The identifier dependents of a target instance refer to, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not of the target contract.
    pub fn target_id(&self, target: &Entity) -> Result<Option<i64>> {
        Ok(target.get(self.key_property())?.and_then(|v| v.as_int()))
    }

    /// The value the key selector is bound to when resolving `id`.
    #[must_use]
    pub fn key_value(id: i64) -> Value {
        Value::Int(id)
    }

    /// The value the inverse selector is bound to when finding dependents
    /// of `id`.
    #[must_use]
    pub fn reference_value(id: i64) -> Value {
        Value::Id(id)
    }

    /// Returns true if two declarations resolve to the same ends.
    #[must_use]
    pub fn is_identical(&self, other: &Self) -> bool {
        self.property.is_identical(&other.property)
            && self.inverse.id() == other.inverse.id()
            && self.key.id() == other.key.id()
    }
}

impl fmt::Debug for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Relationship({}.{} -> {} via {})",
            self.source(),
            self.property.name(),
            self.key.id(),
            self.inverse.id()
        )
    }
}
