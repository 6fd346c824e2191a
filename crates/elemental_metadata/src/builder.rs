//! Staging values and producing instances.
//!
//! An [`ElementBuilder`] holds pending property values for one
//! implementation. [`build`](ElementBuilder::build) either mutates an
//! existing instance in place or produces a fresh one:
//!
//! 1. Each property resolves to its pending value, or else the existing
//!    instance's value.
//! 2. A property is *changed* when its pending value is not the same
//!    reference as the existing value (see [`Value::same`]).
//! 3. Required properties must resolve to a value.
//! 4. With an existing instance of the same implementation whose changed
//!    properties are all mutable, the changes are written in place and the
//!    existing handle is returned.
//! 5. Otherwise a new instance receives every resolved value.
//!
//! Nothing observable is mutated when `build` fails.

use std::collections::HashMap;
use std::sync::Arc;

use elemental_foundation::{ElementType, Error, ErrorKind, Result, Value};

use crate::definition::Definition;
use crate::entity::Entity;
use crate::metadata::Implementation;
use crate::property::Property;

/// Pending property values for one implementation.
#[derive(Clone, Debug)]
pub struct ElementBuilder {
    meta: Arc<dyn Implementation>,
    pending: HashMap<Property, Option<Value>>,
}

impl ElementBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(meta: Arc<dyn Implementation>) -> Self {
        Self {
            meta,
            pending: HashMap::new(),
        }
    }

    /// The contract being built.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.meta.element_type()
    }

    /// The implementation being built.
    #[must_use]
    pub fn implementation(&self) -> &Arc<dyn Implementation> {
        &self.meta
    }

    /// The contract definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<Definition> {
        self.meta.definition()
    }

    /// Looks up a visible property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.definition().property(name)
    }

    fn checked(&self, property: &Property) -> Result<()> {
        if self.definition().has_property(property) {
            Ok(())
        } else {
            Err(Error::unknown_property(self.element_type(), property.name()))
        }
    }

    /// Stages a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is not part of the contract, the
    /// implementation cannot write it, or the value has the wrong type.
    pub fn set_property(
        &mut self,
        property: &Property,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.checked(property)?;
        if !self.meta.is_writable(property) {
            return Err(Error::new(ErrorKind::ReadOnlyProperty(property.to_string())));
        }
        let value = value.into();
        if !property.accepts(&value) {
            return Err(Error::type_mismatch(
                property.name(),
                property.value_type(),
                value.type_name(),
            ));
        }
        self.pending.insert(property.clone(), Some(value));
        Ok(self)
    }

    /// Stages a value for the property with the given name.
    ///
    /// # Errors
    ///
    /// As [`set_property`](Self::set_property), or if no property of that
    /// name is visible.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let property = self
            .property(name)
            .cloned()
            .ok_or_else(|| Error::unknown_property(self.element_type(), name))?;
        self.set_property(&property, value)
    }

    /// Stages an explicit absence of value.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is not part of the contract or the
    /// implementation cannot write it.
    pub fn clear_property(&mut self, property: &Property) -> Result<&mut Self> {
        self.checked(property)?;
        if !self.meta.is_writable(property) {
            return Err(Error::new(ErrorKind::ReadOnlyProperty(property.to_string())));
        }
        self.pending.insert(property.clone(), None);
        Ok(self)
    }

    /// Returns the staged value, or `None` if unstaged or staged as absent.
    #[must_use]
    pub fn property_value(&self, property: &Property) -> Option<&Value> {
        self.pending.get(property).and_then(Option::as_ref)
    }

    /// Returns true if a value (or an explicit absence) has been staged.
    #[must_use]
    pub fn is_staged(&self, property: &Property) -> bool {
        self.pending.contains_key(property)
    }

    /// Stages every visible property's current value from an instance.
    ///
    /// Properties this implementation cannot write are skipped; they cannot
    /// be staged.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not of this builder's contract.
    pub fn load(&mut self, entity: &Entity) -> Result<&mut Self> {
        if !entity.is_a(self.element_type()) {
            return Err(Error::new(ErrorKind::WrongElementType {
                expected: self.element_type(),
                actual: entity.element_type(),
            }));
        }
        let mut staged = Vec::new();
        for property in self.definition().properties() {
            if self.meta.is_writable(property) {
                staged.push((property.clone(), entity.get(property)?));
            }
        }
        self.pending.extend(staged);
        Ok(self)
    }

    /// Discards every staged value.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Produces an instance from the staged values.
    ///
    /// Returns `existing` itself when the changes could be applied in place,
    /// or a new instance otherwise. An existing instance of another
    /// implementation only supplies values.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Validation`] if a required property resolves to
    /// no value; nothing is mutated in that case.
    pub fn build(&self, existing: Option<&Entity>) -> Result<Entity> {
        let definition = Arc::clone(self.definition());
        let properties = definition.properties();

        let mut resolved: Vec<(&Property, Option<Value>, bool)> =
            Vec::with_capacity(properties.len());
        for property in properties {
            let current = match existing {
                Some(entity) => entity.get(property)?,
                None => None,
            };
            let (value, changed) = match self.pending.get(property) {
                Some(pending) => {
                    let changed =
                        existing.is_none() || !Value::same_opt(pending.as_ref(), current.as_ref());
                    (pending.clone(), changed)
                }
                None => (current, existing.is_none()),
            };
            resolved.push((property, value, changed));
        }

        let in_place = existing.filter(|entity| {
            self.same_implementation(entity)
                && resolved
                    .iter()
                    .filter(|(_, _, changed)| *changed)
                    .all(|(p, _, _)| p.is_mutable() && self.meta.is_writable(p))
        });

        if let Some(entity) = in_place {
            self.validate(resolved.iter().map(|(p, v, _)| (*p, v.as_ref())))?;
            let changes: Vec<_> = resolved.into_iter().filter(|(_, _, c)| *c).collect();
            tracing::trace!(
                element = %self.element_type(),
                changes = changes.len(),
                "updating instance in place"
            );
            for (property, value, _) in changes {
                entity.set(property, value)?;
            }
            return Ok(entity.clone());
        }

        let fresh = Entity::new(Arc::clone(&self.meta));
        for (property, value, _) in &resolved {
            if self.meta.is_writable(property) {
                fresh.set(property, value.clone())?;
            }
        }
        let mut values = Vec::with_capacity(resolved.len());
        for (property, _, _) in &resolved {
            values.push((*property, fresh.get(property)?));
        }
        self.validate(values.iter().map(|(p, v)| (*p, v.as_ref())))?;
        tracing::trace!(
            element = %self.element_type(),
            implementation = self.meta.name(),
            replaced = existing.is_some(),
            "built new instance"
        );
        Ok(fresh)
    }

    fn same_implementation(&self, entity: &Entity) -> bool {
        let other = entity.implementation();
        other.element_type() == self.meta.element_type() && other.name() == self.meta.name()
    }

    fn validate<'a>(
        &self,
        values: impl Iterator<Item = (&'a Property, Option<&'a Value>)>,
    ) -> Result<()> {
        for (property, value) in values {
            if property.is_required() && value.is_none() {
                return Err(Error::validation(self.element_type(), property.name()));
            }
        }
        Ok(())
    }
}
