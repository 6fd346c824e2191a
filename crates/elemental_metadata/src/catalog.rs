//! The registry of element definitions and their implementations.
//!
//! A [`Catalog`] is an owned value rather than global state: callers build
//! one, register definitions and implementations into it, then share it
//! (typically behind an `Arc`) with stores and loaders.

use std::sync::Arc;

use elemental_foundation::{Element, ElementType, Error, ErrorKind, Result};
use im::{HashMap, Vector};

use crate::builder::ElementBuilder;
use crate::definition::{Definition, DefinitionBuilder};
use crate::metadata::{Implementation, MetaData, MetaDataBuilder};
use crate::profile::Profile;
use crate::relationship::Relationship;

/// Registry of definitions and implementations.
#[derive(Clone, Debug)]
pub struct Catalog {
    definitions: HashMap<ElementType, Arc<Definition>>,
    implementations: HashMap<(ElementType, &'static str), Arc<dyn Implementation>>,
    /// Implementation names per contract, in registration order.
    names: HashMap<ElementType, Vec<&'static str>>,
    relationships: Vector<Arc<Relationship>>,
}

impl Catalog {
    /// Creates a catalog holding only the root element type.
    #[must_use]
    pub fn new() -> Self {
        let mut definitions = HashMap::new();
        definitions.insert(ElementType::ROOT, Arc::new(Definition::root()));
        Self {
            definitions,
            implementations: HashMap::new(),
            names: HashMap::new(),
            relationships: Vector::new(),
        }
    }

    /// Starts a definition for a new element type.
    #[must_use]
    pub fn define(&self, element: ElementType) -> DefinitionBuilder {
        DefinitionBuilder::new(element)
    }

    /// Registers a definition.
    ///
    /// Registering identical declarations again returns the existing
    /// definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the element type declares more than one parent,
    /// its parent is unknown, it is already registered with different
    /// declarations, one of its properties or selectors shadows an
    /// inherited one, or a selector uses a property that is not visible.
    pub fn register(&mut self, builder: DefinitionBuilder) -> Result<Arc<Definition>> {
        let element = builder.element();
        let existed = self.definitions.contains_key(&element);
        let definition = builder.finish(|t| self.definitions.get(&t).cloned())?;
        if !existed {
            tracing::debug!(
                %element,
                parent = ?definition.parent().map(|p| p.element()),
                properties = definition.own_properties().len(),
                "registered element type"
            );
            self.definitions.insert(element, Arc::clone(&definition));
        }
        Ok(definition)
    }

    /// Looks up a definition.
    #[must_use]
    pub fn definition(&self, element: ElementType) -> Option<&Arc<Definition>> {
        self.definitions.get(&element)
    }

    /// Looks up a definition, failing if it is not registered.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownElementType`] if the element type is not registered.
    pub fn require(&self, element: ElementType) -> Result<&Arc<Definition>> {
        self.definition(element)
            .ok_or_else(|| Error::new(ErrorKind::UnknownElementType(element.to_string())))
    }

    /// Every registered element type, including the root.
    pub fn element_types(&self) -> impl Iterator<Item = ElementType> + '_ {
        self.definitions.keys().copied()
    }

    /// Starts binding the concrete type `U` to a registered contract.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownElementType`] if the contract is not registered.
    pub fn bind<U: Element>(
        &self,
        element: ElementType,
        name: &'static str,
        create: fn() -> U,
    ) -> Result<MetaDataBuilder<U>> {
        let definition = Arc::clone(self.require(element)?);
        Ok(MetaDataBuilder::new(definition, name, create))
    }

    /// Registers a completed implementation binding.
    ///
    /// The first implementation registered for a contract is its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the binding is incomplete, or another
    /// implementation with the same name is already registered for the
    /// contract.
    pub fn implement<U: Element>(
        &mut self,
        builder: MetaDataBuilder<U>,
    ) -> Result<Arc<dyn Implementation>> {
        let meta: Arc<MetaData<U>> = Arc::new(builder.build()?);
        let element = meta.element_type();
        let key = (element, meta.name());
        if self.definition(element).is_none_or(|d| !Arc::ptr_eq(d, meta.definition())) {
            return Err(Error::new(ErrorKind::UnknownElementType(element.to_string())));
        }
        if self.implementations.contains_key(&key) {
            return Err(Error::conflict(format!(
                "{element} already has an implementation named {}",
                key.1
            )));
        }
        tracing::debug!(%element, implementation = meta.name(), "registered implementation");
        let meta: Arc<dyn Implementation> = meta;
        self.implementations.insert(key, Arc::clone(&meta));
        let mut names = self.names.get(&element).cloned().unwrap_or_default();
        names.push(key.1);
        self.names.insert(element, names);
        Ok(meta)
    }

    /// Looks up an implementation by contract and name.
    #[must_use]
    pub fn implementation(
        &self,
        element: ElementType,
        name: &str,
    ) -> Option<&Arc<dyn Implementation>> {
        let names = self.names.get(&element)?;
        let name = names.iter().find(|n| **n == name)?;
        self.implementations.get(&(element, *name))
    }

    /// The implementations of a contract, in registration order.
    #[must_use]
    pub fn implementations(&self, element: ElementType) -> Vec<&Arc<dyn Implementation>> {
        self.names
            .get(&element)
            .into_iter()
            .flatten()
            .filter_map(|n| self.implementations.get(&(element, *n)))
            .collect()
    }

    /// The implementation a profile selects for a contract, or the
    /// contract's default.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotRegistered`] if no matching implementation exists.
    pub fn resolve(
        &self,
        element: ElementType,
        profile: &Profile,
    ) -> Result<&Arc<dyn Implementation>> {
        let found = match profile.implementation_of(element) {
            Some(name) => self.implementation(element, name),
            None => self.implementations(element).into_iter().next(),
        };
        found.ok_or_else(|| {
            Error::new(ErrorKind::NotRegistered(format!(
                "no implementation of {element} for profile {}",
                profile.name()
            )))
        })
    }

    /// Registers a reference from `source.property` to the `target`
    /// instance whose `key` selector matches it.
    ///
    /// `inverse` is the source selector used to find the dependents of a
    /// target. Declaring the same relationship again returns the existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if either contract is unknown, the ends do not
    /// resolve (see [`Relationship::resolve`]), or the property already
    /// takes part in a different relationship.
    pub fn relate(
        &mut self,
        source: ElementType,
        property: &str,
        inverse: &str,
        target: ElementType,
        key: &str,
    ) -> Result<Arc<Relationship>> {
        let relationship = Relationship::resolve(
            self.require(source)?,
            property,
            inverse,
            self.require(target)?,
            key,
        )?;
        if let Some(existing) = self
            .relationships
            .iter()
            .find(|r| r.property() == relationship.property())
        {
            return if existing.is_identical(&relationship) {
                Ok(Arc::clone(existing))
            } else {
                Err(Error::conflict(format!(
                    "{} already takes part in {existing:?}",
                    relationship.property()
                )))
            };
        }
        tracing::debug!(relationship = ?relationship, "registered relationship");
        let relationship = Arc::new(relationship);
        self.relationships.push_back(Arc::clone(&relationship));
        Ok(relationship)
    }

    /// Every registered relationship, in registration order.
    pub fn relationships(&self) -> impl Iterator<Item = &Arc<Relationship>> {
        self.relationships.iter()
    }

    /// Relationships whose references are held by instances of `definition`.
    #[must_use]
    pub fn relationships_from(&self, definition: &Definition) -> Vec<&Arc<Relationship>> {
        self.relationships
            .iter()
            .filter(|r| definition.is_a(r.source()))
            .collect()
    }

    /// Relationships whose references point at instances of `definition`.
    #[must_use]
    pub fn relationships_to(&self, definition: &Definition) -> Vec<&Arc<Relationship>> {
        self.relationships
            .iter()
            .filter(|r| definition.is_a(r.target()))
            .collect()
    }

    /// Creates a builder for a contract's implementation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotRegistered`] if no such implementation exists.
    pub fn builder(&self, element: ElementType, name: &str) -> Result<ElementBuilder> {
        let meta = self.implementation(element, name).ok_or_else(|| {
            Error::new(ErrorKind::NotRegistered(format!("{element}/{name}")))
        })?;
        Ok(ElementBuilder::new(Arc::clone(meta)))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
