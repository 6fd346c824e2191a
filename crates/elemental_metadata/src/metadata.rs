//! Bindings between element contracts and concrete implementation types.
//!
//! [`MetaData`] pairs a [`Definition`] with a constructor and one getter
//! (and optionally one setter) per property for a concrete type `U`.
//! [`Implementation`] is the erased view stores and builders use, so that
//! every implementation of a contract is handled uniformly.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use elemental_foundation::{Element, ElementType, Error, ErrorKind, Result, Value};
use parking_lot::RwLock;

use crate::definition::Definition;
use crate::property::Property;

/// Reads one property from a concrete instance.
pub type Getter<U> = fn(&U) -> Option<Value>;

/// Writes one property on a concrete instance.
///
/// The value has already been checked against the property type.
pub type Setter<U> = fn(&mut U, Option<Value>);

struct Accessor<U> {
    getter: Getter<U>,
    setter: Option<Setter<U>>,
}

impl<U> Clone for Accessor<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Accessor<U> {}

/// Erased implementation metadata.
pub trait Implementation: Send + Sync + fmt::Debug {
    /// The contract implemented.
    fn element_type(&self) -> ElementType;

    /// The implementation name, unique per contract.
    fn name(&self) -> &'static str;

    /// The contract definition.
    fn definition(&self) -> &Arc<Definition>;

    /// The concrete instance type.
    fn instance_type(&self) -> TypeId;

    /// Creates an empty instance.
    fn instantiate(&self) -> Arc<RwLock<dyn Element>>;

    /// Reads a property from an instance of this implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance has another concrete type or the
    /// property is not part of the contract.
    fn read(&self, property: &Property, element: &dyn Element) -> Result<Option<Value>>;

    /// Writes a property on an instance of this implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance has another concrete type, the
    /// property is unknown or read-only, or the value has the wrong type.
    fn write(
        &self,
        property: &Property,
        element: &mut dyn Element,
        value: Option<Value>,
    ) -> Result<()>;

    /// Returns true if the property has a setter.
    fn is_writable(&self, property: &Property) -> bool;
}

/// Implementation metadata for the concrete type `U`.
pub struct MetaData<U> {
    definition: Arc<Definition>,
    name: &'static str,
    create: fn() -> U,
    accessors: HashMap<Property, Accessor<U>>,
}

impl<U: Element> MetaData<U> {
    /// Creates an empty instance.
    #[must_use]
    pub fn create(&self) -> U {
        (self.create)()
    }

    fn accessor(&self, property: &Property) -> Result<&Accessor<U>> {
        self.accessors
            .get(property)
            .ok_or_else(|| Error::unknown_property(self.definition.element(), property.name()))
    }

    /// Reads a property from a concrete instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is not part of the contract.
    pub fn get(&self, property: &Property, instance: &U) -> Result<Option<Value>> {
        Ok((self.accessor(property)?.getter)(instance))
    }

    /// Writes a property on a concrete instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is unknown or read-only, or the
    /// value has the wrong type.
    pub fn set(&self, property: &Property, instance: &mut U, value: Option<Value>) -> Result<()> {
        let setter = self
            .accessor(property)?
            .setter
            .ok_or_else(|| Error::new(ErrorKind::ReadOnlyProperty(property.to_string())))?;
        if let Some(v) = &value {
            if !property.accepts(v) {
                return Err(Error::type_mismatch(
                    property.name(),
                    property.value_type(),
                    v.type_name(),
                ));
            }
        }
        setter(instance, value);
        Ok(())
    }

    fn downcast<'a>(&self, element: &'a dyn Element) -> Result<&'a U> {
        element
            .as_any()
            .downcast_ref::<U>()
            .ok_or_else(|| self.mismatch(element))
    }

    fn downcast_mut<'a>(&self, element: &'a mut dyn Element) -> Result<&'a mut U> {
        if (*element).as_any().is::<U>() {
            element
                .as_any_mut()
                .downcast_mut::<U>()
                .ok_or_else(|| Error::internal("instance changed type"))
        } else {
            Err(self.mismatch(element))
        }
    }

    fn mismatch(&self, element: &dyn Element) -> Error {
        Error::internal(format!(
            "{element:?} is not an instance of {}/{}",
            self.definition.element(),
            self.name
        ))
    }
}

impl<U: Element> Implementation for MetaData<U> {
    fn element_type(&self) -> ElementType {
        self.definition.element()
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn definition(&self) -> &Arc<Definition> {
        &self.definition
    }

    fn instance_type(&self) -> TypeId {
        TypeId::of::<U>()
    }

    fn instantiate(&self) -> Arc<RwLock<dyn Element>> {
        Arc::new(RwLock::new(self.create()))
    }

    fn read(&self, property: &Property, element: &dyn Element) -> Result<Option<Value>> {
        self.get(property, self.downcast(element)?)
    }

    fn write(
        &self,
        property: &Property,
        element: &mut dyn Element,
        value: Option<Value>,
    ) -> Result<()> {
        let instance = self.downcast_mut(element)?;
        self.set(property, instance, value)
    }

    fn is_writable(&self, property: &Property) -> bool {
        self.accessors
            .get(property)
            .is_some_and(|a| a.setter.is_some())
    }
}

impl<U> fmt::Debug for MetaData<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<String> = self
            .accessors
            .iter()
            .map(|(p, a)| {
                if a.setter.is_some() {
                    p.name().to_string()
                } else {
                    format!("{} (ro)", p.name())
                }
            })
            .collect();
        bound.sort();
        f.debug_struct("MetaData")
            .field("element", &self.definition.element())
            .field("name", &self.name)
            .field("bound", &bound)
            .finish()
    }
}

/// Collects the accessors for one implementation of a contract.
///
/// Every property visible on the definition must receive a getter before
/// [`build`](Self::build) succeeds.
pub struct MetaDataBuilder<U> {
    definition: Arc<Definition>,
    name: &'static str,
    create: fn() -> U,
    accessors: HashMap<Property, Accessor<U>>,
}

impl<U> fmt::Debug for MetaDataBuilder<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<&str> = self.accessors.keys().map(Property::name).collect();
        bound.sort_unstable();
        f.debug_struct("MetaDataBuilder")
            .field("element", &self.definition.element())
            .field("name", &self.name)
            .field("bound", &bound)
            .finish()
    }
}

impl<U: Element> MetaDataBuilder<U> {
    /// Starts binding `U` to the given contract.
    #[must_use]
    pub fn new(definition: Arc<Definition>, name: &'static str, create: fn() -> U) -> Self {
        Self {
            definition,
            name,
            create,
            accessors: HashMap::new(),
        }
    }

    fn resolve(&self, property: &str) -> Result<Property> {
        self.definition
            .property(property)
            .cloned()
            .ok_or_else(|| Error::unknown_property(self.definition.element(), property))
    }

    /// Binds a readable and writable property.
    ///
    /// # Errors
    ///
    /// Returns an error if no property of that name is visible on the contract.
    pub fn property(mut self, name: &str, getter: Getter<U>, setter: Setter<U>) -> Result<Self> {
        let property = self.resolve(name)?;
        self.accessors.insert(
            property,
            Accessor {
                getter,
                setter: Some(setter),
            },
        );
        Ok(self)
    }

    /// Binds a property that this implementation can only read.
    ///
    /// # Errors
    ///
    /// Returns an error if no property of that name is visible on the contract.
    pub fn read_only(mut self, name: &str, getter: Getter<U>) -> Result<Self> {
        let property = self.resolve(name)?;
        self.accessors.insert(
            property,
            Accessor {
                getter,
                setter: None,
            },
        );
        Ok(self)
    }

    /// Finishes the binding.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IncompleteBinding`] naming the first visible
    /// property that has no getter.
    pub fn build(self) -> Result<MetaData<U>> {
        if let Some(missing) = self
            .definition
            .properties()
            .into_iter()
            .find(|p| !self.accessors.contains_key(*p))
        {
            return Err(Error::new(ErrorKind::IncompleteBinding {
                element: self.definition.element(),
                implementation: self.name.to_string(),
                property: missing.name().to_string(),
            }));
        }
        Ok(MetaData {
            definition: self.definition,
            name: self.name,
            create: self.create,
            accessors: self.accessors,
        })
    }
}
