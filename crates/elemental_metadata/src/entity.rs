//! Shared handles to element instances.

use std::fmt;
use std::sync::Arc;

use elemental_foundation::{Element, ElementType, Error, Result, Value};
use parking_lot::RwLock;

use crate::definition::Definition;
use crate::metadata::Implementation;
use crate::property::Property;

/// Reference identity of an instance.
///
/// Two handles have the same key exactly when they point at the same
/// instance. Keys are only stable while some handle keeps the instance alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(usize);

/// A handle to an element instance and the implementation that reads it.
///
/// Cloning shares the instance. Equality of handles is reference identity;
/// compare property values explicitly for content equality.
#[derive(Clone)]
pub struct Entity {
    cell: Arc<RwLock<dyn Element>>,
    meta: Arc<dyn Implementation>,
}

impl Entity {
    /// Creates a handle to a fresh, empty instance.
    #[must_use]
    pub fn new(meta: Arc<dyn Implementation>) -> Self {
        Self {
            cell: meta.instantiate(),
            meta,
        }
    }

    /// Wraps an existing concrete instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `U` is not the implementation's instance type.
    pub fn wrap<U: Element>(meta: Arc<dyn Implementation>, instance: U) -> Result<Self> {
        if meta.instance_type() != std::any::TypeId::of::<U>() {
            return Err(Error::internal(format!(
                "{instance:?} is not an instance of {}/{}",
                meta.element_type(),
                meta.name()
            )));
        }
        Ok(Self {
            cell: Arc::new(RwLock::new(instance)),
            meta,
        })
    }

    /// Returns the reference identity of the instance.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey(Arc::as_ptr(&self.cell).cast::<()>().addr())
    }

    /// Returns true if both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    /// The contract this instance implements.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.meta.element_type()
    }

    /// The implementation metadata.
    #[must_use]
    pub fn implementation(&self) -> &Arc<dyn Implementation> {
        &self.meta
    }

    /// The contract definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<Definition> {
        self.meta.definition()
    }

    /// Returns true if the instance's contract is `element` or descends from it.
    #[must_use]
    pub fn is_a(&self, element: ElementType) -> bool {
        self.definition().is_a(element)
    }

    /// Reads a property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is not part of the contract.
    pub fn get(&self, property: &Property) -> Result<Option<Value>> {
        let guard = self.cell.read();
        self.meta.read(property, &*guard)
    }

    /// Reads a property by name.
    ///
    /// # Errors
    ///
    /// Returns an error if no property of that name is visible.
    pub fn value(&self, name: &str) -> Result<Option<Value>> {
        let property = self
            .definition()
            .property(name)
            .ok_or_else(|| Error::unknown_property(self.element_type(), name))?;
        self.get(property)
    }

    /// Writes a property in place. Only the builder mutates instances.
    pub(crate) fn set(&self, property: &Property, value: Option<Value>) -> Result<()> {
        let mut guard = self.cell.write();
        self.meta.write(property, &mut *guard, value)
    }

    /// Runs `f` against the concrete instance, if it is a `U`.
    pub fn inspect<U: Element, R>(&self, f: impl FnOnce(&U) -> R) -> Option<R> {
        let guard = self.cell.read();
        (*guard).as_any().downcast_ref::<U>().map(f)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Entity {}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entity({}/{}@{:#x})",
            self.meta.element_type(),
            self.meta.name(),
            self.key().0
        )
    }
}
