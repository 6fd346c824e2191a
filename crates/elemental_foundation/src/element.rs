//! Element contracts and the erased instance trait.
//!
//! An [`ElementType`] names a contract (e.g. `Role`, `Course`). Concrete
//! implementation types are stored behind [`Element`] so that stores and
//! builders can hold instances of many implementations uniformly.

use std::any::Any;
use std::fmt;

/// Name of an element contract.
///
/// Element types are compared by name. Two contracts with the same name are
/// the same contract, so names must be unique within a catalog.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementType(&'static str);

impl ElementType {
    /// The root contract every registered element type descends from.
    pub const ROOT: Self = Self("Element");

    /// Creates an element type with the given name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the contract name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }

    /// Returns true if this is the root contract.
    #[must_use]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementType({})", self.0)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A concrete element instance, erased.
///
/// Implemented for every `'static` thread-safe type; implementation metadata
/// downcasts back to the concrete type through [`Element::as_any`].
pub trait Element: Any + Send + Sync + fmt::Debug {
    /// Returns this instance as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns this instance as mutable [`Any`] for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Element for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
