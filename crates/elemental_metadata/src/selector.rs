//! Named lookup keys over an element type's properties.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use elemental_foundation::ElementType;

use crate::property::Property;

/// Name of the selector every element type carries, matching all instances.
pub const ALL: &str = "all";

/// Identity of a selector: `(element type, name)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorId {
    /// Element type the selector is declared on.
    pub element: ElementType,
    /// Selector name.
    pub name: Arc<str>,
}

impl fmt::Display for SelectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.element, self.name)
    }
}

/// A named lookup over an ordered list of properties.
///
/// A unique selector matches at most one instance per distinct tuple of
/// property values. The property order is the order of the key tuple.
#[derive(Clone)]
pub struct Selector {
    id: SelectorId,
    unique: bool,
    properties: Vec<Property>,
}

impl Selector {
    /// Creates a selector.
    #[must_use]
    pub fn new(
        element: ElementType,
        name: impl Into<Arc<str>>,
        unique: bool,
        properties: impl IntoIterator<Item = Property>,
    ) -> Self {
        Self {
            id: SelectorId {
                element,
                name: name.into(),
            },
            unique,
            properties: properties.into_iter().collect(),
        }
    }

    /// Creates a unique selector.
    #[must_use]
    pub fn unique(
        element: ElementType,
        name: impl Into<Arc<str>>,
        properties: impl IntoIterator<Item = Property>,
    ) -> Self {
        Self::new(element, name, true, properties)
    }

    /// Creates a multi-valued selector.
    #[must_use]
    pub fn multiple(
        element: ElementType,
        name: impl Into<Arc<str>>,
        properties: impl IntoIterator<Item = Property>,
    ) -> Self {
        Self::new(element, name, false, properties)
    }

    /// Creates a selector over a single property, named after it.
    #[must_use]
    pub fn of(element: ElementType, property: &Property, unique: bool) -> Self {
        Self::new(element, property.name(), unique, [property.clone()])
    }

    /// Creates the selector matching every instance of the element type.
    #[must_use]
    pub fn all(element: ElementType) -> Self {
        Self::new(element, ALL, false, [])
    }

    /// Returns the selector identity.
    #[must_use]
    pub fn id(&self) -> &SelectorId {
        &self.id
    }

    /// Returns the element type the selector is declared on.
    #[must_use]
    pub fn element(&self) -> ElementType {
        self.id.element
    }

    /// Returns the selector name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Returns true if the selector matches at most one instance per key.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns true for the property-less selector over every instance.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.properties.is_empty() && &*self.id.name == ALL
    }

    /// Returns the key properties in key order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Returns true if the selector uses the property.
    #[must_use]
    pub fn contains(&self, property: &Property) -> bool {
        self.properties.contains(property)
    }

    /// Returns true if none of the key properties can change in place.
    ///
    /// An instance's key under a constant selector never moves.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.properties.iter().all(|p| !p.is_mutable())
    }

    /// Returns true if both selectors share an identity but differ in
    /// uniqueness or properties.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        if self.id != other.id {
            return false;
        }
        self.unique != other.unique
            || self.properties.len() != other.properties.len()
            || self
                .properties
                .iter()
                .zip(&other.properties)
                .any(|(a, b)| !a.is_identical(b))
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Selector {}

impl Hash for Selector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.properties.iter().map(Property::name).collect();
        write!(
            f,
            "Selector({}{} [{}])",
            self.id,
            if self.unique { " unique" } else { "" },
            names.join(", ")
        )
    }
}
