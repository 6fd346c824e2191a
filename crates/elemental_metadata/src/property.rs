//! Named, typed attributes of an element contract.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use elemental_foundation::{ElementType, Value, ValueType};

/// A named, typed attribute of an element contract.
///
/// Identity is `(name, value type, owning element type)`. The mutability and
/// requirement flags are attributes: two properties with the same identity
/// but different flags conflict when registered.
#[derive(Clone)]
pub struct Property {
    name: Arc<str>,
    value_type: ValueType,
    element: ElementType,
    mutable: bool,
    required: bool,
}

impl Property {
    /// Creates an immutable, optional property.
    #[must_use]
    pub fn new(element: ElementType, name: impl Into<Arc<str>>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            element,
            mutable: false,
            required: false,
        }
    }

    /// Marks the property as changeable on an existing instance.
    #[must_use]
    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Marks the property as requiring a value on every built instance.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value type.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Returns the element type that declares this property.
    #[must_use]
    pub fn element(&self) -> ElementType {
        self.element
    }

    /// Returns true if the property may change on an existing instance.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Returns true if every built instance must carry a value.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns true if the value may be stored in this property.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        self.value_type.accepts(value)
    }

    /// Returns true if both properties share an identity but differ in flags.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self == other && (self.mutable != other.mutable || self.required != other.required)
    }

    /// Returns true if both properties are identical in every attribute.
    #[must_use]
    pub fn is_identical(&self, other: &Self) -> bool {
        self == other && !self.conflicts_with(other)
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.value_type == other.value_type
            && self.element == other.element
    }
}

impl Eq for Property {}

impl Hash for Property {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.value_type.hash(state);
        self.element.hash(state);
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.element, self.name, self.value_type)?;
        if self.mutable {
            write!(f, " mut")?;
        }
        if self.required {
            write!(f, " required")?;
        }
        Ok(())
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.element, self.name)
    }
}
