//! Type descriptors for property validation.

use std::fmt;

use crate::element::ElementType;
use crate::value::Value;

/// Type descriptor for a property.
///
/// Used to declare property types and validate values before they reach an
/// implementation's setter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// String type.
    String,
    /// Timestamp in milliseconds since the Unix epoch.
    Date,
    /// Identifier of another element of the given contract.
    Id(ElementType),
}

impl ValueType {
    /// Returns true if the value may be stored in a property of this type.
    ///
    /// Types must match exactly; there is no numeric promotion.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::String, Value::String(_))
                | (Self::Date, Value::Date(_))
                | (Self::Id(_), Value::Id(_))
        )
    }

    /// Returns the referenced contract for identifier types.
    #[must_use]
    pub const fn referenced(&self) -> Option<ElementType> {
        match self {
            Self::Id(element) => Some(*element),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Date => write!(f, "date"),
            Self::Id(element) => write!(f, "id<{element}>"),
        }
    }
}
