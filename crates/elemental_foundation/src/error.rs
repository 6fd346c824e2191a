//! Error types for the Elemental system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::element::ElementType;
use crate::types::ValueType;

/// Result alias used throughout Elemental.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Elemental operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Records an operation frame, starting an empty context if needed.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(ErrorContext::new)
            .stack
            .push(frame.into());
        self
    }

    /// Creates a registration conflict error.
    #[must_use]
    pub fn conflict(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict(what.into()))
    }

    /// Creates a missing required value error.
    #[must_use]
    pub fn validation(element: ElementType, property: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation {
            element,
            property: property.into(),
        })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(
        property: impl Into<String>,
        expected: ValueType,
        actual: &'static str,
    ) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            property: property.into(),
            expected,
            actual,
        })
    }

    /// Creates an unknown property error.
    #[must_use]
    pub fn unknown_property(element: ElementType, property: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownProperty {
            element,
            property: property.into(),
        })
    }

    /// Creates an unknown selector error.
    #[must_use]
    pub fn unknown_selector(element: ElementType, selector: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownSelector {
            element,
            selector: selector.into(),
        })
    }

    /// Creates an identity violation error.
    #[must_use]
    pub fn identity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Identity(message.into()))
    }

    /// Creates a transaction state error.
    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transaction(message.into()))
    }

    /// Creates a relationship violation error.
    #[must_use]
    pub fn relationship(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Relationship(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A definition, selector, implementation or loader was registered twice
    /// with different attributes.
    #[error("registration conflict: {0}")]
    Conflict(String),

    /// An element type declared more than one parent.
    #[error("{element} would inherit from {} through more than one path", .parents.len())]
    DiamondInheritance {
        /// The element type being registered.
        element: ElementType,
        /// The declared parents.
        parents: Vec<ElementType>,
    },

    /// An element type was referenced before it was registered.
    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    /// An instance or selector belongs to an unrelated element type.
    #[error("expected {expected}, got {actual}")]
    WrongElementType {
        /// The element type required.
        expected: ElementType,
        /// The element type supplied.
        actual: ElementType,
    },

    /// A property or selector declaration is malformed.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// An implementation binding does not cover every property of its contract.
    #[error("{implementation} does not bind property {property} of {element}")]
    IncompleteBinding {
        /// The contract being implemented.
        element: ElementType,
        /// The implementation name.
        implementation: String,
        /// The property with no getter.
        property: String,
    },

    /// A required property has no value.
    #[error("required property {property} of {element} has no value")]
    Validation {
        /// The element type being built.
        element: ElementType,
        /// The property with no value.
        property: String,
    },

    /// A value does not match its property type.
    #[error("type mismatch for {property}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The property being assigned.
        property: String,
        /// The declared property type.
        expected: ValueType,
        /// The variant supplied.
        actual: &'static str,
    },

    /// A property has no setter in its implementation.
    #[error("property {0} is read-only in this implementation")]
    ReadOnlyProperty(String),

    /// An instance was inserted twice or removed while absent.
    #[error("identity violation: {0}")]
    Identity(String),

    /// Another member already holds the same unique selector values.
    #[error("duplicate key for unique selector {selector}")]
    DuplicateKey {
        /// The unique selector whose key collided.
        selector: String,
    },

    /// A reference names no stored instance, or removing an instance would
    /// leave a required reference dangling.
    #[error("relationship violation: {0}")]
    Relationship(String),

    /// A single-result query was run against a non-unique selector.
    #[error("selector {0} is not unique; use query_all")]
    NotUnique(String),

    /// A selector property has no bound value.
    #[error("selector {selector} requires a value for {property}")]
    MissingBinding {
        /// The selector being queried.
        selector: String,
        /// The unbound property.
        property: String,
    },

    /// No property of that name is visible on the element type.
    #[error("unknown property {property} on {element}")]
    UnknownProperty {
        /// The element type searched.
        element: ElementType,
        /// The property name.
        property: String,
    },

    /// No selector of that name is visible on the element type.
    #[error("unknown selector {selector} on {element}")]
    UnknownSelector {
        /// The element type searched.
        element: ElementType,
        /// The selector name.
        selector: String,
    },

    /// A unique query matched more than one instance.
    #[error("selector {selector} matched {count} instances")]
    Ambiguous {
        /// The selector being queried.
        selector: String,
        /// Number of matches.
        count: usize,
    },

    /// The store has been closed.
    #[error("store is closed")]
    StoreClosed,

    /// The store's profile does not allow writes.
    #[error("store is read-only")]
    ReadOnlyStore,

    /// A transaction operation was called in the wrong state.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// The sequential generator ran past the largest identifier.
    #[error("identifier space exhausted after {0}")]
    IdSpaceExhausted(i64),

    /// No implementation or loader is registered for the request.
    #[error("not registered: {0}")]
    NotRegistered(String),

    /// Encoding or decoding a profile failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Name of the store the operation ran against.
    pub store: Option<String>,
    /// Element type involved.
    pub element: Option<ElementType>,
    /// Operations that led to the error, outermost last.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store name.
    #[must_use]
    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Sets the element type.
    #[must_use]
    pub fn with_element(mut self, element: ElementType) -> Self {
        self.element = Some(element);
        self
    }

    /// Adds an operation frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(element) = &self.element {
            write!(f, "for {element}")?;
        }
        if let Some(store) = &self.store {
            write!(f, " in {store}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
