//! Core values, value types, element contracts and errors for Elemental.
//!
//! This crate provides:
//! - [`Value`] - The scalar value carried by every property
//! - [`ValueType`] - Type descriptors used to validate property values
//! - [`ElementType`] and [`Element`] - Contract names and the erased instance trait
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod element;
pub mod error;
pub mod types;
pub mod value;

pub use element::{Element, ElementType};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use types::ValueType;
pub use value::Value;
