//! Error types for the record mapping layer.
//!
//! Mapping errors are always surfaced to the caller; the layer never
//! swallows a failure or substitutes a default. Messages carry struct and
//! field context in human-readable form; position tracking inside a struct
//! is deliberately out of scope.

use thiserror::Error;

use tiffin_proto::{TType, Value};

/// Convenience alias for mapping results.
pub type Result<T> = std::result::Result<T, PinchError>;

/// Errors produced while converting between records and dynamic values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PinchError {
    /// A required field was absent from the struct map.
    #[error("{strct} is missing required field {id}")]
    MissingField {
        /// Record the field belongs to
        strct: &'static str,
        /// The absent field id
        id: i16,
    },

    /// A value's runtime tag disagreed with the expected type.
    #[error("expected a {expected:?} value, got {actual:?}")]
    UnexpectedType {
        /// Type the record declares
        expected: TType,
        /// Tag the value actually carries
        actual: TType,
    },

    /// An enumeration wire tag outside the declared variant set.
    #[error("unknown {enumeration} value {value}")]
    UnknownEnum {
        /// Enumeration type name
        enumeration: &'static str,
        /// The undeclared wire tag
        value: i32,
    },

    /// A union with zero or multiple fields set, or an undeclared field id.
    #[error("bad union {strct}: {reasons:?}")]
    BadUnion {
        /// Union type name
        strct: &'static str,
        /// What went wrong, one entry per violation
        reasons: Vec<String>,
    },

    /// A conversion failure with no more specific shape.
    #[error("{0}")]
    Message(String),
}

impl PinchError {
    /// An [`PinchError::UnexpectedType`] against `value`'s runtime tag.
    #[must_use]
    pub fn unexpected(expected: TType, value: &Value) -> Self {
        Self::UnexpectedType { expected, actual: value.ttype() }
    }

    /// A [`PinchError::BadUnion`] with a single reason.
    #[must_use]
    pub fn bad_union(strct: &'static str, reason: impl Into<String>) -> Self {
        Self::BadUnion { strct, reasons: vec![reason.into()] }
    }
}
