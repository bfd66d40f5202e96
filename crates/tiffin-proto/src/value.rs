//! Dynamic value model.
//!
//! A [`Value`] is a tagged union whose discriminant is its [`TType`]: the
//! runtime tag and the payload travel together, so the existential "tag plus
//! value" pairs that struct fields require are just `Value`s. Values are
//! immutable once constructed and own their payloads.
//!
//! # Invariants
//!
//! - Containers carry their declared element type(s); the codec rejects
//!   encoding a container whose elements disagree with the declaration, and
//!   decode produces homogeneous containers by construction.
//! - Struct fields are keyed by id in a `BTreeMap`, so re-encode emits them
//!   in ascending id order. Any stable order is legal on the wire; this one
//!   makes byte-level comparisons reproducible.
//! - An empty map still declares key and value types, so its wire form is
//!   always well-defined.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::ttype::TType;

/// A Thrift value, tagged by its runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Signed 8-bit integer
    Byte(i8),
    /// IEEE-754 double
    Double(f64),
    /// Signed 16-bit integer
    I16(i16),
    /// Signed 32-bit integer
    I32(i32),
    /// Signed 64-bit integer
    I64(i64),
    /// Raw byte sequence; text is carried as its UTF-8 bytes
    Binary(Bytes),
    /// Field map keyed by field id; duplicate ids on decode are last-wins
    Struct(BTreeMap<i16, Value>),
    /// Homogeneous ordered sequence
    List {
        /// Declared element type
        elem: TType,
        /// Elements, each of type `elem`
        items: Vec<Value>,
    },
    /// Encoded identically to a list; element uniqueness is a higher-level
    /// contract the codec does not enforce
    Set {
        /// Declared element type
        elem: TType,
        /// Elements, each of type `elem`
        items: Vec<Value>,
    },
    /// Homogeneous key/value pairs in insertion order
    Map {
        /// Declared key type
        key: TType,
        /// Declared value type
        value: TType,
        /// Entries, keys of type `key`, values of type `value`
        entries: Vec<(Value, Value)>,
    },
}

impl Value {
    /// The runtime type tag of this value.
    #[must_use]
    pub fn ttype(&self) -> TType {
        match self {
            Self::Bool(_) => TType::Bool,
            Self::Byte(_) => TType::Byte,
            Self::Double(_) => TType::Double,
            Self::I16(_) => TType::I16,
            Self::I32(_) => TType::I32,
            Self::I64(_) => TType::I64,
            Self::Binary(_) => TType::Binary,
            Self::Struct(_) => TType::Struct,
            Self::List { .. } => TType::List,
            Self::Set { .. } => TType::Set,
            Self::Map { .. } => TType::Map,
        }
    }

    /// A `Binary` value holding the UTF-8 bytes of `text`.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Binary(Bytes::from(text.into().into_bytes()))
    }

    /// A `Struct` value from `(field id, value)` pairs.
    ///
    /// Later duplicates of a field id replace earlier ones, matching the
    /// decoder's last-wins rule.
    #[must_use]
    pub fn struct_of(fields: impl IntoIterator<Item = (i16, Value)>) -> Self {
        Self::Struct(fields.into_iter().collect())
    }

    /// Borrow the field map if this is a `Struct`.
    #[must_use]
    pub fn as_struct(&self) -> Option<&BTreeMap<i16, Value>> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}
