//! Struct field construction and parsing.
//!
//! [`StructBuilder`] is the encode side: fields are pinched into the map,
//! optional fields contribute nothing when absent. [`StructParser`] is the
//! decode side: `required` and `optional` pull a field by id through its
//! expected type. The parser borrows the field map immutably, so alternatives
//! always run against the same input; composition is plain `Result`
//! threading with [`alt`] and [`catch`] for the branching shapes.

use std::collections::BTreeMap;

use tiffin_proto::{TType, Value};

use crate::errors::{PinchError, Result};
use crate::pinchable::Pinchable;

/// Builds a [`Value::Struct`] from record fields.
#[derive(Debug, Default)]
pub struct StructBuilder {
    fields: BTreeMap<i16, Value>,
}

impl StructBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a required field.
    #[must_use]
    pub fn field<T: Pinchable>(mut self, id: i16, value: &T) -> Self {
        self.fields.insert(id, value.pinch());
        self
    }

    /// Insert an optional field; `None` contributes no entry.
    #[must_use]
    pub fn optional<T: Pinchable>(self, id: i16, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.field(id, value),
            None => self,
        }
    }

    /// Finish into a [`Value::Struct`].
    #[must_use]
    pub fn build(self) -> Value {
        Value::Struct(self.fields)
    }
}

/// Pulls typed fields out of a [`Value::Struct`].
#[derive(Debug, Clone, Copy)]
pub struct StructParser<'a> {
    strct: &'static str,
    fields: &'a BTreeMap<i16, Value>,
}

impl<'a> StructParser<'a> {
    /// Open a parser over `value`, which must be a struct.
    ///
    /// `strct` names the record being decoded and appears in errors.
    pub fn new(strct: &'static str, value: &'a Value) -> Result<Self> {
        match value.as_struct() {
            Some(fields) => Ok(Self { strct, fields }),
            None => Err(PinchError::unexpected(TType::Struct, value)),
        }
    }

    /// The record name this parser reports in errors.
    #[must_use]
    pub fn strct(&self) -> &'static str {
        self.strct
    }

    /// Number of fields present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether field `id` is present.
    #[must_use]
    pub fn contains(&self, id: i16) -> bool {
        self.fields.contains_key(&id)
    }

    /// Pull required field `id`.
    ///
    /// # Errors
    ///
    /// - `PinchError::MissingField` if absent; conversion errors otherwise.
    pub fn required<T: Pinchable>(&self, id: i16) -> Result<T> {
        match self.fields.get(&id) {
            Some(value) => T::unpinch(value),
            None => Err(PinchError::MissingField { strct: self.strct, id }),
        }
    }

    /// Pull optional field `id`; absence is `None`, never an error.
    pub fn optional<T: Pinchable>(&self, id: i16) -> Result<Option<T>> {
        self.fields.get(&id).map(T::unpinch).transpose()
    }

    /// The single `(id, value)` pair of a union-shaped struct.
    ///
    /// # Errors
    ///
    /// - `PinchError::BadUnion` when zero or multiple fields are set.
    pub fn single_field(&self) -> Result<(i16, &'a Value)> {
        let mut iter = self.fields.iter();
        match (iter.next(), iter.next()) {
            (Some((id, value)), None) => Ok((*id, value)),
            (None, _) => Err(PinchError::bad_union(self.strct, "no field set")),
            (Some(_), Some(_)) => Err(PinchError::bad_union(
                self.strct,
                format!("{} fields set, expected exactly one", self.fields.len()),
            )),
        }
    }
}

/// Try `first`; on failure run `second` against the same input.
pub fn alt<T>(first: Result<T>, second: impl FnOnce() -> Result<T>) -> Result<T> {
    match first {
        Ok(value) => Ok(value),
        Err(_) => second(),
    }
}

/// Expose both outcomes of a parse step.
pub fn catch<T, U>(
    parsed: Result<T>,
    on_err: impl FnOnce(PinchError) -> Result<U>,
    on_ok: impl FnOnce(T) -> Result<U>,
) -> Result<U> {
    match parsed {
        Ok(value) => on_ok(value),
        Err(err) => on_err(err),
    }
}
