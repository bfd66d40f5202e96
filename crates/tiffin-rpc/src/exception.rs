//! The standard application exception struct.
//!
//! When dispatch fails the server answers with an `Exception` message whose
//! payload is the conventional Thrift shape `{1: message, 2: code}`. Decoding
//! is tolerant: absent fields default and unrecognized codes collapse to
//! [`ExceptionKind::Unknown`], so a peer speaking a newer dialect still
//! surfaces something readable.

use thiserror::Error;

use tiffin_pinch::{PinchError, Pinchable, StructBuilder, StructParser, TType, Value, pinch_enum};

pinch_enum! {
    /// Canonical application-exception codes.
    pub enum ExceptionKind {
        /// Unclassified failure, also the fallback for unrecognized codes
        Unknown = 0,
        /// No handler registered for the requested method
        UnknownMethod = 1,
        /// A message kind that makes no sense in its position
        InvalidMessageType = 2,
        /// Reply named a different method than the call
        WrongMethodName = 3,
        /// Reply correlation number did not match the call
        BadSequenceId = 4,
        /// Handler returned no result
        MissingResult = 5,
        /// Handler failed internally
        InternalError = 6,
        /// Peer violated the wire protocol
        ProtocolViolation = 7,
    }
}

/// Error payload carried by `Exception` messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct ApplicationException {
    /// Human-readable description
    pub message: String,
    /// Canonical failure code
    pub kind: ExceptionKind,
}

impl ApplicationException {
    /// An exception with the given code and description.
    #[must_use]
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self { message: message.into(), kind }
    }

    /// The exception sent when no handler matches a method name.
    #[must_use]
    pub fn unknown_method(name: &str) -> Self {
        Self::new(ExceptionKind::UnknownMethod, format!("method not found: {name}"))
    }

    /// The exception sent when a handler fails.
    #[must_use]
    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::new(ExceptionKind::InternalError, reason)
    }
}

impl Pinchable for ApplicationException {
    const TTYPE: TType = TType::Struct;

    fn pinch(&self) -> Value {
        StructBuilder::new().field(1, &self.message).field(2, &self.kind).build()
    }

    fn unpinch(value: &Value) -> Result<Self, PinchError> {
        let parser = StructParser::new("ApplicationException", value)?;
        let message = parser.optional::<String>(1)?.unwrap_or_default();
        let kind = parser
            .optional::<i32>(2)?
            .and_then(ExceptionKind::from_wire_tag)
            .unwrap_or(ExceptionKind::Unknown);
        Ok(Self { message, kind })
    }
}
