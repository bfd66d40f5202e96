//! Error types for the Binary Protocol codec.
//!
//! Every length and count field read from the wire is untrusted: the decoder
//! reports a typed error before allocating anything sized by such a field.
//! Codec errors abort the current message only; whether the byte channel
//! survives is the transport layer's decision.

use thiserror::Error;

use crate::ttype::TType;

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding Binary Protocol bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The input ended before a primitive could be read in full.
    ///
    /// `remaining` is how many bytes were left at the failing read. Callers
    /// that feed the decoder incrementally retry this variant after reading
    /// more from the source.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the failing read asked for
        needed: usize,
        /// Bytes that were actually available
        remaining: usize,
    },

    /// A strict message header carried an unsupported version number.
    #[error("bad protocol version in message header {header:#010x}")]
    BadVersion {
        /// The full leading 32-bit word of the message
        header: u32,
    },

    /// A wire type code outside the legal set.
    #[error("unknown wire type code {code}")]
    UnknownType {
        /// The offending code byte
        code: u8,
    },

    /// A message type byte outside Call/Reply/Exception/Oneway.
    #[error("unknown message type {code}")]
    UnknownMessageType {
        /// The offending type byte
        code: u8,
    },

    /// A method name was not valid UTF-8.
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 {
        /// Which field failed to parse
        field: &'static str,
    },

    /// A length or count field was negative.
    #[error("negative size for {field}: {size}")]
    NegativeSize {
        /// Which field carried the size
        field: &'static str,
        /// The declared size
        size: i32,
    },

    /// A length or count field exceeded its configured cap.
    #[error("{field} {observed} exceeds limit {cap}")]
    LimitExceeded {
        /// Which field carried the size
        field: &'static str,
        /// The declared size
        observed: usize,
        /// The configured cap it violated
        cap: usize,
    },

    /// Nested structs/containers exceeded the configured depth limit.
    #[error("nesting depth exceeds limit {cap}")]
    DepthLimitExceeded {
        /// The configured depth cap
        cap: usize,
    },

    /// A container value disagreed with its declared element type on encode,
    /// or a message body was not a struct.
    #[error("container declared {declared:?} but holds {actual:?}")]
    ContainerTypeMismatch {
        /// Element type the container header declares
        declared: TType,
        /// Type of the offending element
        actual: TType,
    },
}
