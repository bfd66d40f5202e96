//! Error types for the transport and RPC layers.
//!
//! Three failure domains with different blast radii: codec errors abort the
//! current message, dispatch failures travel back to the peer as `Exception`
//! messages, and transport errors are fatal to the connection.

use thiserror::Error;

use tiffin_pinch::PinchError;
use tiffin_proto::{MessageKind, ProtocolError};

use crate::exception::ApplicationException;

/// Errors produced by channels, clients, and connection loops.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The codec rejected inbound or outbound bytes.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A record mapping failed on a decoded payload.
    #[error("mapping error: {0}")]
    Pinch(#[from] PinchError),

    /// A reply arrived with the wrong correlation number.
    #[error("sequence id mismatch: expected {expected}, got {got}")]
    SeqIdMismatch {
        /// Seqid of the call we sent
        expected: i32,
        /// Seqid the reply carried
        got: i32,
    },

    /// The server answered with an `Exception` message.
    #[error("remote exception: {0}")]
    RemoteException(ApplicationException),

    /// A message that is neither `Reply` nor `Exception` arrived in reply
    /// position.
    #[error("unexpected {kind:?} message in reply position")]
    UnexpectedReply {
        /// Kind of the offending message
        kind: MessageKind,
    },

    /// The byte channel closed while a reply was still owed.
    #[error("transport closed")]
    Closed,

    /// The source ended mid-frame.
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame {
        /// Bytes the frame needed
        expected: usize,
        /// Bytes that actually arrived
        actual: usize,
    },

    /// A frame length exceeded the transport's configured maximum.
    #[error("frame length {len} exceeds maximum {max}")]
    FrameTooLarge {
        /// Declared or actual frame length
        len: usize,
        /// The configured cap it violated
        max: usize,
    },

    /// An I/O failure on the underlying byte source or sink.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
