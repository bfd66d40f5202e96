//! RPC message envelope.
//!
//! A message names a method, carries a correlation sequence id, and wraps a
//! struct payload. The wire framing (strict versus legacy) lives in the
//! codec; this is the decoded shape both framings produce.

use crate::errors::{ProtocolError, Result};
use crate::value::Value;

/// The four message kinds of the RPC layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Request expecting a reply
    Call,
    /// Response to a call, seqid mirrored
    Reply,
    /// Response carrying an application exception
    Exception,
    /// Request expecting no reply
    Oneway,
}

impl MessageKind {
    /// The one-byte code this kind uses on the wire.
    #[must_use]
    pub const fn wire_code(self) -> u8 {
        match self {
            Self::Call => 1,
            Self::Reply => 2,
            Self::Exception => 3,
            Self::Oneway => 4,
        }
    }

    /// Map a wire code back to a kind.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownMessageType` for any other code.
    pub fn from_wire_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Call),
            2 => Ok(Self::Reply),
            3 => Ok(Self::Exception),
            4 => Ok(Self::Oneway),
            _ => Err(ProtocolError::UnknownMessageType { code }),
        }
    }
}

/// One RPC message: method name, kind, sequence id, struct payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Method name routed on by the server
    pub name: String,
    /// Call, Reply, Exception, or Oneway
    pub kind: MessageKind,
    /// Per-channel correlation number
    pub seq_id: i32,
    /// Payload; must be a [`Value::Struct`]
    pub body: Value,
}

impl Message {
    /// A `Call` message.
    #[must_use]
    pub fn call(name: impl Into<String>, seq_id: i32, body: Value) -> Self {
        Self { name: name.into(), kind: MessageKind::Call, seq_id, body }
    }

    /// A `Reply` mirroring the given call's name and seqid.
    #[must_use]
    pub fn reply_to(call: &Message, body: Value) -> Self {
        Self { name: call.name.clone(), kind: MessageKind::Reply, seq_id: call.seq_id, body }
    }

    /// An `Exception` mirroring the given call's name and seqid.
    #[must_use]
    pub fn exception_to(call: &Message, body: Value) -> Self {
        Self { name: call.name.clone(), kind: MessageKind::Exception, seq_id: call.seq_id, body }
    }

    /// A `Oneway` message.
    #[must_use]
    pub fn oneway(name: impl Into<String>, seq_id: i32, body: Value) -> Self {
        Self { name: name.into(), kind: MessageKind::Oneway, seq_id, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_round_trip() {
        for kind in [
            MessageKind::Call,
            MessageKind::Reply,
            MessageKind::Exception,
            MessageKind::Oneway,
        ] {
            assert_eq!(MessageKind::from_wire_code(kind.wire_code()).unwrap(), kind);
        }
        assert_eq!(
            MessageKind::from_wire_code(0),
            Err(ProtocolError::UnknownMessageType { code: 0 })
        );
    }

    #[test]
    fn reply_mirrors_call() {
        let call = Message::call("add", 7, Value::struct_of([]));
        let reply = Message::reply_to(&call, Value::struct_of([(1, Value::I32(3))]));
        assert_eq!(reply.name, "add");
        assert_eq!(reply.seq_id, 7);
        assert_eq!(reply.kind, MessageKind::Reply);
    }
}
