//! Thrift Binary Protocol wire model and codec.
//!
//! This crate is the pure core of the stack: a dynamic, type-tagged value
//! model ([`Value`] / [`TType`]), the Binary Protocol codec for values and
//! RPC messages, and the resource bounds ([`ProtocolOptions`]) the decoder
//! enforces against untrusted input. No I/O happens here; bytes in, values
//! out, and back.
//!
//! Record mapping lives in `tiffin-pinch`; transports and RPC plumbing in
//! `tiffin-rpc`.

pub mod binary;
pub mod errors;
pub mod message;
pub mod options;
pub mod reader;
pub mod ttype;
pub mod value;

pub use binary::{
    decode_message, decode_message_prefix, decode_value, encode_message, encode_value,
};
pub use errors::{ProtocolError, Result};
pub use message::{Message, MessageKind};
pub use options::{MethodNameParser, ProtocolOptions, utf8_method_name};
pub use reader::Reader;
pub use ttype::TType;
pub use value::Value;
