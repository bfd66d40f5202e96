//! Binary Protocol encode and decode.
//!
//! Encoding writes big-endian primitives into a [`BytesMut`]; decoding walks
//! a [`Reader`] positionally. Both directions are pure functions of their
//! input. Encode always emits the strict message framing; decode accepts
//! strict and legacy framings, selected by the sign bit of the leading i32.
//!
//! # Invariants
//!
//! - `decode(encode(v)) == v` for every value, modulo struct field order.
//! - Every untrusted length/count is validated against [`ProtocolOptions`]
//!   before any allocation it sizes.
//! - Nesting depth of structs and containers is bounded by
//!   `ProtocolOptions::max_depth`.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};
use crate::message::{Message, MessageKind};
use crate::options::ProtocolOptions;
use crate::reader::Reader;
use crate::ttype::{STOP, TType};
use crate::value::Value;

/// Strict-framing version word: sign bit set, version 1.
const STRICT_VERSION_1: u32 = 0x8001_0000;

/// Encode a value to its Binary Protocol bytes.
///
/// # Errors
///
/// - `ProtocolError::ContainerTypeMismatch` if a container holds an element
///   that disagrees with its declared type.
/// - `ProtocolError::LimitExceeded` if a length cannot be represented as an
///   i32 on the wire.
pub fn encode_value(value: &Value) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    write_value(value, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode one value of type `ttype` from the front of `bytes`.
///
/// Leftover bytes after the value are permitted; the framed transport is
/// what bounds a message to its frame.
pub fn decode_value(ttype: TType, bytes: &[u8], options: &ProtocolOptions) -> Result<Value> {
    let mut reader = Reader::new(bytes);
    read_value(ttype, &mut reader, options, 0)
}

/// Encode a message with strict framing.
///
/// # Errors
///
/// - `ProtocolError::ContainerTypeMismatch` if the body is not a struct.
pub fn encode_message(message: &Message) -> Result<Bytes> {
    if message.body.ttype() != TType::Struct {
        return Err(ProtocolError::ContainerTypeMismatch {
            declared: TType::Struct,
            actual: message.body.ttype(),
        });
    }
    let mut buf = BytesMut::new();
    buf.put_u32(STRICT_VERSION_1 | u32::from(message.kind.wire_code()));
    write_binary("method name length", message.name.as_bytes(), &mut buf)?;
    buf.put_i32(message.seq_id);
    write_value(&message.body, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode one message from the front of `bytes`, ignoring trailing bytes.
pub fn decode_message(bytes: &[u8], options: &ProtocolOptions) -> Result<Message> {
    decode_message_prefix(bytes, options).map(|(message, _)| message)
}

/// Decode one message and report how many bytes it consumed.
///
/// Unframed transports use the consumed count to drain their inbound buffer;
/// a [`ProtocolError::Truncated`] result means the buffer holds only a
/// message prefix and more bytes are needed.
pub fn decode_message_prefix(
    bytes: &[u8],
    options: &ProtocolOptions,
) -> Result<(Message, usize)> {
    let mut reader = Reader::new(bytes);
    let message = read_message(&mut reader, options)?;
    Ok((message, reader.position()))
}

fn write_value(value: &Value, buf: &mut BytesMut) -> Result<()> {
    match value {
        Value::Bool(v) => buf.put_u8(u8::from(*v)),
        Value::Byte(v) => buf.put_i8(*v),
        Value::Double(v) => buf.put_f64(*v),
        Value::I16(v) => buf.put_i16(*v),
        Value::I32(v) => buf.put_i32(*v),
        Value::I64(v) => buf.put_i64(*v),
        Value::Binary(bytes) => write_binary("binary length", bytes, buf)?,
        Value::Struct(fields) => {
            for (id, field) in fields {
                buf.put_u8(field.ttype().wire_code());
                buf.put_i16(*id);
                write_value(field, buf)?;
            }
            buf.put_u8(STOP);
        }
        Value::List { elem, items } => {
            buf.put_u8(elem.wire_code());
            write_len("list length", items.len(), buf)?;
            for item in items {
                check_element(*elem, item)?;
                write_value(item, buf)?;
            }
        }
        Value::Set { elem, items } => {
            buf.put_u8(elem.wire_code());
            write_len("set size", items.len(), buf)?;
            for item in items {
                check_element(*elem, item)?;
                write_value(item, buf)?;
            }
        }
        Value::Map { key, value, entries } => {
            buf.put_u8(key.wire_code());
            buf.put_u8(value.wire_code());
            write_len("map size", entries.len(), buf)?;
            for (k, v) in entries {
                check_element(*key, k)?;
                check_element(*value, v)?;
                write_value(k, buf)?;
                write_value(v, buf)?;
            }
        }
    }
    Ok(())
}

fn check_element(declared: TType, element: &Value) -> Result<()> {
    if element.ttype() == declared {
        Ok(())
    } else {
        Err(ProtocolError::ContainerTypeMismatch { declared, actual: element.ttype() })
    }
}

fn write_binary(field: &'static str, bytes: &[u8], buf: &mut BytesMut) -> Result<()> {
    write_len(field, bytes.len(), buf)?;
    buf.put_slice(bytes);
    Ok(())
}

fn write_len(field: &'static str, len: usize, buf: &mut BytesMut) -> Result<()> {
    let wire = i32::try_from(len).map_err(|_| ProtocolError::LimitExceeded {
        field,
        observed: len,
        cap: i32::MAX as usize,
    })?;
    buf.put_i32(wire);
    Ok(())
}

/// Validate an untrusted size field against its cap.
///
/// Runs before any allocation sized by the field.
fn check_len(field: &'static str, size: i32, cap: usize) -> Result<usize> {
    if size < 0 {
        return Err(ProtocolError::NegativeSize { field, size });
    }
    let size = size as usize;
    if size > cap {
        return Err(ProtocolError::LimitExceeded { field, observed: size, cap });
    }
    Ok(size)
}

fn enter(depth: usize, options: &ProtocolOptions) -> Result<usize> {
    if depth >= options.max_depth {
        return Err(ProtocolError::DepthLimitExceeded { cap: options.max_depth });
    }
    Ok(depth + 1)
}

fn read_value(
    ttype: TType,
    reader: &mut Reader<'_>,
    options: &ProtocolOptions,
    depth: usize,
) -> Result<Value> {
    match ttype {
        TType::Bool => Ok(Value::Bool(reader.read_i8()? != 0)),
        TType::Byte => Ok(Value::Byte(reader.read_i8()?)),
        TType::Double => Ok(Value::Double(reader.read_f64()?)),
        TType::I16 => Ok(Value::I16(reader.read_i16()?)),
        TType::I32 => Ok(Value::I32(reader.read_i32()?)),
        TType::I64 => Ok(Value::I64(reader.read_i64()?)),
        TType::Binary => {
            let len = check_len("binary length", reader.read_i32()?, options.max_binary_len)?;
            let bytes = reader.take(len)?;
            Ok(Value::Binary(Bytes::copy_from_slice(bytes)))
        }
        TType::Struct => {
            let depth = enter(depth, options)?;
            Ok(Value::Struct(read_struct_fields(reader, options, depth)?))
        }
        TType::List => {
            let depth = enter(depth, options)?;
            let elem = TType::from_wire_code(reader.read_u8()?)?;
            let count = check_len("list length", reader.read_i32()?, options.max_list_len)?;
            let items = read_elements(elem, count, reader, options, depth)?;
            Ok(Value::List { elem, items })
        }
        TType::Set => {
            let depth = enter(depth, options)?;
            let elem = TType::from_wire_code(reader.read_u8()?)?;
            let count = check_len("set size", reader.read_i32()?, options.max_set_len)?;
            let items = read_elements(elem, count, reader, options, depth)?;
            Ok(Value::Set { elem, items })
        }
        TType::Map => {
            let depth = enter(depth, options)?;
            let key = TType::from_wire_code(reader.read_u8()?)?;
            let value = TType::from_wire_code(reader.read_u8()?)?;
            let count = check_len("map size", reader.read_i32()?, options.max_map_len)?;
            // every entry needs at least two bytes, so the declared count can
            // reserve no more than half the bytes actually present
            let mut entries = Vec::with_capacity(count.min(reader.remaining() / 2));
            for _ in 0..count {
                let k = read_value(key, reader, options, depth)?;
                let v = read_value(value, reader, options, depth)?;
                entries.push((k, v));
            }
            Ok(Value::Map { key, value, entries })
        }
    }
}

fn read_elements(
    elem: TType,
    count: usize,
    reader: &mut Reader<'_>,
    options: &ProtocolOptions,
    depth: usize,
) -> Result<Vec<Value>> {
    // each element occupies at least one byte; never reserve past the input
    let mut items = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        items.push(read_value(elem, reader, options, depth)?);
    }
    Ok(items)
}

fn read_struct_fields(
    reader: &mut Reader<'_>,
    options: &ProtocolOptions,
    depth: usize,
) -> Result<BTreeMap<i16, Value>> {
    let mut fields = BTreeMap::new();
    loop {
        let code = reader.read_u8()?;
        if code == STOP {
            return Ok(fields);
        }
        let ttype = TType::from_wire_code(code)?;
        let id = reader.read_i16()?;
        let value = read_value(ttype, reader, options, depth)?;
        // last occurrence of a repeated field id wins
        fields.insert(id, value);
    }
}

fn read_message(reader: &mut Reader<'_>, options: &ProtocolOptions) -> Result<Message> {
    let head = reader.read_i32()?;
    if head < 0 {
        // strict framing: the sign bit marks a version-and-type word
        let word = head as u32;
        let version = (word >> 16) & 0x7fff;
        if version != 1 {
            return Err(ProtocolError::BadVersion { header: word });
        }
        let kind = MessageKind::from_wire_code((word & 0xff) as u8)?;
        let len =
            check_len("method name length", reader.read_i32()?, options.max_method_name_len)?;
        let name = (options.method_name_parser)(reader.take(len)?)?;
        let seq_id = reader.read_i32()?;
        let body = read_value(TType::Struct, reader, options, 0)?;
        Ok(Message { name, kind, seq_id, body })
    } else {
        // legacy framing: the leading word is the name length itself
        let len = check_len("method name length", head, options.max_method_name_len)?;
        let name = (options.method_name_parser)(reader.take(len)?)?;
        let kind = MessageKind::from_wire_code(reader.read_u8()?)?;
        let seq_id = reader.read_i32()?;
        let body = read_value(TType::Struct, reader, options, 0)?;
        Ok(Message { name, kind, seq_id, body })
    }
}
