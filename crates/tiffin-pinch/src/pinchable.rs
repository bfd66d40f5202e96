//! The bidirectional record-to-value contract.
//!
//! A [`Pinchable`] type knows its wire tag and how to cross between itself
//! and the dynamic [`Value`] model. Scalars map one-to-one; containers
//! require their element types to be `Pinchable` and check declared element
//! tags on the way back. The conversions never mutate the `Value` they read.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use bytes::Bytes;

use tiffin_proto::{TType, Value};

use crate::errors::{PinchError, Result};

/// Bidirectional conversion between a Rust type and the dynamic value model.
pub trait Pinchable: Sized {
    /// The wire type tag this type maps to.
    const TTYPE: TType;

    /// Convert into a dynamic value tagged [`Self::TTYPE`].
    fn pinch(&self) -> Value;

    /// Rebuild from a dynamic value, checking the runtime tag.
    fn unpinch(value: &Value) -> Result<Self>;
}

impl Pinchable for bool {
    const TTYPE: TType = TType::Bool;

    fn pinch(&self) -> Value {
        Value::Bool(*self)
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl Pinchable for i8 {
    const TTYPE: TType = TType::Byte;

    fn pinch(&self) -> Value {
        Value::Byte(*self)
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::Byte(v) => Ok(*v),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl Pinchable for i16 {
    const TTYPE: TType = TType::I16;

    fn pinch(&self) -> Value {
        Value::I16(*self)
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::I16(v) => Ok(*v),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl Pinchable for i32 {
    const TTYPE: TType = TType::I32;

    fn pinch(&self) -> Value {
        Value::I32(*self)
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::I32(v) => Ok(*v),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl Pinchable for i64 {
    const TTYPE: TType = TType::I64;

    fn pinch(&self) -> Value {
        Value::I64(*self)
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::I64(v) => Ok(*v),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl Pinchable for f64 {
    const TTYPE: TType = TType::Double;

    fn pinch(&self) -> Value {
        Value::Double(*self)
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::Double(v) => Ok(*v),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

/// Text travels as the UTF-8 bytes of a `Binary` value.
impl Pinchable for String {
    const TTYPE: TType = TType::Binary;

    fn pinch(&self) -> Value {
        Value::text(self.clone())
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::Binary(raw) => String::from_utf8(raw.to_vec()).map_err(|_| {
                PinchError::Message("binary field is not valid UTF-8 text".to_string())
            }),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl Pinchable for Bytes {
    const TTYPE: TType = TType::Binary;

    fn pinch(&self) -> Value {
        Value::Binary(self.clone())
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::Binary(raw) => Ok(raw.clone()),
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl<T: Pinchable> Pinchable for Vec<T> {
    const TTYPE: TType = TType::List;

    fn pinch(&self) -> Value {
        Value::List { elem: T::TTYPE, items: self.iter().map(Pinchable::pinch).collect() }
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::List { elem, items } if *elem == T::TTYPE => {
                items.iter().map(T::unpinch).collect()
            }
            Value::List { elem, .. } => {
                Err(PinchError::UnexpectedType { expected: T::TTYPE, actual: *elem })
            }
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl<T: Pinchable + Ord> Pinchable for BTreeSet<T> {
    const TTYPE: TType = TType::Set;

    fn pinch(&self) -> Value {
        Value::Set { elem: T::TTYPE, items: self.iter().map(Pinchable::pinch).collect() }
    }

    fn unpinch(value: &Value) -> Result<Self> {
        match value {
            Value::Set { elem, items } if *elem == T::TTYPE => {
                items.iter().map(T::unpinch).collect()
            }
            Value::Set { elem, .. } => {
                Err(PinchError::UnexpectedType { expected: T::TTYPE, actual: *elem })
            }
            other => Err(PinchError::unexpected(Self::TTYPE, other)),
        }
    }
}

impl<K: Pinchable + Ord, V: Pinchable> Pinchable for BTreeMap<K, V> {
    const TTYPE: TType = TType::Map;

    fn pinch(&self) -> Value {
        Value::Map {
            key: K::TTYPE,
            value: V::TTYPE,
            entries: self.iter().map(|(k, v)| (k.pinch(), v.pinch())).collect(),
        }
    }

    fn unpinch(value: &Value) -> Result<Self> {
        let (key, val, entries) = unpinch_map_parts::<K, V>(value)?;
        debug_assert_eq!((key, val), (K::TTYPE, V::TTYPE));
        entries.iter().map(|(k, v)| Ok((K::unpinch(k)?, V::unpinch(v)?))).collect()
    }
}

impl<K: Pinchable + Eq + Hash, V: Pinchable> Pinchable for HashMap<K, V> {
    const TTYPE: TType = TType::Map;

    fn pinch(&self) -> Value {
        Value::Map {
            key: K::TTYPE,
            value: V::TTYPE,
            entries: self.iter().map(|(k, v)| (k.pinch(), v.pinch())).collect(),
        }
    }

    fn unpinch(value: &Value) -> Result<Self> {
        let (_, _, entries) = unpinch_map_parts::<K, V>(value)?;
        entries.iter().map(|(k, v)| Ok((K::unpinch(k)?, V::unpinch(v)?))).collect()
    }
}

fn unpinch_map_parts<K: Pinchable, V: Pinchable>(
    value: &Value,
) -> Result<(TType, TType, &[(Value, Value)])> {
    match value {
        Value::Map { key, value: val, entries } => {
            if *key != K::TTYPE {
                return Err(PinchError::UnexpectedType { expected: K::TTYPE, actual: *key });
            }
            if *val != V::TTYPE {
                return Err(PinchError::UnexpectedType { expected: V::TTYPE, actual: *val });
            }
            Ok((*key, *val, entries.as_slice()))
        }
        other => Err(PinchError::unexpected(TType::Map, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_round_trip() {
        assert!(bool::unpinch(&true.pinch()).unwrap());
        assert_eq!(i8::unpinch(&(-3i8).pinch()).unwrap(), -3);
        assert_eq!(i64::unpinch(&7i64.pinch()).unwrap(), 7);
        assert_eq!(f64::unpinch(&1.5f64.pinch()).unwrap(), 1.5);
        assert_eq!(String::unpinch(&"hi".to_string().pinch()).unwrap(), "hi");
    }

    #[test]
    fn tag_mismatch_is_rejected() {
        assert_eq!(
            i32::unpinch(&Value::I64(1)),
            Err(PinchError::UnexpectedType { expected: TType::I32, actual: TType::I64 })
        );
    }

    #[test]
    fn list_round_trips_and_checks_element_tag() {
        let list = vec![1i32, 2, 3];
        let value = list.pinch();
        assert_eq!(value.ttype(), TType::List);
        assert_eq!(Vec::<i32>::unpinch(&value).unwrap(), list);

        assert_eq!(
            Vec::<i16>::unpinch(&value),
            Err(PinchError::UnexpectedType { expected: TType::I16, actual: TType::I32 })
        );
    }

    #[test]
    fn set_and_map_round_trip() {
        let set: BTreeSet<i64> = [3, 1, 2].into_iter().collect();
        assert_eq!(BTreeSet::<i64>::unpinch(&set.pinch()).unwrap(), set);

        let map: BTreeMap<i32, String> =
            [(1, "one".to_string()), (2, "two".to_string())].into_iter().collect();
        assert_eq!(BTreeMap::<i32, String>::unpinch(&map.pinch()).unwrap(), map);
    }

    #[test]
    fn map_key_tag_mismatch_is_rejected() {
        let map: BTreeMap<i32, i32> = [(1, 2)].into_iter().collect();
        assert_eq!(
            BTreeMap::<i64, i32>::unpinch(&map.pinch()),
            Err(PinchError::UnexpectedType { expected: TType::I64, actual: TType::I32 })
        );
    }

    #[test]
    fn text_rejects_non_utf8_binary() {
        let value = Value::Binary(Bytes::from_static(&[0xff, 0xfe]));
        assert!(matches!(String::unpinch(&value), Err(PinchError::Message(_))));
    }
}
