//! Property-based tests for the Binary Protocol codec.
//!
//! Round-trip identity is the codec's core contract: any value or message,
//! encoded and decoded under the same options, compares equal. Struct fields
//! are keyed by id, so field order never enters the comparison.

use bytes::Bytes;
use proptest::prelude::*;
use tiffin_proto::{
    Message, MessageKind, ProtocolOptions, TType, Value, decode_message, decode_value,
    encode_message, encode_value,
};

/// Scalar values only; doubles stay finite so equality is reflexive.
fn arbitrary_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i8>().prop_map(Value::Byte),
        (-1.0e12f64..1.0e12).prop_map(Value::Double),
        any::<i16>().prop_map(Value::I16),
        any::<i32>().prop_map(Value::I32),
        any::<i64>().prop_map(Value::I64),
        prop::collection::vec(any::<u8>(), 0..48).prop_map(|raw| Value::Binary(Bytes::from(raw))),
    ]
}

/// Arbitrary values up to a few levels of nesting.
///
/// Containers are homogeneous by construction: each branch fixes its element
/// type and builds every element from the same strategy.
fn arbitrary_value() -> impl Strategy<Value = Value> {
    arbitrary_scalar().prop_recursive(3, 48, 4, |inner| {
        let strukt = prop::collection::btree_map(any::<i16>(), inner, 0..4)
            .prop_map(Value::Struct);
        let list_of_structs = prop::collection::vec(strukt.clone(), 0..3)
            .prop_map(|items| Value::List { elem: TType::Struct, items });
        let list_of_i64 = prop::collection::vec(any::<i64>(), 0..6).prop_map(|raw| Value::List {
            elem: TType::I64,
            items: raw.into_iter().map(Value::I64).collect(),
        });
        let set_of_binary = prop::collection::vec(prop::collection::vec(any::<u8>(), 0..8), 0..4)
            .prop_map(|raw| Value::Set {
                elem: TType::Binary,
                items: raw.into_iter().map(|b| Value::Binary(Bytes::from(b))).collect(),
            });
        let map_i32_to_struct = prop::collection::vec((any::<i32>(), strukt.clone()), 0..3)
            .prop_map(|raw| Value::Map {
                key: TType::I32,
                value: TType::Struct,
                entries: raw.into_iter().map(|(k, v)| (Value::I32(k), v)).collect(),
            });
        prop_oneof![strukt, list_of_structs, list_of_i64, set_of_binary, map_i32_to_struct]
    })
}

fn arbitrary_struct() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(any::<i16>(), arbitrary_value(), 0..5).prop_map(Value::Struct)
}

fn arbitrary_kind() -> impl Strategy<Value = MessageKind> {
    prop_oneof![
        Just(MessageKind::Call),
        Just(MessageKind::Reply),
        Just(MessageKind::Exception),
        Just(MessageKind::Oneway),
    ]
}

fn arbitrary_message() -> impl Strategy<Value = Message> {
    ("[a-zA-Z][a-zA-Z0-9_]{0,20}", arbitrary_kind(), any::<i32>(), arbitrary_struct()).prop_map(
        |(name, kind, seq_id, body)| Message { name, kind, seq_id, body },
    )
}

proptest! {
    #[test]
    fn value_round_trip(value in arbitrary_value()) {
        let encoded = encode_value(&value).expect("should encode");
        let decoded = decode_value(value.ttype(), &encoded, &ProtocolOptions::default())
            .expect("should decode");
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn message_round_trip(message in arbitrary_message()) {
        let encoded = encode_message(&message).expect("should encode");
        let decoded =
            decode_message(&encoded, &ProtocolOptions::default()).expect("should decode");
        prop_assert_eq!(decoded, message);
    }

    #[test]
    fn strict_header_sign_bit_is_always_set(message in arbitrary_message()) {
        let encoded = encode_message(&message).expect("should encode");
        prop_assert!(encoded[0] & 0x80 != 0);
        prop_assert_eq!(&encoded[0..2], &[0x80, 0x01]);
    }

    #[test]
    fn declared_caps_never_reject_compliant_input(value in arbitrary_value()) {
        // the generator stays far under the default caps, so decode with
        // defaults must never hit a limit error
        let encoded = encode_value(&value).expect("should encode");
        let decoded = decode_value(value.ttype(), &encoded, &ProtocolOptions::default());
        prop_assert!(decoded.is_ok());
    }
}
