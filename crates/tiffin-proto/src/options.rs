//! Decoder resource bounds.
//!
//! Every length and count field on the wire is attacker controlled. The
//! decoder checks each one against these caps before allocating anything
//! sized by it. Options are passed by value at codec use and are immutable
//! for the codec's lifetime.

use crate::errors::{ProtocolError, Result};

/// Parser applied to the raw method-name bytes of a message header.
///
/// The default decodes UTF-8; hosts with non-UTF-8 peers can inject their
/// own.
pub type MethodNameParser = fn(&[u8]) -> Result<String>;

/// Declared decode bounds plus the method-name parser.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolOptions {
    /// Cap on a decoded method name, in bytes.
    pub max_method_name_len: usize,
    /// Cap on a `Binary` payload, in bytes.
    pub max_binary_len: usize,
    /// Cap on a list element count.
    pub max_list_len: usize,
    /// Cap on a set element count.
    pub max_set_len: usize,
    /// Cap on a map entry count.
    pub max_map_len: usize,
    /// Cap on struct/container nesting depth.
    pub max_depth: usize,
    /// Parser for raw method-name bytes.
    pub method_name_parser: MethodNameParser,
}

impl ProtocolOptions {
    /// Default method-name cap (bytes).
    pub const DEFAULT_MAX_METHOD_NAME_LEN: usize = 256;
    /// Default binary cap (100 MiB).
    pub const DEFAULT_MAX_BINARY_LEN: usize = 100 * 1024 * 1024;
    /// Default element-count cap for lists, sets, and maps.
    pub const DEFAULT_MAX_CONTAINER_LEN: usize = 10_000_000;
    /// Default nesting depth cap.
    pub const DEFAULT_MAX_DEPTH: usize = 64;
}

impl Default for ProtocolOptions {
    fn default() -> Self {
        Self {
            max_method_name_len: Self::DEFAULT_MAX_METHOD_NAME_LEN,
            max_binary_len: Self::DEFAULT_MAX_BINARY_LEN,
            max_list_len: Self::DEFAULT_MAX_CONTAINER_LEN,
            max_set_len: Self::DEFAULT_MAX_CONTAINER_LEN,
            max_map_len: Self::DEFAULT_MAX_CONTAINER_LEN,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            method_name_parser: utf8_method_name,
        }
    }
}

/// Default method-name parser: strict UTF-8.
pub fn utf8_method_name(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|_| ProtocolError::InvalidUtf8 { field: "method name" })
}
