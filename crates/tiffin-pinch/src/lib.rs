//! Mapping between user record types and the dynamic Thrift value model.
//!
//! This crate owns everything the codec deliberately does not know: field
//! names, optionality, enumerations, and union arity. Records implement
//! [`Pinchable`] by hand using [`StructBuilder`] on the way out and
//! [`StructParser`] on the way back; enumerations come from the
//! [`pinch_enum!`] macro. The mapping is bidirectional and total on valid
//! inputs, and it never mutates the [`Value`] it reads.

pub mod enumeration;
pub mod errors;
pub mod fields;
pub mod pinchable;

pub use errors::{PinchError, Result};
pub use fields::{StructBuilder, StructParser, alt, catch};
pub use pinchable::Pinchable;

// Re-exported so `pinch_enum!` expansions and record impls resolve the value
// model through this crate alone.
pub use tiffin_proto::{TType, Value};
