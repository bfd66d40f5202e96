//! Framed transport and minimal RPC surface.
//!
//! The pieces that turn the pure codec in `tiffin-proto` into a working
//! client/server pair: a [`Channel`] that moves whole messages over any
//! async byte source and sink (framed or unframed), a [`Client`] that
//! correlates calls with replies by sequence id, and a [`Server`] that
//! routes by method name. Accepting sockets and spawning tasks stay with
//! the host; everything here consumes byte streams it is handed.

pub mod channel;
pub mod client;
pub mod errors;
pub mod exception;
pub mod server;

pub use channel::{Channel, Transport};
pub use client::Client;
pub use errors::RpcError;
pub use exception::{ApplicationException, ExceptionKind};
pub use server::{HandlerError, Server, run_connection};
