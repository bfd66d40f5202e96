//! Method-dispatch server.
//!
//! A [`Server`] is an immutable table of handlers keyed by method name; one
//! value serves every connection. [`run_connection`] drives a single
//! channel: messages are processed strictly in arrival order and replies go
//! out in the same order, so a connection is its own serialization domain.
//! Dispatch failures become `Exception` replies and keep the connection
//! alive; only transport failures end the loop.

use std::collections::HashMap;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use tiffin_pinch::Pinchable;
use tiffin_proto::{Message, MessageKind, Value};

use crate::channel::Channel;
use crate::errors::RpcError;
use crate::exception::{ApplicationException, ExceptionKind};

/// A handler failure, rendered to the peer as an `InternalError` exception.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// A failure with the given description.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<&str> for HandlerError {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for HandlerError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

type Handler<C> = Box<dyn Fn(&mut C, &Message) -> Result<Value, HandlerError> + Send + Sync>;

/// Routes messages to handlers by method name.
///
/// `C` is the per-connection context threaded into every handler.
pub struct Server<C> {
    handlers: HashMap<String, Handler<C>>,
}

impl<C> Default for Server<C> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<C> Server<C> {
    /// A server with no methods registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `name`, replacing any previous one.
    ///
    /// The handler returns the reply's struct payload; the server wraps it
    /// in a `Reply` message with the call's seqid mirrored.
    #[must_use]
    pub fn handle<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut C, &Message) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Names of all registered methods, in no particular order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Process one message; `None` means no response travels back.
    #[must_use]
    pub fn dispatch(&self, ctx: &mut C, message: &Message) -> Option<Message> {
        match message.kind {
            MessageKind::Call => Some(match self.invoke(ctx, message) {
                Ok(body) => Message::reply_to(message, body),
                Err(exception) => Message::exception_to(message, exception.pinch()),
            }),
            MessageKind::Oneway => {
                if let Err(exception) = self.invoke(ctx, message) {
                    tracing::warn!(
                        method = %message.name,
                        error = %exception,
                        "oneway handler failed, peer will not hear about it"
                    );
                }
                None
            }
            MessageKind::Reply | MessageKind::Exception => {
                let exception = ApplicationException::new(
                    ExceptionKind::InvalidMessageType,
                    format!("unexpected {:?} message on the server side", message.kind),
                );
                Some(Message::exception_to(message, exception.pinch()))
            }
        }
    }

    fn invoke(&self, ctx: &mut C, message: &Message) -> Result<Value, ApplicationException> {
        match self.handlers.get(&message.name) {
            None => Err(ApplicationException::unknown_method(&message.name)),
            Some(handler) => handler(ctx, message)
                .map_err(|err| ApplicationException::internal_error(err.to_string())),
        }
    }
}

/// Serve one connection until its byte source ends cleanly.
///
/// Requests are handled sequentially in arrival order; replies leave in the
/// same order. Codec and handler failures are answered with `Exception`
/// messages and the loop continues; transport failures abort it.
pub async fn run_connection<C, R, W>(
    ctx: &mut C,
    server: &Server<C>,
    channel: &mut Channel<R, W>,
) -> Result<(), RpcError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(message) = channel.recv().await? {
        tracing::debug!(
            method = %message.name,
            seq_id = message.seq_id,
            kind = ?message.kind,
            "dispatching"
        );
        if let Some(response) = server.dispatch(ctx, &message) {
            channel.send(&response).await?;
        }
    }
    tracing::debug!("connection ended cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiffin_pinch::StructParser;

    fn echo_server() -> Server<u32> {
        Server::new().handle("echo", |calls: &mut u32, message: &Message| {
            *calls += 1;
            Ok(message.body.clone())
        })
    }

    #[test]
    fn call_gets_a_mirrored_reply() {
        let server = echo_server();
        let mut calls = 0;
        let body = Value::struct_of([(1, Value::I32(5))]);
        let call = Message::call("echo", 9, body.clone());

        let reply = server.dispatch(&mut calls, &call).unwrap();
        assert_eq!(reply.kind, MessageKind::Reply);
        assert_eq!(reply.seq_id, 9);
        assert_eq!(reply.body, body);
        assert_eq!(calls, 1);
    }

    #[test]
    fn unknown_method_becomes_an_exception() {
        let server = echo_server();
        let mut calls = 0;
        let call = Message::call("missing", 1, Value::struct_of([]));

        let reply = server.dispatch(&mut calls, &call).unwrap();
        assert_eq!(reply.kind, MessageKind::Exception);
        let exception = ApplicationException::unpinch(&reply.body).unwrap();
        assert_eq!(exception.kind, ExceptionKind::UnknownMethod);
        assert_eq!(calls, 0);
    }

    #[test]
    fn handler_failure_becomes_an_internal_error() {
        let server: Server<()> = Server::new()
            .handle("boom", |_ctx, _message| Err(HandlerError::new("kaboom")));
        let call = Message::call("boom", 2, Value::struct_of([]));

        let reply = server.dispatch(&mut (), &call).unwrap();
        assert_eq!(reply.kind, MessageKind::Exception);
        let exception = ApplicationException::unpinch(&reply.body).unwrap();
        assert_eq!(exception.kind, ExceptionKind::InternalError);
        assert_eq!(exception.message, "kaboom");
    }

    #[test]
    fn oneway_produces_no_response() {
        let server = echo_server();
        let mut calls = 0;
        let oneway = Message::oneway("echo", 3, Value::struct_of([]));

        assert!(server.dispatch(&mut calls, &oneway).is_none());
        assert_eq!(calls, 1);
    }

    #[test]
    fn reply_in_call_position_is_rejected() {
        let server = echo_server();
        let mut calls = 0;
        let bogus = Message {
            name: "echo".to_string(),
            kind: MessageKind::Reply,
            seq_id: 4,
            body: Value::struct_of([]),
        };

        let reply = server.dispatch(&mut calls, &bogus).unwrap();
        assert_eq!(reply.kind, MessageKind::Exception);
        let parser = StructParser::new("ApplicationException", &reply.body).unwrap();
        assert_eq!(parser.required::<i32>(2).unwrap(), ExceptionKind::InvalidMessageType.wire_tag());
    }
}
