//! RPC client.
//!
//! One in-flight call at a time: `call` takes `&mut self`, sends a `Call`
//! with the next sequence id, and awaits exactly one correlated reply.
//! Callers that share a client across tasks wrap it in their own mutex; the
//! core does not provide one. Per-call timeouts are likewise the host's
//! business.

use tokio::io::{AsyncRead, AsyncWrite};

use tiffin_pinch::Pinchable;
use tiffin_proto::{Message, MessageKind, Value};

use crate::channel::Channel;
use crate::errors::RpcError;
use crate::exception::ApplicationException;

/// A call-and-await-reply handle over a channel.
#[derive(Debug)]
pub struct Client<R, W> {
    channel: Channel<R, W>,
    seq_id: i32,
}

impl<R, W> Client<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wrap a channel.
    pub fn new(channel: Channel<R, W>) -> Self {
        Self { channel, seq_id: 0 }
    }

    /// Give the channel back.
    #[must_use]
    pub fn into_channel(self) -> Channel<R, W> {
        self.channel
    }

    fn next_seq_id(&mut self) -> i32 {
        self.seq_id = self.seq_id.wrapping_add(1);
        self.seq_id
    }

    /// Invoke `name` with a struct payload and await the reply payload.
    ///
    /// # Errors
    ///
    /// - `RpcError::SeqIdMismatch` if the reply carries a foreign seqid.
    /// - `RpcError::RemoteException` if the server answered with an
    ///   `Exception` message.
    /// - `RpcError::Closed` if the stream ends before a reply.
    pub async fn call(&mut self, name: &str, args: Value) -> Result<Value, RpcError> {
        let seq_id = self.next_seq_id();
        self.channel.send(&Message::call(name, seq_id, args)).await?;

        let reply = self.channel.recv().await?.ok_or(RpcError::Closed)?;
        if reply.seq_id != seq_id {
            return Err(RpcError::SeqIdMismatch { expected: seq_id, got: reply.seq_id });
        }
        match reply.kind {
            MessageKind::Reply => Ok(reply.body),
            MessageKind::Exception => {
                Err(RpcError::RemoteException(ApplicationException::unpinch(&reply.body)?))
            }
            kind @ (MessageKind::Call | MessageKind::Oneway) => {
                Err(RpcError::UnexpectedReply { kind })
            }
        }
    }

    /// Invoke `name` without awaiting any reply.
    pub async fn call_oneway(&mut self, name: &str, args: Value) -> Result<(), RpcError> {
        let seq_id = self.next_seq_id();
        self.channel.send(&Message::oneway(name, seq_id, args)).await
    }
}
