//! Message channel over async byte streams.
//!
//! A [`Channel`] pairs any `AsyncRead` source with any `AsyncWrite` sink and
//! moves whole [`Message`]s across them. Two transports:
//!
//! - **Framed**: each message body is buffered, then written as
//!   `len: i32-BE` plus body in a single logical write. Inbound, the length
//!   is validated against the configured maximum before the body allocation.
//! - **Unframed**: raw Binary Protocol bytes. Inbound decoding retries
//!   after reading more whenever the staging buffer holds only a message
//!   prefix.
//!
//! Transport choice is orthogonal to the protocol; the channel carries the
//! [`ProtocolOptions`] its decoder enforces. A clean EOF between messages
//! ends the stream (`recv` returns `None`); an EOF inside a message is a
//! truncation error.

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use tiffin_proto::{
    Message, ProtocolError, ProtocolOptions, decode_message, decode_message_prefix,
    encode_message,
};

use crate::errors::RpcError;

/// How messages are delimited on the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// 4-byte big-endian length prefix per message.
    Framed {
        /// Cap on a single frame body, in bytes
        max_frame_len: usize,
    },
    /// Raw protocol bytes, no delimiter.
    Unframed,
}

impl Transport {
    /// Default frame cap (16 MiB).
    pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

    /// Framed transport with the default cap.
    #[must_use]
    pub const fn framed() -> Self {
        Self::Framed { max_frame_len: Self::DEFAULT_MAX_FRAME_LEN }
    }
}

/// A message-granular pipe over a byte source and sink.
#[derive(Debug)]
pub struct Channel<R, W> {
    reader: R,
    writer: W,
    transport: Transport,
    options: ProtocolOptions,
    /// Staging buffer for unframed inbound bytes.
    inbound: BytesMut,
}

impl<R, W> Channel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Build a channel from its parts.
    pub fn new(reader: R, writer: W, transport: Transport, options: ProtocolOptions) -> Self {
        Self { reader, writer, transport, options, inbound: BytesMut::new() }
    }

    /// The decode bounds this channel enforces.
    #[must_use]
    pub fn options(&self) -> &ProtocolOptions {
        &self.options
    }

    /// Serialize and send one message.
    ///
    /// # Errors
    ///
    /// - `RpcError::FrameTooLarge` if the encoded body exceeds the framed
    ///   transport's cap; codec and I/O errors otherwise.
    pub async fn send(&mut self, message: &Message) -> Result<(), RpcError> {
        let body = encode_message(message)?;
        tracing::trace!(method = %message.name, len = body.len(), "sending message");
        match self.transport {
            Transport::Framed { max_frame_len } => {
                if body.len() > max_frame_len {
                    return Err(RpcError::FrameTooLarge { len: body.len(), max: max_frame_len });
                }
                let len = i32::try_from(body.len()).map_err(|_| RpcError::FrameTooLarge {
                    len: body.len(),
                    max: i32::MAX as usize,
                })?;
                let mut frame = BytesMut::with_capacity(4 + body.len());
                frame.put_i32(len);
                frame.put_slice(&body);
                self.writer.write_all(&frame).await?;
            }
            Transport::Unframed => {
                self.writer.write_all(&body).await?;
            }
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one message, or `None` on a clean end of stream.
    ///
    /// # Errors
    ///
    /// - `RpcError::TruncatedFrame` if the source ends mid-message;
    ///   `RpcError::FrameTooLarge` for an oversize declared length; codec
    ///   and I/O errors otherwise.
    pub async fn recv(&mut self) -> Result<Option<Message>, RpcError> {
        match self.transport {
            Transport::Framed { max_frame_len } => self.recv_framed(max_frame_len).await,
            Transport::Unframed => self.recv_unframed().await,
        }
    }

    async fn recv_framed(&mut self, max_frame_len: usize) -> Result<Option<Message>, RpcError> {
        let mut len_bytes = [0u8; 4];
        let filled = read_full(&mut self.reader, &mut len_bytes).await?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < 4 {
            return Err(RpcError::TruncatedFrame { expected: 4, actual: filled });
        }

        let declared = i32::from_be_bytes(len_bytes);
        if declared < 0 {
            return Err(RpcError::Protocol(ProtocolError::NegativeSize {
                field: "frame length",
                size: declared,
            }));
        }
        let len = declared as usize;
        if len > max_frame_len {
            return Err(RpcError::FrameTooLarge { len, max: max_frame_len });
        }

        let mut body = vec![0u8; len];
        let filled = read_full(&mut self.reader, &mut body).await?;
        if filled < len {
            return Err(RpcError::TruncatedFrame { expected: len, actual: filled });
        }

        let message = decode_message(&body, &self.options)?;
        tracing::trace!(method = %message.name, len, "received frame");
        Ok(Some(message))
    }

    async fn recv_unframed(&mut self) -> Result<Option<Message>, RpcError> {
        loop {
            match decode_message_prefix(&self.inbound, &self.options) {
                Ok((message, consumed)) => {
                    self.inbound.advance(consumed);
                    tracing::trace!(method = %message.name, consumed, "received message");
                    return Ok(Some(message));
                }
                Err(ProtocolError::Truncated { needed, remaining }) => {
                    let read = self.reader.read_buf(&mut self.inbound).await?;
                    if read == 0 {
                        if self.inbound.is_empty() {
                            return Ok(None);
                        }
                        let shortfall = needed.saturating_sub(remaining);
                        return Err(RpcError::TruncatedFrame {
                            expected: self.inbound.len() + shortfall,
                            actual: self.inbound.len(),
                        });
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Fill `buf` from `reader`, stopping early only at EOF.
///
/// Returns how many bytes were written into `buf`.
async fn read_full<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<usize, std::io::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiffin_proto::Value;
    use tokio::io::{duplex, split};

    fn sample_message() -> Message {
        Message::call(
            "ping",
            1,
            Value::struct_of([(1, Value::I32(42)), (2, Value::text("hi"))]),
        )
    }

    fn pair(
        transport: Transport,
    ) -> (
        Channel<impl AsyncRead + Unpin, impl AsyncWrite + Unpin>,
        Channel<impl AsyncRead + Unpin, impl AsyncWrite + Unpin>,
    ) {
        let (near, far) = duplex(1 << 16);
        let (near_r, near_w) = split(near);
        let (far_r, far_w) = split(far);
        (
            Channel::new(near_r, near_w, transport, ProtocolOptions::default()),
            Channel::new(far_r, far_w, transport, ProtocolOptions::default()),
        )
    }

    #[tokio::test]
    async fn framed_round_trip() {
        let (mut near, mut far) = pair(Transport::framed());
        let message = sample_message();
        near.send(&message).await.unwrap();
        assert_eq!(far.recv().await.unwrap(), Some(message));
    }

    #[tokio::test]
    async fn unframed_round_trip() {
        let (mut near, mut far) = pair(Transport::Unframed);
        let message = sample_message();
        near.send(&message).await.unwrap();
        near.send(&message).await.unwrap();
        assert_eq!(far.recv().await.unwrap(), Some(message.clone()));
        assert_eq!(far.recv().await.unwrap(), Some(message));
    }

    #[tokio::test]
    async fn clean_eof_yields_none() {
        let (near, mut far) = pair(Transport::framed());
        drop(near);
        assert!(far.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_frame_is_a_truncation_error() {
        let (near, far) = duplex(1 << 10);
        let (_, mut near_w) = split(near);
        let (far_r, far_w) = split(far);
        let mut channel =
            Channel::new(far_r, far_w, Transport::framed(), ProtocolOptions::default());

        // claim ten bytes, deliver three, then hang up
        near_w.write_all(&10i32.to_be_bytes()).await.unwrap();
        near_w.write_all(&[1, 2, 3]).await.unwrap();
        drop(near_w);

        match channel.recv().await {
            Err(RpcError::TruncatedFrame { expected: 10, actual: 3 }) => {}
            other => panic!("expected truncated frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversize_inbound_frame_is_rejected() {
        let (near, far) = duplex(1 << 10);
        let (_, mut near_w) = split(near);
        let (far_r, far_w) = split(far);
        let mut channel = Channel::new(
            far_r,
            far_w,
            Transport::Framed { max_frame_len: 16 },
            ProtocolOptions::default(),
        );

        near_w.write_all(&1000i32.to_be_bytes()).await.unwrap();

        match channel.recv().await {
            Err(RpcError::FrameTooLarge { len: 1000, max: 16 }) => {}
            other => panic!("expected frame too large, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversize_outbound_message_is_rejected() {
        let (near, _far) = duplex(1 << 10);
        let (near_r, near_w) = split(near);
        let mut channel = Channel::new(
            near_r,
            near_w,
            Transport::Framed { max_frame_len: 8 },
            ProtocolOptions::default(),
        );

        match channel.send(&sample_message()).await {
            Err(RpcError::FrameTooLarge { max: 8, .. }) => {}
            other => panic!("expected frame too large, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn negative_frame_length_is_rejected() {
        let (near, far) = duplex(1 << 10);
        let (_, mut near_w) = split(near);
        let (far_r, far_w) = split(far);
        let mut channel =
            Channel::new(far_r, far_w, Transport::framed(), ProtocolOptions::default());

        near_w.write_all(&(-5i32).to_be_bytes()).await.unwrap();

        match channel.recv().await {
            Err(RpcError::Protocol(ProtocolError::NegativeSize { .. })) => {}
            other => panic!("expected negative size, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unframed_partial_message_is_a_truncation_error() {
        let (near, far) = duplex(1 << 10);
        let (_, mut near_w) = split(near);
        let (far_r, far_w) = split(far);
        let mut channel =
            Channel::new(far_r, far_w, Transport::Unframed, ProtocolOptions::default());

        let encoded = encode_message(&sample_message()).unwrap();
        near_w.write_all(&encoded[..encoded.len() - 2]).await.unwrap();
        drop(near_w);

        match channel.recv().await {
            Err(RpcError::TruncatedFrame { .. }) => {}
            other => panic!("expected truncated frame, got {other:?}"),
        }
    }
}
