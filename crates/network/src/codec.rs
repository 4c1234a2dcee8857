//! Codec for encoding/decoding messages on peer streams.
//!
//! Messages are encoded as compact JSON documents terminated by a newline. Compact JSON never
//! contains a raw newline, so the delimiter alone marks message boundaries and no length prefix is
//! written.

use crate::error::{NetworkError, NetworkResult};
use dn_types::Message;
use futures::{
    io::BufReader, AsyncBufRead, AsyncBufReadExt as _, AsyncRead, AsyncReadExt as _, AsyncWrite,
    AsyncWriteExt as _,
};

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod codec_tests;

/// The byte that terminates every encoded message.
pub const MESSAGE_DELIMITER: u8 = b'\n';

/// The message codec.
///
/// The codec reuses its buffers across messages. A single instance is owned by one stream and is
/// never shared between concurrent callers.
#[derive(Debug)]
pub struct MessageCodec {
    /// Buffer holding the encoded message before it is written.
    encode_buffer: Vec<u8>,
    /// Buffer holding the raw bytes of one message while it is read.
    decode_buffer: Vec<u8>,
    /// The maximum size (bytes) for a single message.
    ///
    /// The delimiter does not count towards this value.
    max_message_size: usize,
}

impl MessageCodec {
    /// Create a new instance of Self.
    pub fn new(max_message_size: usize) -> Self {
        Self { encode_buffer: Vec::new(), decode_buffer: Vec::new(), max_message_size }
    }

    /// Encode a message, write it to `io`, and flush.
    ///
    /// Messages with an unknown type are rejected before any bytes are written.
    pub async fn encode_message<W>(&mut self, io: &mut W, msg: &Message) -> NetworkResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        if msg.msg_type.is_unknown() {
            return Err(NetworkError::UnknownMessageType);
        }

        self.encode_buffer.clear();
        serde_json::to_writer(&mut self.encode_buffer, msg)?;
        self.encode_buffer.push(MESSAGE_DELIMITER);

        io.write_all(&self.encode_buffer).await?;
        io.flush().await?;

        Ok(())
    }

    /// Read and decode the next message from `io`.
    ///
    /// Returns [NetworkError::StreamClosed] if the peer closed the stream cleanly between messages.
    pub async fn decode_message<R>(&mut self, io: &mut R) -> NetworkResult<Message>
    where
        R: AsyncBufRead + Unpin,
    {
        loop {
            self.decode_buffer.clear();

            // read one byte past the limit so oversized messages are detected without buffering them
            let limit = self.max_message_size as u64 + 1;
            let read = (&mut *io)
                .take(limit)
                .read_until(MESSAGE_DELIMITER, &mut self.decode_buffer)
                .await?;

            if read == 0 {
                return Err(NetworkError::StreamClosed);
            }

            if self.decode_buffer.last() != Some(&MESSAGE_DELIMITER) {
                if self.decode_buffer.len() > self.max_message_size {
                    return Err(NetworkError::MessageTooLarge {
                        size: self.decode_buffer.len(),
                        max: self.max_message_size,
                    });
                }

                // eof in the middle of a message
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
            }

            self.decode_buffer.pop();

            // tolerate blank lines between messages
            if self.decode_buffer.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return Ok(serde_json::from_slice(&self.decode_buffer)?);
        }
    }
}

/// A framed stream session.
///
/// Owns exactly one bidirectional stream with buffered reads and one codec. Dropping the session
/// drops the stream.
#[derive(Debug)]
pub struct FramedStream<S> {
    /// The buffered stream.
    ///
    /// Writes pass straight through to the inner stream. The codec buffers each message and flushes
    /// it in one write.
    io: BufReader<S>,
    /// The codec bound to this stream.
    codec: MessageCodec,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a raw stream.
    pub fn new(stream: S, max_message_size: usize) -> Self {
        Self { io: BufReader::new(stream), codec: MessageCodec::new(max_message_size) }
    }

    /// Encode and flush one message.
    pub async fn send(&mut self, msg: &Message) -> NetworkResult<()> {
        self.codec.encode_message(&mut self.io, msg).await
    }

    /// Wait for the next message from the peer.
    pub async fn receive(&mut self) -> NetworkResult<Message> {
        self.codec.decode_message(&mut self.io).await
    }

    /// Close the write side of the stream and release it.
    pub async fn close(mut self) -> NetworkResult<()> {
        self.io.close().await?;
        Ok(())
    }
}
