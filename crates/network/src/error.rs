//! Error types for the dataset network.

use thiserror::Error;

/// The result for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Networking error type.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// An outbound stream to the peer could not be opened.
    #[error("failed to open stream: {0}")]
    Connect(String),
    /// Read or write failure on an established stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The peer closed the stream before a message arrived.
    #[error("stream closed by peer")]
    StreamClosed,
    /// The message could not be serialized or deserialized.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    /// The peer sent a message larger than the configured maximum.
    #[error("message too large: {size} > {max}")]
    MessageTooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Maximum allowed message size.
        max: usize,
    },
    /// Messages with the unknown type tag are never sent.
    #[error("message type is required to send a message")]
    UnknownMessageType,
    /// The exchange violated the protocol in some other way.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Broadcast was attempted without any eligible peers.
    #[error("no peers connected")]
    NoPeers,
    /// The remote handler answered with an error-phase message.
    #[error("peer handler error: {0}")]
    Handler(String),
}
