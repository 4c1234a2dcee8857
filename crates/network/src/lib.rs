//! Peer-to-peer request/response and broadcast protocol for the dataset network.
//!
//! Every exchange runs on its own stream. Outbound requests open a fresh stream, send one message,
//! and wait for one reply. Inbound streams are served by a dispatch loop that routes each request
//! to the handler registered for its type.

mod broadcast;
mod codec;
mod dispatch;
pub mod error;
mod handlers;
mod network;
mod peers;
mod transport;

#[cfg(test)]
#[path = "tests/common.rs"]
mod common;

pub use broadcast::BroadcastReport;
pub use codec::{FramedStream, MessageCodec, MESSAGE_DELIMITER};
pub use error::{NetworkError, NetworkResult};
pub use handlers::{
    handler_fn, FnHandler, HandlerRegistry, PeerInfoHandler, PeersHandler, PingHandler,
    RequestHandler,
};
pub use network::Network;
pub use peers::{ConnectionStatus, PeerDirectory, PeerTable};
pub use transport::StreamTransport;

// re-export so callers do not need a direct libp2p dependency for the common types
pub use libp2p::{PeerId, StreamProtocol};
