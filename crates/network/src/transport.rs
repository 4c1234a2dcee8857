//! The transport capability used to open streams to peers.

use crate::error::{NetworkError, NetworkResult};
use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite};
use libp2p::{PeerId, StreamProtocol};
use tracing::debug;

/// Open bidirectional streams to peers.
///
/// Connection establishment, encryption, and peer discovery belong to the implementor. The network
/// only needs a fresh byte stream per exchange.
#[async_trait]
pub trait StreamTransport: Clone + Send + Sync + 'static {
    /// The bidirectional byte stream yielded for each opened stream.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a new stream to `peer` negotiating `protocol`.
    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> NetworkResult<Self::Stream>;
}

#[async_trait]
impl StreamTransport for libp2p_stream::Control {
    type Stream = libp2p::Stream;

    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> NetworkResult<Self::Stream> {
        // each control has one guaranteed slot, so clone for concurrent callers
        let mut control = self.clone();
        let stream = libp2p_stream::Control::open_stream(&mut control, peer, protocol)
            .await
            .map_err(|e| {
                debug!(target: "network::transport", %peer, ?e, "failed to open stream");
                NetworkError::Connect(e.to_string())
            })?;

        Ok(stream)
    }
}
