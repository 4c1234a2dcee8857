//! The node's view of the network: unicast requests, broadcasts, and inbound streams.

use crate::{
    codec::FramedStream,
    error::{NetworkError, NetworkResult},
    handlers::HandlerRegistry,
    peers::PeerDirectory,
    transport::StreamTransport,
};
use dn_config::NetworkConfig;
use dn_types::{Message, MessageType, Value, PING_RESPONSE};
use futures::{AsyncRead, AsyncWrite, Stream, StreamExt as _};
use libp2p::{PeerId, StreamProtocol};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

#[cfg(test)]
#[path = "tests/network_tests.rs"]
mod network_tests;

/// Handle to the dataset network.
///
/// Cheap to clone. Clones share one inner state.
pub struct Network<T, P> {
    inner: Arc<NetworkInner<T, P>>,
}

struct NetworkInner<T, P> {
    /// This node's identity. Never targeted by broadcasts.
    local_peer_id: PeerId,
    /// Opens outbound streams.
    transport: T,
    /// Source of the connected-peer snapshot.
    peers: Arc<P>,
    /// Handlers for inbound requests, frozen at construction.
    handlers: HandlerRegistry,
    /// The parsed protocol identifier from `config`.
    protocol: StreamProtocol,
    /// Network settings.
    config: NetworkConfig,
}

impl<T, P> Clone for Network<T, P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T, P> Network<T, P>
where
    T: StreamTransport,
    P: PeerDirectory,
{
    /// Create a new instance of Self.
    ///
    /// Fails if the configured protocol identifier is not a valid stream protocol.
    pub fn new(
        local_peer_id: PeerId,
        transport: T,
        peers: Arc<P>,
        handlers: HandlerRegistry,
        config: NetworkConfig,
    ) -> NetworkResult<Self> {
        let protocol = StreamProtocol::try_from_owned(config.protocol.clone())
            .map_err(|e| NetworkError::Protocol(format!("{}: {e}", config.protocol)))?;

        let inner =
            NetworkInner { local_peer_id, transport, peers, handlers, protocol, config };
        Ok(Self { inner: Arc::new(inner) })
    }

    /// This node's peer id.
    pub fn local_peer_id(&self) -> PeerId {
        self.inner.local_peer_id
    }

    /// The protocol negotiated for every stream.
    pub fn protocol(&self) -> &StreamProtocol {
        &self.inner.protocol
    }

    /// Network settings.
    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    pub(crate) fn peers(&self) -> &P {
        &self.inner.peers
    }

    pub(crate) fn handlers(&self) -> &HandlerRegistry {
        &self.inner.handlers
    }

    /// Wrap a raw stream with this network's codec settings.
    pub(crate) fn framed<S>(&self, stream: S) -> FramedStream<S>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        FramedStream::new(stream, self.inner.config.max_message_size)
    }

    /// Send a request to a single peer and wait for exactly one reply.
    ///
    /// A new stream is opened for every call and closed before returning. The reply is returned
    /// as-is, including error-phase replies from the peer's handler. No retries.
    pub async fn send_request(&self, peer: PeerId, msg: Message) -> NetworkResult<Message> {
        // reject before touching the transport
        if msg.msg_type.is_unknown() {
            return Err(NetworkError::UnknownMessageType);
        }

        let msg = msg.into_request();
        let stream = self.inner.transport.open_stream(peer, self.inner.protocol.clone()).await?;
        debug!(target: "network", %peer, msg_type = %msg.msg_type, "stream opened");

        let mut session = self.framed(stream);
        let res = async {
            session.send(&msg).await?;
            session.receive().await
        }
        .await;

        // release the stream on every path
        if let Err(e) = session.close().await {
            debug!(target: "network", %peer, ?e, "error closing stream");
        }

        res
    }

    /// Send a typed request and decode the typed response payload.
    ///
    /// Error-phase replies become [NetworkError::Handler] with the peer's reason.
    pub async fn request<Req, Res>(
        &self,
        peer: PeerId,
        msg_type: MessageType,
        params: &Req,
    ) -> NetworkResult<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let request = Message::with_params(msg_type, params)?;
        let reply = self.send_request(peer, request).await?;

        if let Some(reason) = reply.error_reason() {
            return Err(NetworkError::Handler(reason));
        }

        if reply.msg_type != msg_type {
            return Err(NetworkError::Protocol(format!(
                "expected {msg_type} response, received {}",
                reply.msg_type
            )));
        }

        Ok(reply.decode_payload()?)
    }

    /// Check that a peer is reachable and answering requests.
    pub async fn ping(&self, peer: PeerId) -> NetworkResult<()> {
        let pong: String = self.request(peer, MessageType::Ping, &Value::Null).await?;
        if pong != PING_RESPONSE {
            return Err(NetworkError::Protocol(format!("unexpected ping response: {pong}")));
        }

        Ok(())
    }

    /// Serve every inbound stream yielded by `incoming`.
    ///
    /// Each stream is driven by its own dispatch loop task. The returned task ends when `incoming`
    /// is exhausted.
    pub fn spawn_inbound<I, S>(&self, incoming: I) -> JoinHandle<()>
    where
        I: Stream<Item = (PeerId, S)> + Send + 'static,
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let network = self.clone();
        tokio::spawn(async move {
            futures::pin_mut!(incoming);
            while let Some((peer, stream)) = incoming.next().await {
                debug!(target: "network", %peer, "inbound stream");
                let network = network.clone();
                tokio::spawn(async move { network.handle_stream(peer, stream).await });
            }

            debug!(target: "network", "inbound streams exhausted");
        })
    }

    /// Register this network's protocol with libp2p and serve inbound streams.
    pub fn accept(&self, control: &mut libp2p_stream::Control) -> NetworkResult<JoinHandle<()>> {
        let incoming = control
            .accept(self.inner.protocol.clone())
            .map_err(|e| NetworkError::Protocol(e.to_string()))?;

        Ok(self.spawn_inbound(incoming))
    }
}
