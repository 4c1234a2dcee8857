//! Fixtures used in multiple tests.

use crate::{
    handler_fn, HandlerRegistry, Network, NetworkError, NetworkResult, PeerDirectory, PeerTable,
    StreamTransport,
};
use async_trait::async_trait;
use dn_config::NetworkConfig;
use dn_types::{Message, MessageType, PeerProfile};
use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    future, StreamExt as _,
};
use libp2p::{
    core::{multiaddr::Protocol, transport, upgrade::Version, Transport as _},
    identity::Keypair,
    plaintext,
    swarm::{self, Swarm, SwarmEvent},
    yamux, Multiaddr, PeerId, StreamProtocol,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{Arc, Once},
    time::Duration,
};
use tokio::{io::DuplexStream, task::JoinHandle};
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt as _};
use tracing_subscriber::EnvFilter;

/// In-memory byte stream between two test peers.
pub(crate) type MemoryStream = Compat<DuplexStream>;

/// Buffer size for each in-memory stream.
const DUPLEX_BUFFER: usize = 64 * 1024;

static INIT_TRACING: Once = Once::new();

/// Initialize tracing once for the whole test binary.
///
/// Set `RUST_LOG` to see the network's logs.
pub(crate) fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Default)]
struct HubInner {
    /// Inbound stream queues for listening peers.
    listeners: HashMap<PeerId, UnboundedSender<(PeerId, MemoryStream)>>,
    /// Streams opened to each peer.
    opened: HashMap<PeerId, usize>,
}

/// Connects in-memory transports to each other.
#[derive(Clone, Default)]
pub(crate) struct MemoryHub {
    inner: Arc<Mutex<HubInner>>,
}

impl MemoryHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A transport that opens streams as `local`.
    pub(crate) fn transport(&self, local: PeerId) -> MemoryTransport {
        MemoryTransport { local, hub: self.clone() }
    }

    /// Accept inbound streams for `peer`.
    pub(crate) fn listen(&self, peer: PeerId) -> UnboundedReceiver<(PeerId, MemoryStream)> {
        let (tx, rx) = unbounded();
        self.inner.lock().listeners.insert(peer, tx);
        rx
    }

    /// Open a stream from `local` to `peer`, handing the remote half to the peer's listener.
    fn connect(&self, local: PeerId, peer: PeerId) -> NetworkResult<MemoryStream> {
        let mut hub = self.inner.lock();
        let listener = hub
            .listeners
            .get(&peer)
            .ok_or_else(|| NetworkError::Connect(format!("{peer} unreachable")))?;

        let (stream, remote) = tokio::io::duplex(DUPLEX_BUFFER);
        listener
            .unbounded_send((local, remote.compat()))
            .map_err(|_| NetworkError::Connect(format!("{peer} stopped listening")))?;

        *hub.opened.entry(peer).or_default() += 1;
        Ok(stream.compat())
    }

    /// The number of streams successfully opened to `peer`.
    pub(crate) fn streams_opened(&self, peer: &PeerId) -> usize {
        self.inner.lock().opened.get(peer).copied().unwrap_or_default()
    }

    /// The number of streams opened to any peer.
    pub(crate) fn total_streams_opened(&self) -> usize {
        self.inner.lock().opened.values().sum()
    }
}

/// [StreamTransport] backed by [MemoryHub].
#[derive(Clone)]
pub(crate) struct MemoryTransport {
    local: PeerId,
    hub: MemoryHub,
}

#[async_trait]
impl StreamTransport for MemoryTransport {
    type Stream = MemoryStream;

    async fn open_stream(
        &self,
        peer: PeerId,
        _protocol: StreamProtocol,
    ) -> NetworkResult<Self::Stream> {
        self.hub.connect(self.local, peer)
    }
}

/// A directory returning a fixed list of peers, duplicates included.
pub(crate) struct FixedPeers(pub(crate) Vec<PeerId>);

impl PeerDirectory for FixedPeers {
    fn connected_peers(&self) -> Vec<PeerId> {
        self.0.clone()
    }

    fn peer_info(&self, peer: &PeerId) -> Option<PeerProfile> {
        self.0.contains(peer).then(|| PeerProfile::new(*peer, "fixed"))
    }
}

/// Handlers answering every known type by echoing the request payload.
pub(crate) fn echo_handlers() -> HandlerRegistry {
    let echo = handler_fn(|req: Message| Some(Message::response(req.msg_type, req.payload)));
    MessageType::ALL.into_iter().fold(HandlerRegistry::new(), |registry, msg_type| {
        registry.with_handler(msg_type, echo.clone())
    })
}

/// Create a network for `local` on the hub without serving inbound streams.
pub(crate) fn create_network<P: PeerDirectory>(
    hub: &MemoryHub,
    local: PeerId,
    peers: Arc<P>,
    handlers: HandlerRegistry,
    config: NetworkConfig,
) -> Network<MemoryTransport, P> {
    Network::new(local, hub.transport(local), peers, handlers, config)
        .expect("default protocol is valid")
}

/// Spawn a peer serving inbound streams with `handlers`.
pub(crate) fn spawn_node(
    hub: &MemoryHub,
    handlers: HandlerRegistry,
) -> (PeerId, Network<MemoryTransport, PeerTable>, JoinHandle<()>) {
    let peer_id = PeerId::random();
    let network = create_network(
        hub,
        peer_id,
        Arc::new(PeerTable::new()),
        handlers,
        NetworkConfig::default(),
    );
    let task = network.spawn_inbound(hub.listen(peer_id));
    (peer_id, network, task)
}

/// Spawn a peer that accepts streams and never answers.
///
/// Streams stay open until the task is aborted.
pub(crate) fn spawn_silent_peer(hub: &MemoryHub) -> (PeerId, JoinHandle<()>) {
    let peer_id = PeerId::random();
    let mut incoming = hub.listen(peer_id);
    let task = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Some((_, stream)) = incoming.next().await {
            held.push(stream);
        }
    });
    (peer_id, task)
}

/// Spawn a peer that accepts streams and drops them immediately.
pub(crate) fn spawn_hang_up_peer(hub: &MemoryHub) -> (PeerId, JoinHandle<()>) {
    let peer_id = PeerId::random();
    let mut incoming = hub.listen(peer_id);
    let task = tokio::spawn(async move {
        while let Some((_, stream)) = incoming.next().await {
            drop(stream);
        }
    });
    (peer_id, task)
}

/// Two connected in-memory streams.
pub(crate) fn stream_pair() -> (MemoryStream, MemoryStream) {
    let (a, b) = tokio::io::duplex(DUPLEX_BUFFER);
    (a.compat(), b.compat())
}

/// A swarm running only the stream behaviour over an in-memory libp2p transport.
pub(crate) fn create_stream_swarm() -> Swarm<libp2p_stream::Behaviour> {
    let identity = Keypair::generate_ed25519();
    let transport = transport::MemoryTransport::default()
        .upgrade(Version::V1)
        .authenticate(plaintext::Config::new(&identity))
        .multiplex(yamux::Config::default())
        .boxed();

    // keep connections open between exchanges
    let config = swarm::Config::with_tokio_executor()
        .with_idle_connection_timeout(Duration::from_secs(60));

    Swarm::new(transport, libp2p_stream::Behaviour::new(), identity.public().to_peer_id(), config)
}

/// Listen on a memory address with `listener`, dial it from `dialer`, and wait for both sides
/// to see the connection.
///
/// Returns the listen address.
pub(crate) async fn connect_swarms(
    listener: &mut Swarm<libp2p_stream::Behaviour>,
    dialer: &mut Swarm<libp2p_stream::Behaviour>,
) -> Multiaddr {
    let listener_id =
        listener.listen_on(Protocol::Memory(0).into()).expect("memory transport listens");
    let address = loop {
        match listener.next().await.expect("swarm stream is infinite") {
            SwarmEvent::NewListenAddr { address, listener_id: id } if id == listener_id => {
                break address
            }
            _ => continue,
        }
    };

    dialer.dial(address.clone()).expect("dial memory address");

    let inbound = async {
        loop {
            match listener.next().await.expect("swarm stream is infinite") {
                SwarmEvent::ConnectionEstablished { peer_id, .. } => break peer_id,
                SwarmEvent::IncomingConnectionError { error, .. } => {
                    panic!("incoming connection failed: {error}")
                }
                _ => continue,
            }
        }
    };
    let outbound = async {
        loop {
            match dialer.next().await.expect("swarm stream is infinite") {
                SwarmEvent::ConnectionEstablished { peer_id, .. } => break peer_id,
                SwarmEvent::OutgoingConnectionError { error, .. } => {
                    panic!("failed to dial: {error}")
                }
                _ => continue,
            }
        }
    };

    let (inbound_peer, outbound_peer) = future::join(inbound, outbound).await;
    assert_eq!(&inbound_peer, dialer.local_peer_id());
    assert_eq!(&outbound_peer, listener.local_peer_id());

    address
}

/// Drive a swarm in the background for the rest of the test.
pub(crate) fn spawn_swarm(mut swarm: Swarm<libp2p_stream::Behaviour>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = swarm.next().await {
            tracing::trace!(target: "network::tests", ?event, "swarm event");
        }
    })
}
