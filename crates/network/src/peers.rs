//! Track peers and their connection status.

use dn_types::PeerProfile;
use libp2p::{Multiaddr, PeerId};
use parking_lot::RwLock;
use std::{collections::HashMap, time::Instant};
use tracing::debug;

/// Read-only view of the peers this node knows about.
///
/// Broadcasts take one snapshot of [PeerDirectory::connected_peers] when they start. Peers that
/// connect or disconnect afterwards do not change that broadcast's targets.
pub trait PeerDirectory: Send + Sync + 'static {
    /// Snapshot of every peer with a live connection.
    fn connected_peers(&self) -> Vec<PeerId>;

    /// The public profile for a peer, if known.
    fn peer_info(&self, peer: &PeerId) -> Option<PeerProfile>;
}

/// Connection status of the peer.
#[derive(Debug, Clone, Default)]
pub enum ConnectionStatus {
    /// The peer is connected.
    Connected {
        /// The multiaddr that we are connected via.
        multiaddr: Multiaddr,
    },
    /// The peer has disconnected.
    Disconnected {
        /// The last known connected instant.
        last_seen: Instant,
    },
    /// The connection status has not been specified.
    #[default]
    Unknown,
}

/// A known peer.
#[derive(Debug, Clone)]
struct PeerEntry {
    /// The peer's public profile.
    profile: PeerProfile,
    /// Current connection status.
    status: ConnectionStatus,
}

impl PeerEntry {
    fn is_connected(&self) -> bool {
        matches!(self.status, ConnectionStatus::Connected { .. })
    }
}

/// In-memory [PeerDirectory] updated by the transport as connections change.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: RwLock<HashMap<PeerId, PeerEntry>>,
}

impl PeerTable {
    /// Create a new instance of Self.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a peer's profile without changing its connection status.
    pub fn add_peer(&self, profile: PeerProfile) {
        let mut peers = self.peers.write();
        match peers.get_mut(&profile.id) {
            Some(entry) => entry.profile = profile,
            None => {
                peers.insert(profile.id, PeerEntry { profile, status: ConnectionStatus::Unknown });
            }
        }
    }

    /// Record a new connection to a peer.
    ///
    /// Returns `true` if the peer was not already connected.
    pub fn register_connected(&self, peer_id: PeerId, multiaddr: Multiaddr) -> bool {
        debug!(target: "peer-table", %peer_id, %multiaddr, "peer connected");
        let mut peers = self.peers.write();
        let entry = peers.entry(peer_id).or_insert_with(|| PeerEntry {
            profile: PeerProfile::new(peer_id, ""),
            status: ConnectionStatus::Unknown,
        });

        let newly_connected = !entry.is_connected();
        entry.status = ConnectionStatus::Connected { multiaddr };
        newly_connected
    }

    /// Record that a peer disconnected.
    pub fn register_disconnected(&self, peer_id: &PeerId) {
        debug!(target: "peer-table", %peer_id, "peer disconnected");
        if let Some(entry) = self.peers.write().get_mut(peer_id) {
            entry.status = ConnectionStatus::Disconnected { last_seen: Instant::now() };
        }
    }

    /// Forget a peer entirely.
    pub fn remove_peer(&self, peer_id: &PeerId) -> Option<PeerProfile> {
        self.peers.write().remove(peer_id).map(|entry| entry.profile)
    }

    /// The connection status for a peer.
    pub fn connection_status(&self, peer_id: &PeerId) -> Option<ConnectionStatus> {
        self.peers.read().get(peer_id).map(|entry| entry.status.clone())
    }

    /// Return `true` if the peer is currently connected.
    pub fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.peers.read().get(peer_id).is_some_and(PeerEntry::is_connected)
    }

    /// The number of connected peers.
    pub fn connected_count(&self) -> usize {
        self.peers.read().values().filter(|entry| entry.is_connected()).count()
    }
}

impl PeerDirectory for PeerTable {
    fn connected_peers(&self) -> Vec<PeerId> {
        self.peers
            .read()
            .iter()
            .filter_map(|(peer_id, entry)| entry.is_connected().then_some(*peer_id))
            .collect()
    }

    fn peer_info(&self, peer: &PeerId) -> Option<PeerProfile> {
        let peers = self.peers.read();
        let entry = peers.get(peer)?;
        let mut profile = entry.profile.clone();

        // include the live address if the profile does not already advertise it
        if let ConnectionStatus::Connected { multiaddr } = &entry.status {
            if !profile.addresses.contains(multiaddr) {
                profile.addresses.push(multiaddr.clone());
            }
        }

        Some(profile)
    }
}
