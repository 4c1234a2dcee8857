//! Configuration for network variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The default stream protocol identifier.
pub const DEFAULT_PROTOCOL: &str = "/dn/stream/1.0.0";

/// The default deadline for collecting broadcast responses.
pub const DEFAULT_BROADCAST_TIMEOUT: Duration = Duration::from_secs(6);

/// Maximum size of a single decoded message (default: 10 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// The container for all network configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// The protocol identifier negotiated when opening streams to peers.
    pub protocol: String,
    /// How long a broadcast waits for responses before returning what it collected.
    #[serde(with = "humantime_serde")]
    pub broadcast_timeout: Duration,
    /// The maximum size (bytes) for a single message read from a peer.
    ///
    /// Messages larger than this are rejected before they are parsed.
    pub max_message_size: usize,
}

impl NetworkConfig {
    /// Return a copy of self with a different broadcast deadline.
    pub fn with_broadcast_timeout(mut self, timeout: Duration) -> Self {
        self.broadcast_timeout = timeout;
        self
    }

    /// Return a copy of self with a different maximum message size.
    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            broadcast_timeout: DEFAULT_BROADCAST_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}
