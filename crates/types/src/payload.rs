//! Payload contracts for each [MessageType](crate::MessageType).
//!
//! Handlers answering requests are supplied by the application. These types pin down the
//! input/output shapes both sides agree on:
//!
//! | type           | request payload  | response payload      |
//! |----------------|------------------|-----------------------|
//! | `PEER_INFO`    | none             | [PeerProfile]         |
//! | `PEERS`        | [ListParams]     | `Vec<PeerProfile>`    |
//! | `DATASETS`     | [ListParams]     | `Vec<DatasetRef>`     |
//! | `DATASET_INFO` | [DatasetRef]     | [DatasetRef]          |
//! | `DATASET_LOG`  | [LogParams]      | `Vec<DatasetRef>`     |
//! | `NAMESPACES`   | [ListParams]     | `Vec<String>`         |
//! | `SEARCH`       | [SearchParams]   | `Vec<DatasetRef>`     |
//! | `PING`         | none             | [PING_RESPONSE]       |
//! | `NODES`        | none             | `Vec<Multiaddr>`      |

use libp2p::{Multiaddr, PeerId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The payload of a successful ping response.
pub const PING_RESPONSE: &str = "PONG";

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Pagination for list requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListParams {
    /// Maximum number of entries to return.
    pub limit: usize,
    /// Number of entries to skip.
    #[serde(default)]
    pub offset: usize,
}

impl ListParams {
    /// Create a new instance of Self.
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Apply the page to a slice of items.
    pub fn page<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().skip(self.offset).take(self.limit).cloned().collect()
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self { limit: DEFAULT_PAGE_SIZE, offset: 0 }
    }
}

/// Parameters for a dataset search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchParams {
    /// The query string.
    pub query: String,
    /// Pagination over the results.
    #[serde(flatten)]
    pub page: ListParams,
}

/// Parameters for a dataset history request.
///
/// The history walks `previous` links starting at `path`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogParams {
    /// Content address of the most recent version.
    pub path: String,
    /// Pagination over the results.
    #[serde(flatten)]
    pub page: ListParams,
}

/// A reference to a dataset version held by a peer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRef {
    /// Human-friendly name of the owning peer.
    #[serde(default)]
    pub peername: String,
    /// Dataset name within the peer's namespace.
    #[serde(default)]
    pub name: String,
    /// Content address of this version.
    #[serde(default)]
    pub path: String,
    /// Dataset metadata, when resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Value>,
}

/// Public information about a peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerProfile {
    /// The peer's network identity.
    pub id: PeerId,
    /// Human-friendly name chosen by the peer.
    #[serde(default)]
    pub peername: String,
    /// Addresses the peer is reachable on.
    #[serde(default)]
    pub addresses: Vec<Multiaddr>,
}

impl PeerProfile {
    /// Create a profile without known addresses.
    pub fn new(id: PeerId, peername: impl Into<String>) -> Self {
        Self { id, peername: peername.into(), addresses: Vec::new() }
    }
}
