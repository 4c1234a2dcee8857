//! Node-level configuration.

use crate::NetworkConfig;
use serde::{Deserialize, Serialize};

/// The default file name for a node's configuration.
pub const NODE_CONFIG_FILE: &str = "node.yaml";

/// Configuration for a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Human-friendly name advertised to peers.
    pub peername: String,
    /// Network settings.
    #[serde(default)]
    pub network: NetworkConfig,
}

impl NodeConfig {
    /// Create a new instance of Self with default network settings.
    pub fn new(peername: impl Into<String>) -> Self {
        Self { peername: peername.into(), network: NetworkConfig::default() }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::new("anonymous")
    }
}
