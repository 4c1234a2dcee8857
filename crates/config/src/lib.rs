//! Crate for configuring a node.
//!
//! Configuration is an explicit value handed to the network at construction. Nothing here is
//! process-wide state.
mod network;
pub use network::*;
mod node_config;
pub use node_config::*;
mod traits;
pub use traits::*;
