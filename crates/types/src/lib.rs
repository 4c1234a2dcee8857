//! Types shared by every node on the dataset network.
//!
//! The [Message] envelope is the only unit exchanged between peers. Payload shapes are implied by
//! the [MessageType] tag and documented in [payload].

mod message;
pub mod payload;
pub use message::*;
pub use payload::*;

// re-exports for easier maintainability
pub use libp2p::{Multiaddr, PeerId};
pub use serde_json::Value;
