//! The message envelope exchanged between peers.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

/// The type tag for a [Message].
///
/// The tag determines which handler answers a request and the shape of the payload. Tags are
/// encoded as stable strings so adding a variant never shifts existing values on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Information about the remote peer's profile.
    #[serde(rename = "PEER_INFO")]
    PeerInfo,
    /// The peers known to the remote node.
    #[serde(rename = "PEERS")]
    Peers,
    /// A page of datasets held by the remote node.
    #[serde(rename = "DATASETS")]
    Datasets,
    /// Metadata for a single dataset.
    #[serde(rename = "DATASET_INFO")]
    DatasetInfo,
    /// The version history of a dataset.
    #[serde(rename = "DATASET_LOG")]
    DatasetLog,
    /// Dataset namespaces held by the remote node.
    #[serde(rename = "NAMESPACES")]
    Namespaces,
    /// Full-text search over the remote node's datasets.
    #[serde(rename = "SEARCH")]
    Search,
    /// Liveness check.
    #[serde(rename = "PING")]
    Ping,
    /// Distributed web nodes associated with the remote peer.
    #[serde(rename = "NODES")]
    Nodes,
    /// The default tag. Messages with this tag are never sent.
    ///
    /// Unrecognized tags from newer peers also decode to this variant.
    #[default]
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

impl MessageType {
    /// Every tag a handler can be registered for.
    pub const ALL: [MessageType; 9] = [
        MessageType::PeerInfo,
        MessageType::Peers,
        MessageType::Datasets,
        MessageType::DatasetInfo,
        MessageType::DatasetLog,
        MessageType::Namespaces,
        MessageType::Search,
        MessageType::Ping,
        MessageType::Nodes,
    ];

    /// The wire representation of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::PeerInfo => "PEER_INFO",
            MessageType::Peers => "PEERS",
            MessageType::Datasets => "DATASETS",
            MessageType::DatasetInfo => "DATASET_INFO",
            MessageType::DatasetLog => "DATASET_LOG",
            MessageType::Namespaces => "NAMESPACES",
            MessageType::Search => "SEARCH",
            MessageType::Ping => "PING",
            MessageType::Nodes => "NODES",
            MessageType::Unknown => "UNKNOWN",
        }
    }

    /// Return `true` for the default tag.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, MessageType::Unknown)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The point in a message's lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum MessagePhase {
    /// Sent by the node opening the stream.
    #[default]
    Request = 0,
    /// A successful answer to a request.
    Response = 1,
    /// An answer indicating the remote handler failed.
    Error = 2,
}

/// The unit of exchange between peers.
///
/// Wire shape: `{"Type": "PING", "Phase": 0, "Payload": null, "HangUp": false}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    /// The tag used to route the message to a handler.
    #[serde(rename = "Type", default)]
    pub msg_type: MessageType,
    /// Request, response, or error.
    #[serde(default)]
    pub phase: MessagePhase,
    /// Structured payload. The shape is implied by `msg_type`.
    #[serde(default)]
    pub payload: Value,
    /// The sender intends this to be the last message on the stream.
    #[serde(default)]
    pub hang_up: bool,
}

impl Message {
    /// Create a new request.
    pub fn new(msg_type: MessageType, payload: Value) -> Self {
        Self { msg_type, phase: MessagePhase::Request, payload, hang_up: false }
    }

    /// Create a new request by serializing a typed payload.
    pub fn with_params<T: Serialize>(
        msg_type: MessageType,
        params: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(msg_type, serde_json::to_value(params)?))
    }

    /// Create a successful response.
    pub fn response(msg_type: MessageType, payload: Value) -> Self {
        Self { msg_type, phase: MessagePhase::Response, payload, hang_up: false }
    }

    /// Create an error response carrying a human-readable reason.
    pub fn error(msg_type: MessageType, reason: impl Into<String>) -> Self {
        Self {
            msg_type,
            phase: MessagePhase::Error,
            payload: Value::String(reason.into()),
            hang_up: false,
        }
    }

    /// Set the hang-up flag.
    pub fn with_hang_up(mut self, hang_up: bool) -> Self {
        self.hang_up = hang_up;
        self
    }

    /// Force the request phase.
    pub fn into_request(mut self) -> Self {
        self.phase = MessagePhase::Request;
        self
    }

    /// Decode the payload into a concrete type.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.payload)
    }

    /// Return `true` for request-phase messages.
    pub fn is_request(&self) -> bool {
        self.phase == MessagePhase::Request
    }

    /// Return `true` for successful responses.
    pub fn is_response(&self) -> bool {
        self.phase == MessagePhase::Response
    }

    /// Return `true` for error responses.
    pub fn is_error(&self) -> bool {
        self.phase == MessagePhase::Error
    }

    /// The reason carried by an error-phase message.
    ///
    /// Returns `None` for request and response phases.
    pub fn error_reason(&self) -> Option<String> {
        if !self.is_error() {
            return None;
        }

        let reason = match &self.payload {
            Value::String(reason) => reason.clone(),
            other => other.to_string(),
        };
        Some(reason)
    }
}
