//! Handlers answering inbound requests, keyed by message type.

use crate::peers::PeerDirectory;
use async_trait::async_trait;
use dn_types::{ListParams, Message, MessageType, PeerProfile, PING_RESPONSE};
use serde::Serialize;
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::warn;

/// Answer one inbound request.
///
/// Returning `None` sends nothing back to the peer. Handlers run on the task driving the inbound
/// stream, so a handler that never returns stalls that stream only.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Produce the response for `request`, if any.
    async fn handle(&self, request: Message) -> Option<Message>;
}

/// Adapter for synchronous closures. See [handler_fn].
#[derive(Clone)]
pub struct FnHandler<F>(F);

/// Wrap a synchronous closure as a [RequestHandler].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Message) -> Option<Message> + Send + Sync + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F> RequestHandler for FnHandler<F>
where
    F: Fn(Message) -> Option<Message> + Send + Sync + 'static,
{
    async fn handle(&self, request: Message) -> Option<Message> {
        (self.0)(request)
    }
}

/// The mapping from message type to handler.
///
/// The registry is built once and frozen inside the network. Adding a message type means
/// registering a handler, never changing the dispatch loop.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<MessageType, Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in ping, peer-info, and peer-list handlers.
    pub fn with_defaults<P: PeerDirectory>(local: PeerProfile, peers: Arc<P>) -> Self {
        Self::new()
            .with_handler(MessageType::Ping, PingHandler)
            .with_handler(MessageType::PeerInfo, PeerInfoHandler::new(local))
            .with_handler(MessageType::Peers, PeersHandler::new(peers))
    }

    /// Builder-style [Self::register].
    pub fn with_handler(mut self, msg_type: MessageType, handler: impl RequestHandler) -> Self {
        self.register(msg_type, handler);
        self
    }

    /// Register a handler, returning the handler it replaced.
    ///
    /// Unknown messages are never dispatched, so registering for [MessageType::Unknown] is
    /// ignored and also returns `None`. Use [Self::contains] to tell the two cases apart.
    pub fn register(
        &mut self,
        msg_type: MessageType,
        handler: impl RequestHandler,
    ) -> Option<Arc<dyn RequestHandler>> {
        if msg_type.is_unknown() {
            warn!(target: "network::handlers", "ignoring handler for unknown message type");
            return None;
        }

        self.handlers.insert(msg_type, Arc::new(handler))
    }

    /// The handler for a message type.
    pub fn get(&self, msg_type: &MessageType) -> Option<&Arc<dyn RequestHandler>> {
        self.handlers.get(msg_type)
    }

    /// Return `true` if a handler is registered for the message type.
    pub fn contains(&self, msg_type: &MessageType) -> bool {
        self.handlers.contains_key(msg_type)
    }

    /// The number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Return `true` if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry").field("types", &self.handlers.keys()).finish()
    }
}

/// Serialize a response payload, answering with an error-phase message on failure.
fn respond<T: Serialize>(msg_type: MessageType, payload: &T) -> Message {
    match serde_json::to_value(payload) {
        Ok(value) => Message::response(msg_type, value),
        Err(e) => Message::error(msg_type, e.to_string()),
    }
}

/// Answers pings with [PING_RESPONSE].
#[derive(Debug, Clone, Copy, Default)]
pub struct PingHandler;

#[async_trait]
impl RequestHandler for PingHandler {
    async fn handle(&self, _request: Message) -> Option<Message> {
        Some(Message::response(MessageType::Ping, PING_RESPONSE.into()))
    }
}

/// Answers with this node's profile.
#[derive(Debug, Clone)]
pub struct PeerInfoHandler {
    local: PeerProfile,
}

impl PeerInfoHandler {
    /// Create a new instance of Self.
    pub fn new(local: PeerProfile) -> Self {
        Self { local }
    }
}

#[async_trait]
impl RequestHandler for PeerInfoHandler {
    async fn handle(&self, _request: Message) -> Option<Message> {
        Some(respond(MessageType::PeerInfo, &self.local))
    }
}

/// Answers with a page of connected peer profiles.
///
/// Profiles are ordered by peer id so consecutive pages are stable.
pub struct PeersHandler<P> {
    peers: Arc<P>,
}

impl<P: PeerDirectory> PeersHandler<P> {
    /// Create a new instance of Self.
    pub fn new(peers: Arc<P>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl<P: PeerDirectory> RequestHandler for PeersHandler<P> {
    async fn handle(&self, request: Message) -> Option<Message> {
        let params = if request.payload.is_null() {
            ListParams::default()
        } else {
            match request.decode_payload::<ListParams>() {
                Ok(params) => params,
                Err(e) => return Some(Message::error(MessageType::Peers, e.to_string())),
            }
        };

        let mut profiles: Vec<PeerProfile> = self
            .peers
            .connected_peers()
            .iter()
            .filter_map(|peer| self.peers.peer_info(peer))
            .collect();
        profiles.sort_by_key(|profile| profile.id.to_bytes());

        Some(respond(MessageType::Peers, &params.page(&profiles)))
    }
}
