//! The dispatch loop serving one inbound stream.
//!
//! ```text
//!                  ┌──────────────────────── hang_up == false ───────────────────────┐
//!                  ▼                                                                  │
//!  ──► AwaitingRequest ──decoded──► Dispatching ──handler done──► AwaitingSend ──────┤
//!                  │                                                                  │
//!                  └── eof / stream error ──► Closed ◄──────── hang_up == true ───────┘
//! ```

use crate::{network::Network, peers::PeerDirectory, transport::StreamTransport, NetworkError};
use dn_types::Message;
use futures::{AsyncRead, AsyncWrite};
use libp2p::PeerId;
use tracing::{debug, info, warn};

/// States of the inbound dispatch loop.
#[derive(Debug)]
enum DispatchState {
    /// Waiting for the peer's next message.
    AwaitingRequest,
    /// Routing a decoded message to its handler.
    Dispatching(Message),
    /// Sending the handler's response, if it produced one.
    AwaitingSend {
        /// The handler's response.
        response: Option<Message>,
        /// The hang-up flag from the message being answered.
        hang_up: bool,
    },
    /// The stream is finished and released.
    Closed,
}

impl<T, P> Network<T, P>
where
    T: StreamTransport,
    P: PeerDirectory,
{
    /// Serve requests on an inbound stream until the peer hangs up or the stream fails.
    ///
    /// Receive failures end the loop normally. Send failures are logged and the loop continues.
    pub async fn handle_stream<S>(&self, peer: PeerId, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut session = self.framed(stream);
        let mut state = DispatchState::AwaitingRequest;

        loop {
            state = match state {
                DispatchState::AwaitingRequest => match session.receive().await {
                    Ok(msg) => {
                        info!(target: "network::dispatch", %peer, msg_type = %msg.msg_type, "received message");
                        DispatchState::Dispatching(msg)
                    }
                    Err(NetworkError::StreamClosed) => {
                        debug!(target: "network::dispatch", %peer, "peer closed stream");
                        DispatchState::Closed
                    }
                    Err(e) => {
                        debug!(target: "network::dispatch", %peer, ?e, "error receiving message");
                        DispatchState::Closed
                    }
                },
                DispatchState::Dispatching(msg) => {
                    let hang_up = msg.hang_up;
                    let response = self.dispatch(peer, msg).await;
                    DispatchState::AwaitingSend { response, hang_up }
                }
                DispatchState::AwaitingSend { response, hang_up } => {
                    if let Some(response) = response {
                        info!(target: "network::dispatch", %peer, msg_type = %response.msg_type, "sending response");
                        if let Err(e) = session.send(&response).await {
                            warn!(target: "network::dispatch", %peer, ?e, "failed to send response");
                        }
                    }

                    if hang_up {
                        DispatchState::Closed
                    } else {
                        DispatchState::AwaitingRequest
                    }
                }
                DispatchState::Closed => break,
            };
        }

        if let Err(e) = session.close().await {
            debug!(target: "network::dispatch", %peer, ?e, "error closing stream");
        }
    }

    /// Route a message to the handler registered for its type.
    async fn dispatch(&self, peer: PeerId, msg: Message) -> Option<Message> {
        if !msg.is_request() {
            debug!(target: "network::dispatch", %peer, phase = ?msg.phase, "ignoring non-request message");
            return None;
        }

        let Some(handler) = self.handlers().get(&msg.msg_type) else {
            debug!(target: "network::dispatch", %peer, msg_type = %msg.msg_type, "no handler registered");
            return None;
        };

        info!(target: "network::dispatch", %peer, msg_type = %msg.msg_type, "dispatching message");
        handler.handle(msg).await
    }
}
