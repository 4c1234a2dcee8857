//! Fan a request out to every connected peer and collect the replies that arrive in time.

use crate::{
    error::{NetworkError, NetworkResult},
    network::Network,
    peers::PeerDirectory,
    transport::StreamTransport,
};
use dn_types::Message;
use libp2p::PeerId;
use std::collections::HashSet;
use tokio::{
    sync::mpsc,
    time::{timeout_at, Instant},
};
use tracing::debug;

/// Everything known about a broadcast when it finished.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Replies in the order they arrived.
    pub responses: Vec<Message>,
    /// Peers whose exchange failed before the deadline.
    pub failures: Vec<(PeerId, NetworkError)>,
    /// Peers still outstanding when the deadline elapsed.
    pub unanswered: Vec<PeerId>,
}

impl<T, P> Network<T, P>
where
    T: StreamTransport,
    P: PeerDirectory,
{
    /// Send a request to every connected peer and return the replies received before the
    /// broadcast deadline.
    ///
    /// Failed exchanges are left out of the result. Replies are in arrival order, not peer order.
    /// Reaching the deadline is not an error.
    pub async fn broadcast(&self, msg: Message) -> NetworkResult<Vec<Message>> {
        Ok(self.broadcast_report(msg).await?.responses)
    }

    /// Same as [Self::broadcast], also reporting which peers failed or never answered.
    pub async fn broadcast_report(&self, msg: Message) -> NetworkResult<BroadcastReport> {
        let deadline = Instant::now() + self.config().broadcast_timeout;

        let targets = self.broadcast_targets();
        if targets.is_empty() {
            return Err(NetworkError::NoPeers);
        }

        debug!(
            target: "network::broadcast",
            peers = targets.len(),
            msg_type = %msg.msg_type,
            "broadcasting message"
        );

        // every exchange reports exactly once, so sends never wait on capacity
        let (tx, mut rx) = mpsc::channel(targets.len());
        for peer in targets.iter().copied() {
            let network = self.clone();
            let msg = msg.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let res = network.send_request(peer, msg).await;
                // the receiver is gone once the deadline passes and late results are discarded
                let _ = tx.send((peer, res)).await;
            });
        }
        drop(tx);

        let mut outstanding: HashSet<PeerId> = targets.into_iter().collect();
        let mut report = BroadcastReport::default();

        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some((peer, res))) => {
                    outstanding.remove(&peer);
                    match res {
                        Ok(response) => report.responses.push(response),
                        Err(e) => {
                            debug!(target: "network::broadcast", %peer, ?e, "peer exchange failed");
                            report.failures.push((peer, e));
                        }
                    }
                }
                // all exchanges finished
                Ok(None) => break,
                Err(_) => {
                    debug!(
                        target: "network::broadcast",
                        outstanding = outstanding.len(),
                        "broadcast deadline elapsed"
                    );
                    break;
                }
            }
        }

        report.unanswered = outstanding.into_iter().collect();

        debug!(
            target: "network::broadcast",
            responses = report.responses.len(),
            failures = report.failures.len(),
            unanswered = report.unanswered.len(),
            "broadcast complete"
        );

        Ok(report)
    }

    /// Snapshot the connected peers, excluding this node and duplicates.
    fn broadcast_targets(&self) -> Vec<PeerId> {
        let local = self.local_peer_id();
        let mut contacted = HashSet::new();

        self.peers()
            .connected_peers()
            .into_iter()
            .filter(|peer| *peer != local && contacted.insert(*peer))
            .collect()
    }
}
