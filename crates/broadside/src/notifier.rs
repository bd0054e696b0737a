//! Best-effort outbound delivery with bounded retry.
//!
//! Every outbound message goes through [`Notifier`]. A send that fails is
//! retried a fixed number of times with a pause in between; if every
//! attempt fails the message is dropped and only logged. Callers never see
//! a delivery error.
//!
//! [`Notifier::post`] is the fire-and-forget path the server uses: each
//! live connection gets its own outbox drained by a writer task, so frames
//! reach one peer in the order they were posted while a failing peer never
//! holds up anyone else.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use broadside_protocol::{Codec, JsonCodec, ServerMessage};
use broadside_transport::{Connection, ConnectionId, Peer};
use futures_util::future::join_all;
use tokio::sync::mpsc;

use crate::RetryPolicy;

/// One outbound message and who should get it.
///
/// Handlers return these instead of sending anything themselves.
pub struct Delivery<C> {
    pub recipients: Vec<Peer<C>>,
    pub message: ServerMessage,
}

impl<C> Delivery<C> {
    /// A message for a single peer.
    pub fn to(recipient: Peer<C>, message: ServerMessage) -> Self {
        Self {
            recipients: vec![recipient],
            message,
        }
    }

    /// The same message for every peer in `recipients`.
    pub fn to_all(recipients: Vec<Peer<C>>, message: ServerMessage) -> Self {
        Self {
            recipients,
            message,
        }
    }
}

/// Whether a delivery made it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Dropped,
}

/// What happened to one message on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub connection: ConnectionId,
    /// Sends attempted, first one included. Zero if encoding failed.
    pub attempts: u32,
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        self.outcome == DeliveryOutcome::Delivered
    }
}

/// An encoded frame waiting in a connection's outbox.
#[derive(Debug)]
struct Outgoing {
    frame: Vec<u8>,
    kind: &'static str,
}

/// Encodes server messages and pushes them to connections.
#[derive(Debug)]
pub struct Notifier<K = JsonCodec> {
    codec: K,
    policy: RetryPolicy,
    outboxes: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<Outgoing>>>,
}

impl<K: Codec> Notifier<K> {
    pub fn new(codec: K, policy: RetryPolicy) -> Self {
        Self {
            codec,
            policy,
            outboxes: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Queues a batch without waiting for any of it to be sent.
    ///
    /// Each live recipient's frames go out in batch order, and in the order
    /// of earlier `post` calls. Detached peers are skipped. Must be called
    /// from within a Tokio runtime.
    pub fn post<C: Connection>(&self, deliveries: Vec<Delivery<C>>) {
        let mut outboxes = self.outboxes.lock().unwrap_or_else(PoisonError::into_inner);
        for delivery in deliveries {
            let live: Vec<&Arc<C>> = delivery
                .recipients
                .iter()
                .filter_map(|peer| match peer {
                    Peer::Live(conn) => Some(conn),
                    Peer::Detached(_) => None,
                })
                .collect();
            if live.is_empty() {
                continue;
            }
            let Some(frame) = self.encode(&delivery.message) else {
                continue;
            };
            let kind = delivery.message.kind();
            for conn in live {
                let outgoing = Outgoing {
                    frame: frame.clone(),
                    kind,
                };
                let outbox = outboxes
                    .entry(conn.id())
                    .or_insert_with(|| spawn_writer(Arc::clone(conn), self.policy));
                if let Err(mpsc::error::SendError(outgoing)) = outbox.send(outgoing) {
                    // Writer task is gone (aborted at shutdown); start a new one.
                    let fresh = spawn_writer(Arc::clone(conn), self.policy);
                    let _ = fresh.send(outgoing);
                    outboxes.insert(conn.id(), fresh);
                }
            }
        }
    }

    /// Closes the outbox for `conn`. Frames already queued are still sent
    /// (or retried and dropped); the writer task then exits.
    pub fn forget(&self, conn: ConnectionId) {
        self.outboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&conn);
    }

    /// Number of connections with an open outbox.
    pub fn outbox_count(&self) -> usize {
        self.outboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sends `message` to one connection, retrying per the policy.
    pub async fn notify_one<C: Connection>(
        &self,
        message: &ServerMessage,
        conn: &C,
    ) -> DeliveryReport {
        match self.encode(message) {
            Some(frame) => send_with_retry(&frame, conn, message.kind(), self.policy).await,
            None => undeliverable(conn.id()),
        }
    }

    /// Sends `message` to every connection concurrently and waits for all
    /// of them to settle. One slow or broken peer never holds back or
    /// fails the others.
    pub async fn notify_all<C: Connection>(
        &self,
        message: &ServerMessage,
        conns: &[C],
    ) -> Vec<DeliveryReport> {
        let Some(frame) = self.encode(message) else {
            return conns.iter().map(|c| undeliverable(c.id())).collect();
        };
        let kind = message.kind();
        join_all(
            conns
                .iter()
                .map(|conn| send_with_retry(&frame, conn, kind, self.policy)),
        )
        .await
    }

    /// Delivers a batch and waits for it to settle.
    ///
    /// Each recipient sees its share of the batch in order. Recipients are
    /// served concurrently, so a failing peer delays only its own frames.
    pub async fn deliver<C: Connection>(&self, deliveries: Vec<Delivery<C>>) -> Vec<DeliveryReport> {
        let mut reports = Vec::new();
        let mut queues: Vec<(Peer<C>, Vec<Outgoing>)> = Vec::new();
        for delivery in deliveries {
            let Some(frame) = self.encode(&delivery.message) else {
                reports.extend(delivery.recipients.iter().map(|p| undeliverable(p.id())));
                continue;
            };
            let kind = delivery.message.kind();
            for peer in delivery.recipients {
                let outgoing = Outgoing {
                    frame: frame.clone(),
                    kind,
                };
                match queues.iter_mut().find(|(p, _)| p.id() == peer.id()) {
                    Some((_, queue)) => queue.push(outgoing),
                    None => queues.push((peer, vec![outgoing])),
                }
            }
        }

        let policy = self.policy;
        let per_peer = join_all(queues.iter().map(|(peer, queue)| async move {
            let mut sent = Vec::with_capacity(queue.len());
            for out in queue {
                sent.push(send_with_retry(&out.frame, peer, out.kind, policy).await);
            }
            sent
        }))
        .await;
        reports.extend(per_peer.into_iter().flatten());
        reports
    }

    fn encode(&self, message: &ServerMessage) -> Option<Vec<u8>> {
        match self.codec.encode_server(message) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!(kind = message.kind(), error = %e, "failed to encode message");
                None
            }
        }
    }
}

impl Default for Notifier<JsonCodec> {
    fn default() -> Self {
        Self::new(JsonCodec, RetryPolicy::default())
    }
}

/// Starts the task that drains one connection's outbox in order.
fn spawn_writer<C: Connection>(
    conn: Arc<C>,
    policy: RetryPolicy,
) -> mpsc::UnboundedSender<Outgoing> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();
    tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            send_with_retry(&out.frame, &*conn, out.kind, policy).await;
        }
        tracing::trace!(connection = %conn.id(), "outbox closed");
    });
    tx
}

async fn send_with_retry<C: Connection>(
    frame: &[u8],
    conn: &C,
    kind: &'static str,
    policy: RetryPolicy,
) -> DeliveryReport {
    let connection = conn.id();
    let max = policy.attempts();
    for attempt in 1..=max {
        match conn.send(frame).await {
            Ok(()) => {
                return DeliveryReport {
                    connection,
                    attempts: attempt,
                    outcome: DeliveryOutcome::Delivered,
                };
            }
            Err(e) => {
                tracing::debug!(%connection, kind, attempt, error = %e, "send failed");
                if attempt < max {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
    tracing::warn!(%connection, kind, attempts = max, "delivery dropped");
    DeliveryReport {
        connection,
        attempts: max,
        outcome: DeliveryOutcome::Dropped,
    }
}

fn undeliverable(connection: ConnectionId) -> DeliveryReport {
    DeliveryReport {
        connection,
        attempts: 0,
        outcome: DeliveryOutcome::Dropped,
    }
}
