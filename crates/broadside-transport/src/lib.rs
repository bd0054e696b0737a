//! Transport abstraction layer for Broadside.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the network, plus [`Peer`], the handle the rest of the server uses to
//! talk to a client. A peer is either backed by a real connection or
//! detached (a no-op sink used for bot players).
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique `ConnectionId`.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;

    /// Gracefully shuts down the transport, stopping new connections.
    fn shutdown(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A single connection that can send and receive frames.
///
/// The returned futures are `Send` so connections can be driven from
/// spawned Tokio tasks regardless of the concrete type.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// Where outbound frames for a user go.
///
/// `Live` wraps a transport-backed connection shared between the reader
/// task and every task delivering to it. `Detached` accepts every frame and
/// discards it; bot players sit behind one.
pub enum Peer<C> {
    /// A real client connection.
    Live(Arc<C>),
    /// A sink with no remote end.
    Detached(ConnectionId),
}

impl<C: Connection> Peer<C> {
    /// Wraps a live connection.
    pub fn live(conn: Arc<C>) -> Self {
        Self::Live(conn)
    }

    /// Creates a detached peer with a fresh connection id.
    pub fn detached() -> Self {
        Self::Detached(ConnectionId::next())
    }

    /// Returns `true` for transport-backed peers.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl<C> Clone for Peer<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Live(conn) => Self::Live(Arc::clone(conn)),
            Self::Detached(id) => Self::Detached(*id),
        }
    }
}

impl<C: Connection> fmt::Debug for Peer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(conn) => write!(f, "Live({})", conn.id()),
            Self::Detached(id) => write!(f, "Detached({id})"),
        }
    }
}

impl<C: Connection> Connection for Peer<C> {
    type Error = C::Error;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        match self {
            Self::Live(conn) => conn.send(data).await,
            Self::Detached(_) => Ok(()),
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        match self {
            Self::Live(conn) => conn.recv().await,
            Self::Detached(_) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self {
            Self::Live(conn) => conn.close().await,
            Self::Detached(_) => Ok(()),
        }
    }

    fn id(&self) -> ConnectionId {
        match self {
            Self::Live(conn) => conn.id(),
            Self::Detached(id) => *id,
        }
    }
}
