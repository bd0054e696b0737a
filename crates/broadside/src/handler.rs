//! Per-connection handler: read frames, dispatch, deliver.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register the peer with the hub
//!   2. Loop: receive frame → decode → dispatch under the hub lock →
//!      post the resulting messages to the per-connection outboxes
//!   3. On close, detach the user and close its outbox (via a drop guard)
//!
//! Posting only enqueues, so a slow or broken recipient never stalls
//! this loop.

use std::sync::Arc;

use broadside_protocol::Codec;
use broadside_transport::{Connection, ConnectionId, Peer, TransportError};

use crate::server::ServerState;
use crate::BroadsideError;

/// Drop guard that tells the hub a connection is gone when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct ConnectionGuard<C: Connection, K: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C, K>>,
}

impl<C: Connection, K: Codec> Drop for ConnectionGuard<C, K> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        runtime.spawn(async move {
            let mut hub = state.hub.lock().await;
            let deliveries = hub.disconnect(conn_id);
            state.notifier.forget(conn_id);
            state.notifier.post(deliveries);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C, K>(
    conn: Arc<C>,
    state: Arc<ServerState<C, K>>,
) -> Result<(), BroadsideError>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    let conn_id = conn.id();
    tracing::info!(%conn_id, "client connected");

    state.hub.lock().await.connect(Peer::live(Arc::clone(&conn)));
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let msg = match state.codec.decode_client(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "dropping undecodable frame");
                continue;
            }
        };
        tracing::debug!(%conn_id, kind = msg.kind(), "message received");

        // Post under the lock so every peer sees hub order.
        let mut hub = state.hub.lock().await;
        let deliveries = hub.dispatch(conn_id, msg);
        state.notifier.post(deliveries);
    }

    // _guard drops here → hub disconnect fires.
    Ok(())
}
