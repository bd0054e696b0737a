//! `BroadsideServer` builder and server loop.
//!
//! This is the entry point for running a Broadside server. It ties
//! together all the layers: transport → protocol → hub → notifier.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use broadside_battle::BattleConfig;
use broadside_protocol::{Codec, JsonCodec};
use broadside_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
use futures_util::future::join_all;
use tokio::sync::{Mutex, mpsc};

use crate::bot::BotMove;
use crate::dispatcher::Hub;
use crate::handler::handle_connection;
use crate::notifier::Notifier;
use crate::{BroadsideError, RetryPolicy, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. All game
/// state lives in the hub behind a single lock; handler output is posted
/// to the notifier while that lock is held.
pub(crate) struct ServerState<C, K> {
    pub(crate) hub: Mutex<Hub<C>>,
    pub(crate) notifier: Notifier<K>,
    pub(crate) codec: K,
}

/// Builder for configuring and starting a Broadside server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use broadside::prelude::*;
///
/// # async fn start() -> Result<(), BroadsideError> {
/// let server = BroadsideServer::builder()
///     .bind("0.0.0.0:3000")
///     .bot_delay(Duration::from_millis(500))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BroadsideServerBuilder {
    config: ServerConfig,
}

impl BroadsideServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the outbound delivery retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Sets how long bots wait before attacking.
    pub fn bot_delay(mut self, delay: Duration) -> Self {
        self.config.bot_delay = delay;
        self
    }

    /// Sets the board and fleet rules.
    pub fn battle_config(mut self, config: BattleConfig) -> Self {
        self.config.battle = config;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`, which is what browser
    /// clients speak.
    pub async fn build(self) -> Result<BroadsideServer, BroadsideError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let (bot_tx, bot_rx) = mpsc::unbounded_channel();

        let state = Arc::new(ServerState {
            hub: Mutex::new(Hub::new(&self.config, bot_tx)),
            notifier: Notifier::new(JsonCodec, self.config.retry),
            codec: JsonCodec,
        });

        Ok(BroadsideServer {
            transport,
            state,
            bot_moves: bot_rx,
            config: self.config,
        })
    }
}

/// A bound Broadside server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct BroadsideServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<WebSocketConnection, JsonCodec>>,
    bot_moves: mpsc::UnboundedReceiver<BotMove>,
    config: ServerConfig,
}

impl BroadsideServer {
    /// Creates a new builder.
    pub fn builder() -> BroadsideServerBuilder {
        BroadsideServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), BroadsideError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then stops bot
    /// timers and closes every live connection. Pending delivery retries
    /// are not waited for.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), BroadsideError> {
        tracing::info!(addr = %self.config.bind_addr, "Broadside server running");

        let bots = tokio::spawn(drive_bots(Arc::clone(&self.state), self.bot_moves));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(Arc::new(conn), state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down");
        bots.abort();
        let peers = self.state.hub.lock().await.shutdown();
        for peer in &peers {
            self.state.notifier.forget(peer.id());
        }
        join_all(peers.iter().map(|peer| peer.close())).await;
        self.transport.shutdown().await?;
        tracing::info!("Broadside server stopped");
        Ok(())
    }
}

/// Feeds due bot attacks through the hub, one at a time.
async fn drive_bots<C, K>(
    state: Arc<ServerState<C, K>>,
    mut moves: mpsc::UnboundedReceiver<BotMove>,
) where
    C: Connection,
    K: Codec,
{
    while let Some(mv) = moves.recv().await {
        let mut hub = state.hub.lock().await;
        let deliveries = hub.bot_turn(mv);
        state.notifier.post(deliveries);
    }
}
