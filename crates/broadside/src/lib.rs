//! # Broadside
//!
//! Real-time multiplayer battleship server.
//!
//! Clients connect over WebSocket, register with a name and password,
//! meet in rooms (or play a bot), and fight out a server-authoritative
//! battle. Every state change is pushed to the affected clients with
//! best-effort, bounded-retry delivery.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broadside::prelude::*;
//!
//! # async fn start() -> Result<(), BroadsideError> {
//! let server = BroadsideServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! Transport ─▶ Protocol ─▶ Hub (users, lobby, battles, bots) ─▶ Notifier
//! ```

mod bot;
mod config;
mod dispatcher;
mod error;
mod handler;
mod notifier;
mod server;

pub use bot::{BotController, BotMove, bot_fleet};
pub use config::{RetryPolicy, ServerConfig};
pub use dispatcher::Hub;
pub use error::BroadsideError;
pub use notifier::{Delivery, DeliveryOutcome, DeliveryReport, Notifier};
pub use server::{BroadsideServer, BroadsideServerBuilder};

/// The types most servers and tests need, in one import.
pub mod prelude {
    pub use crate::{
        BroadsideError, BroadsideServer, BroadsideServerBuilder, RetryPolicy, ServerConfig,
    };
    pub use broadside_battle::{BattleConfig, BattleState};
    pub use broadside_protocol::{
        AttackStatus, ClientMessage, Envelope, GameId, Position, RoomId, ServerMessage,
        ShipKind, ShipPlacement, UserId,
    };
}
