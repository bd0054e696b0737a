//! Bot opponents for single-player matches.
//!
//! A bot is an ordinary user behind a detached peer. It never sends
//! anything; instead, whenever it holds the turn, [`BotController`] arms a
//! timer that fires a [`BotMove`] into a channel. The server drains that
//! channel and runs the move through the hub like any client attack.

use std::collections::HashMap;
use std::time::Duration;

use broadside_battle::{BattleConfig, BattleError, standard_fleet};
use broadside_protocol::{GameId, ShipPlacement, UserId};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// A due bot attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotMove {
    pub game_id: GameId,
    pub bot: UserId,
}

/// Owns the pending bot timers, at most one per battle.
#[derive(Debug)]
pub struct BotController {
    delay: Duration,
    moves: mpsc::UnboundedSender<BotMove>,
    timers: HashMap<GameId, AbortHandle>,
}

impl BotController {
    /// Creates a controller whose timers fire into `moves` after `delay`.
    pub fn new(delay: Duration, moves: mpsc::UnboundedSender<BotMove>) -> Self {
        Self {
            delay,
            moves,
            timers: HashMap::new(),
        }
    }

    /// Arms the timer for `mv`, replacing any pending one for that battle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&mut self, mv: BotMove) {
        let delay = self.delay;
        let moves = self.moves.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only during shutdown.
            let _ = moves.send(mv);
        });
        if let Some(previous) = self.timers.insert(mv.game_id, task.abort_handle()) {
            previous.abort();
        }
        tracing::debug!(game_id = %mv.game_id, bot = %mv.bot, ?delay, "bot move scheduled");
    }

    /// Marks the timer for `game_id` as fired.
    pub fn complete(&mut self, game_id: GameId) {
        self.timers.remove(&game_id);
    }

    /// Aborts the pending timer for a battle, if any.
    pub fn cancel(&mut self, game_id: GameId) {
        if let Some(timer) = self.timers.remove(&game_id) {
            timer.abort();
            tracing::debug!(%game_id, "bot move cancelled");
        }
    }

    /// Aborts every pending timer.
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }

    /// Whether a timer is armed for `game_id`.
    pub fn is_pending(&self, game_id: GameId) -> bool {
        self.timers.contains_key(&game_id)
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

/// The fleet a bot places: the fixed layout for the configured rules.
pub fn bot_fleet(config: &BattleConfig) -> Result<Vec<ShipPlacement>, BattleError> {
    standard_fleet(config)
}
