//! Server configuration.

use std::time::Duration;

use broadside_battle::BattleConfig;

/// How hard the notifier tries before dropping a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failed send.
    pub retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Total number of send attempts, first one included.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay: Duration::from_millis(200),
        }
    }
}

/// Everything a [`BroadsideServer`](crate::BroadsideServer) needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Outbound delivery retries.
    pub retry: RetryPolicy,

    /// How long a bot "thinks" before its attack.
    pub bot_delay: Duration,

    /// Board and fleet rules for every battle.
    pub battle: BattleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            retry: RetryPolicy::default(),
            bot_delay: Duration::from_secs(1),
            battle: BattleConfig::default(),
        }
    }
}
