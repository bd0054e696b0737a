//! Battle configuration and lifecycle state.

use std::fmt;

/// Rules for one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleConfig {
    /// Width and height of each board.
    pub board_size: u8,

    /// Total number of ship cells each fleet must cover. `None` accepts
    /// any non-empty fleet.
    pub fleet_cells: Option<usize>,

    /// Longest allowed ship.
    pub max_ship_length: u8,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            board_size: 10,
            fleet_cells: Some(10),
            max_ship_length: 4,
        }
    }
}

/// The lifecycle state of a battle.
///
/// ```text
/// AwaitingShips → InProgress → Finished
/// ```
///
/// - **AwaitingShips**: created from a filled room; fleets are being placed.
/// - **InProgress**: both fleets placed; players take turns attacking.
/// - **Finished**: one fleet is gone. Nothing changes after this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattleState {
    AwaitingShips,
    InProgress,
    Finished,
}

impl fmt::Display for BattleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingShips => "awaiting ships",
            Self::InProgress => "in progress",
            Self::Finished => "finished",
        })
    }
}
