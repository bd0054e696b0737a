//! Error types for the battle engine.

use broadside_protocol::{Position, UserId};

use crate::BattleState;

/// Rule violations reported by [`Battle`](crate::Battle).
///
/// None of these change battle state: every check runs before the first
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    /// The player is not one of the two combatants.
    #[error("player {0} is not in this battle")]
    UnknownPlayer(UserId),

    /// The player tried to attack while the opponent holds the turn.
    #[error("it is not {0}'s turn")]
    NotYourTurn(UserId),

    /// The target cell was attacked (or revealed) before.
    #[error("cell {0} was already attacked")]
    CellAlreadyAttacked(Position),

    /// The target cell is not on the board.
    #[error("cell {0} is off the board")]
    OutOfBounds(Position),

    /// The submitted fleet breaks a placement rule.
    #[error("invalid fleet: {0}")]
    InvalidFleet(String),

    /// The player already submitted a fleet.
    #[error("player {0} already placed ships")]
    AlreadyPlaced(UserId),

    /// The operation is not allowed in the battle's current state.
    #[error("battle is {0}")]
    InvalidState(BattleState),

    /// Every opponent cell has been attacked.
    #[error("no cells left to attack")]
    NoTargetsLeft,
}
