//! Authoritative battleship engine for Broadside.
//!
//! A [`Battle`] owns both boards and enforces every rule: fleet
//! placement, turn order, hit/sink resolution and the win condition.
//! Callers feed it player actions and turn the returned [`TurnResult`]s
//! into messages; the engine itself never touches the network.
//!
//! ```text
//! AwaitingShips ──both fleets──▶ InProgress ──fleet gone──▶ Finished
//! ```
//!
//! Randomness (first turn, random attacks) comes from a caller-supplied
//! [`rand::Rng`], so tests can seed it.

mod battle;
mod board;
mod config;
mod error;
mod fleet;
mod ship;

pub use battle::{Battle, Placement, Player, SunkShip, TurnResult};
pub use board::{Board, Cell};
pub use config::{BattleConfig, BattleState};
pub use error::BattleError;
pub use fleet::standard_fleet;
pub use ship::Ship;
