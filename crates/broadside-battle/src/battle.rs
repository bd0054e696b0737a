//! The authoritative battle: two boards, a turn pointer, and the attack
//! resolution rules.

use broadside_protocol::{AttackStatus, GameId, Position, ShipPlacement, UserId};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::fleet::deploy;
use crate::{BattleConfig, BattleError, BattleState, Board, Ship};

/// One side of a battle.
#[derive(Debug, Clone)]
pub struct Player {
    id: UserId,
    ready: bool,
    board: Board,
    ships: Vec<Ship>,
    alive_cells: usize,
}

impl Player {
    fn new(id: UserId, board_size: u8) -> Self {
        Self {
            id,
            ready: false,
            board: Board::new(board_size),
            ships: Vec::new(),
            alive_cells: 0,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    /// Whether the player's fleet is on the board.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Ship cells not yet accounted for by a sunk ship.
    pub fn alive_cells(&self) -> usize {
        self.alive_cells
    }
}

/// Outcome of a successful [`Battle::add_ships`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The opponent has not placed yet.
    Waiting,
    /// Both fleets are down; the battle is in progress.
    Started { first_turn: UserId },
}

/// The ship that an attack sank, with the cells to reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunkShip {
    pub placement: ShipPlacement,
    pub cells: Vec<Position>,
    /// Cells around the ship, marked attacked by the kill.
    pub neighbors: Vec<Position>,
}

/// The result of one resolved attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub attacker: UserId,
    pub status: AttackStatus,
    pub position: Position,
    pub sunk: Option<SunkShip>,
    /// The attack emptied the opponent's fleet.
    pub finished: bool,
    /// Who attacks next. `None` once the battle is finished.
    pub next_turn: Option<UserId>,
}

/// A battle between two players.
///
/// Every operation validates fully before it mutates anything, so a
/// returned error leaves the battle exactly as it was.
#[derive(Debug, Clone)]
pub struct Battle {
    id: GameId,
    config: BattleConfig,
    players: [Player; 2],
    state: BattleState,
    current_turn: Option<UserId>,
    winner: Option<UserId>,
    last_turn: Option<TurnResult>,
}

impl Battle {
    /// Creates a battle awaiting both fleets.
    pub fn new(id: GameId, players: [UserId; 2], config: BattleConfig) -> Self {
        let [a, b] = players;
        Self {
            id,
            config,
            players: [
                Player::new(a, config.board_size),
                Player::new(b, config.board_size),
            ],
            state: BattleState::AwaitingShips,
            current_turn: None,
            winner: None,
            last_turn: None,
        }
    }

    /// Places `player`'s fleet. When this completes the second fleet, the
    /// battle starts and a uniformly random player gets the first turn.
    ///
    /// # Errors
    /// - [`BattleError::UnknownPlayer`] if `player` is not in this battle
    /// - [`BattleError::InvalidState`] once the battle has started
    /// - [`BattleError::AlreadyPlaced`] on a second fleet from the same player
    /// - [`BattleError::InvalidFleet`] if the fleet breaks a placement rule
    pub fn add_ships<R: Rng + ?Sized>(
        &mut self,
        player: UserId,
        fleet: &[ShipPlacement],
        rng: &mut R,
    ) -> Result<Placement, BattleError> {
        let idx = self.index_of(player)?;
        if self.state != BattleState::AwaitingShips {
            return Err(BattleError::InvalidState(self.state));
        }
        if self.players[idx].ready {
            return Err(BattleError::AlreadyPlaced(player));
        }

        let (board, ships, total) = deploy(&self.config, fleet)?;
        let slot = &mut self.players[idx];
        slot.board = board;
        slot.ships = ships;
        slot.alive_cells = total;
        slot.ready = true;
        tracing::debug!(game_id = %self.id, %player, ships = fleet.len(), cells = total, "fleet placed");

        if !self.players.iter().all(|p| p.ready) {
            return Ok(Placement::Waiting);
        }

        let first_turn = self.players[rng.random_range(0..2)].id;
        self.state = BattleState::InProgress;
        self.current_turn = Some(first_turn);
        tracing::info!(game_id = %self.id, %first_turn, "battle started");
        Ok(Placement::Started { first_turn })
    }

    /// Resolves one attack by `attacker` on the opponent's board.
    ///
    /// With `target` set, that cell is attacked; without it, a uniformly
    /// random cell the attacker has not hit yet. The attacker keeps the
    /// turn after a hit; a plain miss passes it on.
    ///
    /// # Errors
    /// - [`BattleError::UnknownPlayer`] if `attacker` is not in this battle
    /// - [`BattleError::InvalidState`] unless the battle is in progress
    /// - [`BattleError::NotYourTurn`] if the opponent holds the turn
    /// - [`BattleError::OutOfBounds`] / [`BattleError::CellAlreadyAttacked`]
    ///   for a bad explicit target
    /// - [`BattleError::NoTargetsLeft`] if a random attack has nothing left
    pub fn play_turn<R: Rng + ?Sized>(
        &mut self,
        attacker: UserId,
        target: Option<Position>,
        rng: &mut R,
    ) -> Result<TurnResult, BattleError> {
        let idx = self.index_of(attacker)?;
        if self.state != BattleState::InProgress {
            return Err(BattleError::InvalidState(self.state));
        }
        if self.current_turn != Some(attacker) {
            return Err(BattleError::NotYourTurn(attacker));
        }

        let opponent_id = self.players[1 - idx].id;
        let defender = &mut self.players[1 - idx];
        let position = match target {
            Some(pos) => match defender.board.cell(pos) {
                None => return Err(BattleError::OutOfBounds(pos)),
                Some(cell) if cell.attacked => return Err(BattleError::CellAlreadyAttacked(pos)),
                Some(_) => pos,
            },
            None => defender
                .board
                .unattacked()
                .choose(rng)
                .copied()
                .ok_or(BattleError::NoTargetsLeft)?,
        };

        let Some(cell) = defender.board.cell_mut(position) else {
            return Err(BattleError::OutOfBounds(position));
        };
        cell.attacked = true;
        let hit_ship = cell.ship;

        let ship = match hit_ship {
            Some(i) => defender.ships.get_mut(i),
            None => None,
        };
        let (status, sunk) = match ship {
            None => (AttackStatus::Miss, None),
            Some(ship) => {
                if !ship.hit() {
                    (AttackStatus::Shot, None)
                } else {
                    let sunk = SunkShip {
                        placement: ship.placement(),
                        cells: ship.cells().to_vec(),
                        neighbors: ship.neighbors().to_vec(),
                    };
                    defender.alive_cells = defender.alive_cells.saturating_sub(sunk.cells.len());
                    for pos in &sunk.neighbors {
                        if let Some(cell) = defender.board.cell_mut(*pos) {
                            cell.attacked = true;
                        }
                    }
                    (AttackStatus::Killed, Some(sunk))
                }
            }
        };

        let finished = defender.alive_cells == 0;
        if finished {
            self.state = BattleState::Finished;
            self.winner = Some(attacker);
            self.current_turn = None;
            tracing::info!(game_id = %self.id, winner = %attacker, "battle finished");
        } else if status == AttackStatus::Miss {
            self.current_turn = Some(opponent_id);
        }

        let result = TurnResult {
            attacker,
            status,
            position,
            sunk,
            finished,
            next_turn: self.current_turn,
        };
        tracing::debug!(
            game_id = %self.id,
            %attacker,
            %position,
            status = ?result.status,
            "attack resolved"
        );
        self.last_turn = Some(result.clone());
        Ok(result)
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    /// Both combatants, in seat order.
    pub fn players(&self) -> [UserId; 2] {
        [self.players[0].id, self.players[1].id]
    }

    pub fn player(&self, id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn opponent_of(&self, id: UserId) -> Option<UserId> {
        let idx = self.index_of(id).ok()?;
        Some(self.players[1 - idx].id)
    }

    pub fn current_turn(&self) -> Option<UserId> {
        self.current_turn
    }

    pub fn winner(&self) -> Option<UserId> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.state == BattleState::Finished
    }

    /// The fleet exactly as `id` submitted it.
    pub fn ships_of(&self, id: UserId) -> Option<Vec<ShipPlacement>> {
        self.player(id)
            .map(|p| p.ships.iter().map(Ship::placement).collect())
    }

    pub fn board_of(&self, id: UserId) -> Option<&Board> {
        self.player(id).map(|p| &p.board)
    }

    pub fn alive_cells(&self, id: UserId) -> Option<usize> {
        self.player(id).map(|p| p.alive_cells)
    }

    pub fn last_turn(&self) -> Option<&TurnResult> {
        self.last_turn.as_ref()
    }

    fn index_of(&self, id: UserId) -> Result<usize, BattleError> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(BattleError::UnknownPlayer(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_protocol::ShipKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn one_cell(x: u8, y: u8) -> ShipPlacement {
        ShipPlacement {
            position: Position::new(x, y),
            direction: false,
            length: 1,
            kind: ShipKind::Small,
        }
    }

    #[test]
    fn test_new_battle_awaits_ships() {
        let battle = Battle::new(GameId(1), [UserId(1), UserId(2)], BattleConfig::default());
        assert_eq!(battle.state(), BattleState::AwaitingShips);
        assert_eq!(battle.current_turn(), None);
        assert_eq!(battle.opponent_of(UserId(1)), Some(UserId(2)));
        assert_eq!(battle.opponent_of(UserId(3)), None);
        assert_eq!(battle.board_of(UserId(2)).unwrap().cells().len(), 100);
    }

    #[test]
    fn test_attack_before_start_is_invalid_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut battle = Battle::new(GameId(1), [UserId(1), UserId(2)], BattleConfig::default());
        let err = battle
            .play_turn(UserId(1), Some(Position::new(0, 0)), &mut rng)
            .unwrap_err();
        assert_eq!(err, BattleError::InvalidState(BattleState::AwaitingShips));
    }

    #[test]
    fn test_unknown_player_cannot_place() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = BattleConfig { fleet_cells: Some(1), ..BattleConfig::default() };
        let mut battle = Battle::new(GameId(1), [UserId(1), UserId(2)], config);
        let err = battle.add_ships(UserId(9), &[one_cell(0, 0)], &mut rng).unwrap_err();
        assert_eq!(err, BattleError::UnknownPlayer(UserId(9)));
    }

    #[test]
    fn test_invalid_fleet_leaves_player_unready() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut battle = Battle::new(GameId(1), [UserId(1), UserId(2)], BattleConfig::default());
        assert!(battle.add_ships(UserId(1), &[one_cell(0, 0)], &mut rng).is_err());
        assert!(!battle.player(UserId(1)).unwrap().is_ready());
        assert_eq!(battle.alive_cells(UserId(1)), Some(0));
    }
}
