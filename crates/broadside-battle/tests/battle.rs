//! Integration tests for the battle engine: placement, turns, sinking and
//! the win condition.

use broadside_battle::{Battle, BattleConfig, BattleError, BattleState, Placement, TurnResult};
use broadside_protocol::{AttackStatus, GameId, Position, ShipKind, ShipPlacement, UserId};
use rand::SeedableRng;
use rand::rngs::StdRng;

// =========================================================================
// Helpers
// =========================================================================

const A: UserId = UserId(1);
const B: UserId = UserId(2);

fn ship(x: u8, y: u8, vertical: bool, length: u8) -> ShipPlacement {
    ShipPlacement {
        position: Position::new(x, y),
        direction: vertical,
        length,
        kind: ShipKind::for_length(length),
    }
}

/// Ten cells: a 4, a 3, a vertical 2 and a 1 in the far corner.
fn ten_cell_fleet() -> Vec<ShipPlacement> {
    vec![
        ship(0, 0, false, 4),
        ship(0, 2, false, 3),
        ship(0, 4, true, 2),
        ship(9, 9, false, 1),
    ]
}

fn fleet_cells() -> Vec<Position> {
    let mut cells: Vec<Position> = (0..4).map(|x| Position::new(x, 0)).collect();
    cells.extend((0..3).map(|x| Position::new(x, 2)));
    cells.extend([Position::new(0, 4), Position::new(0, 5), Position::new(9, 9)]);
    cells
}

/// Starts a default battle where both sides use [`ten_cell_fleet`].
/// Returns the battle, the first turn-holder and their opponent.
fn started_battle(rng: &mut StdRng) -> (Battle, UserId, UserId) {
    let mut battle = Battle::new(GameId(7), [A, B], BattleConfig::default());
    assert_eq!(
        battle.add_ships(A, &ten_cell_fleet(), rng).unwrap(),
        Placement::Waiting
    );
    let Placement::Started { first_turn } = battle.add_ships(B, &ten_cell_fleet(), rng).unwrap()
    else {
        panic!("second fleet should start the battle");
    };
    let other = battle.opponent_of(first_turn).unwrap();
    (battle, first_turn, other)
}

fn attack(battle: &mut Battle, who: UserId, x: u8, y: u8, rng: &mut StdRng) -> TurnResult {
    battle
        .play_turn(who, Some(Position::new(x, y)), rng)
        .expect("attack should be accepted")
}

// =========================================================================
// Placement
// =========================================================================

#[test]
fn test_valid_fleet_is_accepted_with_ten_live_cells() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut battle = Battle::new(GameId(1), [A, B], BattleConfig::default());

    battle.add_ships(A, &ten_cell_fleet(), &mut rng).unwrap();
    assert_eq!(battle.alive_cells(A), Some(10));
    assert_eq!(battle.state(), BattleState::AwaitingShips);
    assert_eq!(battle.ships_of(A).unwrap(), ten_cell_fleet());
}

#[test]
fn test_second_fleet_starts_battle_with_a_turn_holder() {
    let mut rng = StdRng::seed_from_u64(3);
    let (battle, first, _) = started_battle(&mut rng);
    assert_eq!(battle.state(), BattleState::InProgress);
    assert_eq!(battle.current_turn(), Some(first));
    assert!(battle.players().contains(&first));
}

#[test]
fn test_first_turn_is_random_across_seeds() {
    let firsts: Vec<UserId> = (0..32)
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            started_battle(&mut rng).1
        })
        .collect();
    assert!(firsts.contains(&A));
    assert!(firsts.contains(&B));
}

#[test]
fn test_placing_twice_or_after_start_fails() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut battle = Battle::new(GameId(1), [A, B], BattleConfig::default());
    battle.add_ships(A, &ten_cell_fleet(), &mut rng).unwrap();
    assert_eq!(
        battle.add_ships(A, &ten_cell_fleet(), &mut rng).unwrap_err(),
        BattleError::AlreadyPlaced(A)
    );

    battle.add_ships(B, &ten_cell_fleet(), &mut rng).unwrap();
    assert_eq!(
        battle.add_ships(B, &ten_cell_fleet(), &mut rng).unwrap_err(),
        BattleError::InvalidState(BattleState::InProgress)
    );
}

#[test]
fn test_overlapping_fleet_is_rejected() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut battle = Battle::new(GameId(1), [A, B], BattleConfig::default());
    let fleet = vec![
        ship(0, 0, false, 4),
        ship(2, 0, true, 3),
        ship(5, 5, false, 2),
        ship(9, 9, false, 1),
    ];
    assert!(matches!(
        battle.add_ships(A, &fleet, &mut rng),
        Err(BattleError::InvalidFleet(_))
    ));
}

// =========================================================================
// Turns
// =========================================================================

#[test]
fn test_miss_passes_the_turn() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut battle, first, other) = started_battle(&mut rng);

    let result = attack(&mut battle, first, 9, 0, &mut rng);
    assert_eq!(result.status, AttackStatus::Miss);
    assert!(!result.finished);
    assert_eq!(result.next_turn, Some(other));
    assert_eq!(battle.current_turn(), Some(other));
}

#[test]
fn test_shot_keeps_the_turn() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut battle, first, other) = started_battle(&mut rng);

    let result = attack(&mut battle, first, 1, 0, &mut rng);
    assert_eq!(result.status, AttackStatus::Shot);
    assert!(result.sunk.is_none());
    assert_eq!(battle.current_turn(), Some(first));
    assert_eq!(battle.alive_cells(other), Some(10));
}

#[test]
fn test_kill_reveals_neighbors_and_keeps_the_turn() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut battle, first, other) = started_battle(&mut rng);

    let result = attack(&mut battle, first, 9, 9, &mut rng);
    assert_eq!(result.status, AttackStatus::Killed);
    assert_eq!(result.next_turn, Some(first));

    let sunk = result.sunk.expect("kill reports the ship");
    assert_eq!(sunk.cells, vec![Position::new(9, 9)]);
    assert_eq!(
        sunk.neighbors,
        vec![Position::new(8, 8), Position::new(9, 8), Position::new(8, 9)]
    );

    let board = battle.board_of(other).unwrap();
    for pos in &sunk.neighbors {
        assert!(board.cell(*pos).unwrap().attacked, "{pos} should be revealed");
    }
    assert_eq!(battle.alive_cells(other), Some(9));
}

#[test]
fn test_revealed_neighbor_cannot_be_attacked() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut battle, first, _) = started_battle(&mut rng);
    attack(&mut battle, first, 9, 9, &mut rng);

    let err = battle
        .play_turn(first, Some(Position::new(8, 8)), &mut rng)
        .unwrap_err();
    assert_eq!(err, BattleError::CellAlreadyAttacked(Position::new(8, 8)));
}

#[test]
fn test_repeat_attack_is_rejected_and_changes_nothing() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut battle, first, other) = started_battle(&mut rng);
    attack(&mut battle, first, 0, 0, &mut rng);

    let board_before = battle.board_of(other).unwrap().clone();
    let last_before = battle.last_turn().cloned();

    let err = battle
        .play_turn(first, Some(Position::new(0, 0)), &mut rng)
        .unwrap_err();
    assert_eq!(err, BattleError::CellAlreadyAttacked(Position::new(0, 0)));
    assert_eq!(battle.current_turn(), Some(first));
    assert_eq!(battle.board_of(other).unwrap(), &board_before);
    assert_eq!(battle.last_turn().cloned(), last_before);
}

#[test]
fn test_out_of_turn_and_out_of_bounds_are_rejected() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut battle, first, other) = started_battle(&mut rng);

    assert_eq!(
        battle
            .play_turn(other, Some(Position::new(5, 5)), &mut rng)
            .unwrap_err(),
        BattleError::NotYourTurn(other)
    );
    assert_eq!(
        battle
            .play_turn(first, Some(Position::new(10, 3)), &mut rng)
            .unwrap_err(),
        BattleError::OutOfBounds(Position::new(10, 3))
    );
    assert_eq!(battle.current_turn(), Some(first));
    assert!(battle.last_turn().is_none());
}

#[test]
fn test_random_attack_targets_unattacked_cells() {
    let mut rng = StdRng::seed_from_u64(11);
    let (mut battle, first, other) = started_battle(&mut rng);
    attack(&mut battle, first, 9, 9, &mut rng);
    let revealed: Vec<Position> = battle
        .board_of(other)
        .unwrap()
        .cells()
        .iter()
        .filter(|c| c.attacked)
        .map(|c| c.position)
        .collect();

    let result = battle.play_turn(first, None, &mut rng).unwrap();
    assert!(!revealed.contains(&result.position));
    assert!(battle.board_of(other).unwrap().cell(result.position).unwrap().attacked);
    assert_eq!(battle.last_turn(), Some(&result));
}

// =========================================================================
// Finishing
// =========================================================================

#[test]
fn test_battle_finishes_exactly_when_fleet_is_gone() {
    let mut rng = StdRng::seed_from_u64(9);
    let (mut battle, first, other) = started_battle(&mut rng);

    let cells = fleet_cells();
    let (last, rest) = cells.split_last().unwrap();
    for pos in rest {
        let result = attack(&mut battle, first, pos.x, pos.y, &mut rng);
        assert!(!result.finished);
        assert_ne!(result.status, AttackStatus::Miss);
        assert!(!battle.is_finished());
    }

    let result = attack(&mut battle, first, last.x, last.y, &mut rng);
    assert_eq!(result.status, AttackStatus::Killed);
    assert!(result.finished);
    assert_eq!(result.next_turn, None);
    assert_eq!(battle.state(), BattleState::Finished);
    assert_eq!(battle.winner(), Some(first));
    assert_eq!(battle.alive_cells(other), Some(0));
    assert_eq!(battle.alive_cells(first), Some(10));
}

#[test]
fn test_single_cell_fleets_end_in_one_shot() {
    let mut rng = StdRng::seed_from_u64(1);
    let config = BattleConfig {
        fleet_cells: Some(1),
        ..BattleConfig::default()
    };
    let mut battle = Battle::new(GameId(2), [A, B], config);
    battle.add_ships(A, &[ship(0, 0, false, 1)], &mut rng).unwrap();
    let Placement::Started { first_turn } = battle
        .add_ships(B, &[ship(0, 0, false, 1)], &mut rng)
        .unwrap()
    else {
        panic!("battle should start");
    };

    let result = attack(&mut battle, first_turn, 0, 0, &mut rng);
    assert_eq!(result.status, AttackStatus::Killed);
    assert!(result.finished);
    assert_eq!(battle.winner(), Some(first_turn));
}

#[test]
fn test_finished_battle_rejects_further_attacks() {
    let mut rng = StdRng::seed_from_u64(1);
    let config = BattleConfig {
        fleet_cells: None,
        ..BattleConfig::default()
    };
    let mut battle = Battle::new(GameId(3), [A, B], config);
    battle.add_ships(A, &[ship(4, 4, false, 1)], &mut rng).unwrap();
    let Placement::Started { first_turn } = battle
        .add_ships(B, &[ship(4, 4, false, 1)], &mut rng)
        .unwrap()
    else {
        panic!("battle should start");
    };
    attack(&mut battle, first_turn, 4, 4, &mut rng);
    let other = battle.opponent_of(first_turn).unwrap();

    for who in [first_turn, other] {
        assert_eq!(
            battle.play_turn(who, None, &mut rng).unwrap_err(),
            BattleError::InvalidState(BattleState::Finished)
        );
    }
}
