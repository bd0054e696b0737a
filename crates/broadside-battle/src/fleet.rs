//! Fleet validation and the fixed layout used by bots.

use std::collections::HashSet;

use broadside_protocol::{Position, ShipKind, ShipPlacement};

use crate::ship::footprint;
use crate::{BattleConfig, BattleError, Board, Ship};

/// Ship lengths of the classic ten-ship fleet (20 cells).
const CLASSIC_MIX: [u8; 10] = [4, 3, 3, 2, 2, 2, 1, 1, 1, 1];

/// Checks a fleet against the rules and lays it out on a fresh board.
///
/// Returns the board (ship indices filled in), the ships with their
/// neighbor sets computed, and the total number of ship cells.
pub(crate) fn deploy(
    config: &BattleConfig,
    fleet: &[ShipPlacement],
) -> Result<(Board, Vec<Ship>, usize), BattleError> {
    if fleet.is_empty() {
        return Err(BattleError::InvalidFleet("fleet is empty".into()));
    }

    let mut occupied = HashSet::new();
    let mut ships = Vec::with_capacity(fleet.len());
    for placement in fleet {
        if placement.length == 0 || placement.length > config.max_ship_length {
            return Err(BattleError::InvalidFleet(format!(
                "ship at {} has length {}, expected 1..={}",
                placement.position, placement.length, config.max_ship_length
            )));
        }
        let cells = footprint(placement, config.board_size).ok_or_else(|| {
            BattleError::InvalidFleet(format!(
                "ship at {} does not fit on the board",
                placement.position
            ))
        })?;
        if let Some(clash) = cells.iter().find(|c| !occupied.insert(**c)) {
            return Err(BattleError::InvalidFleet(format!("ships overlap at {clash}")));
        }
        ships.push(Ship::new(*placement, cells));
    }

    let total = occupied.len();
    if let Some(expected) = config.fleet_cells {
        if total != expected {
            return Err(BattleError::InvalidFleet(format!(
                "fleet covers {total} cells, expected {expected}"
            )));
        }
    }

    let mut board = Board::new(config.board_size);
    for (index, ship) in ships.iter().enumerate() {
        for pos in ship.cells() {
            if let Some(cell) = board.cell_mut(*pos) {
                cell.ship = Some(index);
            }
        }
    }
    for ship in &mut ships {
        ship.compute_neighbors(&board);
    }

    Ok((board, ships, total))
}

/// A fixed, valid fleet for the given rules.
///
/// Ship lengths are taken greedily from the classic mix until the
/// configured cell total is covered (the full classic fleet when the total
/// is unconstrained). Ships lie horizontally in two columns on even rows,
/// so no two ships touch.
pub fn standard_fleet(config: &BattleConfig) -> Result<Vec<ShipPlacement>, BattleError> {
    let target = config
        .fleet_cells
        .unwrap_or_else(|| CLASSIC_MIX.iter().map(|l| *l as usize).sum());

    let mut lengths = Vec::new();
    let mut remaining = target;
    for length in CLASSIC_MIX {
        let length = length.min(config.max_ship_length);
        if usize::from(length) <= remaining {
            lengths.push(length);
            remaining -= usize::from(length);
        }
    }
    while remaining > 0 {
        let length = remaining.min(usize::from(config.max_ship_length.max(1))) as u8;
        lengths.push(length);
        remaining -= usize::from(length);
    }

    let column_width = config.max_ship_length.saturating_add(1);
    let slots = (0..config.board_size)
        .step_by(2)
        .flat_map(|y| {
            (0..config.board_size)
                .step_by(usize::from(column_width.max(1)))
                .map(move |x| Position::new(x, y))
        })
        .filter(|p| p.x.saturating_add(config.max_ship_length) <= config.board_size);

    let fleet: Vec<ShipPlacement> = lengths
        .iter()
        .zip(slots)
        .map(|(length, position)| ShipPlacement {
            position,
            direction: false,
            length: *length,
            kind: ShipKind::for_length(*length),
        })
        .collect();

    if fleet.len() < lengths.len() {
        return Err(BattleError::InvalidFleet(format!(
            "{target} ship cells do not fit on a {size}x{size} board",
            size = config.board_size
        )));
    }
    Ok(fleet)
}
