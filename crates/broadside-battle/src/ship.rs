//! Ships and their derived cell sets.

use broadside_protocol::{Position, ShipPlacement};

use crate::Board;

/// A placed ship.
///
/// `cells` is the footprint; `neighbors` is every cell touching the
/// footprint (diagonals included) that no ship covers. Both are fixed once
/// the fleet is on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    placement: ShipPlacement,
    cells: Vec<Position>,
    neighbors: Vec<Position>,
    hits: u8,
}

impl Ship {
    pub(crate) fn new(placement: ShipPlacement, cells: Vec<Position>) -> Self {
        Self {
            placement,
            cells,
            neighbors: Vec::new(),
            hits: 0,
        }
    }

    pub fn placement(&self) -> ShipPlacement {
        self.placement
    }

    pub fn length(&self) -> u8 {
        self.placement.length
    }

    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    pub fn neighbors(&self) -> &[Position] {
        &self.neighbors
    }

    pub fn is_sunk(&self) -> bool {
        self.hits >= self.placement.length
    }

    /// Records one hit. Returns `true` if that sank the ship.
    pub(crate) fn hit(&mut self) -> bool {
        self.hits = self.hits.saturating_add(1);
        self.is_sunk()
    }

    /// Fills `neighbors` from the finished board. Must run after every
    /// ship of the fleet has been placed.
    pub(crate) fn compute_neighbors(&mut self, board: &Board) {
        let (Some(first), Some(last)) = (self.cells.first(), self.cells.last()) else {
            return;
        };
        let (x0, y0) = (i16::from(first.x) - 1, i16::from(first.y) - 1);
        let (x1, y1) = (i16::from(last.x) + 1, i16::from(last.y) + 1);

        self.neighbors = (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| (x, y)))
            .filter_map(|(x, y)| {
                let x = u8::try_from(x).ok()?;
                let y = u8::try_from(y).ok()?;
                board.cell(Position::new(x, y))
            })
            .filter(|cell| cell.ship.is_none())
            .map(|cell| cell.position)
            .collect();
    }
}

/// The cells a placement would cover, or `None` if any of them is off a
/// board of `size`.
pub(crate) fn footprint(placement: &ShipPlacement, size: u8) -> Option<Vec<Position>> {
    let ShipPlacement {
        position,
        direction: vertical,
        length,
        ..
    } = *placement;
    (0..length)
        .map(|i| {
            let (x, y) = if vertical {
                (u16::from(position.x), u16::from(position.y) + u16::from(i))
            } else {
                (u16::from(position.x) + u16::from(i), u16::from(position.y))
            };
            (x < u16::from(size) && y < u16::from(size))
                .then(|| Position::new(x as u8, y as u8))
        })
        .collect()
}
