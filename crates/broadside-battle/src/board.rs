//! One player's grid of cells.

use broadside_protocol::Position;

/// A single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub position: Position,
    /// Hit by an attack, or revealed around a sunk ship.
    pub attacked: bool,
    /// Index into the owner's fleet, if a ship covers this cell.
    pub ship: Option<usize>,
}

/// A square grid, stored row-major. Always `size * size` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: u8,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(size: u8) -> Self {
        let cells = (0..size)
            .flat_map(|y| {
                (0..size).map(move |x| Cell {
                    position: Position::new(x, y),
                    attacked: false,
                    ship: None,
                })
            })
            .collect();
        Self { size, cells }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.size && pos.y < self.size
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.index(pos).map(|i| &mut self.cells[i])
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Positions not yet attacked, row-major.
    pub fn unattacked(&self) -> Vec<Position> {
        self.cells
            .iter()
            .filter(|c| !c.attacked)
            .map(|c| c.position)
            .collect()
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos)
            .then(|| pos.y as usize * self.size as usize + pos.x as usize)
    }
}
