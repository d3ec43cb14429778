//! Cell module - cell records and the arena that owns them
//!
//! A cell is either *placed* (it owns a grid slot) or *held* (it belongs to a
//! drag session). The arena owns every live cell regardless of location; the
//! grid mapping and the session only store [`CellId`]s.

use std::collections::BTreeMap;

use crate::types::{CellId, ColorId, GridPos, Vec3};

/// Where a cell currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLocation {
    Placed(GridPos),
    Held,
}

/// A single colored grid unit
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub color: ColorId,
    pub location: CellLocation,
    /// Last slot the cell was placed at; restores return it here
    pub home: GridPos,
    /// World position (authoritative while placed)
    pub position: Vec3,
    /// Offset from the session anchor (authoritative while held)
    pub local: Vec3,
    pub scale: f32,
    pub rotation_deg: f32,
    pub hit_testable: bool,
    /// Switched on by the merge animation
    pub merged: bool,
    /// Cleared when the merge animation retires the cell
    pub active: bool,
}

impl Cell {
    fn new(id: CellId, color: ColorId, position: Vec3) -> Self {
        Self {
            id,
            color,
            location: CellLocation::Held,
            home: GridPos::ZERO,
            position,
            local: Vec3::ZERO,
            scale: 1.0,
            rotation_deg: 0.0,
            hit_testable: false,
            merged: false,
            active: true,
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self.location, CellLocation::Placed(_))
    }

    pub fn is_held(&self) -> bool {
        self.location == CellLocation::Held
    }

    /// Grid slot when placed
    pub fn grid_pos(&self) -> Option<GridPos> {
        match self.location {
            CellLocation::Placed(pos) => Some(pos),
            CellLocation::Held => None,
        }
    }
}

/// Owner of every live cell
///
/// Ids increase monotonically and are never reused.
#[derive(Debug, Clone, Default)]
pub struct CellArena {
    cells: BTreeMap<CellId, Cell>,
    next_id: u32,
}

impl CellArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a held cell at a world position
    pub fn create(&mut self, color: ColorId, position: Vec3) -> CellId {
        let id = CellId(self.next_id);
        self.next_id += 1;
        self.cells.insert(id, Cell::new(id, color, position));
        id
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn color(&self, id: CellId) -> Option<ColorId> {
        self.cells.get(&id).map(|c| c.color)
    }

    /// Destroy a cell; returns it if it existed
    pub fn destroy(&mut self, id: CellId) -> Option<Cell> {
        self.cells.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.values_mut()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
