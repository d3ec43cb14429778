//! Grid module - the authoritative coordinate → cell mapping
//!
//! The grid is a `width × height` set of slots stored as a flat row-major array
//! (`y * width + x`). Row 0 is the bottom row. A slot is either empty or refers
//! to a placed cell in the store's [`CellArena`].
//!
//! The store also owns the geometry used to convert between grid coordinates and
//! world space. The grid is centered on `origin`: `world_position(0, 0, false)`
//! is `origin - (width/2 · cell.x, height/2 · cell.y)`.

use tracing::{debug, warn};

use crate::cell::{Cell, CellArena, CellLocation};
use crate::types::{CellId, ColorId, GridPos, Vec2, Vec3, DEFAULT_CELL_SIZE};

/// Geometric parameters for coordinate conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub cell_size: Vec2,
    /// World position of the grid center
    pub origin: Vec3,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            origin: Vec3::ZERO,
        }
    }
}

/// Grid store - fixed size slot mapping plus the cell arena
#[derive(Debug, Clone)]
pub struct GridStore {
    width: u16,
    height: u16,
    geometry: GridGeometry,
    /// Flat array of slots, row-major order (y * width + x)
    slots: Vec<Option<CellId>>,
    cells: CellArena,
}

impl GridStore {
    /// Create an empty grid
    ///
    /// Zero dimensions are raised to 1.
    pub fn new(width: u16, height: u16, geometry: GridGeometry) -> Self {
        if width == 0 || height == 0 {
            warn!(width, height, "grid dimensions raised to at least 1x1");
        }
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            geometry,
            slots: vec![None; width as usize * height as usize],
            cells: CellArena::new(),
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Grid coordinate → world space
    ///
    /// With `snap_to_center` the cell's center is returned, otherwise its lower
    /// corner.
    pub fn world_position(&self, x: i32, y: i32, snap_to_center: bool) -> Vec3 {
        let GridGeometry { cell_size, origin } = self.geometry;
        let half_w = self.width as f32 / 2.0;
        let half_h = self.height as f32 / 2.0;

        let corner = Vec3::new(
            (x as f32 - half_w) * cell_size.x,
            (y as f32 - half_h) * cell_size.y,
            0.0,
        ) + origin;

        if !snap_to_center {
            return corner;
        }
        corner + Vec3::new(cell_size.x * 0.5, cell_size.y * 0.5, 0.0)
    }

    /// World space → grid coordinate, floored but not clamped
    ///
    /// The result may lie outside the grid.
    pub fn grid_position_unclamped(&self, point: Vec3) -> GridPos {
        let GridGeometry { cell_size, origin } = self.geometry;
        let rel_x = (point.x - origin.x) / cell_size.x;
        let rel_y = (point.y - origin.y) / cell_size.y;

        GridPos::new(
            (rel_x + self.width as f32 / 2.0).floor() as i32,
            (rel_y + self.height as f32 / 2.0).floor() as i32,
        )
    }

    /// World space → grid coordinate, clamped into the grid
    ///
    /// Any point, including one far outside the grid, resolves to a valid
    /// coordinate; off-grid points land on the nearest edge slot.
    pub fn grid_position(&self, point: Vec3) -> GridPos {
        let raw = self.grid_position_unclamped(point);
        GridPos::new(
            raw.x.clamp(0, self.width as i32 - 1),
            raw.y.clamp(0, self.height as i32 - 1),
        )
    }

    /// Center of the slot containing `point` (after clamping)
    pub fn snap(&self, point: Vec3) -> Vec3 {
        let pos = self.grid_position(point);
        self.world_position(pos.x, pos.y, true)
    }

    /// Cell placed at (x, y), if any; `None` when out of bounds
    pub fn try_get(&self, x: i32, y: i32) -> Option<CellId> {
        self.index(x, y).and_then(|idx| self.slots[idx])
    }

    pub fn try_get_at(&self, pos: GridPos) -> Option<CellId> {
        self.try_get(pos.x, pos.y)
    }

    pub fn is_empty_at(&self, x: i32, y: i32) -> bool {
        matches!(self.index(x, y), Some(idx) if self.slots[idx].is_none())
    }

    /// Place a cell at (x, y)
    ///
    /// Returns false (no-op) when out of bounds or when the cell does not exist.
    /// The slot is expected to be empty; a previous occupant is evicted and
    /// becomes held.
    pub fn place(&mut self, id: CellId, x: i32, y: i32) -> bool {
        let Some(idx) = self.index(x, y) else {
            debug!(cell = %id, x, y, "place out of bounds ignored");
            return false;
        };
        if !self.cells.contains(id) {
            warn!(cell = %id, "place of unknown cell ignored");
            return false;
        }

        if let Some(previous) = self.slots[idx] {
            if previous != id {
                warn!(cell = %id, evicted = %previous, x, y, "place overwrote an occupied slot");
                if let Some(evicted) = self.cells.get_mut(previous) {
                    evicted.location = CellLocation::Held;
                }
            }
        }

        // A cell owns at most one slot.
        if let Some(CellLocation::Placed(old)) = self.cells.get(id).map(|c| c.location) {
            if let Some(old_idx) = self.index(old.x, old.y) {
                if old_idx != idx && self.slots[old_idx] == Some(id) {
                    self.slots[old_idx] = None;
                }
            }
        }

        self.slots[idx] = Some(id);
        if let Some(cell) = self.cells.get_mut(id) {
            let pos = GridPos::new(x, y);
            cell.location = CellLocation::Placed(pos);
            cell.home = pos;
        }
        true
    }

    /// Clear the slot at (x, y); the cell becomes held but keeps its home
    pub fn remove_at(&mut self, x: i32, y: i32) -> Option<CellId> {
        let idx = self.index(x, y)?;
        let id = self.slots[idx].take()?;
        if let Some(cell) = self.cells.get_mut(id) {
            cell.location = CellLocation::Held;
        }
        Some(id)
    }

    /// Detach a placed cell and disable its hit-testing
    ///
    /// Returns false if the cell is unknown or not placed.
    pub fn remove(&mut self, id: CellId) -> bool {
        let Some(pos) = self.cells.get(id).and_then(Cell::grid_pos) else {
            return false;
        };
        if let Some(cell) = self.cells.get_mut(id) {
            cell.hit_testable = false;
        }
        self.remove_at(pos.x, pos.y) == Some(id)
    }

    /// Spawn factory: create a held cell at a world position
    pub fn spawn_cell(&mut self, color: ColorId, position: Vec3) -> CellId {
        self.cells.create(color, position)
    }

    /// Destroy a cell, clearing its slot if it is placed
    pub fn destroy_cell(&mut self, id: CellId) -> Option<Cell> {
        if let Some(pos) = self.cells.get(id).and_then(Cell::grid_pos) {
            if let Some(idx) = self.index(pos.x, pos.y) {
                if self.slots[idx] == Some(id) {
                    self.slots[idx] = None;
                }
            }
        }
        self.cells.destroy(id)
    }

    /// Destroy every placed cell; held cells are left alone
    pub fn clear_placed(&mut self) -> usize {
        let mut removed = 0;
        for idx in 0..self.slots.len() {
            if let Some(id) = self.slots[idx].take() {
                self.cells.destroy(id);
                removed += 1;
            }
        }
        removed
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id)
    }

    pub fn cells(&self) -> &CellArena {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut CellArena {
        &mut self.cells
    }

    /// Placed cells of column `x`, bottom to top
    pub fn column(&self, x: i32) -> Vec<CellId> {
        (0..self.height as i32)
            .filter_map(|y| self.try_get(x, y))
            .collect()
    }

    /// Lowest empty row of column `x`, `None` when the column is full
    pub fn lowest_empty_row(&self, x: i32) -> Option<i32> {
        (0..self.height as i32).find(|&y| self.is_empty_at(x, y))
    }

    /// Placed cells in row-major order
    pub fn iter_placed(&self) -> impl Iterator<Item = (GridPos, CellId)> + '_ {
        let width = self.width as usize;
        self.slots.iter().enumerate().filter_map(move |(idx, slot)| {
            slot.map(|id| (GridPos::new((idx % width) as i32, (idx / width) as i32), id))
        })
    }

    pub fn placed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
