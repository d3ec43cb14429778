//! Render-facing copies of live game state

use crate::grid::GridStore;
use crate::stack::DragSession;
use crate::types::{CellId, ColorId, GridPos, Vec3};

/// Render-facing view of one live cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSnapshot {
    pub id: CellId,
    pub color: ColorId,
    /// World position; held cells are resolved against their session anchor
    pub position: Vec3,
    pub scale: f32,
    pub rotation_deg: f32,
    pub merged: bool,
    /// `None` while held
    pub slot: Option<GridPos>,
}

/// Copy of everything a host needs to draw a frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridSnapshot {
    pub width: u16,
    pub height: u16,
    /// Row-major (`y * width + x`) colors of placed cells
    pub slots: Vec<Option<ColorId>>,
    /// Active cells, placed first (row-major) then held cells in stack order
    pub cells: Vec<CellSnapshot>,
    pub dragging: bool,
    pub stack_count: usize,
    pub anchor: Option<Vec3>,
    pub anchor_color: Option<ColorId>,
    pub merging: bool,
    pub locked: bool,
}

impl GridSnapshot {
    pub fn clear(&mut self) {
        self.width = 0;
        self.height = 0;
        self.slots.clear();
        self.cells.clear();
        self.dragging = false;
        self.stack_count = 0;
        self.anchor = None;
        self.anchor_color = None;
        self.merging = false;
        self.locked = false;
    }

    /// Refill from live state, reusing the existing allocations
    pub fn capture(
        &mut self,
        grid: &GridStore,
        drag: Option<&DragSession>,
        merging: Option<&DragSession>,
        locked: bool,
    ) {
        self.clear();
        self.width = grid.width();
        self.height = grid.height();
        for y in 0..grid.height() as i32 {
            for x in 0..grid.width() as i32 {
                let color = grid.try_get(x, y).and_then(|id| grid.cells().color(id));
                self.slots.push(color);
            }
        }

        for (pos, id) in grid.iter_placed() {
            if let Some(cell) = grid.cell(id).filter(|c| c.active) {
                self.cells.push(CellSnapshot {
                    id,
                    color: cell.color,
                    position: cell.position,
                    scale: cell.scale,
                    rotation_deg: cell.rotation_deg,
                    merged: cell.merged,
                    slot: Some(pos),
                });
            }
        }

        for session in merging.into_iter().chain(drag) {
            for &id in session.cells() {
                let Some(cell) = grid.cell(id).filter(|c| c.active && c.is_held()) else {
                    continue;
                };
                self.cells.push(CellSnapshot {
                    id,
                    color: cell.color,
                    position: session.world_position_of(cell),
                    scale: cell.scale,
                    rotation_deg: cell.rotation_deg,
                    merged: cell.merged,
                    slot: None,
                });
            }
        }

        if let Some(session) = drag {
            self.dragging = true;
            self.stack_count = session.count();
            self.anchor = Some(session.anchor());
            self.anchor_color = session.anchor_color();
        }
        self.merging = merging.is_some();
        self.locked = locked;
    }

    pub fn color_at(&self, x: i32, y: i32) -> Option<ColorId> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        self.slots[y as usize * self.width as usize + x as usize]
    }

    /// True when a new drag could start
    pub fn playable(&self) -> bool {
        !self.locked && !self.merging
    }

    pub fn placed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use crate::motion::RecordingScheduler;
    use crate::stack::{DragSession, StackSettings};

    #[test]
    fn test_capture_lists_placed_then_held_cells() {
        let mut grid = GridStore::new(2, 1, GridGeometry::default());
        let a = grid.spawn_cell(ColorId(1), grid.world_position(0, 0, true));
        grid.place(a, 0, 0);
        let b = grid.spawn_cell(ColorId(3), grid.world_position(1, 0, true));
        grid.place(b, 1, 0);

        grid.remove(b);
        let mut session = DragSession::new(StackSettings::default());
        let mut motion = RecordingScheduler::new();
        assert!(session.initialize(b, grid.cells_mut(), &mut motion));

        let mut snap = GridSnapshot::default();
        snap.capture(&grid, Some(&session), None, false);

        assert_eq!(snap.slots, vec![Some(ColorId(1)), None]);
        assert_eq!(snap.placed_count(), 1);
        assert_eq!(snap.cells.len(), 2);
        assert_eq!(snap.cells[0].slot, Some(GridPos::new(0, 0)));
        assert_eq!(snap.cells[1].id, b);
        assert_eq!(snap.cells[1].slot, None);
        assert_eq!(snap.cells[1].position, grid.world_position(1, 0, true));
        assert!(snap.dragging);
        assert_eq!(snap.stack_count, 1);
        assert_eq!(snap.anchor_color, Some(ColorId(3)));
        assert!(snap.playable());
    }

    #[test]
    fn test_capture_reuses_buffer_and_resets_flags() {
        let grid = GridStore::new(3, 2, GridGeometry::default());
        let mut snap = GridSnapshot::default();
        snap.capture(&grid, None, None, true);
        assert!(!snap.playable());

        snap.capture(&grid, None, None, false);
        assert_eq!(snap.slots.len(), 6);
        assert!(snap.cells.is_empty());
        assert!(!snap.dragging);
        assert!(snap.playable());
        assert_eq!(snap.color_at(5, 0), None);
        assert_eq!(snap.color_at(-1, 0), None);
    }
}
