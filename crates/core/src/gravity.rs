//! Gravity module - column compaction and top-up spawning
//!
//! After a merge every column is repacked toward row 0 and refilled to full
//! height:
//!
//! 1. the interaction lock is acquired (a second concurrent pass is rejected);
//! 2. each column's placed cells are detached bottom-up and re-placed from row 0
//!    upward in the same relative order, so cells never pass each other;
//! 3. every still-empty slot, scanned top-down, receives a new cell of a random
//!    palette color that drops in from one row above the column;
//! 4. the lock release is scheduled after a fixed delay.
//!
//! The release in step 4 is a timer, not tied to the drop motions: when a drop
//! outlasts the delay, input reopens while cells are still moving.

use tracing::{debug, warn};

use crate::grid::GridStore;
use crate::lock::InteractionLock;
use crate::motion::{Completion, MotionRequest, MotionScheduler};
use crate::palette::Palette;
use crate::types::{CellId, ColorId, Ease, DROP_DURATION_MS, INTERACTION_RELEASE_MS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravitySettings {
    pub drop_duration_ms: u32,
    pub drop_ease: Ease,
    pub release_delay_ms: u32,
}

impl Default for GravitySettings {
    fn default() -> Self {
        Self {
            drop_duration_ms: DROP_DURATION_MS,
            drop_ease: Ease::OutBack,
            release_delay_ms: INTERACTION_RELEASE_MS,
        }
    }
}

/// A surviving cell re-placed by compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellDrop {
    pub cell: CellId,
    pub column: i32,
    pub from_row: i32,
    pub to_row: i32,
}

/// A cell created to fill an empty slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpawn {
    pub cell: CellId,
    pub column: i32,
    pub row: i32,
    pub color: ColorId,
}

/// Outcome of one gravity pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GravityReport {
    pub drops: Vec<CellDrop>,
    pub spawns: Vec<CellSpawn>,
    /// True when no spawn source was available and empty slots stayed empty
    pub spawn_skipped: bool,
}

impl GravityReport {
    /// Drops that actually changed row
    pub fn moved(&self) -> impl Iterator<Item = &CellDrop> {
        self.drops.iter().filter(|d| d.from_row != d.to_row)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GravityResolver {
    settings: GravitySettings,
}

impl GravityResolver {
    pub fn new(settings: GravitySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GravitySettings {
        &self.settings
    }

    /// Run a full pass over every column
    ///
    /// Returns `None` when the interaction lock is already held. A missing or
    /// empty palette only skips the spawn phase.
    pub fn resolve(
        &self,
        grid: &mut GridStore,
        palette: Option<&mut Palette>,
        lock: &mut InteractionLock,
        motion: &mut dyn MotionScheduler,
    ) -> Option<GravityReport> {
        if !lock.acquire() {
            debug!("gravity pass rejected: interaction lock held");
            return None;
        }

        let mut report = GravityReport::default();
        for x in 0..grid.width() as i32 {
            self.compact_column(grid, x, motion, &mut report);
        }

        match palette {
            Some(palette) if !palette.is_empty() => {
                for x in 0..grid.width() as i32 {
                    self.fill_column(grid, x, palette, motion, &mut report);
                }
            }
            _ => {
                warn!("cannot spawn new cells: palette not set");
                report.spawn_skipped = true;
            }
        }

        motion.delay(self.settings.release_delay_ms, Completion::ReleaseInteraction);

        debug!(
            moved = report.moved().count(),
            spawned = report.spawns.len(),
            "gravity pass resolved"
        );
        Some(report)
    }

    /// Detach a column's cells and re-place them from row 0 upward
    fn compact_column(
        &self,
        grid: &mut GridStore,
        x: i32,
        motion: &mut dyn MotionScheduler,
        report: &mut GravityReport,
    ) {
        let mut detached = Vec::new();
        for y in 0..grid.height() as i32 {
            if let Some(id) = grid.remove_at(x, y) {
                detached.push((y, id));
            }
        }

        // `detached` is already in ascending row order; filling rows 0.. in that
        // order keeps the relative order of the column.
        for (to_row, (from_row, id)) in detached.into_iter().enumerate() {
            let to_row = to_row as i32;
            grid.place(id, x, to_row);

            let target = grid.world_position(x, to_row, true);
            motion.kill(id);
            motion.request(MotionRequest::move_to(
                id,
                target,
                self.settings.drop_duration_ms,
                self.settings.drop_ease,
            ));

            report.drops.push(CellDrop {
                cell: id,
                column: x,
                from_row,
                to_row,
            });
        }
    }

    /// Fill every empty slot of a column, top-down
    fn fill_column(
        &self,
        grid: &mut GridStore,
        x: i32,
        palette: &mut Palette,
        motion: &mut dyn MotionScheduler,
        report: &mut GravityReport,
    ) {
        let height = grid.height() as i32;
        let spawn_at = grid.world_position(x, height, true);

        for y in (0..height).rev() {
            if !grid.is_empty_at(x, y) {
                continue;
            }
            let Some(color) = palette.random_color() else {
                return;
            };

            let id = grid.spawn_cell(color, spawn_at);
            grid.place(id, x, y);
            if let Some(cell) = grid.cell_mut(id) {
                cell.hit_testable = true;
            }

            motion.request(MotionRequest::move_to(
                id,
                grid.world_position(x, y, true),
                self.settings.drop_duration_ms,
                self.settings.drop_ease,
            ));

            report.spawns.push(CellSpawn {
                cell: id,
                column: x,
                row: y,
                color,
            });
        }
    }
}
