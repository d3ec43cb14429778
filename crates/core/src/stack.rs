//! Stack module - the transient drag session
//!
//! A [`DragSession`] is the ordered set of same-colored cells a player has
//! collected during one drag. It owns no cells permanently: cells are held while
//! the drag lasts and either go back to the grid or are retired by the merge
//! animation.
//!
//! Held cells are positioned relative to the session anchor: a cell's world
//! position is `anchor + cell.local`. Every added cell flies to
//! `stack_offset * index`, so later cells stack further along the offset axis.
//!
//! # Merge animation
//!
//! 1. every cell switches to its merged look, then `settle_ms` elapses
//!    ([`Completion::MergeSettled`]);
//! 2. cells retire in **reverse insertion order**, retirement `k` starting at
//!    `k * stagger_ms`; each is a scale-to-zero joined with a rotation and ends
//!    with a [`Completion::CellRetired`];
//! 3. the caller's completion fires once after the last retirement.

use tracing::{debug, warn};

use crate::cell::{Cell, CellArena};
use crate::motion::{Completion, MotionRequest, MotionScheduler, SequenceStep};
use crate::types::{
    CellId, ColorId, Ease, Vec3, CELL_ADD_DURATION_MS, MERGE_SETTLE_MS, MERGE_STAGGER_MS,
    RETIRE_ROTATE_MS, RETIRE_ROTATION_DEG, RETIRE_SHRINK_MS, STACK_MOVE_SPEED, STACK_OFFSET,
};

/// Tunables for the stack feel and the merge animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackSettings {
    pub move_speed: f32,
    pub offset: Vec3,
    pub add_duration_ms: u32,
    pub settle_ms: u32,
    pub stagger_ms: u32,
    pub shrink_ms: u32,
    pub rotate_ms: u32,
    pub rotation_deg: f32,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            move_speed: STACK_MOVE_SPEED,
            offset: STACK_OFFSET,
            add_duration_ms: CELL_ADD_DURATION_MS,
            settle_ms: MERGE_SETTLE_MS,
            stagger_ms: MERGE_STAGGER_MS,
            shrink_ms: RETIRE_SHRINK_MS,
            rotate_ms: RETIRE_ROTATE_MS,
            rotation_deg: RETIRE_ROTATION_DEG,
        }
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Following the pointer and absorbing cells
    Collecting,
    /// Merged look shown, waiting for the settle delay
    Settling,
    /// Staggered retirement running
    Retiring,
    Finished,
}

#[derive(Debug, Clone)]
pub struct DragSession {
    cells: Vec<CellId>,
    anchor_color: Option<ColorId>,
    anchor: Vec3,
    settings: StackSettings,
    phase: SessionPhase,
    on_complete: Option<Completion>,
    retired: Vec<CellId>,
}

impl DragSession {
    pub fn new(settings: StackSettings) -> Self {
        Self {
            cells: Vec::new(),
            anchor_color: None,
            anchor: Vec3::ZERO,
            settings,
            phase: SessionPhase::Collecting,
            on_complete: None,
            retired: Vec::new(),
        }
    }

    /// Reset and seed the session with its first cell
    ///
    /// The anchor color and position come from `first`. Returns false if the
    /// cell does not exist.
    pub fn initialize(
        &mut self,
        first: CellId,
        cells: &mut CellArena,
        motion: &mut dyn MotionScheduler,
    ) -> bool {
        let Some(cell) = cells.get(first) else {
            return false;
        };
        self.clear();
        self.anchor_color = Some(cell.color);
        self.anchor = cell.position;
        self.add_cell(first, cells, motion)
    }

    /// Append a cell of the anchor color and fly it to its stack slot
    ///
    /// Mismatched colors are rejected with a warning and leave the session
    /// unchanged.
    pub fn add_cell(
        &mut self,
        id: CellId,
        cells: &mut CellArena,
        motion: &mut dyn MotionScheduler,
    ) -> bool {
        let Some(cell) = cells.get_mut(id) else {
            return false;
        };
        if let Some(expected) = self.anchor_color {
            if cell.color != expected {
                warn!(
                    cell = %id,
                    expected = expected.0,
                    got = cell.color.0,
                    "cannot add cell with different color to stack"
                );
                return false;
            }
        }
        if self.cells.contains(&id) {
            return false;
        }

        self.cells.push(id);
        // Keep the cell where it is on screen; its offset then animates.
        cell.local = cell.position - self.anchor;

        let index = (self.cells.len() - 1) as f32;
        motion.kill(id);
        motion.request(MotionRequest::local_move_to(
            id,
            self.settings.offset * index,
            self.settings.add_duration_ms,
            Ease::OutBack,
        ));
        debug!(cell = %id, count = self.cells.len(), "cell added to stack");
        true
    }

    /// True when the session is empty or `cell` has the anchor color
    pub fn can_add(&self, cell: &Cell) -> bool {
        match self.anchor_color {
            None => true,
            Some(color) => self.cells.is_empty() || cell.color == color,
        }
    }

    /// Exponential smoothing toward `target`: `anchor ← lerp(anchor, target, speed·dt)`
    pub fn update_position(&mut self, target: Vec3, dt_secs: f32) {
        self.anchor = self
            .anchor
            .lerp(target, self.settings.move_speed * dt_secs);
    }

    /// Start the two-phase merge animation
    ///
    /// Returns `Some(on_complete)` when the session is empty: there is nothing
    /// to animate and the caller must handle the completion right away.
    pub fn play_merge_animation(
        &mut self,
        cells: &mut CellArena,
        motion: &mut dyn MotionScheduler,
        on_complete: Completion,
    ) -> Option<Completion> {
        if self.cells.is_empty() {
            self.phase = SessionPhase::Finished;
            return Some(on_complete);
        }

        for id in self.cells.iter().rev() {
            if let Some(cell) = cells.get_mut(*id) {
                cell.merged = true;
            }
        }
        self.on_complete = Some(on_complete);
        self.phase = SessionPhase::Settling;
        motion.delay(self.settings.settle_ms, Completion::MergeSettled);
        debug!(count = self.cells.len(), "merge animation started");
        None
    }

    /// Second merge phase: schedule the staggered retirements
    ///
    /// Returns false unless the session is settling.
    pub fn begin_retirement(&mut self, motion: &mut dyn MotionScheduler) -> bool {
        if self.phase != SessionPhase::Settling {
            return false;
        }

        let mut steps = Vec::with_capacity(self.cells.len() * 2);
        for (k, &id) in self.cells.iter().rev().enumerate() {
            let at_ms = k as u32 * self.settings.stagger_ms;
            motion.kill(id);
            steps.push(SequenceStep {
                at_ms,
                request: MotionRequest::scale_to(id, 0.0, self.settings.shrink_ms, Ease::InBack)
                    .with_completion(Completion::CellRetired(id)),
            });
            steps.push(SequenceStep {
                at_ms,
                request: MotionRequest::rotate_to(
                    id,
                    self.settings.rotation_deg,
                    self.settings.rotate_ms,
                    Ease::Linear,
                ),
            });
        }

        motion.sequence(steps, self.on_complete.take());
        self.phase = SessionPhase::Retiring;
        true
    }

    /// Deactivate a retired cell and record the retirement order
    pub fn retire_cell(&mut self, id: CellId, cells: &mut CellArena) -> bool {
        if !self.cells.contains(&id) || self.retired.contains(&id) {
            return false;
        }
        if let Some(cell) = cells.get_mut(id) {
            cell.active = false;
        }
        self.retired.push(id);
        true
    }

    /// Mark the merge finished and hand back the cells to destroy
    pub fn finish(mut self) -> Vec<CellId> {
        self.phase = SessionPhase::Finished;
        std::mem::take(&mut self.cells)
    }

    /// Reset bookkeeping; cells are not returned anywhere
    pub fn clear(&mut self) {
        self.cells.clear();
        self.retired.clear();
        self.anchor_color = None;
        self.on_complete = None;
        self.phase = SessionPhase::Collecting;
    }

    pub fn count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn anchor_color(&self) -> Option<ColorId> {
        self.anchor_color
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn settings(&self) -> &StackSettings {
        &self.settings
    }

    /// Cells retired so far, in retirement order
    pub fn retired(&self) -> &[CellId] {
        &self.retired
    }

    /// World position of a held cell of this session
    pub fn world_position_of(&self, cell: &Cell) -> Vec3 {
        self.anchor + cell.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{Recorded, RecordingScheduler};

    fn setup(colors: &[u16]) -> (CellArena, Vec<CellId>) {
        let mut cells = CellArena::new();
        let ids = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| cells.create(ColorId(c), Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        (cells, ids)
    }

    #[test]
    fn test_initialize_sets_anchor() {
        let (mut cells, ids) = setup(&[2]);
        let mut motion = RecordingScheduler::new();
        let mut session = DragSession::new(StackSettings::default());

        assert!(session.initialize(ids[0], &mut cells, &mut motion));
        assert_eq!(session.count(), 1);
        assert_eq!(session.anchor_color(), Some(ColorId(2)));
        assert_eq!(session.anchor(), Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_add_cell_rejects_other_color() {
        let (mut cells, ids) = setup(&[0, 1, 0]);
        let mut motion = RecordingScheduler::new();
        let mut session = DragSession::new(StackSettings::default());
        session.initialize(ids[0], &mut cells, &mut motion);

        assert!(!session.add_cell(ids[1], &mut cells, &mut motion));
        assert_eq!(session.count(), 1);
        assert!(!session.can_add(cells.get(ids[1]).unwrap()));

        assert!(session.add_cell(ids[2], &mut cells, &mut motion));
        assert_eq!(session.cells(), &[ids[0], ids[2]]);
    }

    #[test]
    fn test_add_cell_targets_stack_offset_by_index() {
        let (mut cells, ids) = setup(&[0, 0, 0]);
        let mut motion = RecordingScheduler::new();
        let settings = StackSettings::default();
        let mut session = DragSession::new(settings);
        session.initialize(ids[0], &mut cells, &mut motion);
        session.add_cell(ids[1], &mut cells, &mut motion);
        session.add_cell(ids[2], &mut cells, &mut motion);

        let targets: Vec<Vec3> = motion
            .requests()
            .map(|r| match r.tween {
                crate::motion::Tween::Move { to, .. } => to,
                _ => panic!("unexpected tween"),
            })
            .collect();
        assert_eq!(
            targets,
            vec![Vec3::ZERO, settings.offset * 1.0, settings.offset * 2.0]
        );
    }

    #[test]
    fn test_update_position_smooths() {
        let (mut cells, ids) = setup(&[0]);
        let mut motion = RecordingScheduler::new();
        let mut session = DragSession::new(StackSettings {
            move_speed: 10.0,
            ..StackSettings::default()
        });
        session.initialize(ids[0], &mut cells, &mut motion);

        session.update_position(Vec3::new(1.0, 0.0, 0.0), 0.05);
        assert!((session.anchor().x - 0.5).abs() < 1e-6);

        // speed·dt above 1 snaps instead of overshooting
        session.update_position(Vec3::new(1.0, 0.0, 0.0), 1.0);
        assert_eq!(session.anchor().x, 1.0);
    }

    #[test]
    fn test_merge_retires_in_reverse_order_with_stagger() {
        let (mut cells, ids) = setup(&[3, 3, 3]);
        let mut motion = RecordingScheduler::new();
        let settings = StackSettings::default();
        let mut session = DragSession::new(settings);
        session.initialize(ids[0], &mut cells, &mut motion);
        session.add_cell(ids[1], &mut cells, &mut motion);
        session.add_cell(ids[2], &mut cells, &mut motion);
        motion.take_log();

        assert_eq!(
            session.play_merge_animation(&mut cells, &mut motion, Completion::MergeFinished),
            None
        );
        assert!(ids.iter().all(|id| cells.get(*id).unwrap().merged));
        assert_eq!(
            motion.log(),
            &[Recorded::Delay {
                delay_ms: settings.settle_ms,
                completion: Completion::MergeSettled
            }]
        );
        assert_eq!(
            motion.advance(0, &mut cells),
            vec![Completion::MergeSettled]
        );

        assert!(session.begin_retirement(&mut motion));
        let steps = motion.sequences().next().unwrap().to_vec();
        let retirements: Vec<(u32, CellId)> = steps
            .iter()
            .filter(|s| s.request.on_complete.is_some())
            .map(|s| (s.at_ms, s.request.cell))
            .collect();
        assert_eq!(
            retirements,
            vec![
                (0, ids[2]),
                (settings.stagger_ms, ids[1]),
                (2 * settings.stagger_ms, ids[0])
            ]
        );

        let fired = motion.advance(0, &mut cells);
        assert_eq!(
            fired,
            vec![
                Completion::CellRetired(ids[2]),
                Completion::CellRetired(ids[1]),
                Completion::CellRetired(ids[0]),
                Completion::MergeFinished
            ]
        );
        assert_eq!(
            fired.iter().filter(|c| **c == Completion::MergeFinished).count(),
            1
        );
    }

    #[test]
    fn test_retirement_requires_settling() {
        let (mut cells, ids) = setup(&[0]);
        let mut motion = RecordingScheduler::new();
        let mut session = DragSession::new(StackSettings::default());
        session.initialize(ids[0], &mut cells, &mut motion);
        assert!(!session.begin_retirement(&mut motion));
        assert_eq!(session.phase(), SessionPhase::Collecting);
    }

    #[test]
    fn test_empty_merge_completes_immediately() {
        let mut cells = CellArena::new();
        let mut motion = RecordingScheduler::new();
        let mut session = DragSession::new(StackSettings::default());
        assert_eq!(
            session.play_merge_animation(&mut cells, &mut motion, Completion::MergeFinished),
            Some(Completion::MergeFinished)
        );
        assert!(motion.is_idle());
    }

    #[test]
    fn test_clear_keeps_cells_untouched() {
        let (mut cells, ids) = setup(&[0, 0]);
        let mut motion = RecordingScheduler::new();
        let mut session = DragSession::new(StackSettings::default());
        session.initialize(ids[0], &mut cells, &mut motion);
        session.add_cell(ids[1], &mut cells, &mut motion);

        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.anchor_color(), None);
        assert_eq!(cells.len(), 2);
    }
}
