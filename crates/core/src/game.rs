//! Game module - owns every component and drives them from one tick
//!
//! A caller-owned loop calls [`Game::init`] once, then [`Game::tick`] with the
//! elapsed time and the current pointer sample, and finally
//! [`Game::teardown`]. Each tick:
//!
//! 1. advances the motion scheduler and dispatches the completions it returns;
//! 2. feeds the pointer sample to the input controller (skipped while a merge
//!    animation is running).
//!
//! Completions are dispatched in the order the scheduler reports them, on the
//! tick thread:
//!
//! | Completion | Effect |
//! |------------|--------|
//! | `MergeSettled` | start the staggered retirement |
//! | `CellRetired` | deactivate the cell |
//! | `MergeFinished` | destroy the merged cells, run one gravity pass |
//! | `ReleaseInteraction` | release the interaction lock |

use tracing::{debug, info, warn};

use crate::collab::{Camera, GridHitTester, HitTester};
use crate::commands::{CommandContext, CommandError, CommandRegistry};
use crate::config::{ConfigError, GameConfig};
use crate::controller::{DragContext, DragEvent, InputController, Release};
use crate::gravity::{GravityReport, GravityResolver, GravitySettings};
use crate::grid::GridStore;
use crate::lock::InteractionLock;
use crate::motion::{Completion, MotionScheduler, Timeline};
use crate::palette::Palette;
use crate::snapshot::GridSnapshot;
use crate::stack::DragSession;
use crate::types::{CellId, PointerSample};

/// Something observable that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    DragStarted { cell: CellId },
    CellAbsorbed { cell: CellId, count: usize },
    /// `merged` is true when the stack was large enough to merge
    DragReleased { count: usize, merged: bool },
    DragCancelled { restored: usize },
    MergeCompleted { cells: Vec<CellId> },
    GravityResolved(GravityReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameStats {
    pub merges: u32,
    pub cells_merged: u32,
    pub gravity_passes: u32,
    pub cells_spawned: u32,
}

pub struct Game<M: MotionScheduler = Timeline> {
    grid: GridStore,
    palette: Option<Palette>,
    lock: InteractionLock,
    gravity: GravityResolver,
    controller: InputController,
    /// Session whose merge animation is in flight
    merging: Option<DragSession>,
    motion: M,
    camera: Option<Box<dyn Camera>>,
    hit_tester: Box<dyn HitTester>,
    commands: CommandRegistry,
    events: Vec<GameEvent>,
    stats: GameStats,
    elapsed_ms: u64,
    initialized: bool,
}

impl<M: MotionScheduler> Game<M> {
    /// Game with default tunables, the grid hit tester and no camera
    pub fn new(grid: GridStore, palette: Option<Palette>, motion: M) -> Self {
        Self {
            grid,
            palette,
            lock: InteractionLock::new(),
            gravity: GravityResolver::default(),
            controller: InputController::default(),
            merging: None,
            motion,
            camera: None,
            hit_tester: Box::new(GridHitTester),
            commands: CommandRegistry::standard(),
            events: Vec::new(),
            stats: GameStats::default(),
            elapsed_ms: 0,
            initialized: false,
        }
    }

    pub fn from_config(config: &GameConfig, motion: M) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = GridStore::new(config.grid.width, config.grid.height, config.grid_geometry());
        let controller = InputController::new(config.stack_settings())
            .with_snap_epsilon(config.drag.snap_epsilon);

        Ok(Self::new(grid, config.palette(), motion)
            .with_controller(controller)
            .with_gravity_settings(config.gravity_settings()))
    }

    pub fn with_camera(mut self, camera: impl Camera + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn with_hit_tester(mut self, hit_tester: impl HitTester + 'static) -> Self {
        self.hit_tester = Box::new(hit_tester);
        self
    }

    pub fn with_controller(mut self, controller: InputController) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_gravity_settings(mut self, settings: GravitySettings) -> Self {
        self.gravity = GravityResolver::new(settings);
        self
    }

    pub fn with_commands(mut self, commands: CommandRegistry) -> Self {
        self.commands = commands;
        self
    }

    /// Replace the camera (hosts re-layout on resize)
    pub fn set_camera(&mut self, camera: Option<Box<dyn Camera>>) {
        self.camera = camera;
    }

    /// Populate an empty grid; a no-op after the first call
    pub fn init(&mut self) -> Result<(), CommandError> {
        if self.initialized {
            return Ok(());
        }
        if self.camera.is_none() {
            warn!("no camera assigned: drags cannot start");
        }
        if self.grid.placed_count() == 0 {
            self.run_command("createGrid")?;
        }
        self.initialized = true;
        info!(
            width = self.grid.width(),
            height = self.grid.height(),
            cells = self.grid.placed_count(),
            "game initialized"
        );
        Ok(())
    }

    /// Advance by `dt_ms` and feed one pointer sample
    pub fn tick(&mut self, dt_ms: u32, sample: PointerSample) {
        self.elapsed_ms += u64::from(dt_ms);

        let completions = self.motion.advance(dt_ms, self.grid.cells_mut());
        for completion in completions {
            self.dispatch(completion);
        }

        if self.merging.is_some() {
            return;
        }

        let mut ctx = DragContext {
            grid: &mut self.grid,
            lock: &self.lock,
            motion: &mut self.motion,
            camera: self.camera.as_deref(),
            hit_tester: &*self.hit_tester,
        };
        let dt_secs = dt_ms as f32 / 1000.0;
        if let Some(event) = self.controller.tick(sample, dt_secs, &mut ctx) {
            self.handle_drag_event(event);
        }
    }

    /// Abort the current drag, returning held cells to their slots
    pub fn cancel_drag(&mut self) -> Option<usize> {
        let mut ctx = DragContext {
            grid: &mut self.grid,
            lock: &self.lock,
            motion: &mut self.motion,
            camera: self.camera.as_deref(),
            hit_tester: &*self.hit_tester,
        };
        let restored = self.controller.cancel(&mut ctx)?;
        self.handle_drag_event(DragEvent::Cancelled { restored });
        Some(restored)
    }

    /// Run a named setup command
    ///
    /// A drag in progress is cancelled first. Rejected while a merge or a
    /// gravity pass is in flight.
    pub fn run_command(&mut self, name: &str) -> Result<usize, CommandError> {
        if !self.commands.contains(name) {
            return Err(CommandError::Unknown(name.to_string()));
        }
        if self.merging.is_some() || self.lock.is_held() {
            return Err(CommandError::Busy(name.to_string()));
        }
        self.cancel_drag();

        let mut ctx = CommandContext {
            grid: &mut self.grid,
            palette: self.palette.as_mut(),
            motion: &mut self.motion,
        };
        self.commands.run(name, &mut ctx)
    }

    /// Run a gravity pass now
    ///
    /// `None` while a drag or merge is in flight or the interaction lock is
    /// already held: compaction would fill the home slots of held cells.
    pub fn resolve_gravity(&mut self) -> Option<GravityReport> {
        if self.controller.is_dragging() || self.merging.is_some() {
            warn!("gravity pass skipped: drag or merge in flight");
            return None;
        }
        let Some(report) = self.gravity.resolve(
            &mut self.grid,
            self.palette.as_mut(),
            &mut self.lock,
            &mut self.motion,
        ) else {
            warn!("gravity pass skipped: interaction lock held");
            return None;
        };

        self.stats.gravity_passes += 1;
        self.stats.cells_spawned += report.spawns.len() as u32;
        self.events.push(GameEvent::GravityResolved(report.clone()));
        Some(report)
    }

    /// Stop everything: cancel the drag, drop in-flight merges, stop motions
    pub fn teardown(&mut self) {
        self.cancel_drag();
        if let Some(session) = self.merging.take() {
            for id in session.finish() {
                self.grid.destroy_cell(id);
            }
        }
        self.motion.clear();
        if self.lock.is_held() {
            self.lock.release();
        }
        self.initialized = false;
        info!(elapsed_ms = self.elapsed_ms, "game torn down");
    }

    fn dispatch(&mut self, completion: Completion) {
        match completion {
            Completion::MergeSettled => {
                if let Some(session) = self.merging.as_mut() {
                    session.begin_retirement(&mut self.motion);
                }
            }
            Completion::CellRetired(id) => {
                if let Some(session) = self.merging.as_mut() {
                    session.retire_cell(id, self.grid.cells_mut());
                }
            }
            Completion::MergeFinished => self.finish_merge(),
            Completion::ReleaseInteraction => self.lock.release(),
        }
    }

    fn finish_merge(&mut self) {
        let Some(session) = self.merging.take() else {
            return;
        };
        let cells = session.finish();
        for &id in &cells {
            self.motion.kill(id);
            self.grid.destroy_cell(id);
        }
        debug!(count = cells.len(), "merge finished");

        self.stats.merges += 1;
        self.stats.cells_merged += cells.len() as u32;
        self.events.push(GameEvent::MergeCompleted { cells });
        self.resolve_gravity();
    }

    fn handle_drag_event(&mut self, event: DragEvent) {
        let event = match event {
            DragEvent::Started { cell } => GameEvent::DragStarted { cell },
            DragEvent::Absorbed { cell, count } => GameEvent::CellAbsorbed { cell, count },
            DragEvent::Released(Release::Merging(session)) => {
                let count = session.count();
                self.merging = Some(session);
                GameEvent::DragReleased {
                    count,
                    merged: true,
                }
            }
            DragEvent::Released(Release::Restored(_)) => GameEvent::DragReleased {
                count: 1,
                merged: false,
            },
            DragEvent::Released(Release::Empty) => GameEvent::DragReleased {
                count: 0,
                merged: false,
            },
            DragEvent::Cancelled { restored } => GameEvent::DragCancelled { restored },
        };
        self.events.push(event);
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridStore {
        &mut self.grid
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn lock(&self) -> &InteractionLock {
        &self.lock
    }

    pub fn controller(&self) -> &InputController {
        &self.controller
    }

    pub fn merging(&self) -> Option<&DragSession> {
        self.merging.as_ref()
    }

    pub fn is_merging(&self) -> bool {
        self.merging.is_some()
    }

    pub fn motion(&self) -> &M {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// No drag, no merge, no lock and no pending motion
    pub fn is_settled(&self) -> bool {
        !self.controller.is_dragging()
            && self.merging.is_none()
            && !self.lock.is_held()
            && self.motion.is_idle()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot_into(&self, snapshot: &mut GridSnapshot) {
        snapshot.capture(
            &self.grid,
            self.controller.session(),
            self.merging.as_ref(),
            self.lock.is_held(),
        );
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let mut snapshot = GridSnapshot::default();
        self.snapshot_into(&mut snapshot);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::OrthoCamera;
    use crate::grid::GridGeometry;
    use crate::motion::RecordingScheduler;
    use crate::types::{ColorId, Vec2};

    fn game_with_colors(width: u16, height: u16, colors: &[u16]) -> Game<RecordingScheduler> {
        let mut grid = GridStore::new(width, height, GridGeometry::default());
        for (i, &color) in colors.iter().enumerate() {
            let x = (i % width as usize) as i32;
            let y = (i / width as usize) as i32;
            let id = grid.spawn_cell(ColorId(color), grid.world_position(x, y, true));
            grid.place(id, x, y);
            grid.cell_mut(id).unwrap().hit_testable = true;
        }
        Game::new(grid, Some(Palette::standard(7)), RecordingScheduler::new())
            .with_camera(OrthoCamera::identity())
    }

    fn screen(game: &Game<RecordingScheduler>, x: i32, y: i32) -> Vec2 {
        game.grid().world_position(x, y, true).truncate()
    }

    #[test]
    fn test_init_populates_empty_grid_once() {
        let grid = GridStore::new(3, 3, GridGeometry::default());
        let mut game = Game::new(grid, Some(Palette::standard(1)), RecordingScheduler::new());
        game.init().unwrap();
        assert!(game.grid().is_full());

        let ids: Vec<_> = game.grid().iter_placed().collect();
        game.init().unwrap();
        assert_eq!(game.grid().iter_placed().collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_single_cell_release_has_no_gravity() {
        let mut game = game_with_colors(2, 1, &[0, 1]);
        let at = screen(&game, 0, 0);
        game.tick(16, PointerSample::pressed(at));
        game.tick(16, PointerSample::released(at));

        let events = game.drain_events();
        assert!(matches!(events[0], GameEvent::DragStarted { .. }));
        assert_eq!(
            events[1],
            GameEvent::DragReleased {
                count: 1,
                merged: false
            }
        );
        assert_eq!(game.stats().gravity_passes, 0);
        assert_eq!(game.grid().placed_count(), 2);
    }

    #[test]
    fn test_merge_runs_gravity_exactly_once() {
        let mut game = game_with_colors(2, 1, &[0, 0]);
        let from = screen(&game, 0, 0);
        let to = screen(&game, 1, 0);
        game.tick(16, PointerSample::pressed(from));
        for _ in 0..30 {
            game.tick(16, PointerSample::held(to));
        }
        game.tick(16, PointerSample::released(to));
        assert!(game.is_merging());

        // Settle, retire, finish, release the lock.
        for _ in 0..4 {
            game.tick(16, PointerSample::idle(Vec2::ZERO));
        }

        assert!(!game.is_merging());
        assert_eq!(game.stats().merges, 1);
        assert_eq!(game.stats().cells_merged, 2);
        assert_eq!(game.stats().gravity_passes, 1);
        assert!(game.grid().is_full());
        assert!(!game.lock().is_held());
    }

    #[test]
    fn test_input_ignored_while_locked() {
        let mut game = game_with_colors(1, 1, &[0]);
        let at = screen(&game, 0, 0);

        game.lock.acquire();
        game.tick(16, PointerSample::pressed(at));
        assert!(!game.controller().is_dragging());
        assert!(game.events().is_empty());

        game.lock.release();
        game.tick(16, PointerSample::pressed(at));
        assert!(game.controller().is_dragging());
    }

    #[test]
    fn test_commands_rejected_while_locked() {
        let mut game = game_with_colors(1, 1, &[0]);
        game.lock.acquire();
        assert_eq!(
            game.run_command("clearGrid"),
            Err(CommandError::Busy("clearGrid".into()))
        );
        game.lock.release();
        assert_eq!(game.run_command("clearGrid"), Ok(1));
    }

    #[test]
    fn test_teardown_restores_held_cells() {
        let mut game = game_with_colors(2, 1, &[0, 0]);
        let at = screen(&game, 1, 0);
        game.tick(16, PointerSample::pressed(at));
        assert_eq!(game.grid().placed_count(), 1);

        game.teardown();
        assert_eq!(game.grid().placed_count(), 2);
        assert!(!game.controller().is_dragging());
        assert!(game.motion().is_idle());
    }
}
