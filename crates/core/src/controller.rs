//! Input controller - the drag state machine
//!
//! Two states, entered and left once per gesture:
//!
//! - **Idle**: a press over a placed cell starts a [`DragSession`] with that
//!   cell and detaches it from the grid.
//! - **Dragging**: every tick the stack follows the pointer one grid step at a
//!   time (four directions, never diagonal). A step into a slot holding a cell of
//!   another color is refused and the stack stalls at its current slot. Same
//!   colored cells the stack passes over are absorbed.
//!
//! Release merges stacks of two or more cells, returns a single cell to its
//! slot, and drops an empty session. Cancellation returns every held cell.
//! While the interaction lock is held the controller ignores all input.

use tracing::{debug, warn};

use crate::collab::{Camera, HitTester};
use crate::grid::GridStore;
use crate::lock::InteractionLock;
use crate::motion::{Completion, MotionRequest, MotionScheduler};
use crate::stack::{DragSession, StackSettings};
use crate::types::{CellId, Ease, GridPos, PointerPhase, PointerSample, Vec2, Vec3, SNAP_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
}

/// Collaborators lent to the controller for one call
pub struct DragContext<'a> {
    pub grid: &'a mut GridStore,
    pub lock: &'a InteractionLock,
    pub motion: &'a mut dyn MotionScheduler,
    pub camera: Option<&'a dyn Camera>,
    pub hit_tester: &'a dyn HitTester,
}

/// What a release did with the session
#[derive(Debug)]
pub enum Release {
    /// Two or more cells: the merge animation is running on the returned session
    Merging(DragSession),
    /// A single cell went back to its slot
    Restored(CellId),
    Empty,
}

/// Observable result of feeding the controller
#[derive(Debug)]
pub enum DragEvent {
    Started { cell: CellId },
    Absorbed { cell: CellId, count: usize },
    Released(Release),
    Cancelled { restored: usize },
}

#[derive(Debug, Clone)]
pub struct InputController {
    session: Option<DragSession>,
    last_hovered: Option<CellId>,
    stack_settings: StackSettings,
    snap_epsilon: f32,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(StackSettings::default())
    }
}

impl InputController {
    pub fn new(stack_settings: StackSettings) -> Self {
        Self {
            session: None,
            last_hovered: None,
            stack_settings,
            snap_epsilon: SNAP_EPSILON,
        }
    }

    pub fn with_snap_epsilon(mut self, epsilon: f32) -> Self {
        self.snap_epsilon = epsilon;
        self
    }

    pub fn state(&self) -> DragState {
        if self.session.is_some() {
            DragState::Dragging
        } else {
            DragState::Idle
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn last_hovered(&self) -> Option<CellId> {
        self.last_hovered
    }

    /// Feed one pointer sample
    ///
    /// Inert while the interaction lock is held.
    pub fn tick(
        &mut self,
        sample: PointerSample,
        dt_secs: f32,
        ctx: &mut DragContext<'_>,
    ) -> Option<DragEvent> {
        if ctx.lock.is_held() {
            return None;
        }

        match sample.phase {
            PointerPhase::Pressed if !self.is_dragging() => self
                .begin_drag(sample.position, ctx)
                .map(|cell| DragEvent::Started { cell }),
            PointerPhase::Held | PointerPhase::Pressed if self.is_dragging() => {
                self.drag_step(sample.position, dt_secs, ctx).map(|cell| {
                    let count = self.session.as_ref().map_or(0, DragSession::count);
                    DragEvent::Absorbed { cell, count }
                })
            }
            PointerPhase::Released if self.is_dragging() => {
                self.end_drag(ctx).map(DragEvent::Released)
            }
            _ => None,
        }
    }

    /// Idle → Dragging: start a session on the cell under the pointer
    pub fn begin_drag(&mut self, screen: Vec2, ctx: &mut DragContext<'_>) -> Option<CellId> {
        if self.session.is_some() {
            return None;
        }
        let Some(camera) = ctx.camera else {
            warn!("cannot start drag: no camera");
            return None;
        };
        let id = ctx.hit_tester.pick(screen, camera, ctx.grid)?;
        if !ctx.grid.cell(id).is_some_and(|c| c.is_placed()) {
            return None;
        }

        let mut session = DragSession::new(self.stack_settings);
        if !session.initialize(id, ctx.grid.cells_mut(), ctx.motion) {
            return None;
        }
        ctx.grid.remove(id);

        debug!(cell = %id, "drag started");
        self.session = Some(session);
        self.last_hovered = Some(id);
        Some(id)
    }

    /// One Dragging tick; returns the absorbed cell, if any
    pub fn drag_step(
        &mut self,
        screen: Vec2,
        dt_secs: f32,
        ctx: &mut DragContext<'_>,
    ) -> Option<CellId> {
        let session = self.session.as_mut()?;
        let camera = ctx.camera?;
        let desired = camera.project(screen, session.anchor().z)?;
        let grid = &mut *ctx.grid;

        let current = grid.grid_position(session.anchor());
        let current_snapped = grid.world_position(current.x, current.y, true);
        // Direction comes from the unclamped target so an off-grid pointer
        // yields an out-of-bounds step instead of "no movement".
        let wanted = grid.grid_position_unclamped(desired);
        let desired_snapped = grid.world_position(wanted.x, wanted.y, true);

        let delta = desired_snapped - current_snapped;
        let chosen = match step_direction(delta, self.snap_epsilon) {
            None => desired,
            Some(step) => {
                if move_allowed(current + step, session, grid) {
                    desired
                } else {
                    current_snapped
                }
            }
        };
        session.update_position(chosen, dt_secs);

        // Absorb where the stack is, not where the pointer is.
        let hovered = grid.grid_position(session.anchor());
        let id = grid.try_get_at(hovered)?;
        if Some(id) == self.last_hovered {
            return None;
        }
        let cell = grid.cell(id)?;
        if !session.can_add(cell) {
            return None;
        }

        grid.remove(id);
        if !session.add_cell(id, grid.cells_mut(), ctx.motion) {
            // Put it back rather than leave a cell neither placed nor held.
            grid.place(id, hovered.x, hovered.y);
            return None;
        }
        self.last_hovered = Some(id);
        Some(id)
    }

    /// Dragging → Idle
    pub fn end_drag(&mut self, ctx: &mut DragContext<'_>) -> Option<Release> {
        let mut session = self.session.take()?;
        self.last_hovered = None;

        let release = match session.count() {
            0 => Release::Empty,
            1 => {
                let id = session.cells()[0];
                self.restore_cell(id, &session, ctx);
                Release::Restored(id)
            }
            _ => {
                session.play_merge_animation(
                    ctx.grid.cells_mut(),
                    ctx.motion,
                    Completion::MergeFinished,
                );
                Release::Merging(session)
            }
        };
        debug!(?release, "drag released");
        Some(release)
    }

    /// Abort the drag, returning every held cell to its slot
    pub fn cancel(&mut self, ctx: &mut DragContext<'_>) -> Option<usize> {
        let session = self.session.take()?;
        self.last_hovered = None;
        for &id in session.cells() {
            self.restore_cell(id, &session, ctx);
        }
        debug!(restored = session.count(), "drag cancelled");
        Some(session.count())
    }

    /// Step validity against the current session
    ///
    /// Out of bounds → false; empty slot → true; occupied → same color as the
    /// session anchor.
    pub fn move_allowed(&self, target: GridPos, grid: &GridStore) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| move_allowed(target, session, grid))
    }

    fn restore_cell(&self, id: CellId, session: &DragSession, ctx: &mut DragContext<'_>) {
        ctx.motion.kill(id);
        let Some(cell) = ctx.grid.cell_mut(id) else {
            return;
        };
        // Freeze the cell where it is on screen, then send it home.
        cell.position = session.anchor() + cell.local;
        cell.local = Vec3::ZERO;
        cell.hit_testable = true;
        let home = cell.home;

        ctx.grid.place(id, home.x, home.y);
        let target = ctx.grid.world_position(home.x, home.y, true);
        ctx.motion.request(MotionRequest::move_to(
            id,
            target,
            self.stack_settings.add_duration_ms,
            Ease::OutBack,
        ));
    }
}

/// Unit grid step along the dominant axis of `delta`, or `None` below `epsilon`
fn step_direction(delta: Vec3, epsilon: f32) -> Option<GridPos> {
    if delta.x.abs() <= epsilon && delta.y.abs() <= epsilon {
        return None;
    }
    let sign = |v: f32| if v > 0.0 { 1 } else { -1 };
    if delta.x.abs() > delta.y.abs() {
        Some(GridPos::new(sign(delta.x), 0))
    } else {
        Some(GridPos::new(0, sign(delta.y)))
    }
}

fn move_allowed(target: GridPos, session: &DragSession, grid: &GridStore) -> bool {
    let Some(anchor_color) = session.anchor_color() else {
        return false;
    };
    if !grid.in_bounds(target.x, target.y) {
        return false;
    }
    match grid.try_get_at(target).and_then(|id| grid.cell(id)) {
        None => true,
        Some(cell) => cell.color == anchor_color,
    }
}
