//! Motion module - the asynchronous animation contract
//!
//! The core never animates anything itself. It issues [`MotionRequest`]s to a
//! [`MotionScheduler`] and later receives [`Completion`]s back from
//! [`MotionScheduler::advance`], which the game dispatches on the tick thread.
//!
//! Composition is explicit: a [`SequenceStep`] list is an ordered set of
//! `(start offset, request)` pairs whose shared completion fires once every
//! step has finished.
//!
//! Two schedulers ship with the crate:
//!
//! - [`Timeline`]: eased interpolation of cell transforms in simulated time.
//! - [`RecordingScheduler`]: logs every request and completes everything on the
//!   next `advance` (fast-forward hosts and tests).

use tracing::trace;

use crate::cell::CellArena;
use crate::types::{CellId, Ease, Vec3};

/// Space in which a move target is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Absolute world position
    World,
    /// Offset from the owning stack's anchor
    Local,
}

/// Animated property and its target value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tween {
    Move { to: Vec3, space: Space },
    Scale(f32),
    /// Z-rotation in degrees
    Rotate(f32),
}

/// Event delivered back to the game when a motion, delay or sequence ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The merged look has been shown long enough; start retiring cells
    MergeSettled,
    /// A cell finished its retirement and must be deactivated
    CellRetired(CellId),
    /// The last retirement finished
    MergeFinished,
    /// Gravity pass delay elapsed; reopen input
    ReleaseInteraction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRequest {
    pub cell: CellId,
    pub tween: Tween,
    pub duration_ms: u32,
    pub ease: Ease,
    pub on_complete: Option<Completion>,
}

impl MotionRequest {
    pub fn move_to(cell: CellId, to: Vec3, duration_ms: u32, ease: Ease) -> Self {
        Self {
            cell,
            tween: Tween::Move {
                to,
                space: Space::World,
            },
            duration_ms,
            ease,
            on_complete: None,
        }
    }

    pub fn local_move_to(cell: CellId, to: Vec3, duration_ms: u32, ease: Ease) -> Self {
        Self {
            cell,
            tween: Tween::Move {
                to,
                space: Space::Local,
            },
            duration_ms,
            ease,
            on_complete: None,
        }
    }

    pub fn scale_to(cell: CellId, scale: f32, duration_ms: u32, ease: Ease) -> Self {
        Self {
            cell,
            tween: Tween::Scale(scale),
            duration_ms,
            ease,
            on_complete: None,
        }
    }

    pub fn rotate_to(cell: CellId, degrees: f32, duration_ms: u32, ease: Ease) -> Self {
        Self {
            cell,
            tween: Tween::Rotate(degrees),
            duration_ms,
            ease,
            on_complete: None,
        }
    }

    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.on_complete = Some(completion);
        self
    }
}

/// One entry of a sequence: `request` starts `at_ms` after the sequence starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceStep {
    pub at_ms: u32,
    pub request: MotionRequest,
}

/// Cancellable handle to a scheduled motion, delay or sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MotionHandle(pub u64);

/// Asynchronous motion collaborator
///
/// Every completion attached to a request fires exactly once, from `advance`,
/// unless the request was killed or cancelled first.
pub trait MotionScheduler {
    /// Start a motion now
    fn request(&mut self, request: MotionRequest) -> MotionHandle;

    /// Fire `completion` after `delay_ms`, independent of any motion
    fn delay(&mut self, delay_ms: u32, completion: Completion) -> MotionHandle;

    /// Start every step at its offset; `on_complete` fires after the last step ends
    fn sequence(&mut self, steps: Vec<SequenceStep>, on_complete: Option<Completion>)
        -> MotionHandle;

    /// Stop every pending motion of `cell` where it is; suppresses their completions
    fn kill(&mut self, cell: CellId);

    /// Drop a delay, sequence or motion without firing its completion
    fn cancel(&mut self, handle: MotionHandle);

    /// Drop everything
    fn clear(&mut self);

    /// Advance simulated time, writing transforms and returning fired completions
    fn advance(&mut self, dt_ms: u32, cells: &mut CellArena) -> Vec<Completion>;

    /// True when nothing is pending
    fn is_idle(&self) -> bool;
}

/// Snapshot of the animated property when a motion starts
#[derive(Debug, Clone, Copy, PartialEq)]
enum StartValue {
    Position(Vec3),
    Scale(f32),
    Rotation(f32),
}

#[derive(Debug, Clone)]
struct ActiveMotion {
    handle: MotionHandle,
    group: Option<MotionHandle>,
    request: MotionRequest,
    /// Time left before the motion starts
    wait_ms: u32,
    elapsed_ms: u32,
    from: Option<StartValue>,
}

#[derive(Debug, Clone)]
struct PendingDelay {
    handle: MotionHandle,
    remaining_ms: u32,
    completion: Completion,
}

#[derive(Debug, Clone)]
struct Group {
    handle: MotionHandle,
    remaining: usize,
    on_complete: Option<Completion>,
}

fn start_value(request: &MotionRequest, cells: &CellArena) -> Option<StartValue> {
    let cell = cells.get(request.cell)?;
    Some(match request.tween {
        Tween::Move {
            space: Space::World,
            ..
        } => StartValue::Position(cell.position),
        Tween::Move {
            space: Space::Local,
            ..
        } => StartValue::Position(cell.local),
        Tween::Scale(_) => StartValue::Scale(cell.scale),
        Tween::Rotate(_) => StartValue::Rotation(cell.rotation_deg),
    })
}

/// Write the tween's value at eased progress `p` into the cell
fn apply(request: &MotionRequest, from: StartValue, p: f32, cells: &mut CellArena) {
    let Some(cell) = cells.get_mut(request.cell) else {
        return;
    };
    match (request.tween, from) {
        (Tween::Move { to, space }, StartValue::Position(start)) => {
            let value = start.lerp_unclamped(to, p);
            match space {
                Space::World => cell.position = value,
                Space::Local => cell.local = value,
            }
        }
        (Tween::Scale(to), StartValue::Scale(start)) => {
            cell.scale = (start + (to - start) * p).max(0.0);
        }
        (Tween::Rotate(to), StartValue::Rotation(start)) => {
            cell.rotation_deg = start + (to - start) * p;
        }
        _ => {}
    }
}

/// Deterministic scheduler driven by simulated milliseconds
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    next_handle: u64,
    motions: Vec<ActiveMotion>,
    delays: Vec<PendingDelay>,
    groups: Vec<Group>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&mut self) -> MotionHandle {
        self.next_handle += 1;
        MotionHandle(self.next_handle)
    }

    fn push_motion(&mut self, request: MotionRequest, wait_ms: u32, group: Option<MotionHandle>) -> MotionHandle {
        let handle = self.next_handle();
        self.motions.push(ActiveMotion {
            handle,
            group,
            request,
            wait_ms,
            elapsed_ms: 0,
            from: None,
        });
        handle
    }

    fn finish_in_group(&mut self, group: Option<MotionHandle>) {
        if let Some(g) = group.and_then(|h| self.groups.iter_mut().find(|g| g.handle == h)) {
            g.remaining = g.remaining.saturating_sub(1);
        }
    }

    /// Number of running or waiting motions
    pub fn active_motions(&self) -> usize {
        self.motions.len()
    }

    /// True when `cell` has a running or waiting motion
    pub fn is_animating(&self, cell: CellId) -> bool {
        self.motions.iter().any(|m| m.request.cell == cell)
    }
}

impl MotionScheduler for Timeline {
    fn request(&mut self, request: MotionRequest) -> MotionHandle {
        self.push_motion(request, 0, None)
    }

    fn delay(&mut self, delay_ms: u32, completion: Completion) -> MotionHandle {
        let handle = self.next_handle();
        self.delays.push(PendingDelay {
            handle,
            remaining_ms: delay_ms,
            completion,
        });
        handle
    }

    fn sequence(
        &mut self,
        steps: Vec<SequenceStep>,
        on_complete: Option<Completion>,
    ) -> MotionHandle {
        let handle = self.next_handle();
        self.groups.push(Group {
            handle,
            remaining: steps.len(),
            on_complete,
        });
        for step in steps {
            self.push_motion(step.request, step.at_ms, Some(handle));
        }
        handle
    }

    fn kill(&mut self, cell: CellId) {
        let mut killed_groups = Vec::new();
        self.motions.retain(|m| {
            if m.request.cell == cell {
                killed_groups.push(m.group);
                false
            } else {
                true
            }
        });
        for group in killed_groups {
            self.finish_in_group(group);
        }
    }

    fn cancel(&mut self, handle: MotionHandle) {
        self.delays.retain(|d| d.handle != handle);
        self.groups.retain(|g| g.handle != handle);
        self.motions
            .retain(|m| m.handle != handle && m.group != Some(handle));
    }

    fn clear(&mut self) {
        self.motions.clear();
        self.delays.clear();
        self.groups.clear();
    }

    fn advance(&mut self, dt_ms: u32, cells: &mut CellArena) -> Vec<Completion> {
        let mut fired = Vec::new();
        let mut finished_groups = Vec::new();
        let mut motions = std::mem::take(&mut self.motions);

        motions.retain_mut(|m| {
            let mut dt = dt_ms;
            if m.wait_ms > 0 {
                if dt < m.wait_ms {
                    m.wait_ms -= dt;
                    return true;
                }
                dt -= m.wait_ms;
                m.wait_ms = 0;
            }

            let from = match m.from {
                Some(from) => from,
                None => match start_value(&m.request, cells) {
                    Some(from) => {
                        m.from = Some(from);
                        from
                    }
                    None => {
                        // Target destroyed before the motion started.
                        finished_groups.push(m.group);
                        return false;
                    }
                },
            };

            m.elapsed_ms = m.elapsed_ms.saturating_add(dt);
            let t = if m.request.duration_ms == 0 {
                1.0
            } else {
                (m.elapsed_ms as f32 / m.request.duration_ms as f32).min(1.0)
            };

            if t >= 1.0 {
                apply(&m.request, from, 1.0, cells);
                if let Some(completion) = m.request.on_complete {
                    fired.push(completion);
                }
                finished_groups.push(m.group);
                false
            } else {
                apply(&m.request, from, m.request.ease.apply(t), cells);
                true
            }
        });

        self.motions = motions;
        for group in finished_groups {
            self.finish_in_group(group);
        }

        self.delays.retain_mut(|d| {
            if dt_ms >= d.remaining_ms {
                fired.push(d.completion);
                false
            } else {
                d.remaining_ms -= dt_ms;
                true
            }
        });

        self.groups.retain(|g| {
            if g.remaining == 0 {
                if let Some(completion) = g.on_complete {
                    fired.push(completion);
                }
                false
            } else {
                true
            }
        });

        if !fired.is_empty() {
            trace!(count = fired.len(), "motion completions fired");
        }
        fired
    }

    fn is_idle(&self) -> bool {
        self.motions.is_empty() && self.delays.is_empty() && self.groups.is_empty()
    }
}

/// Everything a [`RecordingScheduler`] was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Request(MotionRequest),
    Delay { delay_ms: u32, completion: Completion },
    Sequence {
        steps: Vec<SequenceStep>,
        on_complete: Option<Completion>,
    },
    Kill(CellId),
}

#[derive(Debug, Clone)]
enum Pending {
    Motion(MotionHandle, MotionRequest),
    Delay(MotionHandle, Completion),
    Sequence(MotionHandle, Vec<SequenceStep>, Option<Completion>),
}

/// Scheduler that logs every call and completes everything on the next advance
///
/// Final values are written to the cells and completions are returned in the
/// order they were scheduled (sequence steps by start offset, then the
/// sequence's own completion).
#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    next_handle: u64,
    log: Vec<Recorded>,
    pending: Vec<Pending>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&mut self) -> MotionHandle {
        self.next_handle += 1;
        MotionHandle(self.next_handle)
    }

    pub fn log(&self) -> &[Recorded] {
        &self.log
    }

    pub fn take_log(&mut self) -> Vec<Recorded> {
        std::mem::take(&mut self.log)
    }

    /// Every sequence recorded so far
    pub fn sequences(&self) -> impl Iterator<Item = &[SequenceStep]> {
        self.log.iter().filter_map(|r| match r {
            Recorded::Sequence { steps, .. } => Some(steps.as_slice()),
            _ => None,
        })
    }

    /// Every standalone motion request recorded so far
    pub fn requests(&self) -> impl Iterator<Item = &MotionRequest> {
        self.log.iter().filter_map(|r| match r {
            Recorded::Request(req) => Some(req),
            _ => None,
        })
    }

    fn finish(request: &MotionRequest, cells: &mut CellArena) -> bool {
        let Some(from) = start_value(request, cells) else {
            return false;
        };
        apply(request, from, 1.0, cells);
        true
    }
}

impl MotionScheduler for RecordingScheduler {
    fn request(&mut self, request: MotionRequest) -> MotionHandle {
        let handle = self.next_handle();
        self.log.push(Recorded::Request(request));
        self.pending.push(Pending::Motion(handle, request));
        handle
    }

    fn delay(&mut self, delay_ms: u32, completion: Completion) -> MotionHandle {
        let handle = self.next_handle();
        self.log.push(Recorded::Delay {
            delay_ms,
            completion,
        });
        self.pending.push(Pending::Delay(handle, completion));
        handle
    }

    fn sequence(
        &mut self,
        steps: Vec<SequenceStep>,
        on_complete: Option<Completion>,
    ) -> MotionHandle {
        let handle = self.next_handle();
        self.log.push(Recorded::Sequence {
            steps: steps.clone(),
            on_complete,
        });
        self.pending.push(Pending::Sequence(handle, steps, on_complete));
        handle
    }

    fn kill(&mut self, cell: CellId) {
        self.log.push(Recorded::Kill(cell));
        self.pending.retain(|p| !matches!(p, Pending::Motion(_, req) if req.cell == cell));
        for p in &mut self.pending {
            if let Pending::Sequence(_, steps, _) = p {
                steps.retain(|s| s.request.cell != cell);
            }
        }
    }

    fn cancel(&mut self, handle: MotionHandle) {
        self.pending.retain(|p| {
            let h = match p {
                Pending::Motion(h, _) | Pending::Delay(h, _) | Pending::Sequence(h, _, _) => *h,
            };
            h != handle
        });
    }

    fn clear(&mut self) {
        self.pending.clear();
    }

    fn advance(&mut self, _dt_ms: u32, cells: &mut CellArena) -> Vec<Completion> {
        let mut fired = Vec::new();
        for pending in std::mem::take(&mut self.pending) {
            match pending {
                Pending::Motion(_, request) => {
                    if Self::finish(&request, cells) {
                        fired.extend(request.on_complete);
                    }
                }
                Pending::Delay(_, completion) => fired.push(completion),
                Pending::Sequence(_, mut steps, on_complete) => {
                    steps.sort_by_key(|s| s.at_ms);
                    for step in &steps {
                        if Self::finish(&step.request, cells) {
                            fired.extend(step.request.on_complete);
                        }
                    }
                    fired.extend(on_complete);
                }
            }
        }
        fired
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
