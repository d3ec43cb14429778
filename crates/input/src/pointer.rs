//! Mouse tracking for terminal environments.
//!
//! Terminals report mouse activity as discrete events (down, drag, up, moved)
//! at arbitrary times. The simulation wants exactly one [`PointerSample`] per
//! tick. [`PointerTracker`] queues the press/release edges it sees and emits
//! them one per tick, so a click that starts and ends between two ticks still
//! produces a `Pressed` sample followed by a `Released` sample.

use arrayvec::ArrayVec;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::types::{PointerPhase, PointerSample, Vec2};

const MAX_PENDING_EDGES: usize = 8;

#[derive(Debug, Clone)]
pub struct PointerTracker {
    position: Vec2,
    /// Button state as last reported by the terminal
    button_down: bool,
    /// Button state as last emitted to the simulation
    emitted_down: bool,
    pending: ArrayVec<PointerPhase, MAX_PENDING_EDGES>,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            button_down: false,
            emitted_down: false,
            pending: ArrayVec::new(),
        }
    }

    /// Screen position of the pointer, at the center of the character cell
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_down(&self) -> bool {
        self.emitted_down
    }

    /// Record one terminal mouse event. Only the left button drags.
    pub fn handle_mouse_event(&mut self, event: MouseEvent) {
        self.position = Vec2::new(event.column as f32 + 0.5, event.row as f32 + 0.5);

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !self.button_down {
                    self.button_down = true;
                    let _ = self.pending.try_push(PointerPhase::Pressed);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.button_down {
                    self.button_down = false;
                    let _ = self.pending.try_push(PointerPhase::Released);
                }
            }
            _ => {}
        }
    }

    /// Sample for the next tick
    pub fn update(&mut self) -> PointerSample {
        let phase = if self.pending.is_empty() {
            if self.emitted_down {
                PointerPhase::Held
            } else {
                PointerPhase::Idle
            }
        } else {
            self.pending.remove(0)
        };

        match phase {
            PointerPhase::Pressed => self.emitted_down = true,
            PointerPhase::Released => self.emitted_down = false,
            _ => {}
        }

        PointerSample {
            position: self.position,
            phase,
        }
    }

    /// Forget queued edges and the button state (e.g. after focus loss)
    ///
    /// Returns a release sample if the simulation still believes the button is
    /// down.
    pub fn reset(&mut self) -> Option<PointerSample> {
        self.pending.clear();
        self.button_down = false;
        if std::mem::take(&mut self.emitted_down) {
            Some(PointerSample::released(self.position))
        } else {
            None
        }
    }
}
