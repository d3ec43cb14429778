//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no external dependencies, so they can be used
//! by the simulation core, the input mapping layer and any host.
//!
//! # Coordinates
//!
//! - **Grid space**: integer [`GridPos`], `x` grows to the right, `y` grows upward
//!   (row 0 is the bottom row, gravity pulls toward it).
//! - **World space**: continuous [`Vec3`] positions. Cells live on the `z = 0` plane;
//!   cells held by a stack carry a small `z` offset.
//! - **Screen space**: continuous [`Vec2`] pointer positions, mapped into world space
//!   by a camera collaborator.
//!
//! # Timing Defaults
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `CELL_ADD_DURATION_MS` | 300 | Cell flying into the stack |
//! | `MERGE_SETTLE_MS` | 500 | Pause after cells switch to the merged look |
//! | `MERGE_STAGGER_MS` | 81 | Delay between consecutive retirements |
//! | `RETIRE_SHRINK_MS` | 500 | Scale-to-zero duration |
//! | `RETIRE_ROTATE_MS` | 300 | Rotation duration |
//! | `DROP_DURATION_MS` | 500 | Gravity drop / spawn entry duration |
//! | `INTERACTION_RELEASE_MS` | 500 | Lock release after a gravity pass |
//!
//! # Examples
//!
//! ```
//! use tile_stack_types::{GridPos, Vec3, PointerPhase, PointerSample, Vec2};
//!
//! let a = GridPos::new(1, 2);
//! assert_eq!(a + GridPos::RIGHT, GridPos::new(2, 2));
//!
//! let p = Vec3::new(0.0, 0.0, 0.0).lerp(Vec3::new(2.0, 0.0, 0.0), 0.25);
//! assert_eq!(p, Vec3::new(0.5, 0.0, 0.0));
//!
//! let sample = PointerSample::pressed(Vec2::new(10.0, 4.0));
//! assert_eq!(sample.phase, PointerPhase::Pressed);
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Default grid width in cells
pub const DEFAULT_GRID_WIDTH: u16 = 6;

/// Default grid height in cells
pub const DEFAULT_GRID_HEIGHT: u16 = 8;

/// Default cell footprint in world units (x, y)
pub const DEFAULT_CELL_SIZE: Vec2 = Vec2::new(0.8, 1.0);

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Stack follow speed used by the exponential smoothing of the anchor
pub const STACK_MOVE_SPEED: f32 = 20.0;

/// Local offset between consecutive cells of a stack
pub const STACK_OFFSET: Vec3 = Vec3::new(0.0, 0.1, -0.1);

/// Duration of the motion bringing a cell into the stack
pub const CELL_ADD_DURATION_MS: u32 = 300;

/// Pause between the merged look and the first retirement
pub const MERGE_SETTLE_MS: u32 = 500;

/// Delay between two consecutive cell retirements
pub const MERGE_STAGGER_MS: u32 = 81;

/// Scale-to-zero duration of a retiring cell
pub const RETIRE_SHRINK_MS: u32 = 500;

/// Rotation duration of a retiring cell
pub const RETIRE_ROTATE_MS: u32 = 300;

/// Final z-rotation of a retiring cell, in degrees
pub const RETIRE_ROTATION_DEG: f32 = -45.0;

/// Gravity drop and spawn entry duration
pub const DROP_DURATION_MS: u32 = 500;

/// Delay after which a gravity pass releases the interaction lock
pub const INTERACTION_RELEASE_MS: u32 = 500;

/// Snapped deltas below this magnitude (world units) count as "no direction"
pub const SNAP_EPSILON: f32 = 0.01;

/// Continuous 2D vector (screen positions, cell sizes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Lift into world space at the given depth
    pub fn extend(self, z: f32) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }
}

/// Continuous 3D vector (world positions and offsets)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation, `t` is clamped to `[0, 1]`
    ///
    /// # Examples
    ///
    /// ```
    /// use tile_stack_types::Vec3;
    ///
    /// let a = Vec3::new(0.0, 0.0, 0.0);
    /// let b = Vec3::new(1.0, 2.0, 0.0);
    /// assert_eq!(a.lerp(b, 2.0), b);
    /// assert_eq!(a.lerp(b, -1.0), a);
    /// ```
    pub fn lerp(self, to: Vec3, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        self.lerp_unclamped(to, t)
    }

    /// Linear interpolation without clamping (overshooting eases need it)
    pub fn lerp_unclamped(self, to: Vec3, t: f32) -> Vec3 {
        Vec3::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.z + (to.z - self.z) * t,
        )
    }

    pub fn truncate(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn distance(self, other: Vec3) -> f32 {
        let d = self - other;
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Integer grid coordinate
///
/// Signed so that neighbour arithmetic can step outside the grid and be
/// rejected by bounds checks instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const ZERO: GridPos = GridPos::new(0, 0);
    pub const LEFT: GridPos = GridPos::new(-1, 0);
    pub const RIGHT: GridPos = GridPos::new(1, 0);
    pub const UP: GridPos = GridPos::new(0, 1);
    pub const DOWN: GridPos = GridPos::new(0, -1);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for GridPos {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Index into the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorId(pub u16);

/// Stable identity of a cell
///
/// Ids are never reused within one cell arena, so a stale id cannot alias a
/// newer cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Easing curves understood by the motion scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    /// Overshoots the target slightly before settling
    OutBack,
    /// Pulls back slightly before accelerating into the target
    InBack,
    OutQuad,
}

impl Ease {
    const BACK_OVERSHOOT: f32 = 1.70158;

    /// Map normalized time `t ∈ [0, 1]` to progress (may leave `[0, 1]` for back eases)
    ///
    /// # Examples
    ///
    /// ```
    /// use tile_stack_types::Ease;
    ///
    /// for ease in [Ease::Linear, Ease::OutBack, Ease::InBack, Ease::OutQuad] {
    ///     assert!(ease.apply(0.0).abs() < 1e-6);
    ///     assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
    /// }
    /// ```
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let c1 = Self::BACK_OVERSHOOT;
        let c3 = c1 + 1.0;
        match self {
            Ease::Linear => t,
            Ease::OutBack => {
                let u = t - 1.0;
                1.0 + c3 * u * u * u + c1 * u * u
            }
            Ease::InBack => c3 * t * t * t - c1 * t * t,
            Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Pointer button phase for one tick
///
/// Mirrors "button went down this frame / is held / went up this frame".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPhase {
    #[default]
    Idle,
    Pressed,
    Held,
    Released,
}

/// Pointer state sampled once per tick, in screen space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub position: Vec2,
    pub phase: PointerPhase,
}

impl PointerSample {
    pub fn idle(position: Vec2) -> Self {
        Self {
            position,
            phase: PointerPhase::Idle,
        }
    }

    pub fn pressed(position: Vec2) -> Self {
        Self {
            position,
            phase: PointerPhase::Pressed,
        }
    }

    pub fn held(position: Vec2) -> Self {
        Self {
            position,
            phase: PointerPhase::Held,
        }
    }

    pub fn released(position: Vec2) -> Self {
        Self {
            position,
            phase: PointerPhase::Released,
        }
    }
}
