//! Collaborator contracts for the pointer side: camera projection and hit-testing
//!
//! Hosts with a real renderer implement these against their own scene. The
//! provided [`OrthoCamera`] and [`GridHitTester`] are enough for flat,
//! axis-aligned hosts (terminal, tests).

use crate::grid::GridStore;
use crate::types::{CellId, Vec2, Vec3};

/// Maps screen positions into world space
pub trait Camera {
    /// Project a screen point onto the world plane `z = plane_z`
    ///
    /// `None` when the point cannot be projected (e.g. the ray misses the plane).
    fn project(&self, screen: Vec2, plane_z: f32) -> Option<Vec3>;
}

/// Maps a screen position to the cell under it
pub trait HitTester {
    fn pick(&self, screen: Vec2, camera: &dyn Camera, grid: &GridStore) -> Option<CellId>;
}

/// Orthographic camera: `world = world_origin + (screen - screen_origin) * scale`
///
/// A negative `scale.y` handles y-down screens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    pub screen_origin: Vec2,
    pub world_origin: Vec3,
    pub scale: Vec2,
}

impl OrthoCamera {
    pub fn new(screen_origin: Vec2, world_origin: Vec3, scale: Vec2) -> Self {
        Self {
            screen_origin,
            world_origin,
            scale,
        }
    }

    /// Screen coordinates are world coordinates
    pub fn identity() -> Self {
        Self::new(Vec2::ZERO, Vec3::ZERO, Vec2::new(1.0, 1.0))
    }

    /// World → screen, the inverse of [`Camera::project`]
    pub fn to_screen(&self, world: Vec3) -> Option<Vec2> {
        if self.scale.x == 0.0 || self.scale.y == 0.0 {
            return None;
        }
        Some(Vec2::new(
            self.screen_origin.x + (world.x - self.world_origin.x) / self.scale.x,
            self.screen_origin.y + (world.y - self.world_origin.y) / self.scale.y,
        ))
    }
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self::identity()
    }
}

impl Camera for OrthoCamera {
    fn project(&self, screen: Vec2, plane_z: f32) -> Option<Vec3> {
        if !screen.x.is_finite() || !screen.y.is_finite() {
            return None;
        }
        Some(Vec3::new(
            self.world_origin.x + (screen.x - self.screen_origin.x) * self.scale.x,
            self.world_origin.y + (screen.y - self.screen_origin.y) * self.scale.y,
            plane_z,
        ))
    }
}

/// Picks the placed, hit-testable cell whose slot contains the projected point
///
/// Unlike [`GridStore::grid_position`] this does not clamp: a point outside the
/// grid picks nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridHitTester;

impl HitTester for GridHitTester {
    fn pick(&self, screen: Vec2, camera: &dyn Camera, grid: &GridStore) -> Option<CellId> {
        let world = camera.project(screen, 0.0)?;
        let pos = grid.grid_position_unclamped(world);
        let id = grid.try_get_at(pos)?;
        let cell = grid.cell(id)?;
        (cell.hit_testable && cell.active).then_some(id)
    }
}
