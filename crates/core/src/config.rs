//! Game configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Hosts usually call [`GameConfig::from_env`], which reads the file named by
//! `TILE_STACK_CONFIG` (if set) and then applies the `TILE_STACK_SEED`,
//! `TILE_STACK_WIDTH` and `TILE_STACK_HEIGHT` overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::gravity::GravitySettings;
use crate::grid::GridGeometry;
use crate::palette::{standard_entries, ColorEntry, Palette};
use crate::stack::StackSettings;
use crate::types::{
    Ease, Vec2, Vec3, CELL_ADD_DURATION_MS, DEFAULT_CELL_SIZE, DEFAULT_GRID_HEIGHT,
    DEFAULT_GRID_WIDTH, DROP_DURATION_MS, INTERACTION_RELEASE_MS, MERGE_SETTLE_MS,
    MERGE_STAGGER_MS, RETIRE_ROTATE_MS, RETIRE_ROTATION_DEG, RETIRE_SHRINK_MS, SNAP_EPSILON,
    STACK_MOVE_SPEED, STACK_OFFSET,
};

pub const CONFIG_PATH_ENV: &str = "TILE_STACK_CONFIG";
pub const SEED_ENV: &str = "TILE_STACK_SEED";
pub const WIDTH_ENV: &str = "TILE_STACK_WIDTH";
pub const HEIGHT_ENV: &str = "TILE_STACK_HEIGHT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u16,
    pub height: u16,
    pub cell_size: [f32; 2],
    pub origin: [f32; 3],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            cell_size: [DEFAULT_CELL_SIZE.x, DEFAULT_CELL_SIZE.y],
            origin: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub move_speed: f32,
    pub stack_offset: [f32; 3],
    pub cell_add_duration_ms: u32,
    pub snap_epsilon: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            move_speed: STACK_MOVE_SPEED,
            stack_offset: [STACK_OFFSET.x, STACK_OFFSET.y, STACK_OFFSET.z],
            cell_add_duration_ms: CELL_ADD_DURATION_MS,
            snap_epsilon: SNAP_EPSILON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub settle_ms: u32,
    pub stagger_ms: u32,
    pub shrink_ms: u32,
    pub rotate_ms: u32,
    pub rotation_deg: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            settle_ms: MERGE_SETTLE_MS,
            stagger_ms: MERGE_STAGGER_MS,
            shrink_ms: RETIRE_SHRINK_MS,
            rotate_ms: RETIRE_ROTATE_MS,
            rotation_deg: RETIRE_ROTATION_DEG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    pub drop_duration_ms: u32,
    pub release_delay_ms: u32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            drop_duration_ms: DROP_DURATION_MS,
            release_delay_ms: INTERACTION_RELEASE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for palette draws
    pub seed: u32,
    pub grid: GridConfig,
    pub drag: DragConfig,
    pub merge: MergeConfig,
    pub gravity: GravityConfig,
    /// An empty list disables spawning
    pub palette: Vec<ColorEntry>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            grid: GridConfig::default(),
            drag: DragConfig::default(),
            merge: MergeConfig::default(),
            gravity: GravityConfig::default(),
            palette: standard_entries(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading config");
        Self::from_json_str(&json)
    }

    /// Config file from `TILE_STACK_CONFIG` (defaults otherwise) plus env overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env;

        let mut config = match env::var(CONFIG_PATH_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(seed) = env::var(SEED_ENV).ok().and_then(|s| s.parse().ok()) {
            config.seed = seed;
        }
        if let Some(width) = env::var(WIDTH_ENV).ok().and_then(|s| s.parse().ok()) {
            config.grid.width = width;
        }
        if let Some(height) = env::var(HEIGHT_ENV).ok().and_then(|s| s.parse().ok()) {
            config.grid.height = height;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.grid.width == 0 || self.grid.height == 0 {
            return invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.width, self.grid.height
            ));
        }
        if self.grid.cell_size.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return invalid(format!(
                "cell_size must be positive, got {:?}",
                self.grid.cell_size
            ));
        }
        if self.grid.origin.iter().any(|v| !v.is_finite()) {
            return invalid("origin must be finite".to_string());
        }
        if !self.drag.move_speed.is_finite() || self.drag.move_speed < 0.0 {
            return invalid(format!(
                "move_speed must be non-negative, got {}",
                self.drag.move_speed
            ));
        }
        if !self.drag.snap_epsilon.is_finite() || self.drag.snap_epsilon < 0.0 {
            return invalid(format!(
                "snap_epsilon must be non-negative, got {}",
                self.drag.snap_epsilon
            ));
        }
        if self.drag.stack_offset.iter().any(|v| !v.is_finite()) {
            return invalid("stack_offset must be finite".to_string());
        }
        if !self.merge.rotation_deg.is_finite() {
            return invalid("rotation_deg must be finite".to_string());
        }
        if let Some(entry) = self.palette.iter().find(|e| e.name.trim().is_empty()) {
            return invalid(format!("palette entry {:?} has an empty name", entry.glyph));
        }
        Ok(())
    }

    pub fn grid_geometry(&self) -> GridGeometry {
        let [cx, cy] = self.grid.cell_size;
        let [ox, oy, oz] = self.grid.origin;
        GridGeometry {
            cell_size: Vec2::new(cx, cy),
            origin: Vec3::new(ox, oy, oz),
        }
    }

    pub fn stack_settings(&self) -> StackSettings {
        let [x, y, z] = self.drag.stack_offset;
        StackSettings {
            move_speed: self.drag.move_speed,
            offset: Vec3::new(x, y, z),
            add_duration_ms: self.drag.cell_add_duration_ms,
            settle_ms: self.merge.settle_ms,
            stagger_ms: self.merge.stagger_ms,
            shrink_ms: self.merge.shrink_ms,
            rotate_ms: self.merge.rotate_ms,
            rotation_deg: self.merge.rotation_deg,
        }
    }

    pub fn gravity_settings(&self) -> GravitySettings {
        GravitySettings {
            drop_duration_ms: self.gravity.drop_duration_ms,
            drop_ease: Ease::OutBack,
            release_delay_ms: self.gravity.release_delay_ms,
        }
    }

    /// Seeded palette, or `None` when the list is empty
    pub fn palette(&self) -> Option<Palette> {
        (!self.palette.is_empty()).then(|| Palette::new(self.palette.clone(), self.seed))
    }
}
