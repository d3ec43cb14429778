//! Core simulation - pure, deterministic, and testable
//!
//! A grid of colored cells the player drags across to collect a same-colored
//! stack. Releasing a stack of two or more merges it away; the columns then
//! compact downward and refill from above.
//!
//! Nothing here renders, reads a device, or spawns threads. Animation is a
//! contract ([`motion::MotionScheduler`]); screen projection and picking are
//! contracts ([`collab::Camera`], [`collab::HitTester`]). Hosts supply them, or
//! use the in-crate [`motion::Timeline`], [`collab::OrthoCamera`] and
//! [`collab::GridHitTester`].
//!
//! # Module Structure
//!
//! - [`grid`]: slot mapping, coordinate conversion, cell arena ownership
//! - [`cell`]: cell records and the arena that hands out ids
//! - [`palette`] / [`rng`]: color list and the seeded draw behind it
//! - [`gravity`]: column compaction and top-up spawning
//! - [`stack`]: the drag session and its merge animation
//! - [`controller`]: the Idle / Dragging state machine
//! - [`lock`]: interaction lock held during a gravity pass
//! - [`motion`]: animation contract, `Timeline`, `RecordingScheduler`
//! - [`commands`]: named setup commands (`createGrid`, ...)
//! - [`config`]: serde configuration with env overrides
//! - [`game`]: owns everything and drives it from `tick`
//! - [`snapshot`]: render-facing copy of the state
//!
//! # Example
//!
//! ```
//! use tile_stack_core::{Game, GameConfig, OrthoCamera, Timeline};
//! use tile_stack_core::types::PointerSample;
//!
//! let config = GameConfig::default();
//! let mut game = Game::from_config(&config, Timeline::new())
//!     .unwrap()
//!     .with_camera(OrthoCamera::identity());
//! game.init().unwrap();
//! assert!(game.grid().is_full());
//!
//! // Press on the bottom-left cell and let go again.
//! let at = game.grid().world_position(0, 0, true).truncate();
//! game.tick(16, PointerSample::pressed(at));
//! assert!(game.controller().is_dragging());
//! game.tick(16, PointerSample::released(at));
//! assert!(!game.controller().is_dragging());
//! ```

pub mod cell;
pub mod collab;
pub mod commands;
pub mod config;
pub mod controller;
pub mod game;
pub mod gravity;
pub mod grid;
pub mod lock;
pub mod motion;
pub mod palette;
pub mod rng;
pub mod snapshot;
pub mod stack;

pub use tile_stack_types as types;

pub use cell::{Cell, CellArena, CellLocation};
pub use collab::{Camera, GridHitTester, HitTester, OrthoCamera};
pub use commands::{CommandContext, CommandError, CommandFn, CommandRegistry};
pub use config::{ConfigError, GameConfig};
pub use controller::{DragContext, DragEvent, DragState, InputController, Release};
pub use game::{Game, GameEvent, GameStats};
pub use gravity::{CellDrop, CellSpawn, GravityReport, GravityResolver, GravitySettings};
pub use grid::{GridGeometry, GridStore};
pub use lock::InteractionLock;
pub use motion::{
    Completion, MotionHandle, MotionRequest, MotionScheduler, Recorded, RecordingScheduler,
    SequenceStep, Space, Timeline, Tween,
};
pub use palette::{ColorEntry, Palette};
pub use rng::SimpleRng;
pub use snapshot::{CellSnapshot, GridSnapshot};
pub use stack::{DragSession, SessionPhase, StackSettings};
