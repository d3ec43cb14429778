//! Drag-to-merge tile grid
//!
//! Facade over the workspace crates:
//!
//! - [`types`]: vectors, ids, pointer samples, default tunables
//! - [`core`]: grid, gravity, drag sessions, input controller, game loop
//! - [`input`]: terminal mouse/key mapping
//! - [`term`]: framebuffer renderer and board view

pub use tile_stack_core as core;
pub use tile_stack_input as input;
pub use tile_stack_term as term;
pub use tile_stack_types as types;
