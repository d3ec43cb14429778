//! Terminal input module (host-facing).
//!
//! Independent of any UI framework. Turns `crossterm` mouse events into one
//! [`types::PointerSample`] per tick and maps keys to [`HostAction`]s.

pub mod map;
pub mod pointer;

pub use tile_stack_types as types;

pub use map::{handle_key_event, should_quit, HostAction};
pub use pointer::PointerTracker;
