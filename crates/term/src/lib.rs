//! Terminal rendering for the tile grid.
//!
//! A small, game-oriented rendering layer: the board is drawn into a plain
//! framebuffer that is then diffed and flushed to the terminal. No widget or
//! layout library is involved, which keeps the screen ↔ world mapping exact
//! (see [`BoardView::camera`]).

pub mod board_view;
pub mod fb;
pub mod renderer;

pub use tile_stack_core as core;
pub use tile_stack_types as types;

pub use board_view::{BoardLayout, BoardView, Viewport};
pub use fb::{FrameBuffer, Glyph, Rgb, Style};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
