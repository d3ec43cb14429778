//! Named one-shot setup commands
//!
//! Level setup happens outside the drag protocol: a host looks a command up by
//! name and runs it against the grid. The standard registry knows
//! `createGrid`, `clearGrid` and `randomizeColors`.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{error, info};

use crate::grid::GridStore;
use crate::motion::MotionScheduler;
use crate::palette::Palette;

/// Everything a command may touch
pub struct CommandContext<'a> {
    pub grid: &'a mut GridStore,
    pub palette: Option<&'a mut Palette>,
    pub motion: &'a mut dyn MotionScheduler,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("no palette colors available")]
    MissingPalette,
    #[error("command `{0}` rejected: the grid is busy")]
    Busy(String),
}

/// A command returns the number of cells it affected
pub type CommandFn = fn(&mut CommandContext<'_>) -> Result<usize, CommandError>;

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandFn>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.commands.keys()).finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in grid commands
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("createGrid", create_grid);
        registry.register("clearGrid", clear_grid);
        registry.register("randomizeColors", randomize_colors);
        registry
    }

    /// Add or replace a command
    pub fn register(&mut self, name: &'static str, command: CommandFn) {
        self.commands.insert(name, command);
    }

    pub fn get(&self, name: &str) -> Option<CommandFn> {
        self.commands.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    pub fn run(&self, name: &str, ctx: &mut CommandContext<'_>) -> Result<usize, CommandError> {
        let command = self
            .get(name)
            .ok_or_else(|| CommandError::Unknown(name.to_string()))?;
        command(ctx)
    }
}

/// Clear the grid, then fill every slot with a random palette color
///
/// Cells appear at their snapped slot position, hit-testable.
pub fn create_grid(ctx: &mut CommandContext<'_>) -> Result<usize, CommandError> {
    let Some(palette) = ctx.palette.as_deref_mut().filter(|p| !p.is_empty()) else {
        error!("cannot create grid: no palette colors assigned");
        return Err(CommandError::MissingPalette);
    };

    clear_placed(ctx.grid, ctx.motion);

    let mut created = 0;
    for x in 0..ctx.grid.width() as i32 {
        for y in 0..ctx.grid.height() as i32 {
            let Some(color) = palette.random_color() else {
                return Err(CommandError::MissingPalette);
            };
            let position = ctx.grid.world_position(x, y, true);
            let id = ctx.grid.spawn_cell(color, position);
            ctx.grid.place(id, x, y);
            if let Some(cell) = ctx.grid.cell_mut(id) {
                cell.hit_testable = true;
            }
            created += 1;
        }
    }
    info!(created, "grid created");
    Ok(created)
}

/// Destroy every placed cell
pub fn clear_grid(ctx: &mut CommandContext<'_>) -> Result<usize, CommandError> {
    let removed = clear_placed(ctx.grid, ctx.motion);
    info!(removed, "grid cleared");
    Ok(removed)
}

/// Give every placed cell a fresh random color
pub fn randomize_colors(ctx: &mut CommandContext<'_>) -> Result<usize, CommandError> {
    let Some(palette) = ctx.palette.as_deref_mut().filter(|p| !p.is_empty()) else {
        error!("cannot randomize colors: no palette colors assigned");
        return Err(CommandError::MissingPalette);
    };

    let placed: Vec<_> = ctx.grid.iter_placed().map(|(_, id)| id).collect();
    let mut recolored = 0;
    for id in placed {
        let Some(color) = palette.random_color() else {
            break;
        };
        if let Some(cell) = ctx.grid.cell_mut(id) {
            cell.color = color;
            recolored += 1;
        }
    }
    info!(recolored, "randomized cell colors");
    Ok(recolored)
}

fn clear_placed(grid: &mut GridStore, motion: &mut dyn MotionScheduler) -> usize {
    let placed: Vec<_> = grid.iter_placed().map(|(_, id)| id).collect();
    for &id in &placed {
        motion.kill(id);
        grid.destroy_cell(id);
    }
    placed.len()
}
