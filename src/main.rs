//! Terminal tile-stack runner (default binary).
//!
//! Drag with the left mouse button across same-colored cells; release a stack
//! of two or more to merge it. Uses crossterm for input and the framebuffer
//! renderer from `tile-stack-term`.
//!
//! Environment:
//! - `TILE_STACK_CONFIG`, `TILE_STACK_SEED`, `TILE_STACK_WIDTH`, `TILE_STACK_HEIGHT`: see `GameConfig::from_env`
//! - `TILE_STACK_LOG_PATH`: write `tracing` output to this file (filtered by `RUST_LOG`)

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tile_stack::core::{Game, GameConfig, GridSnapshot, Timeline};
use tile_stack::input::{handle_key_event, should_quit, HostAction, PointerTracker};
use tile_stack::term::{BoardView, FrameBuffer, TerminalRenderer, Viewport};
use tile_stack::types::TICK_MS;

const LOG_PATH_ENV: &str = "TILE_STACK_LOG_PATH";

fn main() -> Result<()> {
    init_tracing()?;

    let config = GameConfig::from_env().context("loading configuration")?;
    let mut game = Game::from_config(&config, Timeline::new())?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &mut game);

    game.teardown();
    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// Log to a file only: the terminal itself is the UI.
fn init_tracing() -> Result<()> {
    let Some(path) = std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return Ok(());
    };

    let file = File::create(&path).with_context(|| format!("creating log file {path}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn run(term: &mut TerminalRenderer, game: &mut Game<Timeline>) -> Result<()> {
    let view = BoardView::default();
    let mut viewport = current_viewport();
    game.set_camera(Some(Box::new(view.camera(game.grid(), viewport))));

    if let Err(err) = game.init() {
        warn!(%err, "grid setup failed");
    }

    let mut pointer = PointerTracker::new();
    let mut snapshot = GridSnapshot::default();
    let mut fb = FrameBuffer::new(viewport.width, viewport.height);

    let tick_duration = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    loop {
        // Render.
        game.snapshot_into(&mut snapshot);
        let camera = view.camera(game.grid(), viewport);
        view.render_into(&snapshot, &camera, game.palette(), viewport, &mut fb);
        term.draw_swap(&mut fb)?;

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    match handle_key_event(key) {
                        Some(HostAction::CancelDrag) => {
                            game.cancel_drag();
                        }
                        Some(HostAction::RunCommand(name)) => match game.run_command(name) {
                            Ok(count) => info!(command = name, count, "command finished"),
                            Err(err) => warn!(%err, "command failed"),
                        },
                        None => {}
                    }
                }
                Event::Mouse(mouse) => pointer.handle_mouse_event(mouse),
                Event::Resize(w, h) => {
                    viewport = Viewport::new(w, h);
                    game.set_camera(Some(Box::new(view.camera(game.grid(), viewport))));
                    term.invalidate();
                }
                Event::FocusLost => {
                    if pointer.reset().is_some() {
                        game.cancel_drag();
                    }
                }
                _ => {}
            }
        }

        // Tick.
        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();
            game.tick(TICK_MS, pointer.update());
            for event in game.drain_events() {
                debug!(?event, "game event");
            }
        }
    }
}

fn current_viewport() -> Viewport {
    let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
    Viewport::new(w, h)
}
