//! End-to-end drag scenarios driven through `Game::tick`.

use tile_stack::core::{
    Completion, Game, GameEvent, GridGeometry, GridStore, OrthoCamera, Palette,
    RecordingScheduler,
};
use tile_stack::types::{CellId, ColorId, GridPos, PointerSample, Vec2};

const RED: ColorId = ColorId(0);
const BLUE: ColorId = ColorId(2);

/// Row-major (bottom row first) grid with every cell hit-testable
fn game_from_rows(rows: &[&[ColorId]]) -> Game<RecordingScheduler> {
    let height = rows.len() as u16;
    let width = rows[0].len() as u16;
    let mut grid = GridStore::new(width, height, GridGeometry::default());
    for (y, row) in rows.iter().enumerate() {
        for (x, &color) in row.iter().enumerate() {
            let (x, y) = (x as i32, y as i32);
            let id = grid.spawn_cell(color, grid.world_position(x, y, true));
            grid.place(id, x, y);
            grid.cell_mut(id).unwrap().hit_testable = true;
        }
    }
    Game::new(grid, Some(Palette::standard(11)), RecordingScheduler::new())
        .with_camera(OrthoCamera::identity())
}

fn slot_screen(game: &Game<RecordingScheduler>, x: i32, y: i32) -> Vec2 {
    game.grid().world_position(x, y, true).truncate()
}

/// Every cell is placed in exactly the slot it records, or held by exactly one session
fn assert_exclusive(game: &Game<RecordingScheduler>) {
    let drag: &[CellId] = game.controller().session().map_or(&[], |s| s.cells());
    let merging: &[CellId] = game.merging().map_or(&[], |s| s.cells());

    for cell in game.grid().cells().iter() {
        let held_by = drag.contains(&cell.id) as usize + merging.contains(&cell.id) as usize;
        match cell.grid_pos() {
            Some(pos) => {
                assert_eq!(game.grid().try_get_at(pos), Some(cell.id), "{} slot", cell.id);
                assert_eq!(held_by, 0, "{} placed and held", cell.id);
            }
            None => assert_eq!(held_by, 1, "{} held by {held_by} sessions", cell.id),
        }
    }
}

fn settle(game: &mut Game<RecordingScheduler>) {
    for _ in 0..8 {
        game.tick(16, PointerSample::idle(Vec2::ZERO));
        assert_exclusive(game);
    }
}

#[test]
fn test_scenario_a_merge_two_reds_blocked_by_blue() {
    let mut game = game_from_rows(&[&[RED, RED, BLUE]]);
    let red0 = game.grid().try_get(0, 0).unwrap();
    let red1 = game.grid().try_get(1, 0).unwrap();
    let blue = game.grid().try_get(2, 0).unwrap();

    game.tick(16, PointerSample::pressed(slot_screen(&game, 0, 0)));
    assert_eq!(game.controller().session().unwrap().cells(), &[red0]);
    assert_exclusive(&game);

    let col1 = slot_screen(&game, 1, 0);
    for _ in 0..30 {
        game.tick(16, PointerSample::held(col1));
        assert_exclusive(&game);
    }
    assert_eq!(
        game.controller().session().unwrap().cells(),
        &[red0, red1]
    );

    // Blue blocks: the anchor stalls on column 1 and never enters column 2.
    let col2 = slot_screen(&game, 2, 0);
    let boundary = game.grid().world_position(2, 0, false).x;
    for _ in 0..30 {
        game.tick(16, PointerSample::held(col2));
        let anchor = game.controller().session().unwrap().anchor();
        assert!(anchor.x < boundary, "anchor {anchor:?} crossed into column 2");
        assert_exclusive(&game);
    }
    let anchor = game.controller().session().unwrap().anchor();
    assert_eq!(game.grid().grid_position(anchor), GridPos::new(1, 0));
    assert_eq!(game.controller().session().unwrap().count(), 2);

    game.tick(16, PointerSample::released(col2));
    assert!(game.is_merging());
    settle(&mut game);

    // Reverse insertion order retirement.
    let retired: Vec<CellId> = game
        .motion()
        .sequences()
        .flat_map(|steps| steps.iter())
        .filter_map(|s| match s.request.on_complete {
            Some(Completion::CellRetired(id)) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(retired, vec![red1, red0]);

    let events = game.drain_events();
    let gravity: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::GravityResolved(report) => Some(report),
            _ => None,
        })
        .collect();
    assert_eq!(gravity.len(), 1);
    let mut spawned_columns: Vec<i32> = gravity[0].spawns.iter().map(|s| s.column).collect();
    spawned_columns.sort_unstable();
    assert_eq!(spawned_columns, vec![0, 1]);
    assert_eq!(gravity[0].moved().count(), 0);

    assert!(game.grid().is_full());
    assert_eq!(game.grid().try_get(2, 0), Some(blue));
    assert!(game.grid().cell(red0).is_none());
    assert!(game.grid().cell(red1).is_none());
    assert_eq!(game.stats().gravity_passes, 1);
    assert!(!game.lock().is_held());
}

#[test]
fn test_scenario_b_single_cell_release_leaves_grid_unchanged() {
    let mut game = game_from_rows(&[&[RED, BLUE], &[BLUE, RED]]);
    let before: Vec<_> = game.grid().iter_placed().collect();

    let at = slot_screen(&game, 0, 0);
    game.tick(16, PointerSample::pressed(at));
    for _ in 0..5 {
        game.tick(16, PointerSample::held(at));
    }
    game.tick(16, PointerSample::released(at));
    settle(&mut game);

    assert_eq!(game.grid().iter_placed().collect::<Vec<_>>(), before);
    assert!(game.controller().session().is_none());
    assert_eq!(game.stats().gravity_passes, 0);
    assert!(!game
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::GravityResolved(_))));

    // The returned cell can be picked again.
    let id = game.grid().try_get(0, 0).unwrap();
    assert!(game.grid().cell(id).unwrap().hit_testable);
}

#[test]
fn test_scenario_c_off_grid_pointer_never_crosses_boundary() {
    let mut game = game_from_rows(&[&[BLUE, RED], &[RED, BLUE]]);
    let right_edge = game.grid().world_position(2, 0, false).x;

    game.tick(16, PointerSample::pressed(slot_screen(&game, 1, 0)));
    assert!(game.controller().is_dragging());

    let far_right = Vec2::new(right_edge + 5.0, slot_screen(&game, 1, 0).y);
    for _ in 0..40 {
        let grid = game.grid();
        assert!(!game.controller().move_allowed(GridPos::new(2, 0), grid));

        game.tick(16, PointerSample::held(far_right));
        let anchor = game.controller().session().unwrap().anchor();
        assert!(anchor.x <= right_edge, "anchor {anchor:?} left the grid");
    }
    assert_eq!(game.controller().session().unwrap().count(), 1);

    game.tick(16, PointerSample::released(far_right));
    settle(&mut game);
    assert!(game.grid().is_full());
}

#[test]
fn test_cancel_mid_drag_returns_every_cell_home() {
    let mut game = game_from_rows(&[&[RED, RED, RED]]);
    let before: Vec<_> = game.grid().iter_placed().collect();

    game.tick(16, PointerSample::pressed(slot_screen(&game, 0, 0)));
    for x in [1, 2] {
        for _ in 0..20 {
            game.tick(16, PointerSample::held(slot_screen(&game, x, 0)));
        }
    }
    assert_eq!(game.controller().session().unwrap().count(), 3);
    assert_eq!(game.grid().placed_count(), 0);

    assert_eq!(game.cancel_drag(), Some(3));
    assert_exclusive(&game);
    assert_eq!(game.grid().iter_placed().collect::<Vec<_>>(), before);

    settle(&mut game);
    for (pos, id) in game.grid().iter_placed() {
        assert_eq!(
            game.grid().cell(id).unwrap().position,
            game.grid().world_position(pos.x, pos.y, true)
        );
    }
    assert_eq!(game.stats().gravity_passes, 0);
}

#[test]
fn test_no_new_drag_while_merge_or_gravity_in_flight() {
    let mut game = game_from_rows(&[&[RED, RED], &[BLUE, BLUE]]);

    game.tick(16, PointerSample::pressed(slot_screen(&game, 0, 0)));
    for _ in 0..20 {
        game.tick(16, PointerSample::held(slot_screen(&game, 1, 0)));
    }
    game.tick(16, PointerSample::released(slot_screen(&game, 1, 0)));
    assert!(game.is_merging());

    // The press lands during the merge and is ignored.
    game.tick(16, PointerSample::pressed(slot_screen(&game, 0, 1)));
    assert!(!game.controller().is_dragging());

    settle(&mut game);
    assert!(game.is_settled());
    game.tick(16, PointerSample::pressed(slot_screen(&game, 0, 1)));
    assert!(game.controller().is_dragging());
}

#[test]
fn test_gravity_refused_while_cells_are_held() {
    let mut game = game_from_rows(&[&[RED], &[BLUE]]);
    let before: Vec<_> = game.grid().iter_placed().collect();

    game.tick(16, PointerSample::pressed(slot_screen(&game, 0, 0)));
    assert!(game.controller().is_dragging());
    assert!(game.resolve_gravity().is_none());
    assert!(!game.lock().is_held());
    assert_exclusive(&game);

    game.tick(16, PointerSample::released(slot_screen(&game, 0, 0)));
    settle(&mut game);
    assert_eq!(game.grid().iter_placed().collect::<Vec<_>>(), before);
    assert_eq!(game.stats().gravity_passes, 0);
}

#[test]
fn test_gravity_refused_during_merge() {
    let mut game = game_from_rows(&[&[RED, RED]]);
    game.tick(16, PointerSample::pressed(slot_screen(&game, 0, 0)));
    for _ in 0..20 {
        game.tick(16, PointerSample::held(slot_screen(&game, 1, 0)));
    }
    game.tick(16, PointerSample::released(slot_screen(&game, 1, 0)));
    assert!(game.is_merging());
    assert!(game.resolve_gravity().is_none());

    settle(&mut game);
    assert_eq!(game.stats().gravity_passes, 1);
    assert!(game.grid().is_full());
}
