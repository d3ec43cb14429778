//! Building games from JSON configuration

use tile_stack::core::{ColorEntry, Game, GameConfig, OrthoCamera, RecordingScheduler};
use tile_stack::types::PointerSample;

#[test]
fn test_config_survives_json_roundtrip() {
    let mut config = GameConfig::default();
    config.seed = 7;
    config.grid.width = 4;
    config.palette = vec![ColorEntry::new("red", 'R'), ColorEntry::new("blue", 'B')];

    let json = serde_json::to_string_pretty(&config).unwrap();
    let back = GameConfig::from_json_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_game_from_config_fills_configured_grid() {
    let config = GameConfig::from_json_str(
        r#"{
            "seed": 3,
            "grid": { "width": 4, "height": 3, "cell_size": [1.0, 1.0] },
            "palette": [
                { "name": "red", "glyph": "R" },
                { "name": "green", "glyph": "G" }
            ]
        }"#,
    )
    .unwrap();

    let mut game = Game::from_config(&config, RecordingScheduler::new()).unwrap();
    game.init().unwrap();

    let snap = game.snapshot();
    assert_eq!((snap.width, snap.height), (4, 3));
    assert_eq!(snap.placed_count(), 12);
    assert!(snap.slots.iter().flatten().all(|c| c.0 < 2));
    assert!(snap.playable());
}

#[test]
fn test_same_seed_builds_same_grid() {
    let config = GameConfig::from_json_str(r#"{ "seed": 1234 }"#).unwrap();
    let build = || {
        let mut game = Game::from_config(&config, RecordingScheduler::new()).unwrap();
        game.init().unwrap();
        game.snapshot().slots
    };
    assert_eq!(build(), build());
}

#[test]
fn test_empty_palette_game_cannot_create_grid() {
    let config = GameConfig::from_json_str(r#"{ "palette": [] }"#).unwrap();
    let mut game = Game::from_config(&config, RecordingScheduler::new()).unwrap();
    assert!(game.init().is_err());
    assert_eq!(game.grid().placed_count(), 0);
}

#[test]
fn test_configured_drag_speed_is_used() {
    let config = GameConfig::from_json_str(
        r#"{ "grid": { "width": 3, "height": 1 }, "drag": { "move_speed": 0.0 } }"#,
    )
    .unwrap();
    let mut game = Game::from_config(&config, RecordingScheduler::new())
        .unwrap()
        .with_camera(OrthoCamera::identity());
    game.init().unwrap();

    let start = game.grid().world_position(0, 0, true);
    game.tick(16, PointerSample::pressed(start.truncate()));
    let far = game.grid().world_position(2, 0, true).truncate();
    for _ in 0..10 {
        game.tick(16, PointerSample::held(far));
    }
    // Zero speed: the anchor never leaves the first cell.
    let session = game.controller().session().unwrap();
    assert_eq!(session.anchor(), start);
}
