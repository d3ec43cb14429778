use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tile_stack::core::{
    Game, GameConfig, GravityResolver, GridGeometry, GridSnapshot, GridStore, InteractionLock,
    OrthoCamera, Palette, RecordingScheduler, Timeline,
};
use tile_stack::term::{BoardView, FrameBuffer, Viewport};
use tile_stack::types::{ColorId, PointerSample};

/// 6x8 grid with every other slot empty
fn checkered_grid() -> GridStore {
    let mut grid = GridStore::new(6, 8, GridGeometry::default());
    for y in 0..8 {
        for x in 0..6 {
            if (x + y) % 2 == 0 {
                let id = grid.spawn_cell(ColorId((x % 4) as u16), grid.world_position(x, y, true));
                grid.place(id, x, y);
            }
        }
    }
    grid
}

fn bench_gravity_pass(c: &mut Criterion) {
    let resolver = GravityResolver::default();

    c.bench_function("gravity_pass_6x8", |b| {
        b.iter_batched(
            || (checkered_grid(), Palette::standard(12345)),
            |(mut grid, mut palette)| {
                let mut lock = InteractionLock::new();
                let mut motion = RecordingScheduler::new();
                resolver.resolve(
                    black_box(&mut grid),
                    Some(&mut palette),
                    &mut lock,
                    &mut motion,
                )
            },
            BatchSize::SmallInput,
        )
    });
}

fn started_game() -> Game<Timeline> {
    let config = GameConfig::default();
    let mut game = Game::from_config(&config, Timeline::new())
        .expect("default config is valid")
        .with_camera(OrthoCamera::identity());
    game.init().expect("standard palette");
    game
}

fn bench_drag_tick(c: &mut Criterion) {
    let mut game = started_game();
    let start = game.grid().world_position(0, 0, true).truncate();
    let target = game.grid().world_position(5, 7, true).truncate();
    game.tick(16, PointerSample::pressed(start));

    c.bench_function("drag_tick_16ms", |b| {
        b.iter(|| {
            game.tick(black_box(16), PointerSample::held(target));
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let game = started_game();
    let mut snapshot = GridSnapshot::default();

    c.bench_function("snapshot_into", |b| {
        b.iter(|| {
            game.snapshot_into(black_box(&mut snapshot));
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let game = started_game();
    let snapshot = game.snapshot();
    let view = BoardView::default();
    let viewport = Viewport::new(80, 24);
    let camera = view.camera(game.grid(), viewport);
    let mut fb = FrameBuffer::new(viewport.width, viewport.height);

    c.bench_function("board_view_render_into", |b| {
        b.iter(|| {
            view.render_into(
                black_box(&snapshot),
                &camera,
                game.palette(),
                viewport,
                &mut fb,
            );
        })
    });
}

criterion_group!(
    benches,
    bench_gravity_pass,
    bench_drag_tick,
    bench_snapshot,
    bench_render
);
criterion_main!(benches);
