//! Benchmarks for placement, group matching, and move resolution.
//!
//! Run with: cargo bench -p gridpack

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use gridpack::placement::{SearchScope, find_position};
use gridpack::resolve::resolve_move;
use gridpack::{Board, CellPos, GridConfig, GridPlane, GroupMatcher, Widget, WidgetId, WidgetSize};
use std::hint::black_box;

fn id(raw: u64) -> WidgetId {
    WidgetId::new(raw).expect("non-zero")
}

/// A grid of `rows × columns` filled with 1×1 widgets, leaving the last
/// `free` cells empty.
fn tiled(config: &GridConfig, free: usize) -> Vec<Widget<()>> {
    let cells = config.cell_count().saturating_sub(free);
    (0..cells)
        .map(|idx| {
            let row = (idx / config.columns as usize) as u16;
            let col = (idx % config.columns as usize) as u16;
            Widget::new(id(idx as u64 + 1), WidgetSize::VerySmall, ()).at(CellPos::new(row, col))
        })
        .collect()
}

fn roomy(rows: u16, columns: u16) -> GridConfig {
    GridConfig::single_plane()
        .with_dims(rows, columns)
        .with_score_budget(u32::MAX)
}

fn bench_first_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("gridpack/first_fit");

    for (rows, columns) in [(4u16, 2u16), (8, 4), (16, 8)] {
        let config = roomy(rows, columns);
        let widgets = tiled(&config, 2);
        group.bench_with_input(
            BenchmarkId::new("nearly_full", format!("{rows}x{columns}")),
            &widgets,
            |b, widgets| {
                b.iter(|| {
                    black_box(find_position(
                        SearchScope::new(&config, widgets),
                        WidgetSize::Small,
                    ))
                })
            },
        );
    }

    group.finish();
}

fn bench_group_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("gridpack/group_matcher");

    for (rows, columns) in [(4u16, 2u16), (4, 4), (6, 4)] {
        let config = roomy(rows, columns);
        let widgets = tiled(&config, 0);
        let target = config.cell_count() as u32 / 2;
        group.bench_with_input(
            BenchmarkId::new("half_grid", format!("{rows}x{columns}")),
            &widgets,
            |b, widgets| {
                b.iter(|| {
                    let mut matcher = GroupMatcher::new(&config, widgets, &[]);
                    black_box(matcher.find(id(1), target))
                })
            },
        );
    }

    group.finish();
}

fn bench_resolve_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("gridpack/resolve_move");
    let config = GridConfig::single_plane();

    let exact = vec![
        Widget::new(id(1), WidgetSize::VerySmall, ()).at(CellPos::new(0, 0)),
        Widget::new(id(2), WidgetSize::VerySmall, ()).at(CellPos::new(0, 1)),
        Widget::new(id(3), WidgetSize::VerySmall, ()).at(CellPos::new(1, 0)),
        Widget::new(id(4), WidgetSize::VerySmall, ()).at(CellPos::new(1, 1)),
        Widget::new(id(5), WidgetSize::Medium, ()).at(CellPos::new(2, 0)),
    ];
    group.bench_function("exact_swap", |b| {
        b.iter(|| black_box(resolve_move(&config, &exact, id(5), CellPos::ORIGIN)))
    });

    let grouped = vec![
        Widget::new(id(1), WidgetSize::Medium, ()).at(CellPos::new(0, 0)),
        Widget::new(id(2), WidgetSize::VerySmall, ()).at(CellPos::new(2, 0)),
        Widget::new(id(3), WidgetSize::VerySmall, ()).at(CellPos::new(3, 0)),
        Widget::new(id(4), WidgetSize::Small, ()).at(CellPos::new(2, 1)),
    ];
    group.bench_function("group_swap", |b| {
        b.iter(|| black_box(resolve_move(&config, &grouped, id(2), CellPos::ORIGIN)))
    });

    group.finish();
}

fn bench_board_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("gridpack/board_stream");
    let sizes = [
        WidgetSize::VerySmall,
        WidgetSize::Small,
        WidgetSize::Medium,
        WidgetSize::Small,
        WidgetSize::Big,
    ];

    for count in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("add", count), &count, |b, &count| {
            b.iter_batched(
                || Board::<u32>::new(GridConfig::multi_plane()).expect("valid config"),
                |mut board| {
                    for n in 0..count {
                        let _ = board.add(sizes[n % sizes.len()], n as u32);
                    }
                    black_box(board.state_hash())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("plane_fill_and_compact", |b| {
        b.iter_batched(
            || GridPlane::<u32>::new(GridConfig::single_plane()).expect("valid config"),
            |mut plane| {
                for n in 0..8u32 {
                    let _ = plane.add(sizes[n as usize % sizes.len()], n);
                }
                if let Some(first) = plane.widgets().first().map(|w| w.id) {
                    let _ = plane.remove(first);
                }
                black_box(plane.compact())
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_first_fit,
    bench_group_matcher,
    bench_resolve_move,
    bench_board_stream
);
criterion_main!(benches);
