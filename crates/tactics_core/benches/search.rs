//! Grid search benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tactics_core::grid::{HexGrid, Terrain};
use tactics_core::hex::HexCoord;
use tactics_core::pathfinding::{find_path, Heuristic, PathOptions};
use tactics_core::rangefinder::{tiles_in_range, RangeFilter};

/// Square grid with a broken wall down the middle and rough ground around it.
fn walled_grid(side: u32) -> HexGrid {
    let mut grid = HexGrid::parallelogram(side, side);
    let mid = i32::try_from(side / 2).unwrap_or(0);
    let last = i32::try_from(side).unwrap_or(0) - 1;
    for r in 0..last {
        if r % 7 != 3 {
            grid.set_terrain(HexCoord::new(mid, r), Terrain::Wall).unwrap();
        }
        grid.set_terrain_cost(HexCoord::new(mid - 1, r), 2).unwrap();
    }
    grid
}

/// A* corner to corner with both heuristics.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    for side in [16u32, 32, 64] {
        let grid = walled_grid(side);
        let far = i32::try_from(side).unwrap_or(1) - 1;
        let (from, to) = (HexCoord::new(0, 0), HexCoord::new(far, far));

        for heuristic in [Heuristic::Euclidean, Heuristic::Dijkstra] {
            let options = PathOptions::default().with_heuristic(heuristic);
            group.bench_with_input(
                BenchmarkId::new(format!("{heuristic:?}"), side),
                &grid,
                |b, grid| b.iter(|| find_path(black_box(grid), from, to, &options)),
            );
        }
    }
    group.finish();
}

/// Movement-range flood fill at typical move ranges.
pub fn range_benchmark(c: &mut Criterion) {
    let grid = walled_grid(32);
    let origin = HexCoord::new(10, 16);
    let mut group = c.benchmark_group("tiles_in_range");
    for steps in [3u32, 6, 12] {
        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, &steps| {
            b.iter(|| tiles_in_range(black_box(&grid), origin, steps, RangeFilter::default()));
        });
    }
    group.finish();
}

criterion_group!(benches, pathfinding_benchmark, range_benchmark);
criterion_main!(benches);
