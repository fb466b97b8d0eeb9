use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mesh_topo::prelude::*;

fn layer(n: usize) -> (Session, CoEdgeId) {
    let mut s = Session::default();
    s.execute(NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [n, n, 1], [4, 4, 4]).unwrap())
        .unwrap();
    let g = s.graph();
    let b = g.live_blocks()[0];
    // vertical line of the first block: the cut runs through the whole layer
    let ce = g.block_line_chain(b, 0, 4).unwrap()[0].coedge;
    (s, ce)
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_blocks");

    for &n in &[4usize, 8, 16] {
        group.bench_with_input(BenchmarkId::new("propagate", n * n), &n, |b, &n| {
            b.iter_batched(
                || layer(n),
                |(mut s, ce)| {
                    let cmd = SplitBlocks::all_blocks(s.graph(), ce, 0.5).unwrap();
                    black_box(s.execute(cmd).unwrap());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("undo_redo", n * n), &n, |b, &n| {
            let (mut s, ce) = layer(n);
            s.execute(SplitBlocks::all_blocks(s.graph(), ce, 0.5).unwrap()).unwrap();
            b.iter(|| {
                s.undo().unwrap();
                s.redo().unwrap();
                black_box(s.graph().nb_blocks());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split);
criterion_main!(benches);
