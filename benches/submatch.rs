//! Submatch reconstruction benchmarks: diagonal grouping and run
//! detection over synthetic anchor sets.
//!
//! Run with: cargo bench --bench submatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use symhound::submatch::{reconstruct, Anchor};

const WIDTH: usize = 8;

/// `n_symbols` candidate symbols, each contributing one run of
/// `run_len` consecutive anchors on the zero diagonal against the query.
fn synthetic_anchors(n_symbols: i64, run_len: i64) -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity((n_symbols * run_len) as usize);
    for sym in 0..n_symbols {
        for q in 0..run_len {
            anchors.push(Anchor {
                other_symbol_id: sym,
                project_id: 1,
                source_id: 1,
                query_pos: q,
                match_pos: q,
            });
        }
    }
    anchors
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    for n_symbols in [16i64, 256, 4096] {
        let anchors = synthetic_anchors(n_symbols, 20);
        group.throughput(Throughput::Elements(anchors.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_symbols),
            &anchors,
            |b, anchors| b.iter(|| reconstruct(black_box(anchors), black_box(WIDTH), black_box(10))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_reconstruct);
criterion_main!(benches);
