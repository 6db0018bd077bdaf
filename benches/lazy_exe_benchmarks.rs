//! Benchmarks for lazy materialization.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lazy_exe::LazyExe;

/// Benchmark a full episode: first `path` call plus `cleanup`
fn bench_materialize_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize_cycle");

    for size in [0usize, 1_024, 65_536, 1_048_576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let bytes = vec![0xAAu8; size];
            b.iter(|| {
                let exe = LazyExe::new(bytes.clone());
                black_box(exe.path().unwrap());
                exe.cleanup().unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark the cached fast path: repeated `path` calls after the write
fn bench_cached_path(c: &mut Criterion) {
    let exe = LazyExe::new(vec![0xAAu8; 65_536]);
    exe.path().unwrap();

    c.bench_function("cached_path", |b| {
        b.iter(|| black_box(exe.path().unwrap()));
    });

    exe.cleanup().unwrap();
}

criterion_group!(benches, bench_materialize_cycle, bench_cached_path);
criterion_main!(benches);
