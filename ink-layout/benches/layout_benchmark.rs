use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ink_layout::{compute_tab_layout, TabMetrics, TabStrip};
use std::hint::black_box;

/// Benchmark: pure layout for growing sheet counts
fn bench_compute(c: &mut Criterion) {
    let metrics = TabMetrics::default();
    let mut group = c.benchmark_group("compute_tab_layout");

    for count in [10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
            b.iter(|| compute_tab_layout(black_box(n), black_box(1280.0), &metrics))
        });
    }

    group.finish();
}

/// Benchmark: a drag-resize burst where every width is new
fn bench_resize_burst(c: &mut Criterion) {
    c.bench_function("tab_strip_resize_burst", |b| {
        b.iter(|| {
            let mut strip = TabStrip::default();
            for width in (200..1600).step_by(7) {
                strip.update(black_box(40), width as f32);
            }
        })
    });
}

criterion_group!(benches, bench_compute, bench_resize_burst);
criterion_main!(benches);
