//! Criterion benchmarks for core histogram operations.
//!
//! Stable run tips:
//!   export RUSTFLAGS="-C target-cpu=native"
//!   export RAYON_NUM_THREADS=8       # or 1 for max stability
//!
//! Discover benches:
//!   cargo bench --bench histogram_core -- --list
//!
//! Save a baseline, then compare one group against it:
//!   cargo bench --bench histogram_core -- --save-baseline base
//!   cargo bench --bench histogram_core -- --baseline base "rank_at/batch"

use std::hint::black_box;
use std::sync::Once;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gr_histogram::histogram::Histogram;
use gr_histogram::quality;
use histogram_testdata::{gen_dataset, DistKind};
use rayon::ThreadPoolBuilder;

/* ------------------------ RAYON INIT (once) ------------------------ */

static RAYON_INIT: Once = Once::new();

fn init_rayon() {
    RAYON_INIT.call_once(|| {
        let builder = match std::env::var("RAYON_NUM_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            Some(n) => ThreadPoolBuilder::new().num_threads(n),
            None => ThreadPoolBuilder::new(),
        };
        let _ = builder.build_global(); // ignore Err if already built
    });
}

/* ------------------------ BUILD HELPERS ------------------------ */

fn build_histogram(kind: DistKind, n: usize, max_centroids: usize, seed: u64) -> Histogram {
    let data = gen_dataset(kind, n, seed);
    let mut h = Histogram::builder()
        .max_centroids(max_centroids)
        .markers(vec![0.5, 0.99])
        .build()
        .expect("valid budget");
    h.add_many(data).expect("finite data");
    h
}

#[derive(Clone, Copy)]
struct Params {
    n: usize,
    max_centroids: usize,
    kind: DistKind,
    seed: u64,
}

/* ------------------------ BENCH: INGEST ------------------------ */

fn bench_ingest(c: &mut Criterion) {
    let cases = [
        Params {
            n: 100_000,
            max_centroids: 100,
            kind: DistKind::Normal,
            seed: 42,
        },
        Params {
            n: 100_000,
            max_centroids: 1_000,
            kind: DistKind::Bimodal,
            seed: 42,
        },
        Params {
            n: 100_000,
            max_centroids: 100,
            kind: DistKind::Discrete { levels: 50 },
            seed: 42,
        },
    ];

    let mut g = c.benchmark_group("ingest");
    for p in cases {
        let data = gen_dataset(p.kind, p.n, p.seed);
        g.throughput(Throughput::Elements(p.n as u64));
        let id = BenchmarkId::from_parameter(format!(
            "n={},k={},kind={:?}",
            p.n, p.max_centroids, p.kind
        ));
        g.bench_with_input(id, &data, |b, data| {
            b.iter(|| {
                let mut h = Histogram::new(p.max_centroids).expect("valid budget");
                for &v in data {
                    black_box(h.add(v).expect("finite"));
                }
                black_box(h.centroid_count())
            });
        });
    }
    g.finish();
}

/* ------------------------ BENCH: MERGE ------------------------ */

fn bench_merge_from(c: &mut Criterion) {
    let a = build_histogram(DistKind::Uniform, 50_000, 500, 1);
    let b = build_histogram(DistKind::Normal, 50_000, 500, 2);

    let mut g = c.benchmark_group("merge_from");
    g.bench_function("k=500", |bench| {
        bench.iter(|| {
            let mut m = a.clone();
            m.merge_from(black_box(&b));
            black_box(m.count())
        });
    });
    g.finish();
}

/* --------------------- BENCH: QUERIES ------------------------ */

fn bench_queries(c: &mut Criterion) {
    init_rayon();
    let h = build_histogram(DistKind::LogNormal { sigma: 1.0 }, 200_000, 500, 123);

    let mut g_single = c.benchmark_group("query/single");
    g_single.bench_function("rank_at", |b| {
        b.iter(|| black_box(h.rank_at(black_box(0.5))));
    });
    g_single.bench_function("quantile_at", |b| {
        b.iter(|| black_box(h.quantile_at(black_box(0.95)).expect("non-empty")));
    });
    g_single.bench_function("marker_at", |b| {
        b.iter(|| black_box(h.marker_at(black_box(1)).expect("populated")));
    });
    g_single.finish();

    let mut g_batch = c.benchmark_group("rank_at/batch");
    for m in [1_000usize, 100_000] {
        let xs: Vec<f64> = (0..m).map(|i| i as f64 / m as f64).collect();
        g_batch.throughput(Throughput::Elements(m as u64));
        g_batch.bench_with_input(BenchmarkId::from_parameter(m), &xs, |b, xs| {
            b.iter(|| {
                let out = h.rank_at_many(black_box(xs));
                black_box(out[out.len() / 2])
            });
        });
    }
    g_batch.finish();

    let mut g_peaks = c.benchmark_group("peaks");
    g_peaks.bench_function("smoothing=3", |b| {
        b.iter(|| black_box(h.peaks(3).expect("smoothing").count()));
    });
    g_peaks.finish();
}

/* ------------------------ ACCURACY SNAPSHOT ------------------------ */

fn bench_quality(c: &mut Criterion) {
    let data = gen_dataset(DistKind::Bimodal, 100_000, 7);
    let mut g = c.benchmark_group("quality");
    g.sample_size(10);
    for k in [50usize, 200, 1_000] {
        let rep = quality::assess(&data, k).expect("non-empty sample");
        println!("[quality] {}", rep.to_line());
        g.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| black_box(quality::assess(&data, k).expect("non-empty sample")));
        });
    }
    g.finish();
}

/* ------------------------ registration ------------------------ */

fn configure() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(3))
        .sample_size(30)
        .without_plots()
}

criterion_group!(
    name = histogram_benches;
    config = configure();
    targets = bench_ingest, bench_merge_from, bench_queries, bench_quality
);
criterion_main!(histogram_benches);
