use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pinch_cactus::pinch::ThreadStore;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn build_thread_pair(rng: &mut StdRng, length: i64) -> ThreadStore {
    let mut store = ThreadStore::new();
    store.add_thread(1, 0, length).unwrap();
    store.add_thread(2, 0, length).unwrap();
    let _ = rng.gen::<u64>();
    store
}

fn bench_pinch_range(c: &mut Criterion) {
    static B: i64 = 1000;

    let mut group = c.benchmark_group("pinch_range");
    for size in [B, 2 * B, 4 * B, 8 * B] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &size, |b, &size| {
            b.iter_batched(
                || build_thread_pair(&mut StdRng::seed_from_u64(42), size),
                |mut store| {
                    pinch_cactus::pinch::pinch_range(&mut store, 1, 2, 0, 0, size, true).unwrap();
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_join_trivial_boundaries(c: &mut Criterion) {
    static B: i64 = 1000;

    let mut group = c.benchmark_group("join_trivial_boundaries");
    for size in [B, 2 * B, 4 * B] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("after_fragmented_pinch", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut store = build_thread_pair(&mut StdRng::seed_from_u64(7), size);
                    let mut rng = StdRng::seed_from_u64(7);
                    let mut pos = 0;
                    while pos < size {
                        let run = rng.gen_range(1..=5).min(size - pos);
                        pinch_cactus::pinch::pinch_range(&mut store, 1, 2, pos, pos, run, true).unwrap();
                        pos += run;
                    }
                    store
                },
                |mut store| {
                    pinch_cactus::pinch::join_trivial_boundaries(&mut store);
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pinch_range, bench_join_trivial_boundaries);
criterion_main!(benches);
