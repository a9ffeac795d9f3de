use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pinch_cactus::cactus::CactusGraph;
use pinch_cactus::tecc::BruteForceThreeEdgeConnected;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn build_cycle_graph(size: usize, rng: &mut StdRng) -> (CactusGraph<usize, ()>, pinch_cactus::cactus::NodeId) {
    let mut g = CactusGraph::new();
    let nodes: Vec<_> = (0..size).map(|i| g.add_node(i)).collect();
    for i in 0..size {
        g.add_edge(nodes[i], nodes[(i + 1) % size], (), ());
    }
    for _ in 0..size / 4 {
        let a = nodes[rng.gen_range(0..size)];
        let b = nodes[rng.gen_range(0..size)];
        g.add_edge(a, b, (), ());
    }
    (g, nodes[0])
}

fn bench_mark_cycles(c: &mut Criterion) {
    static B: usize = 200;

    let mut group = c.benchmark_group("mark_cycles");
    for size in [B, 2 * B, 4 * B] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("ring_plus_bridges", size), &size, |b, &size| {
            b.iter_batched(
                || build_cycle_graph(size, &mut StdRng::seed_from_u64(11)),
                |(mut g, start)| {
                    g.mark_cycles(start);
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_collapse_to_cactus(c: &mut Criterion) {
    static B: usize = 100;

    let mut group = c.benchmark_group("collapse_to_cactus");
    for size in [B, 2 * B] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("ring_plus_bridges", size), &size, |b, &size| {
            b.iter_batched(
                || build_cycle_graph(size, &mut StdRng::seed_from_u64(99)),
                |(mut g, start)| {
                    let tecc = BruteForceThreeEdgeConnected;
                    g.collapse_to_cactus(start, &tecc, |a, _b| a);
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mark_cycles, bench_collapse_to_cactus);
criterion_main!(benches);
