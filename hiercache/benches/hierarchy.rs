use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hiercache::config::{CoherenceMode, HierarchyConfig, ReplacementPolicyConfig};
use hiercache::simulator::Simulator;
use hiercache::util::generate_trace;

const CONFIG: &str = r#"{"L1_setBits": 6, "L1_ways": 4, "blockBits": 6, "L2_setBits": 9, "L2_ways": 8}"#;

/// Replays the same synthetic trace under every policy and mode
pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hierarchy");
    let config = HierarchyConfig::from_reader(CONFIG.as_bytes()).unwrap();
    // Spans a few times the L2 capacity, so both levels see real eviction traffic
    let trace = generate_trace(200_000, 1 << 20, 0x5eed);

    for mode in [CoherenceMode::Inclusive, CoherenceMode::Exclusive] {
        for policy in [ReplacementPolicyConfig::LeastRecentlyUsed, ReplacementPolicyConfig::LeastFrequentlyUsed] {
            group.bench_with_input(BenchmarkId::new(format!("{mode}"), format!("{policy:?}")), &trace, |bench, trace| {
                bench.iter(|| {
                    Simulator::new(&config, policy, mode)
                        .unwrap()
                        .replay(trace.iter().copied(), |_, _| {})
                        .unwrap()
                        .main_memory_accesses
                });
            });
        }
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
