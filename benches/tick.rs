use slime_simulation::settings::SimulationParams;
use slime_simulation::Simulation;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for count in [1_000usize, 4_000] {
        let params = SimulationParams {
            particle_count: count,
            ..Default::default()
        };
        let mut sim = Simulation::with_seed(256, 256, params, 42);
        sim.add_food_source(64.0, 64.0, 4.0, 1.0);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(sim.tick()))
        });
    }
    group.finish();
}

fn bench_tick_sticky(c: &mut Criterion) {
    let params = SimulationParams {
        particle_count: 3_000,
        sticking_probability: 0.5,
        release_probability: 0.01,
        ..Default::default()
    };
    let mut sim = Simulation::with_seed(256, 256, params, 7);
    sim.spawn_pinned(128.0, 128.0);
    c.bench_function("tick with aggregation", |b| b.iter(|| black_box(sim.tick())));
}

criterion_group!(benches, bench_tick, bench_tick_sticky);
criterion_main!(benches);
