//! Tick throughput benchmark.
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use ironvein_sim::{Difficulty, SimWorld};

fn bench_skirmish_tick(c: &mut Criterion) {
    c.bench_function("skirmish_tick_hard_ai", |b| {
        let mut sim = SimWorld::new_skirmish(7, Difficulty::Hard);
        // Warm up past the opening build order.
        for _ in 0..200 {
            sim.tick();
        }
        b.iter(|| sim.tick());
    });
}

fn bench_mass_battle_tick(c: &mut Criterion) {
    c.bench_function("mass_battle_tick_200_tanks", |b| {
        let mut sim = SimWorld::sandbox(7);
        let p0 = sim.add_player(false, Difficulty::Easy);
        let p1 = sim.add_player(false, Difficulty::Easy);
        for i in 0..100 {
            let row = (i % 10) as f32;
            let col = (i / 10) as f32;
            sim.spawn_unit_at(p0, "light_tank", 300.0 + row * 45.0, 300.0 + col * 45.0);
            sim.spawn_unit_at(p1, "light_tank", 1500.0 + row * 45.0, 1100.0 + col * 45.0);
        }
        b.iter(|| sim.tick());
    });
}

criterion_group!(benches, bench_skirmish_tick, bench_mass_battle_tick);
criterion_main!(benches);
