//! Benchmarks for softkin colony simulation.

use criterion::{criterion_group, criterion_main, Criterion};
use softkin::*;

fn bench_construct_destroy(c: &mut Criterion) {
    c.bench_function("construct_destroy_10x10_grid", |b| {
        let props: AgentProperties<f32> = AgentProperties::grid(Vec2::new(0.0, 0.0)).with_grid_dims(10, 10);
        let mut colony = Colony::default();
        b.iter(|| {
            let id = colony.construct(&props).unwrap();
            colony.destroy(id).unwrap();
        });
    });
}

fn bench_colony_tick(c: &mut Criterion) {
    c.bench_function("colony_12_agents_60_ticks", |b| {
        let grid = AgentProperties::grid(Vec2::new(0.0, 0.0));
        let disc = AgentProperties::disc(Vec2::new(0.0, 0.0));
        b.iter(|| {
            let solver = SolverConfig::new()
                .with_gravity(Vec2::new(0.0, 30.0))
                .with_bounds(Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(800.0, 600.0), 0.3));
            let mut colony: Colony<f32> = Colony::new(solver, BondingConfig::default()).unwrap();
            for i in 0..6 {
                let x = 20.0 + i as f32 * 125.0;
                colony.construct(&AgentProperties::grid(Vec2::new(x, 20.0)).with_seed(i)).unwrap();
                colony.construct(&AgentProperties::disc(Vec2::new(x + 50.0, 300.0)).with_seed(i)).unwrap();
            }
            colony.set_targets_all(&[
                Target::person(Vec2::new(400.0, 300.0), Stimulus::Attract),
                Target::person(Vec2::new(200.0, 150.0), Stimulus::Tickle),
            ]);
            for _ in 0..60 {
                colony.tick(1.0 / 60.0, &grid, &disc).unwrap();
            }
            colony.roster().bond_count()
        });
    });
}

fn bench_compound_groups(c: &mut Criterion) {
    c.bench_function("compound_groups_chain_of_20", |b| {
        let config = BondingConfig::default().with_max_bonds(2, 4);
        let mut colony: Colony<f32> = Colony::new(SolverConfig::new(), config).unwrap();
        let ids: Vec<_> = (0..20)
            .map(|i| colony.construct(&AgentProperties::disc(Vec2::new(i as f32 * 100.0, 0.0))).unwrap())
            .collect();
        for pair in ids.windows(2) {
            // Rim vertex 1 points +X, rim vertex 7 points -X on a 12-segment disc.
            let a = colony.agent(pair[0]).unwrap().graph().body(1).unwrap();
            let b = colony.agent(pair[1]).unwrap().graph().body(7).unwrap();
            colony.on_contact_start(a, b);
        }
        colony.flush_bonds();
        b.iter(|| colony.compound_groups());
    });
}

criterion_group!(benches, bench_construct_destroy, bench_colony_tick, bench_compound_groups);
criterion_main!(benches);
