//! Criterion benchmarks for one full daily pass over the reference town.

use std::hint::black_box;

use contagion_bench::{reference_town, ResidentModel, DISEASE};
use contagion_core::Day;
use contagion_engine::{DailyScheduler, SchedulerConfig};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

fn bench_daily_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_pass");
    for threads in [1, 4] {
        let mut scheduler = DailyScheduler::new(SchedulerConfig {
            threads: Some(threads),
            shards_per_place: 4,
            seed: 7,
        })
        .unwrap();
        let shards = scheduler.config().shards_per_place;
        group.bench_function(format!("town_10k_households_{threads}t"), |b| {
            b.iter_batched(
                || reference_town(10_000, 5, 42, shards),
                |(mut population, places)| {
                    let model = ResidentModel::new(&population);
                    let m = scheduler.run_daily_pass(
                        DISEASE,
                        Day(0),
                        &mut population,
                        &places,
                        &model,
                    );
                    black_box(m.infections);
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_daily_pass);
criterion_main!(benches);
