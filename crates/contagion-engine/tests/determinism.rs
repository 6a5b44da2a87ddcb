//! Outcomes depend on the seed only, never on thread or shard count.

use contagion_core::{Day, DiseaseId, PlaceKind};
use contagion_engine::{ContactRates, DailyScheduler, DayMetrics, PopulationMask, SchedulerConfig};
use contagion_test_utils::fixtures::Town;
use contagion_test_utils::{ScriptedModel, SpreadRecord, TestAgent};

const COVID: DiseaseId = DiseaseId(0);

struct Outcome {
    agents: Vec<TestAgent>,
    records: Vec<SpreadRecord>,
    metrics: Vec<DayMetrics>,
}

fn run(threads: usize, shards: usize, seed: u64, days: u32) -> Outcome {
    let mut town = Town::build(40, 4, 1, shards);
    town.seed(COVID, &[0, 37, 101]);
    let rates = ContactRates::uniform(2.0, 0.2).with(PlaceKind::Household, 3.0, 0.4);
    let model = ScriptedModel::with_rates(&town.population, rates);
    let mut sched = DailyScheduler::new(SchedulerConfig {
        threads: Some(threads),
        shards_per_place: shards,
        seed,
    })
    .unwrap();

    let metrics = (0..days)
        .map(|d| sched.run_daily_pass(COVID, Day(d), &mut town.population, &town.places, &model))
        .collect();
    Outcome {
        agents: town
            .agents
            .iter()
            .map(|&a| town.population.get(a).clone())
            .collect(),
        records: model.records(),
        metrics,
    }
}

fn strip_timings(metrics: &[DayMetrics]) -> Vec<DayMetrics> {
    metrics
        .iter()
        .map(|m| DayMetrics {
            infectious_pass_us: 0,
            susceptible_pass_us: 0,
            transmission_us: 0,
            apply_us: 0,
            reset_us: 0,
            total_us: 0,
            ..m.clone()
        })
        .collect()
}

#[test]
fn thread_and_shard_count_do_not_change_outcomes() {
    let serial = run(1, 1, 99, 6);
    let parallel = run(4, 3, 99, 6);
    assert_eq!(serial.agents, parallel.agents);
    assert_eq!(serial.records, parallel.records);
    assert_eq!(strip_timings(&serial.metrics), strip_timings(&parallel.metrics));
}

#[test]
fn each_target_is_infected_at_most_once_per_day() {
    let out = run(4, 2, 5, 6);
    for m in &out.metrics {
        assert!(m.infections <= m.transmissions);
    }
    let infected = out.agents.iter().filter(|a| a.infected_on.is_some()).count();
    let total: usize = out.metrics.iter().map(|m| m.infections).sum();
    assert_eq!(infected, total);
}

#[test]
fn infection_counts_match_masks() {
    let mut town = Town::build(10, 3, 1, 1);
    town.seed(COVID, &[4]);
    let model = ScriptedModel::with_rates(&town.population, ContactRates::uniform(3.0, 0.5));
    let mut sched = DailyScheduler::new(SchedulerConfig {
        threads: Some(2),
        ..SchedulerConfig::default()
    })
    .unwrap();
    let mut infections = 0;
    for d in 0..5 {
        let m = sched.run_daily_pass(COVID, Day(d), &mut town.population, &town.places, &model);
        infections += m.infections;
    }
    let pop = &town.population;
    assert_eq!(pop.count(PopulationMask::Infectious(COVID)), 1 + infections);
    assert_eq!(
        pop.count(PopulationMask::Susceptible(COVID)),
        town.agents.len() - 1 - infections
    );
}
