//! End-to-end daily pass scenarios over a real population and place set.

use contagion_core::{Day, DiseaseId, PlaceKind, Slot};
use contagion_engine::{
    ContactRates, DailyScheduler, Places, PopulationMask, SchedulerConfig, Simulation,
    SimulationConfig,
};
use contagion_test_utils::fixtures::{population, small_arena_config, Town};
use contagion_test_utils::{ScriptedModel, SpreadRecord, TestAgent};

const FLU: DiseaseId = DiseaseId(0);

fn scheduler(threads: usize, shards: usize) -> DailyScheduler {
    DailyScheduler::new(SchedulerConfig {
        threads: Some(threads),
        shards_per_place: shards,
        seed: 11,
    })
    .unwrap()
}

#[test]
fn place_buffers_hold_exactly_the_tagged_visitors() {
    let mut pop = population(1);
    let mut places = Places::new(1, 2);
    let home = places.add_place(PlaceKind::Household);

    let ids: Vec<Slot> = (0..3)
        .map(|_| pop.add_agent(TestAgent::visiting(&[home])))
        .collect();
    assert_eq!(ids, vec![Slot(0), Slot(1), Slot(2)]);
    pop.tag(PopulationMask::Infectious(FLU), Slot(1));
    pop.tag(PopulationMask::Susceptible(FLU), Slot(2));

    let model = ScriptedModel::recording(&pop);
    let mut sched = scheduler(4, 2);
    sched.run_daily_pass(FLU, Day(0), &mut pop, &places, &model);

    assert_eq!(
        model.records(),
        vec![SpreadRecord {
            place: home,
            disease: FLU,
            day: Day(0),
            infectious: vec![Slot(1)],
            susceptible: vec![Slot(2)],
        }]
    );
    let state = places.get(home).state(FLU);
    assert!(state.merged().is_empty());
    assert!(!state.is_infectious());

    // Agent 0 carries neither mask and was never scheduled.
    assert_eq!(pop.get(Slot(0)).scheduled, 0);
    assert_eq!(pop.get(Slot(1)).scheduled, 1);
    assert_eq!(pop.get(Slot(2)).scheduled, 1);
}

#[test]
fn invalidating_a_doubly_tagged_agent_decrements_both_masks() {
    let mut pop = population(1);
    let agents: Vec<Slot> = (0..3).map(|_| pop.add_agent(TestAgent::default())).collect();
    let quarantine = pop.arena().register_mask("quarantine").unwrap();
    pop.tag(PopulationMask::Infectious(FLU), agents[1]);
    pop.arena().set(quarantine, agents[1]);
    pop.arena().set(quarantine, agents[2]);
    let free_before = pop.arena().free_count();

    pop.remove_agent(agents[1]);

    assert_eq!(pop.count(PopulationMask::Infectious(FLU)), 0);
    assert_eq!(pop.arena().count(quarantine), 1);
    assert_eq!(pop.arena().free_count(), free_before + 1);
    assert!(!pop.arena().is_valid(agents[1]));
    assert_eq!(pop.add_agent(TestAgent::default()), agents[1]);
}

#[test]
fn agents_kept_home_are_never_buffered() {
    let mut pop = population(1);
    let mut places = Places::new(1, 1);
    let office = places.add_place(PlaceKind::Office);
    let sick = pop.add_agent(TestAgent::visiting(&[office]));
    let well = pop.add_agent(TestAgent::visiting(&[office]));
    pop.tag(PopulationMask::Infectious(FLU), sick);
    pop.tag(PopulationMask::Susceptible(FLU), well);

    let model = ScriptedModel::recording(&pop).keep_home(sick);
    let m = scheduler(2, 1).run_daily_pass(FLU, Day(0), &mut pop, &places, &model);
    assert_eq!(m.infectious_visits, 0);
    assert_eq!(m.susceptible_visits, 0);
    assert!(model.records().is_empty());
}

#[test]
fn certain_spread_reaches_every_contact_once() {
    let mut town = Town::build(4, 3, 1, 2);
    town.seed(FLU, &[0]);
    let model = ScriptedModel::with_rates(&town.population, ContactRates::uniform(1000.0, 1.0));
    let mut sched = scheduler(3, 2);

    let m = sched.run_daily_pass(FLU, Day(0), &mut town.population, &town.places, &model);

    // Agent 0 visits its home, the neighborhood, and the school, which
    // together reach every other agent.
    assert_eq!(m.infectious_places_total(), 3);
    assert_eq!(m.places_of(PlaceKind::Neighborhood), 1);
    assert_eq!(m.infections, 11);
    assert!(m.transmissions >= m.infections);
    assert_eq!(town.population.count(PopulationMask::Susceptible(FLU)), 0);
    assert_eq!(town.population.count(PopulationMask::Infectious(FLU)), 12);
    for &agent in &town.agents[1..] {
        let a = town.population.get(agent);
        assert_eq!(a.infected_on, Some(Day(0)));
        assert_eq!(a.infected_by, Some(town.agents[0]));
    }
}

#[test]
fn simulation_steps_every_disease_and_advances_the_day() {
    let mut sim = Simulation::<TestAgent>::new(SimulationConfig {
        arena: small_arena_config(),
        scheduler: SchedulerConfig {
            threads: Some(2),
            ..SchedulerConfig::default()
        },
        diseases: 2,
    })
    .unwrap();
    let home = sim.places_mut().add_place(PlaceKind::Household);
    let a = sim.population_mut().add_agent(TestAgent::visiting(&[home]));
    let b = sim.population_mut().add_agent(TestAgent::visiting(&[home]));
    let pop = sim.population();
    pop.tag(PopulationMask::Infectious(DiseaseId(1)), a);
    pop.tag(PopulationMask::Susceptible(DiseaseId(1)), b);
    let model = ScriptedModel::with_rates(pop, ContactRates::uniform(5.0, 1.0));

    let metrics = sim.step(&model);
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].disease, DiseaseId(0));
    assert_eq!(metrics[0].infectious_agents, 0);
    assert_eq!(metrics[1].infections, 1);
    assert_eq!(sim.day(), Day(1));

    let later = sim.run(3, &model);
    assert_eq!(later.len(), 6);
    assert_eq!(later.last().map(|m| m.day), Some(Day(3)));
    assert_eq!(sim.day(), Day(4));
    assert!(later.iter().all(|m| m.infections == 0));
}
