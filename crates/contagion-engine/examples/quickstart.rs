//! Contagion quickstart: a small town through one outbreak.
//!
//! Demonstrates:
//!   1. Building a `Simulation` from a `SimulationConfig`
//!   2. Adding places and agents, and seeding masks
//!   3. Implementing `EpidemicModel` on top of `contact_spread`
//!   4. Stepping days and reading `DayMetrics`
//!   5. Recovering agents with a masked parallel pass over `UpdateHealth`
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use contagion_arena::{MaskFilter, Visit};
use contagion_core::{Day, DiseaseId, MaskId, PlaceId, PlaceKind, Slot};
use contagion_engine::{
    contact_spread, ContactRates, EpidemicModel, Population, PopulationMask, Schedule,
    SchedulerConfig, Simulation, SimulationConfig, SpreadContext, Transmission, VisitRole,
};

// ─── Scenario parameters ────────────────────────────────────────

const FLU: DiseaseId = DiseaseId(0);
const HOUSEHOLDS: usize = 400;
const HOUSEHOLD_SIZE: usize = 4;
const SCHOOLS: usize = 4;
const WORKPLACES: usize = 20;
const INFECTIOUS_DAYS: u32 = 5;
const DAYS: u32 = 60;
const SEED_EVERY: usize = 500;

// ─── Agent ──────────────────────────────────────────────────────

#[derive(Default)]
struct Person {
    home: Option<PlaceId>,
    neighborhood: Option<PlaceId>,
    daytime: Option<PlaceId>,
    infected_on: Option<Day>,
}

// ─── Model ──────────────────────────────────────────────────────

struct Flu {
    rates: ContactRates,
    susceptible: MaskId,
    infectious: MaskId,
    update_health: MaskId,
}

impl Flu {
    fn new(population: &Population<Person>) -> Self {
        Self {
            rates: ContactRates::default(),
            susceptible: population.mask(PopulationMask::Susceptible(FLU)),
            infectious: population.mask(PopulationMask::Infectious(FLU)),
            update_health: population.mask(PopulationMask::UpdateHealth),
        }
    }
}

impl EpidemicModel<Person> for Flu {
    fn daily_schedule(
        &self,
        _slot: Slot,
        person: &mut Person,
        role: VisitRole,
        _disease: DiseaseId,
        day: Day,
        out: &mut Schedule,
    ) {
        out.extend(person.home);
        out.extend(person.neighborhood);
        // Infectious people stay home after their first two days.
        let staying_home = role == VisitRole::Infectious
            && person.infected_on.is_some_and(|d| day.0 >= d.0 + 2);
        if !staying_home && day.0 % 7 < 5 {
            out.extend(person.daytime);
        }
    }

    fn spread(&self, ctx: &mut SpreadContext<'_, Person>) -> Vec<Transmission> {
        contact_spread(ctx, &self.rates)
    }

    fn infect(&self, visit: Visit<'_, Person>, _t: &Transmission, _disease: DiseaseId, day: Day) {
        visit.item.infected_on = Some(day);
        visit.tags.clear(self.susceptible);
        visit.tags.set(self.infectious);
        visit.tags.set(self.update_health);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // ─── Build ──────────────────────────────────────────────────
    let mut sim = Simulation::<Person>::new(SimulationConfig {
        scheduler: SchedulerConfig {
            shards_per_place: 2,
            ..SchedulerConfig::default()
        },
        diseases: 1,
        ..SimulationConfig::default()
    })?;

    let places = sim.places_mut();
    let neighborhoods: Vec<PlaceId> = (0..8)
        .map(|_| places.add_place(PlaceKind::Neighborhood))
        .collect();
    let schools: Vec<PlaceId> = (0..SCHOOLS)
        .map(|_| places.add_place(PlaceKind::School))
        .collect();
    let workplaces: Vec<PlaceId> = (0..WORKPLACES)
        .map(|_| places.add_place(PlaceKind::Workplace))
        .collect();
    let homes: Vec<PlaceId> = (0..HOUSEHOLDS)
        .map(|_| places.add_place(PlaceKind::Household))
        .collect();

    let mut people = Vec::with_capacity(HOUSEHOLDS * HOUSEHOLD_SIZE);
    for (h, &home) in homes.iter().enumerate() {
        for member in 0..HOUSEHOLD_SIZE {
            let daytime = if member < 2 {
                workplaces[(h + member) % WORKPLACES]
            } else {
                schools[h % SCHOOLS]
            };
            people.push(sim.population_mut().add_agent(Person {
                home: Some(home),
                neighborhood: Some(neighborhoods[h % neighborhoods.len()]),
                daytime: Some(daytime),
                infected_on: (people.len() % SEED_EVERY == 0).then_some(Day(0)),
            }));
        }
    }

    let population = sim.population();
    let model = Flu::new(population);
    for (i, &person) in people.iter().enumerate() {
        if i % SEED_EVERY == 0 {
            population.tag(PopulationMask::Infectious(FLU), person);
            population.tag(PopulationMask::UpdateHealth, person);
        } else {
            population.tag(PopulationMask::Susceptible(FLU), person);
        }
    }
    println!(
        "Town: {} people in {} places, {} seeded",
        population.size(),
        sim.places().len(),
        population.count(PopulationMask::Infectious(FLU)),
    );

    // ─── Run ────────────────────────────────────────────────────
    for _ in 0..DAYS {
        let day = sim.day();
        let metrics = sim.step(&model);

        // Recover everyone past their infectious period.
        let (infectious, update_health) = (model.infectious, model.update_health);
        sim.population_mut().arena_mut().parallel_apply(
            MaskFilter::Set(update_health),
            |visit| {
                let since = visit.item.infected_on.map_or(0, |d| day.0 - d.0);
                if since >= INFECTIOUS_DAYS {
                    visit.tags.clear(infectious);
                    visit.tags.clear(update_health);
                }
            },
        );

        let m = &metrics[0];
        if day.0 % 5 == 0 || m.infections > 0 {
            println!(
                "day {:>2}: infectious={:>4} places={:>3} new={:>3} ({} us)",
                day.0,
                m.infectious_agents,
                m.infectious_places_total(),
                m.infections,
                m.total_us,
            );
        }
    }

    let population = sim.population();
    println!(
        "Done: {} still susceptible, {} still infectious",
        population.count(PopulationMask::Susceptible(FLU)),
        population.count(PopulationMask::Infectious(FLU)),
    );
    Ok(())
}
