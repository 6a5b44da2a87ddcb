//! Benchmark profiles for the contagion agent simulator.
//!
//! - [`reference_town`]: households, neighborhoods, schools, and workplaces
//!   with every agent susceptible except a seeded fraction
//! - [`ResidentModel`]: non-recording [`EpidemicModel`] over [`Resident`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use contagion_arena::{ArenaConfig, Visit};
use contagion_core::{Day, DiseaseId, MaskId, PlaceId, PlaceKind, Slot};
use contagion_engine::{
    contact_spread, ContactRates, EpidemicModel, Places, Population, PopulationMask, Schedule,
    SpreadContext, Transmission, VisitRole,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The single disease used by every profile.
pub const DISEASE: DiseaseId = DiseaseId(0);

/// Agent with a home, a neighborhood, and an optional daytime place.
#[derive(Clone, Debug, Default)]
pub struct Resident {
    pub home: Option<PlaceId>,
    pub neighborhood: Option<PlaceId>,
    pub daytime: Option<PlaceId>,
    pub infected_on: Option<Day>,
}

/// Transmission model for benchmarks. No locks or recording.
pub struct ResidentModel {
    rates: ContactRates,
    susceptible: MaskId,
    infectious: MaskId,
}

impl ResidentModel {
    pub fn new(population: &Population<Resident>) -> Self {
        Self {
            rates: ContactRates::default(),
            susceptible: population.mask(PopulationMask::Susceptible(DISEASE)),
            infectious: population.mask(PopulationMask::Infectious(DISEASE)),
        }
    }
}

impl EpidemicModel<Resident> for ResidentModel {
    fn daily_schedule(
        &self,
        _slot: Slot,
        agent: &mut Resident,
        _role: VisitRole,
        _disease: DiseaseId,
        _day: Day,
        out: &mut Schedule,
    ) {
        out.extend(agent.home);
        out.extend(agent.neighborhood);
        out.extend(agent.daytime);
    }

    fn spread(&self, ctx: &mut SpreadContext<'_, Resident>) -> Vec<Transmission> {
        contact_spread(ctx, &self.rates)
    }

    fn infect(&self, visit: Visit<'_, Resident>, _t: &Transmission, _d: DiseaseId, day: Day) {
        visit.item.infected_on = Some(day);
        visit.tags.clear(self.susceptible);
        visit.tags.set(self.infectious);
    }
}

/// Build a town of `households` four-person households.
///
/// One neighborhood per 100 households, one school per 250, one workplace
/// per 20. Adults work, children attend school. Roughly `infected_per_mille`
/// agents in a thousand start infectious; placement is deterministic in
/// `seed`. Places get `shards_per_place` visitor shards; pass the value
/// from the [`SchedulerConfig`](contagion_engine::SchedulerConfig) that
/// will run the town.
///
/// # Panics
///
/// Panics if the population cannot be created (the default arena config
/// always succeeds).
pub fn reference_town(
    households: usize,
    infected_per_mille: u32,
    seed: u64,
    shards_per_place: usize,
) -> (Population<Resident>, Places) {
    let mut population = match Population::new(ArenaConfig::default(), 1) {
        Ok(p) => p,
        Err(e) => panic!("reference town: {e}"),
    };
    let mut places = Places::new(1, shards_per_place);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let neighborhoods: Vec<PlaceId> = (0..households.div_ceil(100))
        .map(|_| places.add_place(PlaceKind::Neighborhood))
        .collect();
    let schools: Vec<PlaceId> = (0..households.div_ceil(250))
        .map(|_| places.add_place(PlaceKind::School))
        .collect();
    let workplaces: Vec<PlaceId> = (0..households.div_ceil(20))
        .map(|_| places.add_place(PlaceKind::Workplace))
        .collect();

    for h in 0..households {
        let home = places.add_place(PlaceKind::Household);
        for member in 0..4 {
            let daytime = if member < 2 {
                workplaces[rng.random_range(0..workplaces.len())]
            } else {
                schools[h % schools.len()]
            };
            let slot = population.add_agent(Resident {
                home: Some(home),
                neighborhood: Some(neighborhoods[h / 100]),
                daytime: Some(daytime),
                infected_on: None,
            });
            let mask = if rng.random_range(0..1000) < infected_per_mille {
                PopulationMask::Infectious(DISEASE)
            } else {
                PopulationMask::Susceptible(DISEASE)
            };
            population.tag(mask, slot);
        }
    }
    (population, places)
}
