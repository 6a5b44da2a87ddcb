//! Canned populations and place layouts.

use contagion_arena::ArenaConfig;
use contagion_core::{DiseaseId, PlaceId, PlaceKind, Slot};
use contagion_engine::{Places, Population, PopulationMask};

use crate::TestAgent;

/// Small arena configuration that grows often.
pub fn small_arena_config() -> ArenaConfig {
    ArenaConfig {
        block_capacity: 64,
        max_blocks: 1024,
        max_masks: 16,
    }
}

/// Empty population over [`small_arena_config`].
pub fn population(diseases: u16) -> Population<TestAgent> {
    match Population::new(small_arena_config(), diseases) {
        Ok(p) => p,
        Err(e) => panic!("test population: {e}"),
    }
}

/// A town of `households` households of `size` agents each. Every
/// household shares one neighborhood; agents with an even index within
/// their household also attend one school.
pub struct Town {
    pub population: Population<TestAgent>,
    pub places: Places,
    pub households: Vec<PlaceId>,
    pub neighborhood: PlaceId,
    pub school: PlaceId,
    pub agents: Vec<Slot>,
}

impl Town {
    pub fn build(households: usize, size: usize, diseases: u16, shards: usize) -> Self {
        let mut population = population(diseases);
        let mut places = Places::new(diseases, shards);
        let neighborhood = places.add_place(PlaceKind::Neighborhood);
        let school = places.add_place(PlaceKind::School);
        let mut homes = Vec::with_capacity(households);
        let mut agents = Vec::with_capacity(households * size);
        for _ in 0..households {
            let home = places.add_place(PlaceKind::Household);
            homes.push(home);
            for member in 0..size {
                let mut visits = vec![home, neighborhood];
                if member % 2 == 0 {
                    visits.push(school);
                }
                agents.push(population.add_agent(TestAgent::visiting(&visits)));
            }
        }
        Self {
            population,
            places,
            households: homes,
            neighborhood,
            school,
            agents,
        }
    }

    /// Mark every agent susceptible to `disease`, then make the agents at
    /// `infected` indices infectious instead.
    pub fn seed(&self, disease: DiseaseId, infected: &[usize]) {
        for &agent in &self.agents {
            self.population
                .tag(PopulationMask::Susceptible(disease), agent);
        }
        for &i in infected {
            let agent = self.agents[i];
            self.population
                .untag(PopulationMask::Susceptible(disease), agent);
            self.population
                .tag(PopulationMask::Infectious(disease), agent);
        }
    }
}
