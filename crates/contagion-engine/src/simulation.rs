//! Owned simulation state advanced one day at a time.

use contagion_core::{Day, DiseaseId};
use tracing::info;

use crate::config::{ConfigError, SimulationConfig};
use crate::metrics::DayMetrics;
use crate::place::Places;
use crate::population::Population;
use crate::scheduler::{DailyScheduler, EpidemicModel};

/// Population, places, and scheduler for one run.
///
/// There is no global state: every collaborator receives the pieces it
/// needs by reference.
#[derive(Debug)]
pub struct Simulation<A> {
    population: Population<A>,
    places: Places,
    scheduler: DailyScheduler,
    day: Day,
}

impl<A> Simulation<A> {
    /// Validate `config` and build an empty simulation at day 0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any part of `config` is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let population = Population::new(config.arena, config.diseases)?;
        let scheduler = DailyScheduler::new(config.scheduler)?;
        let places = scheduler.new_places(config.diseases);
        info!(
            diseases = config.diseases,
            threads = scheduler.threads(),
            "simulation created"
        );
        Ok(Self {
            population,
            places,
            scheduler,
            day: Day(0),
        })
    }

    /// The day the next [`step`](Self::step) will run.
    pub fn day(&self) -> Day {
        self.day
    }

    /// The agent population.
    pub fn population(&self) -> &Population<A> {
        &self.population
    }

    /// The agent population, mutably.
    pub fn population_mut(&mut self) -> &mut Population<A> {
        &mut self.population
    }

    /// The place registry.
    pub fn places(&self) -> &Places {
        &self.places
    }

    /// The place registry, mutably (for adding places at setup).
    pub fn places_mut(&mut self) -> &mut Places {
        &mut self.places
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &DailyScheduler {
        &self.scheduler
    }
}

impl<A: Send + Sync> Simulation<A> {
    /// Run one daily pass per disease for the current day, then advance
    /// the day. Diseases run in id order.
    pub fn step<M: EpidemicModel<A>>(&mut self, model: &M) -> Vec<DayMetrics> {
        let day = self.day;
        let metrics: Vec<DayMetrics> = (0..self.population.diseases())
            .map(|d| {
                self.scheduler.run_daily_pass(
                    DiseaseId(d),
                    day,
                    &mut self.population,
                    &self.places,
                    model,
                )
            })
            .collect();
        self.day = day.next();
        metrics
    }

    /// Run `days` steps, returning every pass's metrics in order.
    pub fn run<M: EpidemicModel<A>>(&mut self, days: u32, model: &M) -> Vec<DayMetrics> {
        (0..days).flat_map(|_| self.step(model)).collect()
    }
}
