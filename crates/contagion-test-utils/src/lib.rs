//! Test agents, scripted models, and fixtures for contagion development.
//!
//! [`TestAgent`] visits a fixed list of places every day. [`ScriptedModel`]
//! implements [`EpidemicModel`] over it: it records what every place saw,
//! spreads with [`contact_spread`] under configurable rates, and moves
//! infected agents from the susceptible to the infectious mask.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use contagion_arena::Visit;
use contagion_core::{Day, DiseaseId, MaskId, PlaceId, Slot};
use contagion_engine::{
    contact_spread, ContactRates, EpidemicModel, Population, PopulationMask, Schedule,
    SpreadContext, Transmission, VisitRole,
};
use parking_lot::Mutex;

/// Agent that visits the same places every day.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestAgent {
    pub places: Vec<PlaceId>,
    pub infected_on: Option<Day>,
    pub infected_by: Option<Slot>,
    /// Times this agent's schedule was requested.
    pub scheduled: u32,
}

impl TestAgent {
    pub fn visiting(places: &[PlaceId]) -> Self {
        Self {
            places: places.to_vec(),
            ..Self::default()
        }
    }
}

/// What one place saw during one fan-out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadRecord {
    pub place: PlaceId,
    pub disease: DiseaseId,
    pub day: Day,
    pub infectious: Vec<Slot>,
    pub susceptible: Vec<Slot>,
}

/// [`EpidemicModel`] over [`TestAgent`] with recording.
pub struct ScriptedModel {
    rates: ContactRates,
    susceptible: Vec<MaskId>,
    infectious: Vec<MaskId>,
    records: Mutex<Vec<SpreadRecord>>,
    /// Agents that stay home regardless of their places.
    home_bound: Vec<Slot>,
}

impl ScriptedModel {
    /// Model that records visitors but never transmits.
    pub fn recording(population: &Population<TestAgent>) -> Self {
        Self::with_rates(population, ContactRates::uniform(0.0, 0.0))
    }

    /// Model spreading with `rates`.
    pub fn with_rates(population: &Population<TestAgent>, rates: ContactRates) -> Self {
        let diseases = 0..population.diseases();
        Self {
            rates,
            susceptible: diseases
                .clone()
                .map(|d| population.mask(PopulationMask::Susceptible(DiseaseId(d))))
                .collect(),
            infectious: diseases
                .map(|d| population.mask(PopulationMask::Infectious(DiseaseId(d))))
                .collect(),
            records: Mutex::new(Vec::new()),
            home_bound: Vec::new(),
        }
    }

    /// Keep `agent` away from every place.
    pub fn keep_home(mut self, agent: Slot) -> Self {
        self.home_bound.push(agent);
        self
    }

    /// Records sorted by `(day, disease, place)`.
    pub fn records(&self) -> Vec<SpreadRecord> {
        let mut records = self.records.lock().clone();
        records.sort_by_key(|r| (r.day, r.disease, r.place));
        records
    }

    pub fn clear_records(&self) {
        self.records.lock().clear();
    }
}

impl EpidemicModel<TestAgent> for ScriptedModel {
    fn daily_schedule(
        &self,
        slot: Slot,
        agent: &mut TestAgent,
        _role: VisitRole,
        _disease: DiseaseId,
        _day: Day,
        out: &mut Schedule,
    ) {
        agent.scheduled += 1;
        if !self.home_bound.contains(&slot) {
            out.extend(agent.places.iter().copied());
        }
    }

    fn spread(&self, ctx: &mut SpreadContext<'_, TestAgent>) -> Vec<Transmission> {
        self.records.lock().push(SpreadRecord {
            place: ctx.place.id(),
            disease: ctx.disease,
            day: ctx.day,
            infectious: ctx.visitors.infectious.clone(),
            susceptible: ctx.visitors.susceptible.clone(),
        });
        contact_spread(ctx, &self.rates)
    }

    fn infect(
        &self,
        visit: Visit<'_, TestAgent>,
        transmission: &Transmission,
        disease: DiseaseId,
        day: Day,
    ) {
        visit.item.infected_on = Some(day);
        visit.item.infected_by = Some(transmission.source);
        visit.tags.clear(self.susceptible[disease.index()]);
        visit.tags.set(self.infectious[disease.index()]);
    }
}
