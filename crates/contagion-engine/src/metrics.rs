//! Per-day metrics for the daily scheduler.
//!
//! [`DayMetrics`] captures counts and timings for one
//! [`run_daily_pass`](crate::DailyScheduler::run_daily_pass), for one
//! disease on one day.

use contagion_core::{Day, DiseaseId, PlaceKind};

/// Counts and timings collected during a single daily pass.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DayMetrics {
    /// Day the pass ran for.
    pub day: Day,
    /// Disease the pass ran for.
    pub disease: DiseaseId,
    /// Agents visited by the infectious pass.
    pub infectious_agents: usize,
    /// Agents visited by the susceptible pass.
    pub susceptible_agents: usize,
    /// Infectious visits recorded at places.
    pub infectious_visits: usize,
    /// Susceptible visits recorded at infectious places.
    pub susceptible_visits: usize,
    /// Infectious places per kind, in [`PlaceKind::ALL`] order.
    pub infectious_places: [usize; PlaceKind::COUNT],
    /// Transmissions proposed by the fan-out.
    pub transmissions: usize,
    /// Transmissions applied after per-target deduplication.
    pub infections: usize,
    /// Wall-clock time of the infectious pass.
    pub infectious_pass_us: u64,
    /// Wall-clock time of the susceptible pass.
    pub susceptible_pass_us: u64,
    /// Wall-clock time of the transmission fan-out.
    pub transmission_us: u64,
    /// Wall-clock time spent applying infections.
    pub apply_us: u64,
    /// Wall-clock time of the bucket and buffer reset.
    pub reset_us: u64,
    /// Wall-clock time of the whole pass.
    pub total_us: u64,
}

impl DayMetrics {
    /// Infectious places of `kind`.
    pub fn places_of(&self, kind: PlaceKind) -> usize {
        self.infectious_places[kind.index()]
    }

    /// Infectious places across all kinds.
    pub fn infectious_places_total(&self) -> usize {
        self.infectious_places.iter().sum()
    }
}
