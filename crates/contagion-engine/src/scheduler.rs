//! The daily fork-join transmission pipeline.
//!
//! One [`run_daily_pass`](DailyScheduler::run_daily_pass) per disease per
//! day:
//!
//! 1. **Infectious pass**: parallel apply over the infectious mask. Each
//!    agent's schedule is computed and the agent is added to every
//!    scheduled place as an infectious visitor. The first infectious
//!    visitor at a place registers it in its kind's bucket.
//! 2. **Susceptible pass**: parallel apply over the susceptible mask.
//!    Agents are added only at scheduled places already infectious today.
//! 3. **Transmission fan-out**: for each kind, parallel-for over the
//!    bucket. Each place reads its frozen visitors and proposes
//!    [`Transmission`]s.
//! 4. **Apply**: proposals are sorted, deduplicated to one per target, and
//!    applied to agents serially.
//! 5. **Reset**: touched place buffers and all buckets are cleared.
//!
//! Places registered in a bucket are the only places written to in steps
//! 1 and 2, so step 5 touches nothing else.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use contagion_arena::{MaskFilter, Visit};
use contagion_core::{Day, DiseaseId, PlaceId, PlaceKind, Slot};
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::bucket::InfectiousBuckets;
use crate::config::{ConfigError, SchedulerConfig};
use crate::metrics::DayMetrics;
use crate::place::Places;
use crate::population::{Population, PopulationMask};
use crate::transmission::{place_rng, SpreadContext, Transmission};

/// Places an agent visits on one day.
pub type Schedule = SmallVec<[PlaceId; 8]>;

/// Which pass is asking for an agent's schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisitRole {
    /// The agent is infectious with the disease being processed.
    Infectious,
    /// The agent is susceptible to the disease being processed.
    Susceptible,
}

/// Collaborator seam between the scheduler and the epidemic model.
///
/// `daily_schedule` and `spread` run concurrently on the scheduler's pool;
/// `infect` runs serially after the fan-out.
pub trait EpidemicModel<A>: Sync {
    /// Push today's places for `agent` into `out`. Leaving `out` empty
    /// means the agent stays home from every place today.
    fn daily_schedule(
        &self,
        slot: Slot,
        agent: &mut A,
        role: VisitRole,
        disease: DiseaseId,
        day: Day,
        out: &mut Schedule,
    );

    /// Propose infections at one infectious place.
    fn spread(&self, ctx: &mut SpreadContext<'_, A>) -> Vec<Transmission>;

    /// Apply one accepted infection to its target.
    fn infect(&self, visit: Visit<'_, A>, transmission: &Transmission, disease: DiseaseId, day: Day);
}

/// Drives the daily pipeline on a dedicated rayon pool.
pub struct DailyScheduler {
    config: SchedulerConfig,
    pool: rayon::ThreadPool,
    buckets: InfectiousBuckets,
    last_metrics: DayMetrics,
}

impl DailyScheduler {
    /// Build a scheduler and its worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid or the pool cannot be
    /// created.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let threads = config.resolved_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("contagion-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool {
                reason: e.to_string(),
            })?;
        debug!(threads, shards = config.shards_per_place, "scheduler ready");
        Ok(Self {
            config,
            pool,
            buckets: InfectiousBuckets::new(),
            last_metrics: DayMetrics::default(),
        })
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Metrics from the most recent pass.
    pub fn last_metrics(&self) -> &DayMetrics {
        &self.last_metrics
    }

    /// Empty place registry for `diseases` diseases, sharded the way this
    /// scheduler is configured.
    pub fn new_places(&self, diseases: u16) -> Places {
        Places::new(diseases, self.config.shards_per_place)
    }

    /// Infectious-place buckets. Empty between passes.
    pub fn buckets(&self) -> &InfectiousBuckets {
        &self.buckets
    }

    /// Run the full pipeline for one disease on one day.
    ///
    /// # Panics
    ///
    /// Panics if `disease` is not tracked by `population` or `places`, or if
    /// the model schedules an unknown place.
    pub fn run_daily_pass<A, M>(
        &mut self,
        disease: DiseaseId,
        day: Day,
        population: &mut Population<A>,
        places: &Places,
        model: &M,
    ) -> DayMetrics
    where
        A: Send + Sync,
        M: EpidemicModel<A>,
    {
        let start = Instant::now();
        let mut metrics = DayMetrics {
            day,
            disease,
            ..DayMetrics::default()
        };

        let t = Instant::now();
        (metrics.infectious_agents, metrics.infectious_visits) =
            self.visit_pass(VisitRole::Infectious, disease, day, population, places, model);
        metrics.infectious_pass_us = t.elapsed().as_micros() as u64;
        metrics.infectious_places = self.buckets.lens();

        let t = Instant::now();
        (metrics.susceptible_agents, metrics.susceptible_visits) =
            self.visit_pass(VisitRole::Susceptible, disease, day, population, places, model);
        metrics.susceptible_pass_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        let mut proposed = self.fan_out(disease, day, population, places, model);
        metrics.transmissions = proposed.len();
        metrics.transmission_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        proposed.sort_unstable();
        proposed.dedup_by_key(|tr| tr.target);
        let arena = population.arena_mut();
        for tr in &proposed {
            if !arena.is_valid(tr.target) {
                continue;
            }
            model.infect(arena.visit_mut(tr.target), tr, disease, day);
            metrics.infections += 1;
        }
        metrics.apply_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        self.reset(disease, places);
        metrics.reset_us = t.elapsed().as_micros() as u64;
        metrics.total_us = start.elapsed().as_micros() as u64;

        debug!(
            day = day.0,
            disease = disease.0,
            infectious = metrics.infectious_agents,
            susceptible = metrics.susceptible_agents,
            places = metrics.infectious_places_total(),
            infections = metrics.infections,
            total_us = metrics.total_us,
            "daily pass complete"
        );
        self.last_metrics = metrics.clone();
        metrics
    }

    /// Steps 1 and 2. Returns `(agents visited, visits recorded)`.
    fn visit_pass<A, M>(
        &self,
        role: VisitRole,
        disease: DiseaseId,
        day: Day,
        population: &mut Population<A>,
        places: &Places,
        model: &M,
    ) -> (usize, usize)
    where
        A: Send + Sync,
        M: EpidemicModel<A>,
    {
        let mask = match role {
            VisitRole::Infectious => PopulationMask::Infectious(disease),
            VisitRole::Susceptible => PopulationMask::Susceptible(disease),
        };
        let filter = MaskFilter::Set(population.mask(mask));
        let agents = AtomicUsize::new(0);
        let visits = AtomicUsize::new(0);
        let buckets = &self.buckets;

        self.pool.install(|| {
            population.arena_mut().parallel_apply(filter, |visit| {
                let Visit { slot, item, .. } = visit;
                let mut schedule = Schedule::new();
                model.daily_schedule(slot, item, role, disease, day, &mut schedule);
                agents.fetch_add(1, Ordering::Relaxed);
                let mut recorded = 0;
                for &id in &schedule {
                    let place = places.get(id);
                    let state = place.state(disease);
                    match role {
                        VisitRole::Infectious => {
                            if state.add_infectious(slot) {
                                buckets.register(place.kind(), id);
                            }
                            recorded += 1;
                        }
                        VisitRole::Susceptible => {
                            if state.is_infectious() {
                                state.add_susceptible(slot);
                                recorded += 1;
                            }
                        }
                    }
                }
                visits.fetch_add(recorded, Ordering::Relaxed);
            });
        });
        (agents.into_inner(), visits.into_inner())
    }

    /// Step 3: run every infectious place's transmission step.
    fn fan_out<A, M>(
        &self,
        disease: DiseaseId,
        day: Day,
        population: &Population<A>,
        places: &Places,
        model: &M,
    ) -> Vec<Transmission>
    where
        A: Send + Sync,
        M: EpidemicModel<A>,
    {
        let seed = self.config.seed;
        let agents = population.arena();
        let mut proposed = Vec::new();
        for kind in PlaceKind::ALL {
            let ids = self.buckets.places(kind);
            if ids.is_empty() {
                continue;
            }
            let found: Vec<Transmission> = self.pool.install(|| {
                ids.par_iter()
                    .flat_map_iter(|&id| {
                        let place = places.get(id);
                        let visitors = place.state(disease).merged();
                        if !visitors.can_transmit() {
                            return Vec::new();
                        }
                        let mut ctx = SpreadContext {
                            place,
                            disease,
                            day,
                            visitors,
                            agents,
                            rng: place_rng(seed, disease, day, id),
                        };
                        model.spread(&mut ctx)
                    })
                    .collect()
            });
            trace!(kind = kind.label(), places = ids.len(), found = found.len(), "fan-out");
            proposed.extend(found);
        }
        proposed
    }

    /// Step 5: clear touched buffers, then the buckets.
    fn reset(&self, disease: DiseaseId, places: &Places) {
        self.pool.install(|| {
            for kind in PlaceKind::ALL {
                self.buckets
                    .places(kind)
                    .par_iter()
                    .for_each(|&id| places.get(id).state(disease).clear());
            }
        });
        self.buckets.clear();
    }
}

impl std::fmt::Debug for DailyScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyScheduler")
            .field("config", &self.config)
            .field("threads", &self.threads())
            .finish()
    }
}
