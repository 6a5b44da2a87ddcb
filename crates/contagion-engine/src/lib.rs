//! Daily transmission scheduler for the contagion agent simulator.
//!
//! Builds the fork-join "who is infectious, who is susceptible, who infects
//! whom" pipeline on top of the [`contagion_arena`] slot arena: masked
//! parallel passes fill per-place visitor buffers, infectious places are
//! bucketed by kind, and place transmission steps fan out across a fixed
//! rayon pool. See [`scheduler`] for the pipeline and [`buffer`] for the
//! per-place state machine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bucket;
pub mod buffer;
pub mod config;
pub mod metrics;
pub mod place;
pub mod population;
pub mod scheduler;
pub mod shard;
pub mod simulation;
pub mod transmission;

pub use bucket::InfectiousBuckets;
pub use buffer::{PlaceDayState, VisitorBuffer, Visitors};
pub use config::{ConfigError, SchedulerConfig, SimulationConfig};
pub use metrics::DayMetrics;
pub use place::{Place, Places};
pub use population::{Population, PopulationMask};
pub use scheduler::{DailyScheduler, EpidemicModel, Schedule, VisitRole};
pub use shard::PerThread;
pub use simulation::Simulation;
pub use transmission::{
    contact_spread, place_rng, ContactRates, SpreadContext, Transmission, MAX_CONTACTS_PER_DAY,
};
