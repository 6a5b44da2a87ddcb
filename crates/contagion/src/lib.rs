//! Contagion: a concurrent agent arena and daily transmission scheduler for
//! large-scale epidemic simulation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the contagion sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use contagion::prelude::*;
//!
//! #[derive(Default)]
//! struct Person {
//!     home: Option<PlaceId>,
//! }
//!
//! // Everyone stays home; every household contact transmits.
//! struct HomeOnly {
//!     rates: ContactRates,
//!     susceptible: MaskId,
//!     infectious: MaskId,
//! }
//!
//! impl EpidemicModel<Person> for HomeOnly {
//!     fn daily_schedule(
//!         &self,
//!         _slot: Slot,
//!         person: &mut Person,
//!         _role: VisitRole,
//!         _disease: DiseaseId,
//!         _day: Day,
//!         out: &mut Schedule,
//!     ) {
//!         out.extend(person.home);
//!     }
//!     fn spread(&self, ctx: &mut SpreadContext<'_, Person>) -> Vec<Transmission> {
//!         contact_spread(ctx, &self.rates)
//!     }
//!     fn infect(&self, visit: Visit<'_, Person>, _t: &Transmission, _d: DiseaseId, _day: Day) {
//!         visit.tags.clear(self.susceptible);
//!         visit.tags.set(self.infectious);
//!     }
//! }
//!
//! let flu = DiseaseId(0);
//! let mut sim = Simulation::<Person>::new(SimulationConfig {
//!     diseases: 1,
//!     ..SimulationConfig::default()
//! })
//! .unwrap();
//! let home = sim.places_mut().add_place(PlaceKind::Household);
//! let sick = sim.population_mut().add_agent(Person { home: Some(home) });
//! let well = sim.population_mut().add_agent(Person { home: Some(home) });
//!
//! let population = sim.population();
//! population.tag(PopulationMask::Infectious(flu), sick);
//! population.tag(PopulationMask::Susceptible(flu), well);
//! let model = HomeOnly {
//!     rates: ContactRates::uniform(4.0, 1.0),
//!     susceptible: population.mask(PopulationMask::Susceptible(flu)),
//!     infectious: population.mask(PopulationMask::Infectious(flu)),
//! };
//!
//! let metrics = sim.step(&model);
//! assert_eq!(metrics[0].infections, 1);
//! assert_eq!(sim.population().count(PopulationMask::Infectious(flu)), 2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `contagion-core` | Slot, mask, place, disease, and day ids; place kinds |
//! | [`arena`] | `contagion-arena` | Slot arena, masks, sequential and parallel traversal |
//! | [`engine`] | `contagion-engine` | Visitor buffers, scheduler, population, simulation |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers and place kinds (`contagion-core`).
pub use contagion_core as types;

/// Slot arena, mask layer, and traversal engine (`contagion-arena`).
///
/// [`arena::Arena`] is usable on its own for any `T: Default` item type.
pub use contagion_arena as arena;

/// Per-place buffers and the daily scheduler (`contagion-engine`).
///
/// [`engine::Simulation`] owns everything for one run;
/// [`engine::DailyScheduler`] drives a single disease-day.
pub use contagion_engine as engine;

/// Common imports for typical contagion usage.
///
/// ```rust
/// use contagion::prelude::*;
/// ```
pub mod prelude {
    // Identifiers
    pub use contagion_core::{Day, DiseaseId, MaskId, PlaceId, PlaceKind, Slot};

    // Arena
    pub use contagion_arena::{Arena, ArenaConfig, ArenaError, MaskFilter, Tags, Visit};

    // Engine
    pub use contagion_engine::{
        contact_spread, ConfigError, ContactRates, DailyScheduler, DayMetrics, EpidemicModel,
        Places, Population, PopulationMask, Schedule, SchedulerConfig, Simulation,
        SimulationConfig, SpreadContext, Transmission, VisitRole, Visitors,
    };
}
