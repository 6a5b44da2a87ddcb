//! Scheduler and simulation configuration, validation, and error types.
//!
//! [`SchedulerConfig`] sizes the worker pool and the per-place shards.
//! [`SimulationConfig`] bundles it with the arena configuration and the
//! number of diseases for [`Simulation::new`](crate::Simulation::new).

use std::error::Error;
use std::fmt;

use contagion_arena::{ArenaConfig, ArenaError};

/// Default number of visitor shards per place-per-disease.
pub const DEFAULT_SHARDS_PER_PLACE: usize = 1;

/// Upper bound on visitor shards per place-per-disease.
pub const MAX_SHARDS_PER_PLACE: usize = 256;

/// Default base seed for per-place transmission randomness.
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE_F00D_0001;

// ── SchedulerConfig ────────────────────────────────────────────────

/// Configuration for [`DailyScheduler`](crate::DailyScheduler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Worker threads in the scheduler's rayon pool. `None` = one per
    /// available core.
    pub threads: Option<usize>,
    /// Visitor shards per place-per-disease. Writers pick the shard of
    /// their rayon worker index, so more shards means less lock
    /// contention at crowded places. Default: 1.
    pub shards_per_place: usize,
    /// Base seed mixed with disease, day, and place for each place's RNG.
    pub seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threads: None,
            shards_per_place: DEFAULT_SHARDS_PER_PLACE,
            seed: DEFAULT_SEED,
        }
    }
}

impl SchedulerConfig {
    /// Resolve the actual thread count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 256]`.
    pub fn resolved_threads(&self) -> usize {
        match self.threads {
            Some(n) => n.clamp(1, 256),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards_per_place == 0 || self.shards_per_place > MAX_SHARDS_PER_PLACE {
            return Err(ConfigError::InvalidShards {
                configured: self.shards_per_place,
            });
        }
        Ok(())
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Everything needed to build a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, Default)]
pub struct SimulationConfig {
    /// Agent arena layout.
    pub arena: ArenaConfig,
    /// Worker pool and shard layout.
    pub scheduler: SchedulerConfig,
    /// Number of diseases tracked. Each disease registers a susceptible
    /// and an infectious mask. Default: 0, which fails validation.
    pub diseases: u16,
}

impl SimulationConfig {
    /// Check structural invariants of all nested configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena.validate()?;
        self.scheduler.validate()?;
        if self.diseases == 0 {
            return Err(ConfigError::NoDiseases);
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building a scheduler or simulation.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Arena configuration is invalid or its limits were hit at setup.
    Arena(ArenaError),
    /// `shards_per_place` is zero or above [`MAX_SHARDS_PER_PLACE`].
    InvalidShards {
        /// The configured value.
        configured: usize,
    },
    /// No diseases configured.
    NoDiseases,
    /// The rayon pool could not be built.
    ThreadPool {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::InvalidShards { configured } => write!(
                f,
                "shards_per_place must be in 1..={MAX_SHARDS_PER_PLACE}, got {configured}"
            ),
            Self::NoDiseases => write!(f, "at least one disease is required"),
            Self::ThreadPool { reason } => write!(f, "thread pool: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
