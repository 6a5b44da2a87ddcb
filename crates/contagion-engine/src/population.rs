//! The agent population: an arena plus the well-known masks.

use std::fmt;

use contagion_arena::{Arena, ArenaConfig, ArenaError, MaskFilter};
use contagion_core::{DiseaseId, MaskId, Slot};
use tracing::debug;

/// Masks every population registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PopulationMask {
    /// Agents susceptible to a disease.
    Susceptible(DiseaseId),
    /// Agents currently infectious with a disease.
    Infectious(DiseaseId),
    /// Agents whose health needs a daily update.
    UpdateHealth,
}

impl fmt::Display for PopulationMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Susceptible(d) => write!(f, "susceptible.{d}"),
            Self::Infectious(d) => write!(f, "infectious.{d}"),
            Self::UpdateHealth => write!(f, "update_health"),
        }
    }
}

/// Handles resolved once at construction.
#[derive(Debug)]
struct MaskTable {
    susceptible: Vec<MaskId>,
    infectious: Vec<MaskId>,
    update_health: MaskId,
}

/// Every agent in the simulation.
///
/// Owns the agent [`Arena`] and resolves [`PopulationMask`] to arena mask
/// handles. Collaborators needing other masks register them on
/// [`arena`](Self::arena) directly.
#[derive(Debug)]
pub struct Population<A> {
    arena: Arena<A>,
    masks: MaskTable,
}

impl<A> Population<A> {
    /// Build an empty population tracking `diseases` diseases.
    ///
    /// # Errors
    ///
    /// Returns an [`ArenaError`] if `config` is invalid or cannot hold
    /// `2 * diseases + 1` masks.
    pub fn new(config: ArenaConfig, diseases: u16) -> Result<Self, ArenaError> {
        let arena = Arena::new(config)?;
        let update_health = arena.register_mask(&PopulationMask::UpdateHealth.to_string())?;
        let mut susceptible = Vec::with_capacity(diseases as usize);
        let mut infectious = Vec::with_capacity(diseases as usize);
        for d in 0..diseases {
            let d = DiseaseId(d);
            susceptible.push(arena.register_mask(&PopulationMask::Susceptible(d).to_string())?);
            infectious.push(arena.register_mask(&PopulationMask::Infectious(d).to_string())?);
        }
        debug!(diseases, masks = arena.mask_count(), "population created");
        Ok(Self {
            arena,
            masks: MaskTable {
                susceptible,
                infectious,
                update_health,
            },
        })
    }

    /// Number of diseases tracked.
    pub fn diseases(&self) -> u16 {
        self.masks.susceptible.len() as u16
    }

    /// Arena handle for a well-known mask.
    ///
    /// # Panics
    ///
    /// Panics if the mask names an untracked disease.
    pub fn mask(&self, mask: PopulationMask) -> MaskId {
        let found = match mask {
            PopulationMask::Susceptible(d) => self.masks.susceptible.get(d.index()),
            PopulationMask::Infectious(d) => self.masks.infectious.get(d.index()),
            PopulationMask::UpdateHealth => Some(&self.masks.update_health),
        };
        match found {
            Some(&id) => id,
            None => panic!("mask {mask} names an untracked disease"),
        }
    }

    /// Traversal filter selecting agents with `mask` set.
    pub fn filter(&self, mask: PopulationMask) -> MaskFilter {
        MaskFilter::Set(self.mask(mask))
    }

    /// Set `mask` on a live agent.
    pub fn tag(&self, mask: PopulationMask, agent: Slot) {
        self.arena.set(self.mask(mask), agent);
    }

    /// Clear `mask` on an agent.
    pub fn untag(&self, mask: PopulationMask, agent: Slot) {
        self.arena.clear(self.mask(mask), agent);
    }

    /// Whether a live agent has `mask` set.
    pub fn is_tagged(&self, mask: PopulationMask, agent: Slot) -> bool {
        self.arena.test(self.mask(mask), agent)
    }

    /// Number of agents with `mask` set. O(1).
    pub fn count(&self, mask: PopulationMask) -> usize {
        self.arena.count(self.mask(mask))
    }

    /// Number of live agents.
    pub fn size(&self) -> usize {
        self.arena.size()
    }

    /// The agent in `slot`.
    pub fn get(&self, agent: Slot) -> &A {
        self.arena.get(agent)
    }

    /// The agent in `slot`, mutably.
    pub fn get_mut(&mut self, agent: Slot) -> &mut A {
        self.arena.get_mut(agent)
    }

    /// The underlying arena.
    pub fn arena(&self) -> &Arena<A> {
        &self.arena
    }

    /// The underlying arena, mutably (for traversals).
    pub fn arena_mut(&mut self) -> &mut Arena<A> {
        &mut self.arena
    }
}

impl<A: Default> Population<A> {
    /// Store `agent` and mark it live.
    pub fn add_agent(&mut self, agent: A) -> Slot {
        self.arena.insert(agent)
    }

    /// Retire an agent, clearing every mask it carries, and return it.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not live.
    pub fn remove_agent(&mut self, agent: Slot) -> A {
        self.arena.remove(agent)
    }
}
