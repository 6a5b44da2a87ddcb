//! Transmission outcomes, per-place randomness, and a reference
//! contact-based transmission step.

use contagion_arena::Arena;
use contagion_core::{Day, DiseaseId, PlaceId, PlaceKind, Slot};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::buffer::Visitors;
use crate::place::Place;

/// One infection proposed by a place's transmission step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transmission {
    /// Agent infected.
    pub target: Slot,
    /// Place where the contact happened.
    pub place: PlaceId,
    /// Infectious agent responsible.
    pub source: Slot,
}

/// Everything a place's transmission step may read.
///
/// Built after the visit passes, so `visitors` is frozen and `agents` is
/// shared read-only across all places running concurrently.
pub struct SpreadContext<'a, A> {
    /// The place being processed.
    pub place: &'a Place,
    /// Disease being spread.
    pub disease: DiseaseId,
    /// Current day.
    pub day: Day,
    /// Today's visitors, sorted by slot.
    pub visitors: Visitors,
    /// The agent arena.
    pub agents: &'a Arena<A>,
    /// RNG seeded from the scheduler seed, disease, day, and place.
    pub rng: ChaCha8Rng,
}

/// Deterministic RNG for one place on one day.
///
/// Each component occupies its own bit range before mixing with `seed`,
/// so distinct `(disease, day, place)` triples never share a stream.
pub fn place_rng(seed: u64, disease: DiseaseId, day: Day, place: PlaceId) -> ChaCha8Rng {
    let mixed = seed
        ^ ((disease.0 as u64) << 48)
        ^ ((day.0 as u64 & 0xFFFF) << 32)
        ^ (place.0 as u64);
    let mut rng = ChaCha8Rng::seed_from_u64(mixed);
    // Day bits above 16 go into the stream id.
    rng.set_stream((day.0 >> 16) as u64);
    rng
}

/// Contacts one infectious visitor can make in a day; larger rates,
/// including infinity, are clamped to this.
pub const MAX_CONTACTS_PER_DAY: f64 = 10_000.0;

/// Per-kind contact parameters for [`contact_spread`].
#[derive(Clone, Debug, PartialEq)]
pub struct ContactRates {
    contacts: [f64; PlaceKind::COUNT],
    transmission: [f64; PlaceKind::COUNT],
}

impl Default for ContactRates {
    fn default() -> Self {
        Self {
            contacts: [3.0, 1.0, 2.0, 4.0, 1.5, 3.0],
            transmission: [0.3, 0.02, 0.05, 0.1, 0.05, 0.1],
        }
    }
}

impl ContactRates {
    /// Same parameters for every kind.
    pub fn uniform(contacts_per_day: f64, transmission_prob: f64) -> Self {
        Self {
            contacts: [contacts_per_day; PlaceKind::COUNT],
            transmission: [transmission_prob; PlaceKind::COUNT],
        }
    }

    /// Override the parameters for one kind.
    pub fn with(mut self, kind: PlaceKind, contacts_per_day: f64, transmission_prob: f64) -> Self {
        self.contacts[kind.index()] = contacts_per_day;
        self.transmission[kind.index()] = transmission_prob;
        self
    }

    /// Expected contacts per infectious visitor per day at `kind`.
    pub fn contacts(&self, kind: PlaceKind) -> f64 {
        self.contacts[kind.index()]
    }

    /// Probability that one contact at `kind` transmits.
    pub fn transmission(&self, kind: PlaceKind) -> f64 {
        self.transmission[kind.index()]
    }
}

/// Reference transmission step.
///
/// Each infectious visitor makes `contacts(kind)` contacts (at most
/// [`MAX_CONTACTS_PER_DAY`]), randomly rounded to an integer. Each contact picks a susceptible visitor with
/// replacement and transmits with probability `transmission(kind)`. A
/// susceptible visitor is infected at most once per place. Visitors are
/// shuffled with the context RNG first, so the result depends only on the
/// seed and the set of visitors.
pub fn contact_spread<A>(ctx: &mut SpreadContext<'_, A>, rates: &ContactRates) -> Vec<Transmission> {
    let mut out = Vec::new();
    if !ctx.visitors.can_transmit() {
        return out;
    }
    let kind = ctx.place.kind();
    let contacts = rates.contacts(kind);
    let prob = rates.transmission(kind);
    if !(contacts > 0.0 && prob > 0.0) {
        return out;
    }
    let contacts = contacts.min(MAX_CONTACTS_PER_DAY);
    let prob = prob.min(1.0);

    ctx.visitors.shuffle(&mut ctx.rng);
    let targets = ctx.visitors.susceptible.len();
    let mut infected = vec![false; targets];
    for &source in &ctx.visitors.infectious {
        let whole = contacts.floor();
        let mut count = whole as usize;
        if ctx.rng.random::<f64>() < contacts - whole {
            count += 1;
        }
        for _ in 0..count {
            let pos = ctx.rng.random_range(0..targets);
            if infected[pos] || !ctx.rng.random_bool(prob) {
                continue;
            }
            infected[pos] = true;
            out.push(Transmission {
                target: ctx.visitors.susceptible[pos],
                place: ctx.place.id(),
                source,
            });
            if out.len() == targets {
                return out;
            }
        }
    }
    out
}
