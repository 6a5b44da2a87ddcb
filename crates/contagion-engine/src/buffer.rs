//! Per-place visitor buffers.
//!
//! Every place keeps, per disease, the agents that visited it today as
//! susceptible or as infectious. Buffers move through three states each
//! day:
//!
//! ```text
//! Empty ──add_*──▶ Accumulating ──barrier──▶ Frozen ──clear──▶ Empty
//! ```
//!
//! Accumulation happens from inside parallel traversals, so every append
//! takes a short per-buffer lock. The Accumulating → Frozen transition is
//! the end of the parallel pass; no lock marks it.

use std::sync::atomic::{AtomicBool, Ordering};

use contagion_core::Slot;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::shard::PerThread;

/// Susceptible and infectious visitor lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Visitors {
    /// Agents visiting while susceptible.
    pub susceptible: Vec<Slot>,
    /// Agents visiting while infectious.
    pub infectious: Vec<Slot>,
}

impl Visitors {
    /// Append both of `other`'s lists.
    pub fn merge(&mut self, other: &Visitors) {
        self.susceptible.extend_from_slice(&other.susceptible);
        self.infectious.extend_from_slice(&other.infectious);
    }

    /// Whether both lists are empty.
    pub fn is_empty(&self) -> bool {
        self.susceptible.is_empty() && self.infectious.is_empty()
    }

    /// Whether transmission is possible: at least one visitor of each role.
    pub fn can_transmit(&self) -> bool {
        !self.susceptible.is_empty() && !self.infectious.is_empty()
    }

    /// Sort both lists by slot.
    pub fn sort(&mut self) {
        self.susceptible.sort_unstable();
        self.infectious.sort_unstable();
    }

    /// Shuffle both lists independently.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.infectious.shuffle(rng);
        self.susceptible.shuffle(rng);
    }
}

/// One lock-guarded pair of visitor lists.
#[derive(Debug, Default)]
pub struct VisitorBuffer {
    lists: Mutex<Visitors>,
}

impl VisitorBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a susceptible visitor.
    #[inline]
    pub fn add_susceptible(&self, agent: Slot) {
        self.lists.lock().susceptible.push(agent);
    }

    /// Append an infectious visitor.
    #[inline]
    pub fn add_infectious(&self, agent: Slot) {
        self.lists.lock().infectious.push(agent);
    }

    /// Drop both lists and their storage.
    pub fn clear(&self) {
        *self.lists.lock() = Visitors::default();
    }

    /// Append `other`'s lists to this buffer.
    ///
    /// `other` is read under its own lock first, so merging a buffer into
    /// itself duplicates its contents instead of deadlocking.
    pub fn merge(&self, other: &VisitorBuffer) {
        let incoming = other.snapshot();
        self.lists.lock().merge(&incoming);
    }

    /// Copy of both lists.
    pub fn snapshot(&self) -> Visitors {
        self.lists.lock().clone()
    }

    /// Move both lists out, leaving the buffer empty.
    pub fn take(&self) -> Visitors {
        std::mem::take(&mut *self.lists.lock())
    }

    /// `(susceptible, infectious)` lengths.
    pub fn lens(&self) -> (usize, usize) {
        let lists = self.lists.lock();
        (lists.susceptible.len(), lists.infectious.len())
    }
}

/// Today's visitors to one place for one disease.
///
/// Lists are sharded with [`PerThread`]; the infectious-today flag flips
/// exactly once per day, on the first infectious visitor, so the caller
/// can register the place for transmission without double entries.
#[derive(Debug)]
pub struct PlaceDayState {
    shards: PerThread<VisitorBuffer>,
    infectious_today: AtomicBool,
}

impl PlaceDayState {
    /// Empty state with `shards` visitor shards.
    pub fn new(shards: usize) -> Self {
        Self {
            shards: PerThread::new(shards),
            infectious_today: AtomicBool::new(false),
        }
    }

    /// Record an infectious visitor. Returns `true` if this is the first
    /// infectious visitor today.
    pub fn add_infectious(&self, agent: Slot) -> bool {
        self.shards.current().add_infectious(agent);
        !self.infectious_today.swap(true, Ordering::AcqRel)
    }

    /// Record a susceptible visitor.
    pub fn add_susceptible(&self, agent: Slot) {
        self.shards.current().add_susceptible(agent);
    }

    /// Whether at least one infectious agent visited today.
    pub fn is_infectious(&self) -> bool {
        self.infectious_today.load(Ordering::Acquire)
    }

    /// All shards folded into one view, sorted by slot so the result does
    /// not depend on which worker wrote which shard.
    pub fn merged(&self) -> Visitors {
        let mut all = Visitors::default();
        self.shards.apply(|shard| all.merge(&shard.lists.lock()));
        all.sort();
        all
    }

    /// Number of visitor shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Discard today's visitors and lower the infectious flag.
    pub fn clear(&self) {
        self.shards.apply(VisitorBuffer::clear);
        self.infectious_today.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rayon::prelude::*;

    #[test]
    fn buffer_appends_and_clears() {
        let buf = VisitorBuffer::new();
        buf.add_susceptible(Slot(2));
        buf.add_infectious(Slot(1));
        buf.add_susceptible(Slot(5));
        assert_eq!(buf.lens(), (2, 1));
        let v = buf.snapshot();
        assert_eq!(v.susceptible, vec![Slot(2), Slot(5)]);
        assert_eq!(v.infectious, vec![Slot(1)]);

        buf.clear();
        assert_eq!(buf.lens(), (0, 0));
        assert_eq!(buf.snapshot().susceptible.capacity(), 0);
    }

    #[test]
    fn merge_concatenates_another_shard() {
        let acc = VisitorBuffer::new();
        acc.add_infectious(Slot(1));
        let other = VisitorBuffer::new();
        other.add_infectious(Slot(7));
        other.add_susceptible(Slot(3));
        acc.merge(&other);
        let v = acc.take();
        assert_eq!(v.infectious, vec![Slot(1), Slot(7)]);
        assert_eq!(v.susceptible, vec![Slot(3)]);
        assert_eq!(acc.lens(), (0, 0));
        assert_eq!(other.lens(), (1, 1));
    }

    #[test]
    fn self_merge_duplicates() {
        let buf = VisitorBuffer::new();
        buf.add_susceptible(Slot(4));
        buf.merge(&buf);
        assert_eq!(buf.snapshot().susceptible, vec![Slot(4), Slot(4)]);
    }

    #[test]
    fn infectious_flag_flips_once() {
        let state = PlaceDayState::new(2);
        assert!(!state.is_infectious());
        assert!(state.add_infectious(Slot(3)));
        assert!(!state.add_infectious(Slot(4)));
        assert!(state.is_infectious());
        state.clear();
        assert!(!state.is_infectious());
        assert!(state.merged().is_empty());
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        let state = PlaceDayState::new(3);
        let firsts = std::sync::atomic::AtomicUsize::new(0);
        pool.install(|| {
            (0..2000u32).into_par_iter().for_each(|i| {
                if i % 2 == 0 {
                    if state.add_infectious(Slot(i)) {
                        firsts.fetch_add(1, Ordering::Relaxed);
                    }
                } else {
                    state.add_susceptible(Slot(i));
                }
            });
        });
        assert_eq!(firsts.load(Ordering::Relaxed), 1);
        let v = state.merged();
        assert_eq!(v.infectious.len(), 1000);
        assert_eq!(v.susceptible.len(), 1000);
        assert!(v.infectious.windows(2).all(|w| w[0] < w[1]));
        assert!(v.susceptible.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn shuffle_is_a_seeded_permutation() {
        let mut a = Visitors {
            susceptible: (0..50).map(Slot).collect(),
            infectious: (100..110).map(Slot).collect(),
        };
        let mut b = a.clone();
        a.shuffle(&mut ChaCha8Rng::seed_from_u64(9));
        b.shuffle(&mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
        a.sort();
        assert_eq!(a.susceptible, (0..50).map(Slot).collect::<Vec<_>>());
        assert!(a.can_transmit());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn fill(shards: usize, threads: usize, visits: &[(u32, bool)]) -> Visitors {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let state = PlaceDayState::new(shards);
            pool.install(|| {
                visits.par_iter().for_each(|&(agent, infectious)| {
                    if infectious {
                        state.add_infectious(Slot(agent));
                    } else {
                        state.add_susceptible(Slot(agent));
                    }
                });
            });
            state.merged()
        }

        proptest! {
            #[test]
            fn merged_view_ignores_sharding(
                visits in proptest::collection::vec((0u32..500, any::<bool>()), 0..300),
                shards in 1usize..8,
                threads in 1usize..5,
            ) {
                let mut expected = Visitors::default();
                for &(agent, infectious) in &visits {
                    if infectious {
                        expected.infectious.push(Slot(agent));
                    } else {
                        expected.susceptible.push(Slot(agent));
                    }
                }
                expected.sort();
                prop_assert_eq!(fill(shards, threads, &visits), expected.clone());
                prop_assert_eq!(fill(1, 1, &visits), expected);
            }
        }
    }
}
