//! Infectious-place buckets, one per place kind.

use contagion_core::{PlaceId, PlaceKind};
use parking_lot::Mutex;

/// Places that received at least one infectious visitor today, grouped by
/// [`PlaceKind`].
///
/// Each kind has its own lock, so registrations for unrelated kinds never
/// contend. Callers register a place at most once per day (see
/// [`PlaceDayState::add_infectious`](crate::PlaceDayState::add_infectious)).
#[derive(Debug, Default)]
pub struct InfectiousBuckets {
    buckets: [Mutex<Vec<PlaceId>>; PlaceKind::COUNT],
}

impl InfectiousBuckets {
    /// Six empty buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `place` to the bucket for `kind`.
    #[inline]
    pub fn register(&self, kind: PlaceKind, place: PlaceId) {
        self.buckets[kind.index()].lock().push(place);
    }

    /// Places registered under `kind`, sorted by id.
    pub fn places(&self, kind: PlaceKind) -> Vec<PlaceId> {
        let mut places = self.buckets[kind.index()].lock().clone();
        places.sort_unstable();
        places
    }

    /// Number of places registered under `kind`.
    pub fn len(&self, kind: PlaceKind) -> usize {
        self.buckets[kind.index()].lock().len()
    }

    /// Per-kind counts in [`PlaceKind::ALL`] order.
    pub fn lens(&self) -> [usize; PlaceKind::COUNT] {
        PlaceKind::ALL.map(|kind| self.len(kind))
    }

    /// Places registered across all kinds.
    pub fn total(&self) -> usize {
        self.lens().iter().sum()
    }

    /// Whether no place is registered.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Empty every bucket, releasing its storage.
    pub fn clear(&self) {
        for bucket in &self.buckets {
            *bucket.lock() = Vec::new();
        }
    }
}
