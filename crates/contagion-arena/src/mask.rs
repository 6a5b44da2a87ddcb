//! Auxiliary mask bookkeeping.
//!
//! A mask is a named bitset family with one [`AtomicBitset`] per block and
//! a single live count. Counts change only on real bit transitions, so a
//! mask's count always equals the number of set bits across its blocks
//! and [`Arena::count`](crate::Arena::count) is a plain atomic load.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use contagion_core::MaskId;

use crate::bitset::AtomicBitset;
use crate::block::mask_bits;

/// Per-mask live counts plus the number of registered masks.
pub(crate) struct MaskCounters {
    counts: Box<[AtomicUsize]>,
    registered: AtomicUsize,
}

impl MaskCounters {
    pub(crate) fn new(max_masks: usize) -> Self {
        Self {
            counts: (0..max_masks).map(|_| AtomicUsize::new(0)).collect(),
            registered: AtomicUsize::new(0),
        }
    }

    /// Number of masks registered so far.
    pub(crate) fn registered(&self) -> usize {
        self.registered.load(Ordering::Acquire)
    }

    /// Publish `n` as the registered mask count. Called under the growth lock
    /// after every block has its bitset installed.
    pub(crate) fn publish(&self, n: usize) {
        self.registered.store(n, Ordering::Release);
    }

    #[inline]
    pub(crate) fn get(&self, mask: MaskId) -> usize {
        self.check(mask);
        self.counts[mask.index()].load(Ordering::Acquire)
    }

    #[inline]
    fn check(&self, mask: MaskId) {
        assert!(
            mask.index() < self.registered(),
            "mask {mask} is not registered"
        );
    }

    /// Set `mask` at `offset` within one block's mask table.
    #[inline]
    pub(crate) fn set(&self, masks: &[OnceLock<AtomicBitset>], mask: MaskId, offset: usize) {
        self.check(mask);
        if mask_bits(masks, mask).set(offset) {
            self.counts[mask.index()].fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Clear `mask` at `offset`. Returns `true` if the bit was set.
    #[inline]
    pub(crate) fn clear(
        &self,
        masks: &[OnceLock<AtomicBitset>],
        mask: MaskId,
        offset: usize,
    ) -> bool {
        self.check(mask);
        let was_set = mask_bits(masks, mask).clear(offset);
        if was_set {
            self.counts[mask.index()].fetch_sub(1, Ordering::AcqRel);
        }
        was_set
    }
}

/// Mask access for the single slot being visited by a traversal.
///
/// Handed to traversal callbacks inside a [`Visit`](crate::Visit) so that an
/// agent can flip its own tags (e.g. leave the susceptible set) while the
/// pass holds the arena mutably. The slot is live for the whole visit, so
/// the validity precondition of [`Arena::set`](crate::Arena::set) holds.
pub struct Tags<'a> {
    masks: &'a [OnceLock<AtomicBitset>],
    counters: &'a MaskCounters,
    offset: usize,
}

impl<'a> Tags<'a> {
    pub(crate) fn new(
        masks: &'a [OnceLock<AtomicBitset>],
        counters: &'a MaskCounters,
        offset: usize,
    ) -> Self {
        Self {
            masks,
            counters,
            offset,
        }
    }

    /// Set `mask` on the visited slot.
    pub fn set(&self, mask: MaskId) {
        self.counters.set(self.masks, mask, self.offset);
    }

    /// Clear `mask` on the visited slot.
    pub fn clear(&self, mask: MaskId) {
        self.counters.clear(self.masks, mask, self.offset);
    }

    /// Whether `mask` is set on the visited slot.
    pub fn test(&self, mask: MaskId) -> bool {
        mask_bits(self.masks, mask).test(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> Box<[OnceLock<AtomicBitset>]> {
        (0..n)
            .map(|_| {
                let cell = OnceLock::new();
                let _ = cell.set(AtomicBitset::new(64));
                cell
            })
            .collect()
    }

    #[test]
    fn counts_follow_bit_transitions() {
        let counters = MaskCounters::new(2);
        counters.publish(2);
        let masks = table(2);

        counters.set(&masks, MaskId(0), 4);
        counters.set(&masks, MaskId(0), 4);
        counters.set(&masks, MaskId(0), 9);
        assert_eq!(counters.get(MaskId(0)), 2);
        assert_eq!(counters.get(MaskId(1)), 0);

        assert!(counters.clear(&masks, MaskId(0), 4));
        assert!(!counters.clear(&masks, MaskId(0), 4));
        assert_eq!(counters.get(MaskId(0)), 1);
    }

    #[test]
    #[should_panic(expected = "mask 1 is not registered")]
    fn unpublished_mask_is_rejected() {
        let counters = MaskCounters::new(2);
        counters.publish(1);
        counters.get(MaskId(1));
    }

    #[test]
    fn tags_operate_on_one_offset() {
        let counters = MaskCounters::new(1);
        counters.publish(1);
        let masks = table(1);
        let tags = Tags::new(&masks, &counters, 7);

        tags.set(MaskId(0));
        assert!(tags.test(MaskId(0)));
        assert!(masks[0].get().unwrap().test(7));
        assert!(!masks[0].get().unwrap().test(6));
        tags.clear(MaskId(0));
        assert_eq!(counters.get(MaskId(0)), 0);
    }
}
