//! Fixed-capacity item blocks.

use std::sync::OnceLock;

use contagion_core::{MaskId, Slot};

use crate::bitset::AtomicBitset;
use crate::mask::{MaskCounters, Tags};
use crate::traverse::{MaskFilter, Visit};

/// One block of item storage plus its default and auxiliary bitsets.
///
/// Blocks are boxed into the arena directory once and never moved,
/// resized, or freed while the arena lives.
pub(crate) struct Block<T> {
    pub(crate) items: Box<[T]>,
    pub(crate) valid: AtomicBitset,
    /// One cell per mask table entry; filled on registration.
    pub(crate) masks: Box<[OnceLock<AtomicBitset>]>,
}

impl<T: Default> Block<T> {
    /// Create a block with default-initialised items and bitsets for the
    /// first `registered` masks.
    pub(crate) fn new(capacity: usize, max_masks: usize, registered: usize) -> Self {
        let block = Self {
            items: (0..capacity).map(|_| T::default()).collect(),
            valid: AtomicBitset::new(capacity),
            masks: (0..max_masks).map(|_| OnceLock::new()).collect(),
        };
        for id in 0..registered {
            block.install_mask(id);
        }
        block
    }
}

impl<T> Block<T> {
    pub(crate) fn install_mask(&self, id: usize) {
        let capacity = self.items.len();
        self.masks[id].get_or_init(|| AtomicBitset::new(capacity));
    }

    /// The bitset for `mask` in this block.
    ///
    /// # Panics
    ///
    /// Panics if the mask has not been registered.
    #[inline]
    pub(crate) fn mask(&self, mask: MaskId) -> &AtomicBitset {
        mask_bits(&self.masks, mask)
    }

    /// Visit every slot selected by `filter`, in ascending offset order.
    ///
    /// The selection of each 64-slot word is captured before its slots are
    /// visited, so tag changes made by `f` never add or drop visits.
    pub(crate) fn visit_selected<F>(
        &mut self,
        base: usize,
        filter: MaskFilter,
        counters: &MaskCounters,
        f: &mut F,
    ) where
        F: FnMut(Visit<'_, T>),
    {
        let Block {
            items,
            valid,
            masks,
        } = self;
        let masks = &**masks;
        for w in 0..valid.word_count() {
            let mut word = select_word(valid, masks, filter, w);
            while word != 0 {
                let bit = word.trailing_zeros() as usize;
                word &= word - 1;
                let offset = w * 64 + bit;
                f(Visit {
                    slot: Slot((base + offset) as u32),
                    item: &mut items[offset],
                    tags: Tags::new(masks, counters, offset),
                });
            }
        }
    }

    /// Read-only counterpart of [`visit_selected`](Self::visit_selected).
    pub(crate) fn for_each_selected<F>(&self, base: usize, filter: MaskFilter, f: &mut F)
    where
        F: FnMut(Slot, &T),
    {
        for w in 0..self.valid.word_count() {
            let mut word = select_word(&self.valid, &self.masks, filter, w);
            while word != 0 {
                let bit = word.trailing_zeros() as usize;
                word &= word - 1;
                let offset = w * 64 + bit;
                f(Slot((base + offset) as u32), &self.items[offset]);
            }
        }
    }
}

#[inline]
pub(crate) fn mask_bits(masks: &[OnceLock<AtomicBitset>], mask: MaskId) -> &AtomicBitset {
    match masks.get(mask.index()).and_then(OnceLock::get) {
        Some(bits) => bits,
        None => panic!("mask {mask} is not registered"),
    }
}

/// Word `w` of the default bitset intersected with the filter.
#[inline]
pub(crate) fn select_word(
    valid: &AtomicBitset,
    masks: &[OnceLock<AtomicBitset>],
    filter: MaskFilter,
    w: usize,
) -> u64 {
    let word = valid.word(w);
    match filter {
        MaskFilter::All => word,
        MaskFilter::Set(mask) => word & mask_bits(masks, mask).word(w),
        MaskFilter::Clear(mask) => word & !mask_bits(masks, mask).word(w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_installs_registered_masks_only() {
        let block: Block<u32> = Block::new(128, 4, 2);
        assert_eq!(block.items.len(), 128);
        assert!(block.masks[0].get().is_some());
        assert!(block.masks[1].get().is_some());
        assert!(block.masks[2].get().is_none());
        assert_eq!(block.mask(MaskId(1)).len(), 128);
    }

    #[test]
    #[should_panic(expected = "mask 3 is not registered")]
    fn unregistered_mask_panics() {
        let block: Block<u32> = Block::new(64, 4, 1);
        block.mask(MaskId(3));
    }

    #[test]
    fn select_word_applies_filter() {
        let block: Block<u32> = Block::new(64, 1, 1);
        block.valid.set(1);
        block.valid.set(2);
        block.mask(MaskId(0)).set(2);
        block.mask(MaskId(0)).set(5);
        assert_eq!(select_word(&block.valid, &block.masks, MaskFilter::All, 0), 0b110);
        assert_eq!(
            select_word(&block.valid, &block.masks, MaskFilter::Set(MaskId(0)), 0),
            0b100
        );
        assert_eq!(
            select_word(&block.valid, &block.masks, MaskFilter::Clear(MaskId(0)), 0),
            0b010
        );
    }
}
