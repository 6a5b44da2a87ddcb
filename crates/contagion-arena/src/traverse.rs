//! Sequential and parallel traversal over live slots.
//!
//! All traversal modes share one selection rule: a slot is visited if its
//! default bit is set and it passes the [`MaskFilter`]. Sequential modes
//! walk the positional iterator ([`Arena::seek`]) from the first to the last
//! valid slot in ascending order. Parallel modes split the block directory
//! across the rayon pool and scan each block's words independently, so no
//! two threads ever touch the same item.

use std::sync::OnceLock;

use contagion_core::{MaskId, Slot};
use rayon::prelude::*;

use crate::arena::Arena;
use crate::block::{select_word, Block};
use crate::mask::Tags;

/// Which live slots a traversal selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaskFilter {
    /// Every valid slot.
    All,
    /// Valid slots with the mask bit set.
    Set(MaskId),
    /// Valid slots with the mask bit clear.
    Clear(MaskId),
}

impl From<MaskId> for MaskFilter {
    fn from(mask: MaskId) -> Self {
        MaskFilter::Set(mask)
    }
}

/// One live item handed to a traversal callback.
pub struct Visit<'a, T> {
    /// Slot of the visited item.
    pub slot: Slot,
    /// The item itself.
    pub item: &'a mut T,
    /// Mask access restricted to this slot.
    pub tags: Tags<'a>,
}

impl<T> Arena<T> {
    /// Position of the first selected slot in `pos..=end`.
    ///
    /// Scans whole words: the default bitset is intersected with the
    /// filter's mask, bits below `pos` are discarded, and the lowest
    /// remaining bit is taken. Returns `None` past the last allocated block.
    pub fn seek(&self, pos: usize, end: usize, filter: MaskFilter) -> Option<usize> {
        let cap = self.block_capacity();
        let mut pos = pos;
        while pos <= end {
            let index = pos / cap;
            let block = self.block(index)?;
            let offset = pos % cap;
            let w = offset / 64;
            let word =
                select_word(&block.valid, &block.masks, filter, w) & (u64::MAX << (offset % 64));
            if word != 0 {
                let found = index * cap + w * 64 + word.trailing_zeros() as usize;
                return (found <= end).then_some(found);
            }
            pos = index * cap + (w + 1) * 64;
        }
        None
    }

    /// Position of the last selected slot in `start..=pos`.
    pub fn seek_back(&self, pos: usize, start: usize, filter: MaskFilter) -> Option<usize> {
        let cap = self.block_capacity();
        let mut pos = pos;
        loop {
            if pos < start {
                return None;
            }
            let index = pos / cap;
            let block = self.block(index)?;
            let offset = pos % cap;
            let w = offset / 64;
            let keep = u64::MAX >> (63 - offset % 64);
            let word = select_word(&block.valid, &block.masks, filter, w) & keep;
            if word != 0 {
                let found = index * cap + w * 64 + 63 - word.leading_zeros() as usize;
                return (found >= start).then_some(found);
            }
            let word_start = index * cap + w * 64;
            if word_start == 0 {
                return None;
            }
            pos = word_start - 1;
        }
    }

    /// Ascending iterator over selected slots.
    pub fn slots(&self, filter: MaskFilter) -> Slots<'_, T> {
        let bounds = *self.bounds.lock();
        match bounds {
            Some(b) => Slots {
                arena: self,
                next: b.first,
                end: b.last,
                filter,
                done: false,
            },
            None => Slots {
                arena: self,
                next: 0,
                end: 0,
                filter,
                done: true,
            },
        }
    }

    /// Ascending iterator over selected `(slot, item)` pairs.
    pub fn iter(&self, filter: MaskFilter) -> impl Iterator<Item = (Slot, &T)> + '_ {
        self.slots(filter).map(move |slot| (slot, self.get(slot)))
    }

    /// Visit one slot outside a traversal.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not valid.
    pub fn visit_mut(&mut self, slot: Slot) -> Visit<'_, T> {
        let cap = self.block_capacity();
        let (index, offset) = (slot.block(cap), slot.offset(cap));
        let Arena {
            directory,
            counters,
            ..
        } = self;
        let block = match directory.get_mut(index).and_then(OnceLock::get_mut) {
            Some(block) => &mut **block,
            None => panic!("slot {slot} lies in unallocated block {index}"),
        };
        assert!(block.valid.test(offset), "slot {slot} is not valid");
        let Block { items, masks, .. } = block;
        Visit {
            slot,
            item: &mut items[offset],
            tags: Tags::new(masks, counters, offset),
        }
    }

    /// Apply `f` to every selected item, one at a time, in ascending slot
    /// order from the first to the last valid slot.
    pub fn apply<F>(&mut self, filter: MaskFilter, mut f: F)
    where
        F: FnMut(Visit<'_, T>),
    {
        let Some((first, last)) = self.bounds() else {
            return;
        };
        let mut pos = first.index();
        while let Some(found) = self.seek(pos, last.index(), filter) {
            f(self.visit_mut(Slot(found as u32)));
            pos = found + 1;
        }
    }

    /// Read-only sequential traversal in ascending slot order.
    pub fn for_each<F>(&self, filter: MaskFilter, mut f: F)
    where
        F: FnMut(Slot, &T),
    {
        for (slot, item) in self.iter(filter) {
            f(slot, item);
        }
    }
}

impl<T: Send + Sync> Arena<T> {
    /// Apply `f` to every selected item across the current rayon pool.
    ///
    /// Blocks are the unit of work; there is no ordering across or within
    /// blocks. Each selected slot is visited exactly once, so `f` only has
    /// to be safe for concurrent calls on distinct items.
    pub fn parallel_apply<F>(&mut self, filter: MaskFilter, f: F)
    where
        F: Fn(Visit<'_, T>) + Sync + Send,
    {
        let n = self.block_count();
        let cap = self.block_capacity();
        let Arena {
            directory,
            counters,
            ..
        } = self;
        let counters = &*counters;
        directory[..n]
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, cell)| {
                if let Some(block) = cell.get_mut() {
                    block.visit_selected(index * cap, filter, counters, &mut &f);
                }
            });
    }

    /// Read-only parallel traversal.
    pub fn par_for_each<F>(&self, filter: MaskFilter, f: F)
    where
        F: Fn(Slot, &T) + Sync + Send,
    {
        let cap = self.block_capacity();
        (0..self.block_count()).into_par_iter().for_each(|index| {
            if let Some(block) = self.block(index) {
                block.for_each_selected(index * cap, filter, &mut &f);
            }
        });
    }
}

/// Iterator returned by [`Arena::slots`].
pub struct Slots<'a, T> {
    arena: &'a Arena<T>,
    next: usize,
    end: usize,
    filter: MaskFilter,
    done: bool,
}

impl<T> Iterator for Slots<'_, T> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        if self.done {
            return None;
        }
        match self.arena.seek(self.next, self.end, self.filter) {
            Some(found) => {
                self.next = found + 1;
                Some(Slot(found as u32))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn arena_with(n: u64) -> (Arena<u64>, Vec<Slot>) {
        let mut arena = Arena::new(ArenaConfig {
            block_capacity: 64,
            max_blocks: 128,
            max_masks: 4,
        })
        .unwrap();
        let slots = (0..n).map(|v| arena.insert(v)).collect();
        (arena, slots)
    }

    #[test]
    fn seek_finds_next_valid_across_words_and_blocks() {
        let (arena, slots) = arena_with(200);
        for &slot in &slots[5..150] {
            arena.mark_invalid(slot);
        }
        assert_eq!(arena.seek(0, 199, MaskFilter::All), Some(0));
        assert_eq!(arena.seek(5, 199, MaskFilter::All), Some(150));
        assert_eq!(arena.seek(5, 149, MaskFilter::All), None);
        assert_eq!(arena.seek_back(149, 0, MaskFilter::All), Some(4));
        assert_eq!(arena.seek_back(149, 5, MaskFilter::All), None);
        assert_eq!(arena.seek(250, 400, MaskFilter::All), None);
    }

    #[test]
    fn apply_visits_all_valid_slots_in_order() {
        let (mut arena, slots) = arena_with(150);
        arena.mark_invalid(slots[7]);
        arena.mark_invalid(slots[64]);

        let mut seen = Vec::new();
        arena.apply(MaskFilter::All, |visit| {
            *visit.item += 1000;
            seen.push(visit.slot);
        });
        let expected: Vec<Slot> = slots
            .iter()
            .copied()
            .filter(|s| *s != slots[7] && *s != slots[64])
            .collect();
        assert_eq!(seen, expected);
        assert_eq!(*arena.get(slots[10]), 1010);
        assert_eq!(*arena.get(slots[7]), 7);
    }

    #[test]
    fn masked_apply_visits_only_tagged_slots() {
        let (mut arena, slots) = arena_with(300);
        let mask = arena.register_mask("infectious").unwrap();
        let tagged: Vec<Slot> = slots.iter().copied().filter(|s| s.0 % 7 == 0).collect();
        for &slot in &tagged {
            arena.set(mask, slot);
        }
        arena.mark_invalid(slots[14]);

        let mut seen = Vec::new();
        arena.apply(MaskFilter::Set(mask), |visit| seen.push(visit.slot));
        let expected: Vec<Slot> = tagged.into_iter().filter(|s| *s != slots[14]).collect();
        assert_eq!(seen, expected);
        assert_eq!(seen.len(), arena.count(mask));
    }

    #[test]
    fn clear_filter_selects_untagged_valid_slots() {
        let (arena, slots) = arena_with(10);
        let mask = arena.register_mask("immune").unwrap();
        arena.set(mask, slots[2]);
        arena.set(mask, slots[3]);
        arena.mark_invalid(slots[9]);

        let seen: Vec<Slot> = arena.slots(MaskFilter::Clear(mask)).collect();
        assert_eq!(
            seen,
            vec![slots[0], slots[1], slots[4], slots[5], slots[6], slots[7], slots[8]]
        );
    }

    #[test]
    fn empty_arena_traversal_is_noop() {
        let (mut arena, _) = arena_with(0);
        let mut calls = 0;
        arena.apply(MaskFilter::All, |_| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(arena.slots(MaskFilter::All).count(), 0);
    }

    #[test]
    fn iter_yields_items() {
        let (arena, _) = arena_with(4);
        let items: Vec<u64> = arena.iter(MaskFilter::All).map(|(_, v)| *v).collect();
        assert_eq!(items, vec![0, 1, 2, 3]);
    }

    #[test]
    fn parallel_apply_matches_sequential_multiset() {
        let (mut arena, slots) = arena_with(1000);
        let mask = arena.register_mask("m").unwrap();
        for &slot in slots.iter().filter(|s| s.0 % 3 == 1) {
            arena.set(mask, slot);
        }
        for &slot in slots.iter().filter(|s| s.0 % 11 == 0) {
            arena.mark_invalid(slot);
        }

        let mut sequential = Vec::new();
        arena.apply(MaskFilter::Set(mask), |visit| sequential.push(visit.slot));

        let parallel = Mutex::new(Vec::new());
        let calls = AtomicUsize::new(0);
        arena.parallel_apply(MaskFilter::Set(mask), |visit| {
            calls.fetch_add(1, Ordering::Relaxed);
            parallel.lock().unwrap().push(visit.slot);
        });
        let mut parallel = parallel.into_inner().unwrap();
        parallel.sort_unstable();
        assert_eq!(parallel, sequential);
        assert_eq!(calls.load(Ordering::Relaxed), arena.count(mask));
    }

    #[test]
    fn parallel_apply_mutates_each_item_once() {
        let (mut arena, slots) = arena_with(700);
        arena.parallel_apply(MaskFilter::All, |visit| *visit.item *= 2);
        for (i, &slot) in slots.iter().enumerate() {
            assert_eq!(*arena.get(slot), 2 * i as u64);
        }
    }

    #[test]
    fn tags_flip_masks_during_parallel_pass() {
        let (mut arena, slots) = arena_with(500);
        let susceptible = arena.register_mask("susceptible").unwrap();
        let infectious = arena.register_mask("infectious").unwrap();
        for &slot in &slots {
            arena.set(susceptible, slot);
        }
        arena.parallel_apply(MaskFilter::Set(susceptible), |visit| {
            if *visit.item % 2 == 0 {
                visit.tags.clear(susceptible);
                visit.tags.set(infectious);
            }
        });
        assert_eq!(arena.count(susceptible), 250);
        assert_eq!(arena.count(infectious), 250);
        assert!(arena.test(infectious, slots[0]));
        assert!(!arena.test(infectious, slots[1]));
    }

    #[test]
    fn par_for_each_sees_every_valid_item() {
        let (arena, slots) = arena_with(333);
        arena.mark_invalid(slots[100]);
        let sum = AtomicUsize::new(0);
        arena.par_for_each(MaskFilter::All, |_, v| {
            sum.fetch_add(*v as usize, Ordering::Relaxed);
        });
        let expected: usize = (0..333).sum::<usize>() - 100;
        assert_eq!(sum.load(Ordering::Relaxed), expected);
    }

    #[test]
    #[should_panic(expected = "is not valid")]
    fn visit_mut_rejects_free_slot() {
        let (mut arena, slots) = arena_with(3);
        arena.mark_invalid(slots[1]);
        arena.visit_mut(slots[1]);
    }
}
