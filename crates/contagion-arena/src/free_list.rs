//! Free-slot bookkeeping.

use contagion_core::Slot;

/// LIFO stack of free slot indices.
///
/// Ordering carries no meaning; any free slot is as good as any other.
/// The arena wraps this in a mutex so that a pop is exclusive.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    slots: Vec<Slot>,
}

impl FreeList {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Enqueue every slot of a freshly allocated block.
    ///
    /// Pushed in descending order so the lowest index pops first.
    pub(crate) fn refill(&mut self, base: u32, capacity: u32) {
        self.slots.reserve(capacity as usize);
        let start = base as u64;
        let end = start + capacity as u64;
        self.slots.extend((start..end).rev().map(|i| Slot(i as u32)));
    }

    pub(crate) fn pop(&mut self) -> Option<Slot> {
        self.slots.pop()
    }

    pub(crate) fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
