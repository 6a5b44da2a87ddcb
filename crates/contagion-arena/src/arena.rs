//! The slot arena: allocation, validity, and mask operations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use contagion_core::{MaskId, Slot};
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::block::Block;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::free_list::FreeList;
use crate::mask::MaskCounters;
use crate::traverse::MaskFilter;

/// State mutated only while extending the arena.
///
/// Block growth and mask registration both hold this lock, so a new block
/// always sees the full mask table and a new mask reaches every block.
struct Growth {
    names: IndexMap<String, MaskId>,
}

/// Inclusive range of slots that may hold live items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub(crate) first: usize,
    pub(crate) last: usize,
}

/// A growable, block-based store of `T` with stable slot addresses.
///
/// Items live in fixed-capacity blocks appended to a preallocated
/// directory. Blocks are never moved, so `&T` obtained through
/// [`get`](Self::get) stays valid while other threads call
/// [`allocate`](Self::allocate) and grow the arena.
///
/// A slot is either *free* (on the free list, default bit clear) or *live*
/// (default bit set). Between [`allocate`](Self::allocate) and
/// [`mark_valid`](Self::mark_valid) it belongs exclusively to the caller
/// and is neither.
///
/// Storage is never destroyed; [`mark_invalid`](Self::mark_invalid)
/// recycles the slot and leaves the old item in place until the slot is
/// reused.
pub struct Arena<T> {
    config: ArenaConfig,
    block_capacity: usize,
    pub(crate) directory: Box<[OnceLock<Box<Block<T>>>]>,
    block_count: AtomicUsize,
    growth: Mutex<Growth>,
    free: Mutex<FreeList>,
    pub(crate) bounds: Mutex<Option<Bounds>>,
    pub(crate) counters: MaskCounters,
    live: AtomicUsize,
}

impl<T> Arena<T> {
    /// Create an empty arena. No block is allocated until the first
    /// [`allocate`](Self::allocate).
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            block_capacity: config.block_capacity as usize,
            directory: (0..config.max_blocks).map(|_| OnceLock::new()).collect(),
            block_count: AtomicUsize::new(0),
            growth: Mutex::new(Growth {
                names: IndexMap::new(),
            }),
            free: Mutex::new(FreeList::new()),
            bounds: Mutex::new(None),
            counters: MaskCounters::new(config.max_masks as usize),
            live: AtomicUsize::new(0),
            config,
        })
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Slots per block.
    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Number of blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.block_count.load(Ordering::Acquire)
    }

    /// Total slots across allocated blocks (live, free, or in flight).
    pub fn capacity(&self) -> usize {
        self.block_count() * self.block_capacity
    }

    /// Number of live items. O(1).
    pub fn size(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Whether the arena holds no live items.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of slots on the free list.
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }

    /// First and last slot that may hold a live item, or `None` when empty.
    pub fn bounds(&self) -> Option<(Slot, Slot)> {
        self.bounds
            .lock()
            .map(|b| (Slot(b.first as u32), Slot(b.last as u32)))
    }

    #[inline]
    pub(crate) fn block(&self, index: usize) -> Option<&Block<T>> {
        self.directory
            .get(index)
            .and_then(OnceLock::get)
            .map(|b| &**b)
    }

    #[inline]
    fn block_for(&self, slot: Slot) -> (&Block<T>, usize) {
        let index = slot.block(self.block_capacity);
        match self.block(index) {
            Some(block) => (block, slot.offset(self.block_capacity)),
            None => panic!("slot {slot} lies in unallocated block {index}"),
        }
    }

    #[inline]
    pub(crate) fn block_for_mut(&mut self, slot: Slot) -> (&mut Block<T>, usize) {
        let index = slot.block(self.block_capacity);
        let offset = slot.offset(self.block_capacity);
        match self.directory.get_mut(index).and_then(OnceLock::get_mut) {
            Some(block) => (&mut **block, offset),
            None => panic!("slot {slot} lies in unallocated block {index}"),
        }
    }

    /// Whether `slot` currently holds a live item.
    pub fn is_valid(&self, slot: Slot) -> bool {
        self.block(slot.block(self.block_capacity))
            .is_some_and(|b| b.valid.test(slot.offset(self.block_capacity)))
    }

    /// Shared reference to the item in `slot`.
    ///
    /// Not checked against validity: a free slot yields whatever item it
    /// last held (or the default value).
    ///
    /// # Panics
    ///
    /// Panics if `slot` lies beyond the allocated blocks.
    #[inline]
    pub fn get(&self, slot: Slot) -> &T {
        let (block, offset) = self.block_for(slot);
        &block.items[offset]
    }

    /// Mutable reference to the item in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` lies beyond the allocated blocks.
    #[inline]
    pub fn get_mut(&mut self, slot: Slot) -> &mut T {
        let (block, offset) = self.block_for_mut(slot);
        &mut block.items[offset]
    }

    /// Set the default bit of an allocated slot, making its item live.
    ///
    /// # Panics
    ///
    /// Panics if the slot is already valid.
    pub fn mark_valid(&self, slot: Slot) {
        let (block, offset) = self.block_for(slot);
        if !block.valid.set(offset) {
            panic!("slot {slot} marked valid twice");
        }
        self.live.fetch_add(1, Ordering::AcqRel);

        let i = slot.index();
        let mut bounds = self.bounds.lock();
        *bounds = Some(match *bounds {
            None => Bounds { first: i, last: i },
            Some(b) => Bounds {
                first: b.first.min(i),
                last: b.last.max(i),
            },
        });
    }

    /// Retire the item in `slot` and return the slot to the free list.
    ///
    /// Clears every registered mask bit first (decrementing each mask's
    /// count), then the default bit, so no mask is ever set on a free slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not valid.
    pub fn mark_invalid(&self, slot: Slot) {
        let (block, offset) = self.block_for(slot);
        assert!(block.valid.test(offset), "slot {slot} is not valid");

        for id in 0..self.counters.registered() {
            self.counters
                .clear(&block.masks, MaskId(id as u16), offset);
        }
        if !block.valid.clear(offset) {
            panic!("slot {slot} invalidated concurrently");
        }
        self.live.fetch_sub(1, Ordering::AcqRel);

        // Bounds settle before the slot can be reallocated.
        let i = slot.index();
        let mut bounds = self.bounds.lock();
        if let Some(b) = *bounds {
            if b.first == i || b.last == i {
                let first = if b.first == i {
                    self.seek(i + 1, b.last, MaskFilter::All)
                } else {
                    Some(b.first)
                };
                let last = if b.last == i {
                    i.checked_sub(1)
                        .and_then(|from| self.seek_back(from, b.first, MaskFilter::All))
                } else {
                    Some(b.last)
                };
                *bounds = match (first, last) {
                    (Some(first), Some(last)) if first <= last => Some(Bounds { first, last }),
                    _ => None,
                };
            }
        }
        drop(bounds);
        self.free.lock().push(slot);
    }

    // ── Masks ──────────────────────────────────────────────────────

    /// Register a named mask, or return the existing handle for `name`.
    ///
    /// The new mask's bitsets are installed in every existing block before
    /// the handle is returned; blocks added later receive them on creation.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::MaskLimit`] when `max_masks` masks are
    /// already registered.
    pub fn register_mask(&self, name: &str) -> Result<MaskId, ArenaError> {
        let mut growth = self.growth.lock();
        if let Some(&id) = growth.names.get(name) {
            return Ok(id);
        }
        let id = growth.names.len();
        if id >= self.config.max_masks as usize {
            return Err(ArenaError::MaskLimit {
                limit: self.config.max_masks as usize,
            });
        }
        for index in 0..self.block_count() {
            if let Some(block) = self.block(index) {
                block.install_mask(id);
            }
        }
        let mask = MaskId(id as u16);
        growth.names.insert(name.to_owned(), mask);
        self.counters.publish(id + 1);
        debug!(mask = id, name, "registered arena mask");
        Ok(mask)
    }

    /// Handle of the mask registered under `name`.
    pub fn mask_id(&self, name: &str) -> Option<MaskId> {
        self.growth.lock().names.get(name).copied()
    }

    /// Name a mask was registered under.
    pub fn mask_name(&self, mask: MaskId) -> Option<String> {
        self.growth
            .lock()
            .names
            .get_index(mask.index())
            .map(|(name, _)| name.clone())
    }

    /// Number of registered masks.
    pub fn mask_count(&self) -> usize {
        self.counters.registered()
    }

    /// Tag `slot` with `mask`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not valid or the mask is not registered.
    pub fn set(&self, mask: MaskId, slot: Slot) {
        let (block, offset) = self.block_for(slot);
        assert!(
            block.valid.test(offset),
            "cannot set mask {mask} on invalid slot {slot}"
        );
        self.counters.set(&block.masks, mask, offset);
    }

    /// Remove `mask` from `slot`. Clearing an unset bit is a no-op.
    pub fn clear(&self, mask: MaskId, slot: Slot) {
        let (block, offset) = self.block_for(slot);
        self.counters.clear(&block.masks, mask, offset);
    }

    /// Whether `slot` carries `mask`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not valid or the mask is not registered.
    pub fn test(&self, mask: MaskId, slot: Slot) -> bool {
        let (block, offset) = self.block_for(slot);
        assert!(
            block.valid.test(offset),
            "cannot test mask {mask} on invalid slot {slot}"
        );
        block.mask(mask).test(offset)
    }

    /// Number of slots carrying `mask`. O(1).
    pub fn count(&self, mask: MaskId) -> usize {
        self.counters.get(mask)
    }
}

impl<T: Default> Arena<T> {
    /// Hand out a free slot, growing the arena if the free list is empty.
    ///
    /// The pop is serialized, so concurrent callers never receive the same
    /// slot. The slot is not yet valid.
    ///
    /// # Panics
    ///
    /// Panics if the block directory is full. Use
    /// [`try_allocate`](Self::try_allocate) to handle that case.
    pub fn allocate(&self) -> Slot {
        match self.try_allocate() {
            Ok(slot) => slot,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible form of [`allocate`](Self::allocate).
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityExceeded`] if no slot is free and the
    /// directory has no room for another block.
    pub fn try_allocate(&self) -> Result<Slot, ArenaError> {
        let mut free = self.free.lock();
        loop {
            if let Some(slot) = free.pop() {
                return Ok(slot);
            }
            self.grow(&mut free)?;
        }
    }

    /// Append one block and enqueue its slots. Returns the new block index.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityExceeded`] if the directory is full.
    pub fn add_block(&self) -> Result<usize, ArenaError> {
        let mut free = self.free.lock();
        self.grow(&mut free)
    }

    /// Lock order is free list, then growth.
    fn grow(&self, free: &mut FreeList) -> Result<usize, ArenaError> {
        let growth = self.growth.lock();
        let index = self.block_count.load(Ordering::Acquire);
        if index >= self.directory.len() {
            return Err(ArenaError::CapacityExceeded {
                blocks: index,
                slots: index * self.block_capacity,
            });
        }
        self.directory[index].get_or_init(|| {
            Box::new(Block::new(
                self.block_capacity,
                self.config.max_masks as usize,
                growth.names.len(),
            ))
        });
        self.block_count.store(index + 1, Ordering::Release);
        free.refill(
            (index * self.block_capacity) as u32,
            self.block_capacity as u32,
        );
        debug!(
            block = index,
            capacity = self.block_capacity,
            masks = growth.names.len(),
            "arena grew"
        );
        Ok(index)
    }

    /// Allocate a slot, store `item` in it, and mark it valid.
    pub fn insert(&mut self, item: T) -> Slot {
        let slot = self.allocate();
        *self.get_mut(slot) = item;
        self.mark_valid(slot);
        slot
    }

    /// Invalidate `slot` and move its item out, leaving a default value in
    /// the recycled storage.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not valid.
    pub fn remove(&mut self, slot: Slot) -> T {
        self.mark_invalid(slot);
        std::mem::take(self.get_mut(slot))
    }
}

impl<T> std::fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("blocks", &self.block_count())
            .field("block_capacity", &self.block_capacity)
            .field("live", &self.size())
            .field("masks", &self.mask_count())
            .finish()
    }
}
