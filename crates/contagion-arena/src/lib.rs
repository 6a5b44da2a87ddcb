//! Concurrent slot arena for agent-based simulations.
//!
//! Stores items in fixed-capacity blocks that are appended to a lock-free
//! directory and never moved, so a reference to a live item stays valid
//! while other threads grow the arena. Freed slots are recycled through a
//! serialized free list.
//!
//! # Architecture
//!
//! ```text
//! Arena<T>
//! ├── directory: [OnceLock<Box<Block<T>>>; max_blocks]  (lock-free reads)
//! │   └── Block<T>
//! │       ├── items: [T; block_capacity]
//! │       ├── valid: AtomicBitset            (default mask)
//! │       └── masks: [OnceLock<AtomicBitset>; max_masks]
//! ├── growth: Mutex<Growth>                 (add_block + register_mask)
//! ├── free:   Mutex<FreeList>               (allocate / mark_invalid)
//! ├── bounds: Mutex<Option<Bounds>>         (first/last valid slot)
//! └── counters: MaskCounters                (atomic per-mask live counts)
//! ```
//!
//! # Traversal
//!
//! Every traversal is driven by a word-scanning positional iterator over
//! the default bitset, optionally intersected with one mask
//! ([`MaskFilter`]). Sequential passes visit slots in ascending order;
//! parallel passes partition the directory at block granularity with rayon.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod bitset;
mod block;
pub mod config;
pub mod error;
mod free_list;
pub mod mask;
pub mod traverse;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use bitset::AtomicBitset;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use mask::Tags;
pub use traverse::{MaskFilter, Slots, Visit};
