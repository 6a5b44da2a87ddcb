//! Fixed-size bitsets with atomic per-bit updates.
//!
//! One [`AtomicBitset`] backs the default mask of each block and one more
//! backs every registered auxiliary mask. Neighbouring slots share a `u64`
//! word, so updates use atomic read-modify-write instead of plain stores.

use std::sync::atomic::{AtomicU64, Ordering};

/// A fixed-length bitset whose bits can be set and cleared concurrently.
pub struct AtomicBitset {
    words: Box<[AtomicU64]>,
}

impl AtomicBitset {
    /// Create a zeroed bitset holding `bits` bits, rounded up to whole words.
    pub fn new(bits: usize) -> Self {
        let words = bits.div_ceil(64);
        Self {
            words: (0..words).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Number of bits (always a multiple of 64).
    pub fn len(&self) -> usize {
        self.words.len() * 64
    }

    /// Whether the bitset holds zero bits.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of backing words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Set bit `i`. Returns `true` if the bit was previously clear.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[inline]
    pub fn set(&self, i: usize) -> bool {
        let bit = 1u64 << (i % 64);
        self.words[i / 64].fetch_or(bit, Ordering::AcqRel) & bit == 0
    }

    /// Clear bit `i`. Returns `true` if the bit was previously set.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[inline]
    pub fn clear(&self, i: usize) -> bool {
        let bit = 1u64 << (i % 64);
        self.words[i / 64].fetch_and(!bit, Ordering::AcqRel) & bit != 0
    }

    /// Test bit `i`.
    #[inline]
    pub fn test(&self, i: usize) -> bool {
        self.word(i / 64) & (1u64 << (i % 64)) != 0
    }

    /// Load word `w`.
    #[inline]
    pub fn word(&self, w: usize) -> u64 {
        self.words[w].load(Ordering::Acquire)
    }

    /// Population count across all words.
    ///
    /// This is a full scan; mask counts are maintained incrementally and
    /// never computed with this.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }
}

impl std::fmt::Debug for AtomicBitset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicBitset")
            .field("len", &self.len())
            .field("ones", &self.count_ones())
            .finish()
    }
}
