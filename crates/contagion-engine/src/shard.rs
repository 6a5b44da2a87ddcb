//! Per-worker sharded state.

use rayon::prelude::*;

/// A fixed set of `T` shards indexed by rayon worker.
///
/// [`current`](Self::current) returns the shard for the calling worker
/// (`thread_index % len`), so writers on different workers usually touch
/// different shards. Outside a rayon pool every caller gets shard 0.
/// Readers fold the shards after the fork-join barrier with
/// [`apply`](Self::apply) or [`par_apply`](Self::par_apply).
#[derive(Debug)]
pub struct PerThread<T> {
    shards: Box<[T]>,
}

impl<T> PerThread<T> {
    /// Create `len` shards built by `init`.
    ///
    /// # Panics
    ///
    /// Panics if `len` is zero.
    pub fn new_with(len: usize, init: impl FnMut() -> T) -> Self {
        assert!(len > 0, "PerThread needs at least one shard");
        Self {
            shards: std::iter::repeat_with(init).take(len).collect(),
        }
    }

    /// Number of shards.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Shard owned by the calling rayon worker.
    #[inline]
    pub fn current(&self) -> &T {
        let i = rayon::current_thread_index().unwrap_or(0);
        &self.shards[i % self.shards.len()]
    }

    /// Shard `i`.
    pub fn shard(&self, i: usize) -> &T {
        &self.shards[i]
    }

    /// All shards in index order.
    pub fn shards(&self) -> &[T] {
        &self.shards
    }

    /// Apply `f` to each shard in index order.
    pub fn apply(&self, mut f: impl FnMut(&T)) {
        for shard in self.shards.iter() {
            f(shard);
        }
    }

    /// Apply `f` to each shard mutably in index order.
    pub fn apply_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for shard in self.shards.iter_mut() {
            f(shard);
        }
    }
}

impl<T: Sync> PerThread<T> {
    /// Apply `f` to every shard concurrently.
    pub fn par_apply(&self, f: impl Fn(&T) + Sync + Send) {
        self.shards.par_iter().for_each(f);
    }
}

impl<T: Default> PerThread<T> {
    /// Create `len` default shards.
    pub fn new(len: usize) -> Self {
        Self::new_with(len, T::default)
    }

    /// Replace every shard with a fresh default value.
    pub fn reset(&mut self) {
        self.apply_mut(|shard| *shard = T::default());
    }
}
