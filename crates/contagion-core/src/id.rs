//! Strongly-typed identifiers.

use std::fmt;

/// Index of one item's storage location in an arena.
///
/// A slot maps deterministically to `(block, offset)` for a fixed block
/// capacity. It is stable for the lifetime of the item stored in it and is
/// recycled once the item is invalidated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub u32);

impl Slot {
    /// The slot as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Block number for the given (power-of-two) block capacity.
    #[inline]
    pub fn block(self, block_capacity: usize) -> usize {
        self.index() / block_capacity
    }

    /// Offset within the block for the given block capacity.
    #[inline]
    pub fn offset(self, block_capacity: usize) -> usize {
        self.index() % block_capacity
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Slot {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Handle to an auxiliary mask registered with an arena.
///
/// `MaskId(n)` is the n-th mask registered; handles are only meaningful
/// for the arena that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaskId(pub u16);

impl MaskId {
    /// The mask as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a place (household, school, workplace, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceId(pub u32);

impl PlaceId {
    /// The place as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlaceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a disease tracked by the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiseaseId(pub u16);

impl DiseaseId {
    /// The disease as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DiseaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for DiseaseId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Simulated day counter, starting at day 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Day(pub u32);

impl Day {
    /// The following day.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Day {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
