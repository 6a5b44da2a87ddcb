//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the slot arena.
///
/// Controls block sizing and the fixed limits of the block directory and
/// mask table. Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Number of slots per block.
    ///
    /// Default: 4096. Must be a power of two and a multiple of 64 so the
    /// per-block bitsets pack into whole `u64` words.
    pub block_capacity: u32,

    /// Maximum number of blocks the directory can hold.
    ///
    /// Default: 16_384, i.e. 64M slots at the default block capacity.
    /// The directory is preallocated so growth never moves existing blocks.
    pub max_blocks: u32,

    /// Maximum number of auxiliary masks that can be registered.
    ///
    /// Default: 32.
    pub max_masks: u16,
}

impl ArenaConfig {
    /// Default block capacity in slots.
    pub const DEFAULT_BLOCK_CAPACITY: u32 = 4096;

    /// Default directory size in blocks.
    pub const DEFAULT_MAX_BLOCKS: u32 = 16_384;

    /// Default mask table size.
    pub const DEFAULT_MAX_MASKS: u16 = 32;

    /// Create a config with the given block capacity and default limits.
    pub fn with_block_capacity(block_capacity: u32) -> Self {
        Self {
            block_capacity,
            ..Self::default()
        }
    }

    /// Total number of slots the arena can ever hold.
    pub fn slot_capacity(&self) -> u64 {
        self.block_capacity as u64 * self.max_blocks as u64
    }

    /// Number of `u64` words in each per-block bitset.
    pub fn words_per_block(&self) -> usize {
        self.block_capacity as usize / 64
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the block capacity is not a
    /// power-of-two multiple of 64, if either limit is zero, or if the
    /// total slot count does not fit a `u32` slot index.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.block_capacity < 64 || !self.block_capacity.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "block_capacity must be a power of two >= 64, got {}",
                    self.block_capacity
                ),
            });
        }
        if self.max_blocks == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "max_blocks must be at least 1".into(),
            });
        }
        if self.max_masks == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "max_masks must be at least 1".into(),
            });
        }
        if self.slot_capacity() > u32::MAX as u64 + 1 {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "{} blocks of {} slots exceed the u32 slot index range",
                    self.max_blocks, self.block_capacity
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            block_capacity: Self::DEFAULT_BLOCK_CAPACITY,
            max_blocks: Self::DEFAULT_MAX_BLOCKS,
            max_masks: Self::DEFAULT_MAX_MASKS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.words_per_block(), 64);
        assert_eq!(config.slot_capacity(), 4096 * 16_384);
    }

    #[test]
    fn rejects_non_power_of_two_capacity() {
        let config = ArenaConfig::with_block_capacity(96);
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_capacity_below_one_word() {
        let config = ArenaConfig::with_block_capacity(32);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        let mut config = ArenaConfig::default();
        config.max_blocks = 0;
        assert!(config.validate().is_err());

        let mut config = ArenaConfig::default();
        config.max_masks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_slot_range_overflow() {
        let config = ArenaConfig {
            block_capacity: 1 << 20,
            max_blocks: 1 << 13,
            max_masks: 4,
        };
        assert!(config.validate().is_err());

        let exact = ArenaConfig {
            block_capacity: 1 << 20,
            max_blocks: 1 << 12,
            max_masks: 4,
        };
        assert!(exact.validate().is_ok());
    }
}
