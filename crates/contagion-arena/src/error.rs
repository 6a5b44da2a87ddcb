//! Arena-specific error types.
//!
//! Only setup-time and capacity conditions are reported as errors. Contract
//! violations on the hot path (double validation, tagging a free slot)
//! panic instead.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The arena configuration violates a structural invariant.
    InvalidConfig {
        /// Description of the violated invariant.
        reason: String,
    },
    /// The block directory is full; no further block can be added.
    CapacityExceeded {
        /// Number of blocks already allocated.
        blocks: usize,
        /// Total slot capacity of those blocks.
        slots: usize,
    },
    /// The mask table is full; no further mask can be registered.
    MaskLimit {
        /// The configured maximum number of masks.
        limit: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
            Self::CapacityExceeded { blocks, slots } => {
                write!(
                    f,
                    "arena capacity exceeded: {blocks} blocks ({slots} slots) already allocated"
                )
            }
            Self::MaskLimit { limit } => {
                write!(f, "mask limit reached: at most {limit} masks can be registered")
            }
        }
    }
}

impl Error for ArenaError {}
