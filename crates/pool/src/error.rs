//! Error types for memory pool operations
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use rtpool_tick::TickError;
use thiserror::Error;
use tracing::{error, warn};

// ============================================================================
// Main Error Types
// ============================================================================

/// Memory pool errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // --- Parameter Errors ---
    /// The handle does not name a live pool
    #[error("Invalid memory pool handle")]
    InvalidHandle,

    /// A pool needs at least one block
    #[error("Block count must be greater than zero")]
    ZeroBlockCount,

    /// A block needs at least one byte
    #[error("Block size must be greater than zero")]
    ZeroBlockSize,

    /// The address is not the start of any block of this pool
    #[error("Address {address:#x} does not start a block of this pool")]
    UnknownAddress {
        /// The rejected address
        address: usize,
    },

    /// The block was already free
    #[error("Block {index} is already free")]
    DoubleFree {
        /// Slot index of the block
        index: usize,
    },

    /// The block is owned by a live guard and must be released through it
    #[error("Block {index} is owned by a live guard")]
    BlockGuarded {
        /// Slot index of the block
        index: usize,
    },

    /// The tick configuration cannot express deadlines
    #[error("Invalid tick configuration: {0}")]
    InvalidTick(#[from] TickError),

    // --- Resource Errors ---
    /// No block is free and the caller asked not to wait
    #[error("No free block available")]
    WouldBlock,

    /// No block became free before the deadline
    #[error("No free block became available within {ticks} ticks")]
    Timeout {
        /// The requested timeout in ticks
        ticks: u32,
    },

    // --- Allocation Errors ---
    /// `block_count * padded_block_size` does not fit in memory
    #[error("Arena size overflow: {block_count} blocks of {block_size} bytes")]
    SizeOverflow {
        /// Requested block count
        block_count: u32,
        /// Requested block size
        block_size: u32,
    },

    /// The system allocator refused the arena
    #[error("Arena allocation failed: {size} bytes")]
    AllocationFailed {
        /// Requested arena size
        size: usize,
    },

    // --- Internal Errors ---
    /// Admission succeeded but no slot was free
    #[error("Pool bookkeeping inconsistent: {details}")]
    Inconsistent {
        /// What was observed
        details: String,
    },
}

impl PoolError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WouldBlock | Self::Timeout { .. })
    }

    /// Check if error is a caller mistake
    #[must_use]
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidHandle
                | Self::ZeroBlockCount
                | Self::ZeroBlockSize
                | Self::UnknownAddress { .. }
                | Self::DoubleFree { .. }
                | Self::BlockGuarded { .. }
                | Self::InvalidTick(_)
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidHandle => "POOL:PARAM:HANDLE",
            Self::ZeroBlockCount => "POOL:PARAM:BLOCK_COUNT",
            Self::ZeroBlockSize => "POOL:PARAM:BLOCK_SIZE",
            Self::UnknownAddress { .. } => "POOL:PARAM:ADDRESS",
            Self::DoubleFree { .. } => "POOL:PARAM:DOUBLE_FREE",
            Self::BlockGuarded { .. } => "POOL:PARAM:GUARDED",
            Self::InvalidTick(_) => "POOL:PARAM:TICK",
            Self::WouldBlock => "POOL:RESOURCE:EMPTY",
            Self::Timeout { .. } => "POOL:RESOURCE:TIMEOUT",
            Self::SizeOverflow { .. } => "POOL:ALLOC:OVERFLOW",
            Self::AllocationFailed { .. } => "POOL:ALLOC:FAILED",
            Self::Inconsistent { .. } => "POOL:INTERNAL:INCONSISTENT",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create unknown address error
    pub fn unknown_address(address: usize) -> Self {
        warn!("free of unknown address {address:#x} rejected");
        Self::UnknownAddress { address }
    }

    /// Create double free error
    pub fn double_free(index: usize) -> Self {
        warn!(index, "double free rejected");
        Self::DoubleFree { index }
    }

    /// Create guarded block error
    pub fn guarded(index: usize) -> Self {
        warn!(index, "free of a guarded block rejected");
        Self::BlockGuarded { index }
    }

    /// Create arena allocation failed error
    pub fn allocation_failed(size: usize) -> Self {
        error!(size, "arena allocation failed");
        Self::AllocationFailed { size }
    }

    /// Create bookkeeping inconsistency error
    pub fn inconsistent(details: &str) -> Self {
        error!(details, "memory pool invariant violated");
        Self::Inconsistent {
            details: details.to_string(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for memory pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PoolError::InvalidHandle.code(), "POOL:PARAM:HANDLE");
        assert_eq!(PoolError::double_free(3).code(), "POOL:PARAM:DOUBLE_FREE");
        assert_eq!(PoolError::Timeout { ticks: 10 }.code(), "POOL:RESOURCE:TIMEOUT");
    }

    #[test]
    fn test_retryable() {
        assert!(PoolError::WouldBlock.is_retryable());
        assert!(PoolError::Timeout { ticks: 1 }.is_retryable());
        assert!(!PoolError::ZeroBlockSize.is_retryable());
    }

    #[test]
    fn test_parameter_errors() {
        assert!(PoolError::unknown_address(0x10).is_parameter_error());
        assert!(PoolError::ZeroBlockCount.is_parameter_error());
        assert!(PoolError::guarded(2).is_parameter_error());
        assert!(PoolError::from(TickError::ZeroTick).is_parameter_error());
        assert!(!PoolError::WouldBlock.is_parameter_error());
        assert!(!PoolError::allocation_failed(64).is_parameter_error());
    }

    #[test]
    fn test_display() {
        let error = PoolError::unknown_address(0xdead);
        assert!(error.to_string().contains("0xdead"));
        let error = PoolError::SizeOverflow {
            block_count: 7,
            block_size: 9,
        };
        assert!(error.to_string().contains("7 blocks"));
    }
}
