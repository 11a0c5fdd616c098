//! Error types for tick configuration
use thiserror::Error;

/// Result type for tick operations
pub type Result<T> = std::result::Result<T, TickError>;

/// Errors raised while validating a tick configuration
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    /// A tick must last at least one nanosecond
    #[error("Tick length must be greater than zero nanoseconds")]
    ZeroTick,

    /// Ticks longer than one second overflow the deadline arithmetic
    #[error("Tick length {nanos_per_tick}ns exceeds the {max}ns limit")]
    TickTooLong {
        /// The rejected tick length
        nanos_per_tick: u32,
        /// The largest accepted tick length
        max: u32,
    },
}

impl TickError {
    /// Create a tick-too-long error
    pub fn tick_too_long(nanos_per_tick: u32) -> Self {
        Self::TickTooLong {
            nanos_per_tick,
            max: crate::MAX_NANOS_PER_TICK,
        }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroTick => "TICK:CONFIG:ZERO",
            Self::TickTooLong { .. } => "TICK:CONFIG:TOO_LONG",
        }
    }
}
