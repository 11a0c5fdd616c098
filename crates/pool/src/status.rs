//! CMSIS-style status codes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PoolError;

/// Outcome of a handle-level pool operation.
///
/// The discriminants match the `osStatus_t` values of the CMSIS-RTOS2 API so
/// they can cross a C boundary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Status {
    /// Operation completed
    Ok = 0,
    /// Unspecified error
    Error = -1,
    /// The timeout elapsed before the operation could complete
    ErrorTimeout = -2,
    /// The resource was not available and waiting was not allowed
    ErrorResource = -3,
    /// A parameter was invalid
    ErrorParameter = -4,
    /// Memory for the object could not be obtained
    ErrorNoMemory = -5,
}

impl Status {
    /// Numeric status code
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether the status reports success
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<&PoolError> for Status {
    fn from(error: &PoolError) -> Self {
        match error {
            PoolError::InvalidHandle
            | PoolError::ZeroBlockCount
            | PoolError::ZeroBlockSize
            | PoolError::UnknownAddress { .. }
            | PoolError::DoubleFree { .. }
            | PoolError::BlockGuarded { .. }
            | PoolError::InvalidTick(_) => Self::ErrorParameter,
            PoolError::WouldBlock => Self::ErrorResource,
            PoolError::Timeout { .. } => Self::ErrorTimeout,
            PoolError::SizeOverflow { .. } | PoolError::AllocationFailed { .. } => {
                Self::ErrorNoMemory
            }
            PoolError::Inconsistent { .. } => Self::Error,
        }
    }
}

impl From<PoolError> for Status {
    fn from(error: PoolError) -> Self {
        Self::from(&error)
    }
}

impl<T> From<&crate::Result<T>> for Status {
    fn from(result: &crate::Result<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(error) => Self::from(error),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::ErrorTimeout => "timeout",
            Self::ErrorResource => "resource unavailable",
            Self::ErrorParameter => "parameter error",
            Self::ErrorNoMemory => "out of memory",
        };
        f.write_str(name)
    }
}
