// hartirq/src/trap/ds/status.rs

//! # Status Codes
//!
//! Every fallible operation in this subsystem reports failure synchronously
//! through one of these codes; nothing is deferred and nothing is silently
//! corrected. Permission failures are kept distinct from malformed requests
//! so callers can tell "not allowed" from "invalid".

/// Errors reported by the trap, signal, and timer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapError {
    /// The platform lacks the requested capability (e.g. interrupt
    /// priorities or levels).
    NotImplemented,
    /// The source id is not a standard, board, or defined software source,
    /// or a software signal id collides with an existing definition.
    InvalidSource,
    /// A parameter is out of range for the operation.
    InvalidArgument,
    /// The context was never initialized, or was uninitialized before this
    /// call.
    NotInitialized,
    /// The context's backing storage cannot hold another distinct entry.
    OutOfCapacity,
    /// User mode attempted an operation on a source it has not been granted.
    PermissionDenied,
}

/// Result alias used throughout the subsystem.
pub type TrapResult<T = ()> = Result<T, TrapError>;

impl core::fmt::Display for TrapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotImplemented => write!(f, "Capability not implemented on this platform."),
            Self::InvalidSource => write!(f, "Unrecognized or conflicting trap source."),
            Self::InvalidArgument => write!(f, "Parameter out of range."),
            Self::NotInitialized => write!(f, "Interrupt context not initialized."),
            Self::OutOfCapacity => write!(f, "Context storage exhausted."),
            Self::PermissionDenied => write!(f, "Operation denied for user mode."),
        }
    }
}
