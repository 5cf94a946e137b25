// hartirq/src/trap/mod.rs

//! # RISC-V Trap Routing, Signal, and Timer Subsystem
//!
//! Per-hart trap handling: handler registration for machine-mode and
//! user-mode traps, priority/level arbitration, software-defined signals,
//! and tick-driven software timeouts, all over caller-supplied storage.

// Make submodules accessible within the trap subsystem.
pub mod collections;
pub mod ds;
pub mod infrastructure;
mod api;

// Publicly re-export the entire API module.
pub use self::api::*;

// Re-export key data structures that users of the API might need directly.
pub use self::ds::{
    sources, Cause, InterruptCode, InterruptEnables, PrivilegeMode, TrapSource, // Source types
    context_size, InterruptContext, TrapFrame,                 // Context structures
    Isr, RawIsr, UserHandle,                                   // Handler signatures and handles
    Timeout, TimeoutCallback, TimeoutState,                    // Timeout handles
    TrapError, TrapResult, UnhandledPolicy,                    // Status codes and policy
    NUM_STANDARD_SOURCES,
};

// Re-export the board seam and its machine implementation.
pub use self::infrastructure::hal::HardwareController;
pub use self::infrastructure::low_level::{ClintController, PlicPorts};
