// hartirq/src/trap/ds/mod.rs

//! # Trap Data Structures Module
//!
//! Core data structures for the trap routing and timer subsystem: source
//! identifiers and cause decoding, status codes, handler slots, the per-hart
//! registry context, and caller-owned timeout handles. Nothing in this module
//! allocates; every structure either lives in the caller-supplied arena or in
//! caller-owned storage.

// The order of declaration matters for public re-export.
pub mod types;
pub mod status;
pub mod handler;
pub mod context;
pub mod timeout;

// Re-export key types for convenient access by other modules.
pub use self::types::{
    sources, Cause, InterruptCode, InterruptEnables, PrivilegeMode, TrapSource, UnhandledPolicy,
    NUM_STANDARD_SOURCES,
};

pub use self::status::{TrapError, TrapResult};

pub use self::handler::{DispatchKind, HandlerSlot, Isr, RawIsr, UserHandle};

pub use self::context::{context_size, InterruptContext, TrapFrame};

pub use self::timeout::{Timeout, TimeoutCallback, TimeoutState};
