// hartirq/src/trap/ds/timeout.rs

//! # Timeout Handles
//!
//! A [`Timeout`] is one outstanding software timer. The caller supplies the
//! storage (typically a `static`), arms it through the timeout scheduler,
//! and may cancel it at any time; cancelling a handle that already fired or
//! was already cancelled is defined as a successful no-op.

use core::cell::Cell;
use core::ffi::c_void;

use super::context::InterruptContext;

/// Signature of a timeout expiry callback. Receives the handle that fired
/// and the opaque context supplied when the timeout was armed.
pub type TimeoutCallback = fn(timeout: &Timeout, callback_ctx: *mut c_void);

/// Lifecycle of a timeout handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeoutState {
    /// Never armed, or reset.
    Idle,
    /// Counting down in a context's pending set.
    Armed,
    /// Expired; its callback has run.
    Fired,
    /// Cancelled before expiry; its callback will not run.
    Cancelled,
}

/// One caller-owned software timer.
///
/// All fields are mutated only inside interrupts-disabled critical sections
/// on the hart owning the context the handle is armed against.
pub struct Timeout {
    pub(crate) state: Cell<TimeoutState>,
    /// Ticks left until expiry while armed.
    pub(crate) remaining: Cell<i32>,
    pub(crate) callback: Cell<Option<TimeoutCallback>>,
    pub(crate) callback_ctx: Cell<*mut c_void>,
    /// Context this handle is armed against.
    pub(crate) owner: Cell<Option<&'static InterruptContext>>,
    /// Next handle in the armed list.
    pub(crate) next: Cell<Option<&'static Timeout>>,
}

// SAFETY: mutation is confined to the owning hart's critical sections; see
// the struct docs.
unsafe impl Sync for Timeout {}

impl Timeout {
    /// A new, idle handle. `const` so handles can live in statics.
    pub const fn new() -> Self {
        Self {
            state: Cell::new(TimeoutState::Idle),
            remaining: Cell::new(0),
            callback: Cell::new(None),
            callback_ctx: Cell::new(core::ptr::null_mut()),
            owner: Cell::new(None),
            next: Cell::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TimeoutState {
        self.state.get()
    }

    /// Ticks left before expiry; 0 unless the handle is armed.
    pub fn remaining_ticks(&self) -> i32 {
        match self.state.get() {
            TimeoutState::Armed => self.remaining.get(),
            _ => 0,
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::new()
    }
}
