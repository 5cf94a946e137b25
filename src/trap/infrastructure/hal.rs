// hartirq/src/trap/infrastructure/hal.rs

//! # Hardware Control Seam
//!
//! Defines the interface the board support layer implements for this
//! subsystem. Everything that touches a CSR, the interrupt controller, the
//! CLINT, or the console goes through this trait, which keeps the routing
//! and scheduling logic portable and lets the self-test suites substitute a
//! recording implementation.

use core::ffi::c_void;

use crate::trap::ds::{InterruptEnables, Isr, TrapSource};

/// Interface for hardware-level trap control.
///
/// One implementation serves all harts; per-hart state (the msip and
/// mtimecmp words) is addressed by hart id.
pub trait HardwareController: Sync {
    /// Id of the calling hart.
    fn hart_id(&self) -> usize;

    /// Disables interrupts globally for the current hart.
    ///
    /// Returns `true` if interrupts were previously enabled. Every registry
    /// or scheduler mutation runs between this call and
    /// `restore_interrupts`, which is the only exclusion the dispatcher
    /// relies on.
    fn disable_interrupts(&self) -> bool;

    /// Restores the global interrupt enable state previously returned by
    /// `disable_interrupts`.
    fn restore_interrupts(&self, was_enabled: bool);

    /// Writes the three interrupt-class enable bits and returns the
    /// previous word, so callers can restore it later.
    fn set_interrupt_enables(&self, enables: InterruptEnables) -> InterruptEnables;

    /// Opens the routing path for a source at the interrupt-control level.
    /// Exception sources have no gate; the call is a no-op for them.
    fn enable_source(&self, source: TrapSource);

    /// Gates a source at the interrupt-control level.
    fn disable_source(&self, source: TrapSource);

    /// One past the last board-enumerated source id. Software signals are
    /// allocated at and above this value.
    fn total_sources(&self) -> TrapSource;

    /// Highest supported interrupt priority, or `None` when the platform
    /// has no priority hardware.
    fn max_priority(&self) -> Option<u8>;

    /// Highest supported preemption level, or `None` when the platform has
    /// no level hardware.
    fn max_level(&self) -> Option<u8>;

    /// Claims the highest-precedence pending external interrupt and returns
    /// its source id, or `None` when nothing is pending.
    fn claim_external(&self) -> Option<TrapSource>;

    /// Signals completion of a claimed external interrupt.
    fn complete_external(&self, source: TrapSource);

    /// Posts a software interrupt to `hart`. Posting to the calling hart
    /// makes the interrupt observable at its next interrupt-enabled point.
    fn send_soft_interrupt(&self, hart: usize);

    /// Acknowledges the software interrupt pending on `hart`.
    fn clear_soft_interrupt(&self, hart: usize);

    /// Current value of the free-running system timer.
    fn read_time(&self) -> u64;

    /// Programs the timer compare register for `hart`; the next timer
    /// interrupt fires when the timer reaches `deadline`.
    fn set_time_compare(&self, hart: usize, deadline: u64);

    /// Points the hart's trap vector at the board's trap entry sequence.
    fn install_trap_vector(&self);

    /// Runs a user-mode handler. The privilege transition is board ABI;
    /// the default simply invokes the handler in place, which suits boards
    /// without user-interrupt delegation.
    fn invoke_user(&self, isr: Isr, source: TrapSource, isr_ctx: *mut c_void, tval: usize) {
        isr(source, isr_ctx, tval);
    }

    /// Emits a line of text through the board console.
    fn console_write(&self, text: &str);

    /// Stops the hart. Used by the unhandled-exception path under the
    /// halting policy.
    fn halt(&self) -> !;
}

/// Runs `f` with interrupts disabled on the current hart, restoring the
/// previous enable state afterwards.
pub(crate) fn with_interrupts_disabled<R>(
    hal: &dyn HardwareController,
    f: impl FnOnce() -> R,
) -> R {
    let was_enabled = hal.disable_interrupts();
    let result = f();
    hal.restore_interrupts(was_enabled);
    result
}
