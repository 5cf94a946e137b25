// hartirq/src/trap/api.rs

//! # Public API for the Trap and Timer Subsystem
//!
//! A stable, unified surface over the registry, privilege gate, arbiter,
//! signal allocator, and timeout scheduler. Machine-mode operations take
//! the context reference returned by [`interrupts_init`]; user-mode
//! operations take the opaque handle from [`interrupts_user_handle`] and
//! are mediated through the privilege gate.

use core::ffi::c_void;

use crate::trap::ds::{
    InterruptContext, InterruptEnables, Isr, PrivilegeMode, RawIsr, Timeout, TimeoutCallback,
    TrapResult, TrapSource, UnhandledPolicy, UserHandle,
};
use crate::trap::infrastructure::{
    arbiter, directory, hal::HardwareController, registry, signal, timer,
};

/// Initializes the interrupt and timer subsystem for the calling hart.
///
/// `arena` is caller-allocated backing storage for the hart's registry and
/// scheduler state; [`crate::trap::context_size`] gives the size needed for
/// a wanted handler capacity, and a larger arena permits more entries. The
/// context is carved out of the arena, recorded as the hart's one live
/// context, and the board trap vector is installed. Following
/// initialization every source except exceptions is disabled; register a
/// handler and enable the source to receive traps. Machine mode only.
pub fn interrupts_init(
    hal: &'static dyn HardwareController,
    arena: &'static mut [u8],
    policy: UnhandledPolicy,
) -> TrapResult<&'static InterruptContext> {
    let ctx = InterruptContext::carve(hal, hal.hart_id(), arena, policy)?;
    directory::install(ctx).map_err(|e| {
        ctx.invalidate();
        e
    })?;
    hal.install_trap_vector();
    Ok(ctx)
}

/// Uninitializes the subsystem for this hart. Outstanding registrations
/// are cleared and gated, armed timeouts are cancelled, and the arena may
/// be reused afterwards; every later call through this context fails with
/// `NotInitialized`. Machine mode only.
pub fn interrupts_uninit(ctx: &'static InterruptContext) -> TrapResult {
    ctx.check_init()?;
    crate::trap::infrastructure::hal::with_interrupts_disabled(ctx.hal(), || {
        while let Some(head) = ctx.timeouts.get() {
            let _ = timer::cancel_timeout(head);
        }
        registry::clear_all(ctx);
        directory::remove(ctx.hart());
        ctx.invalidate();
    });
    Ok(())
}

/// The opaque handle user mode uses to reference `hart`'s subsystem, or
/// [`UserHandle::NONE`] when the hart was never initialized.
pub fn interrupts_user_handle(hart: usize) -> UserHandle {
    directory::user_handle(hart)
}

/// Registers a machine-mode handler for a trap source.
///
/// `isr_ctx` is passed back to the handler verbatim along with the source
/// id and trap value. Registration transparently routes and enables the
/// source; a second registration for the same source replaces the first.
/// Passing `None` unregisters the handler and disables the source.
/// Machine mode only.
pub fn register_machine_isr(
    ctx: &InterruptContext,
    isr: Option<Isr>,
    isr_ctx: *mut c_void,
    source: TrapSource,
) -> TrapResult {
    registry::register(ctx, isr, isr_ctx, source, PrivilegeMode::Machine)
}

/// Registers a user-mode handler for a trap source.
///
/// Requires a prior [`set_user_permission`] grant for the source on this
/// hart; fails with `PermissionDenied` otherwise. Runs in user mode,
/// addressed through the subsystem handle.
pub fn register_user_isr(
    handle: UserHandle,
    isr: Option<Isr>,
    isr_ctx: *mut c_void,
    source: TrapSource,
) -> TrapResult {
    let ctx = directory::resolve(handle)?;
    registry::register(ctx, isr, isr_ctx, source, PrivilegeMode::User)
}

/// Installs a raw override for a source, bypassing dispatch entirely: the
/// handler receives the undecoded cause and trap value, and no arbitration
/// or mode routing applies. A raw override and a routed handler for the
/// same source are mutually exclusive; the later registration wins.
/// Passing `None` removes a previously installed override. Machine mode
/// only.
pub fn register_raw_handler(
    ctx: &InterruptContext,
    handler: Option<RawIsr>,
    source: TrapSource,
) -> TrapResult {
    registry::register_raw(ctx, handler, source)
}

/// Enables a trap source. Machine mode only. This gates only the routing
/// path within the interrupt control logic; device drivers may offer
/// separate controls for their interrupts at source.
pub fn enable_machine_source(ctx: &InterruptContext, source: TrapSource) -> TrapResult {
    registry::enable_source(ctx, source)
}

/// Disables a trap source. Machine mode only.
pub fn disable_machine_source(ctx: &InterruptContext, source: TrapSource) -> TrapResult {
    registry::disable_source(ctx, source)
}

/// Enables handling of a source from user mode. Only affects sources with
/// a user-mode handler registered.
pub fn enable_user_source(handle: UserHandle, source: TrapSource) -> TrapResult {
    let ctx = directory::resolve(handle)?;
    registry::enable_user_source(ctx, source)
}

/// Disables handling of a source from user mode. Only affects sources with
/// a user-mode handler registered.
pub fn disable_user_source(handle: UserHandle, source: TrapSource) -> TrapResult {
    let ctx = directory::resolve(handle)?;
    registry::disable_user_source(ctx, source)
}

/// Writes the three interrupt-class enable bits for this hart and returns
/// the previous word, which may be passed back later to restore the prior
/// state. Machine mode only.
pub fn set_interrupt_enables(
    ctx: &InterruptContext,
    enables: InterruptEnables,
) -> InterruptEnables {
    ctx.hal().set_interrupt_enables(enables)
}

/// Grants or revokes user-mode access to a source. Until granted, every
/// user-mode registration or signal raise for the source fails with
/// `PermissionDenied`. Machine mode only.
pub fn set_user_permission(
    ctx: &InterruptContext,
    source: TrapSource,
    permitted: bool,
) -> TrapResult {
    registry::set_user_permission(ctx, source, permitted)
}

/// Allocates a signal number for software use, routed to `target_hart`
/// when raised. The number must lie above the board's source range and be
/// system-wide unique. Machine mode only.
pub fn define_signal(ctx: &InterruptContext, signal: TrapSource, target_hart: usize) -> TrapResult {
    signal::define(ctx, signal, target_hart)
}

/// Raises a previously defined software signal from machine mode.
pub fn raise_machine_signal(ctx: &InterruptContext, signal: TrapSource) -> TrapResult {
    signal::raise(ctx, signal, PrivilegeMode::Machine)
}

/// Raises a previously defined software signal from user mode. Requires a
/// permission grant for the signal on the raising hart.
pub fn raise_user_signal(handle: UserHandle, signal: TrapSource) -> TrapResult {
    let ctx = directory::resolve(handle)?;
    signal::raise(ctx, signal, PrivilegeMode::User)
}

/// Sets the delivery priority of a source; 0 means "never interrupt".
/// Fails with `NotImplemented` on platforms without priority hardware.
/// Machine mode only.
pub fn set_priority(ctx: &InterruptContext, source: TrapSource, priority: u8) -> TrapResult {
    arbiter::set_priority(ctx, source, priority)
}

/// The priority of a source, or -1 on an invalid or unsupported query.
pub fn priority(ctx: &InterruptContext, source: TrapSource) -> i32 {
    arbiter::priority(ctx, source)
}

/// Sets the threshold at or below which source priorities are masked.
/// Machine mode only.
pub fn set_priority_threshold(ctx: &InterruptContext, threshold: u8) -> TrapResult {
    arbiter::set_priority_threshold(ctx, threshold)
}

/// The current priority threshold, or -1 if unsupported or on error.
pub fn priority_threshold(ctx: &InterruptContext) -> i32 {
    arbiter::priority_threshold(ctx)
}

/// Sets the preemption level of a source. Fails with `NotImplemented` on
/// platforms without level support. Machine mode only.
pub fn set_level(ctx: &InterruptContext, source: TrapSource, level: u8) -> TrapResult {
    arbiter::set_level(ctx, source, level)
}

/// The level of a source, or -1 on an invalid or unsupported query.
pub fn level(ctx: &InterruptContext, source: TrapSource) -> i32 {
    arbiter::level(ctx, source)
}

/// Sets the hart-wide level threshold participating in preemption
/// decisions. Machine mode only.
pub fn set_level_threshold(ctx: &InterruptContext, threshold: u8) -> TrapResult {
    arbiter::set_level_threshold(ctx, threshold)
}

/// The current level threshold, or -1 if unsupported or on error.
pub fn level_threshold(ctx: &InterruptContext) -> i32 {
    arbiter::level_threshold(ctx)
}

/// Records the system timer frequency in MHz. One timer typically serves
/// all harts, so this affects the whole system. Machine mode only.
pub fn timer_config(timer_freq_mhz: u32) -> TrapResult {
    timer::timer_config(timer_freq_mhz)
}

/// The configured timer frequency in Hz, or -1 before configuration.
pub fn get_timer_freq() -> i64 {
    timer::timer_frequency()
}

/// The current system timer value, or -1 on an uninitialized context.
pub fn read_mtime(ctx: &InterruptContext) -> i64 {
    timer::read_time(ctx)
}

/// Configures the periodic tick used for timed events on this hart; 0
/// turns timer interrupts off and freezes outstanding timeouts. Machine
/// mode only.
pub fn set_timer_tick(ctx: &InterruptContext, tick_period_us: u32) -> TrapResult {
    timer::set_timer_tick(ctx, tick_period_us)
}

/// Arms a caller-owned timeout: after `ticks` timer ticks, `callback` runs
/// from the tick handler with `callback_ctx`, unless cancelled first.
/// Machine mode only.
pub fn set_machine_timeout(
    ctx: &'static InterruptContext,
    timeout: &'static Timeout,
    callback: TimeoutCallback,
    callback_ctx: *mut c_void,
    ticks: i32,
) -> TrapResult {
    timer::set_timeout(ctx, timeout, callback, callback_ctx, ticks)
}

/// Arms a caller-owned timeout from user mode, addressed through the
/// subsystem handle.
pub fn set_user_timeout(
    handle: UserHandle,
    timeout: &'static Timeout,
    callback: TimeoutCallback,
    callback_ctx: *mut c_void,
    ticks: i32,
) -> TrapResult {
    let ctx = directory::resolve(handle)?;
    timer::set_timeout(ctx, timeout, callback, callback_ctx, ticks)
}

/// Cancels a timeout previously armed with a set-timeout call. Cancelling
/// one that already fired or was already cancelled is not an error. May
/// run in either machine or user mode.
pub fn cancel_timeout(timeout: &Timeout) -> TrapResult {
    timer::cancel_timeout(timeout)
}
