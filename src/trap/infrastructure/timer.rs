// hartirq/src/trap/infrastructure/timer.rs

//! # Timeout Scheduler
//!
//! A tick-driven software timer facility layered on the hardware
//! timer-compare mechanism. The machine timer source carries an internal
//! tick handler registered through the ordinary registry; on every tick it
//! counts down the armed timeout handles, fires the expired ones, and
//! re-arms the compare register. Setting the tick period to 0 removes the
//! tick handler and freezes every countdown until a period is set again.

use core::ffi::c_void;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::trap::ds::{
    sources, InterruptContext, PrivilegeMode, Timeout, TimeoutCallback, TimeoutState, TrapError,
    TrapResult, TrapSource,
};

use super::hal::with_interrupts_disabled;
use super::registry;

/// System timer frequency in Hz; one timer serves every hart, so this is
/// global. 0 until configured.
static TIMER_FREQ_HZ: AtomicU64 = AtomicU64::new(0);

/// Records the system timer frequency in MHz. Affects every hart.
pub fn timer_config(timer_freq_mhz: u32) -> TrapResult {
    if timer_freq_mhz == 0 {
        return Err(TrapError::InvalidArgument);
    }
    TIMER_FREQ_HZ.store(timer_freq_mhz as u64 * 1_000_000, Ordering::Release);
    Ok(())
}

/// The configured timer frequency in Hz, or -1 before `timer_config` ran.
pub fn timer_frequency() -> i64 {
    match TIMER_FREQ_HZ.load(Ordering::Acquire) {
        0 => -1,
        hz => hz as i64,
    }
}

/// Current system timer value, or -1 if the context is not initialized.
pub fn read_time(ctx: &InterruptContext) -> i64 {
    if ctx.check_init().is_err() {
        return -1;
    }
    ctx.hal().read_time() as i64
}

/// Timer increment equivalent to the context's tick period.
fn tick_increment(ctx: &InterruptContext) -> u64 {
    let hz = TIMER_FREQ_HZ.load(Ordering::Acquire);
    ctx.tick_period_us.get() as u64 * hz / 1_000_000
}

/// Configures the periodic timer tick for this hart.
///
/// A non-zero `tick_period_us` registers the internal tick handler for the
/// machine timer source (replacing whatever was registered there) and
/// programs the first compare deadline. Longer periods cost less interrupt
/// load but bound timed-event accuracy. A period of 0 turns timer
/// interrupts off, releases the machine timer entry, and freezes every
/// armed countdown.
pub fn set_timer_tick(ctx: &InterruptContext, tick_period_us: u32) -> TrapResult {
    ctx.check_init()?;

    if tick_period_us == 0 {
        ctx.tick_period_us.set(0);
        return registry::register(
            ctx,
            None,
            core::ptr::null_mut(),
            sources::MACHINE_TIMER_INTERRUPT,
            PrivilegeMode::Machine,
        );
    }

    if TIMER_FREQ_HZ.load(Ordering::Acquire) == 0 {
        return Err(TrapError::InvalidArgument);
    }

    ctx.tick_period_us.set(tick_period_us);
    registry::register(
        ctx,
        Some(tick_isr),
        ctx as *const InterruptContext as *mut c_void,
        sources::MACHINE_TIMER_INTERRUPT,
        PrivilegeMode::Machine,
    )?;
    let hal = ctx.hal();
    hal.set_time_compare(ctx.hart(), hal.read_time().wrapping_add(tick_increment(ctx)));
    Ok(())
}

/// Arms a caller-owned timeout handle.
///
/// After `ticks` timer ticks the callback runs synchronously from the tick
/// handler, unless the handle is cancelled first. Arming an already-armed
/// handle re-programs it in place. Fails with `InvalidArgument` when
/// `ticks` is not positive or the tick period is 0.
pub fn set_timeout(
    ctx: &'static InterruptContext,
    timeout: &'static Timeout,
    callback: TimeoutCallback,
    callback_ctx: *mut c_void,
    ticks: i32,
) -> TrapResult {
    ctx.check_init()?;
    if ticks <= 0 || ctx.tick_period_us.get() == 0 {
        return Err(TrapError::InvalidArgument);
    }

    with_interrupts_disabled(ctx.hal(), || {
        timeout.remaining.set(ticks);
        timeout.callback.set(Some(callback));
        timeout.callback_ctx.set(callback_ctx);

        let rearming = timeout.state.get() == TimeoutState::Armed
            && timeout.owner.get().map_or(false, |owner| core::ptr::eq(owner, ctx));
        if !rearming {
            if timeout.state.get() == TimeoutState::Armed {
                // Armed against another hart's context; pull it off that
                // list before re-homing it.
                if let Some(previous) = timeout.owner.get() {
                    unlink(previous, timeout);
                }
            }
            timeout.state.set(TimeoutState::Armed);
            timeout.owner.set(Some(ctx));
            timeout.next.set(None);
            append(ctx, timeout);
        }
        Ok(())
    })
}

/// Cancels an armed timeout so its callback never runs.
///
/// Cancelling a handle that already fired or was already cancelled is a
/// defined no-op, not an error.
pub fn cancel_timeout(timeout: &Timeout) -> TrapResult {
    let owner = match timeout.owner.get() {
        Some(owner) if timeout.state.get() == TimeoutState::Armed => owner,
        _ => {
            if timeout.state.get() == TimeoutState::Armed {
                // Armed but unowned cannot arise through set_timeout.
                timeout.state.set(TimeoutState::Cancelled);
            }
            return Ok(());
        }
    };

    with_interrupts_disabled(owner.hal(), || {
        if timeout.state.get() == TimeoutState::Armed {
            unlink(owner, timeout);
            timeout.state.set(TimeoutState::Cancelled);
            timeout.owner.set(None);
        }
        Ok(())
    })
}

/// Appends a handle at the tail of the armed list, preserving insertion
/// order for same-tick expiry.
fn append(ctx: &InterruptContext, timeout: &'static Timeout) {
    match ctx.timeouts.get() {
        None => ctx.timeouts.set(Some(timeout)),
        Some(head) => {
            let mut tail = head;
            while let Some(next) = tail.next.get() {
                tail = next;
            }
            tail.next.set(Some(timeout));
        }
    }
}

/// Removes a handle from the armed list if present.
fn unlink(ctx: &InterruptContext, timeout: &Timeout) {
    let mut prev: Option<&'static Timeout> = None;
    let mut cursor = ctx.timeouts.get();
    while let Some(current) = cursor {
        let next = current.next.get();
        if core::ptr::eq(current, timeout) {
            match prev {
                None => ctx.timeouts.set(next),
                Some(p) => p.next.set(next),
            }
            current.next.set(None);
            return;
        }
        prev = Some(current);
        cursor = next;
    }
}

/// The internal machine-timer handler driving the scheduler.
pub(crate) fn tick_isr(_source: TrapSource, isr_ctx: *mut c_void, _tval: usize) {
    // SAFETY: set_timer_tick registers this handler with the context's own
    // address, and the registration is removed before a context can be
    // invalidated.
    let ctx = unsafe { &*(isr_ctx as *const InterruptContext) };
    advance_tick(ctx);
    if ctx.tick_period_us.get() > 0 {
        let hal = ctx.hal();
        hal.set_time_compare(ctx.hart(), hal.read_time().wrapping_add(tick_increment(ctx)));
    }
}

/// Counts one tick against every armed handle and fires the expired ones in
/// insertion order.
fn advance_tick(ctx: &InterruptContext) {
    // Pass 1: count down, unlinking expired handles onto a local chain so
    // callbacks that arm new timeouts never see a half-walked list.
    let mut fired_head: Option<&'static Timeout> = None;
    let mut fired_tail: Option<&'static Timeout> = None;
    let mut prev: Option<&'static Timeout> = None;
    let mut cursor = ctx.timeouts.get();

    while let Some(current) = cursor {
        let next = current.next.get();
        let left = current.remaining.get() - 1;
        current.remaining.set(left);
        if left <= 0 {
            match prev {
                None => ctx.timeouts.set(next),
                Some(p) => p.next.set(next),
            }
            current.next.set(None);
            current.state.set(TimeoutState::Fired);
            current.owner.set(None);
            match fired_tail {
                None => fired_head = Some(current),
                Some(tail) => tail.next.set(Some(current)),
            }
            fired_tail = Some(current);
        } else {
            prev = Some(current);
        }
        cursor = next;
    }

    // Pass 2: callbacks, in the order the handles were armed.
    let mut fired = fired_head;
    while let Some(current) = fired {
        let next = current.next.get();
        current.next.set(None);
        if let Some(callback) = current.callback.get() {
            callback(current, current.callback_ctx.get());
        }
        fired = next;
    }
}
