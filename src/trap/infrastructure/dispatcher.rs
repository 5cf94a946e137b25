// hartirq/src/trap/infrastructure/dispatcher.rs

//! # Trap Dispatcher
//!
//! The routine behind every trap once the board's entry sequence has saved
//! the register file. It resolves the raw cause to a source id, consults
//! the arbiter, selects the registered entry, and invokes the handler;
//! exceptions nobody claims are reported through the console seam and then
//! halt or fall through per the context's policy. Unmapped interrupts are
//! ignored silently.

use core::fmt::Write;
use core::sync::atomic::Ordering;

use crate::console::LineBuffer;
use crate::trap::ds::{
    sources, Cause, DispatchKind, InterruptCode, InterruptContext, PrivilegeMode, TrapSource,
    UnhandledPolicy,
};

use super::{arbiter, signal};

/// Dispatches one trap against a hart's context.
///
/// Runs to completion before the interrupted context resumes. Re-entrant:
/// a handler that re-enables interrupts may cause a nested dispatch, which
/// the level arbitration accounts for.
pub fn dispatch(ctx: &InterruptContext, mcause: usize, mtval: usize) {
    if ctx.check_init().is_err() {
        return;
    }
    let cause = Cause::from_bits(mcause);

    if cause.is_interrupt() {
        match cause.interrupt_code() {
            Some(InterruptCode::MachineSoft) => dispatch_soft(ctx, cause, mtval),
            Some(InterruptCode::MachineTimer) => {
                dispatch_source(ctx, cause, sources::MACHINE_TIMER_INTERRUPT, mtval);
            }
            Some(InterruptCode::MachineExternal) => {
                if let Some(source) = ctx.hal().claim_external() {
                    dispatch_source(ctx, cause, source, mtval);
                    ctx.hal().complete_external(source);
                }
            }
            // Interrupts this subsystem cannot map are ignored.
            None => {}
        }
    } else {
        let delivered = cause
            .exception_source()
            .map_or(false, |source| dispatch_source(ctx, cause, source, mtval));
        if !delivered {
            report_unhandled(ctx, cause, mtval);
        }
    }
}

/// Machine software interrupt: drain pending software signals in ascending
/// id order; a bare machine-software entry only runs when no signal was
/// pending.
fn dispatch_soft(ctx: &InterruptContext, cause: Cause, mtval: usize) {
    ctx.hal().clear_soft_interrupt(ctx.hart());

    let mut deferred: usize = 0;
    let mut any_pending = false;
    loop {
        let pending = ctx.pending_signals.load(Ordering::Acquire) & !deferred;
        if pending == 0 {
            break;
        }
        any_pending = true;
        let Some((bit, id)) = signal::next_pending(ctx.hart(), pending) else {
            // Pending bits with no surviving definition for this hart.
            ctx.pending_signals.fetch_and(!pending, Ordering::AcqRel);
            break;
        };
        ctx.pending_signals.fetch_and(!(1 << bit), Ordering::AcqRel);
        if !dispatch_source(ctx, cause, id, mtval) {
            // Masked or unregistered: the signal stays pending.
            ctx.pending_signals.fetch_or(1 << bit, Ordering::AcqRel);
            deferred |= 1 << bit;
        }
    }

    if !any_pending {
        dispatch_source(ctx, cause, sources::MACHINE_SOFT_INTERRUPT, mtval);
    }
}

/// Looks up and invokes the entry for a resolved source. Returns whether a
/// handler actually ran.
fn dispatch_source(ctx: &InterruptContext, cause: Cause, source: TrapSource, mtval: usize) -> bool {
    let Some(slot) = ctx.slots.find(|slot| slot.source == source) else {
        return false;
    };
    match slot.kind {
        None => false,
        // A raw override short-circuits arbitration and mode routing.
        Some(DispatchKind::Raw { handler }) => {
            handler(cause.bits(), mtval);
            true
        }
        Some(DispatchKind::Routed { isr, isr_ctx }) => {
            if !slot.enabled {
                return false;
            }
            // Masking applies to interrupts only; an exception cannot be
            // left pending in hardware.
            if cause.is_interrupt() && !arbiter::permits(ctx, &slot) {
                return false;
            }

            let previous_level = ctx.active_level.replace(slot.level);
            ctx.nesting.set(ctx.nesting.get() + 1);
            match slot.mode {
                PrivilegeMode::Machine => isr(source, isr_ctx, mtval),
                PrivilegeMode::User => ctx.hal().invoke_user(isr, source, isr_ctx, mtval),
            }
            ctx.nesting.set(ctx.nesting.get() - 1);
            ctx.active_level.set(previous_level);
            true
        }
    }
}

/// Default unhandled-exception path: report through the console seam, then
/// halt or return per the configured policy.
fn report_unhandled(ctx: &InterruptContext, cause: Cause, mtval: usize) {
    let mut line = LineBuffer::new();
    let _ = write!(
        line,
        "hart {}: unhandled exception, mcause={:#x} mtval={:#x}\n",
        ctx.hart(),
        cause.bits(),
        mtval
    );
    ctx.hal().console_write(line.as_str());

    match ctx.unhandled_policy() {
        UnhandledPolicy::Halt => ctx.hal().halt(),
        UnhandledPolicy::Continue => {}
    }
}
