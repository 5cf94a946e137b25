// hartirq/src/trap/infrastructure/signal.rs

//! # Software Signal Allocator
//!
//! Software signals are trap sources claimed by software above the board's
//! source range, each bound to a target hart when defined. Raising one sets
//! a single pending bit on the target hart's context and posts a software
//! interrupt; raising an already-pending signal coalesces. The definition
//! table is system-wide because signal ids are unique across harts.

use core::sync::atomic::Ordering;

use spin::Mutex;

use crate::trap::ds::{InterruptContext, PrivilegeMode, TrapError, TrapResult, TrapSource};
use crate::MAX_HARTS;

use super::directory;
use super::hal::with_interrupts_disabled;
use super::registry;

/// Most software signals definable at once, system-wide. Each definition
/// owns one pending bit on its target hart.
pub const MAX_SIGNALS: usize = 32;

#[derive(Debug, Clone, Copy)]
struct SignalDef {
    id: TrapSource,
    target_hart: usize,
}

static SIGNALS: Mutex<[Option<SignalDef>; MAX_SIGNALS]> = Mutex::new([None; MAX_SIGNALS]);

/// Whether `signal` has been defined.
pub fn is_defined(signal: TrapSource) -> bool {
    SIGNALS
        .lock()
        .iter()
        .any(|def| matches!(def, Some(d) if d.id == signal))
}

/// Claims `signal` as a software source routed to `target_hart`.
///
/// The id must lie above the board's source range and must not already be
/// claimed. Machine mode only.
pub fn define(ctx: &InterruptContext, signal: TrapSource, target_hart: usize) -> TrapResult {
    ctx.check_init()?;
    if signal < ctx.hal().total_sources() {
        return Err(TrapError::InvalidSource);
    }
    if target_hart >= MAX_HARTS {
        return Err(TrapError::InvalidArgument);
    }

    with_interrupts_disabled(ctx.hal(), || {
        let mut table = SIGNALS.lock();
        if table.iter().any(|def| matches!(def, Some(d) if d.id == signal)) {
            return Err(TrapError::InvalidSource);
        }
        match table.iter_mut().find(|def| def.is_none()) {
            Some(free) => {
                *free = Some(SignalDef {
                    id: signal,
                    target_hart,
                });
                Ok(())
            }
            None => Err(TrapError::OutOfCapacity),
        }
    })
}

/// Raises a previously defined signal from the given privilege mode.
///
/// The user-mode path additionally requires a permission grant for the
/// signal on the raising hart. Delivery sets the signal's pending bit on
/// the target hart and posts a software interrupt; the effect on the
/// calling hart becomes observable at its next interrupt-enabled point.
pub fn raise(ctx: &InterruptContext, signal: TrapSource, mode: PrivilegeMode) -> TrapResult {
    ctx.check_init()?;
    let (bit, target_hart) = lookup(signal).ok_or(TrapError::InvalidSource)?;
    if mode == PrivilegeMode::User && !registry::user_permitted(ctx, signal) {
        return Err(TrapError::PermissionDenied);
    }
    let target = directory::context_for(target_hart).ok_or(TrapError::NotInitialized)?;
    // Cross-hart delivery is this single atomic bit set; the target's
    // registry is never touched from here.
    target.pending_signals.fetch_or(1 << bit, Ordering::AcqRel);
    ctx.hal().send_soft_interrupt(target_hart);
    Ok(())
}

/// Pending-bit index and target hart for a defined signal.
fn lookup(signal: TrapSource) -> Option<(usize, usize)> {
    SIGNALS.lock().iter().enumerate().find_map(|(bit, def)| match def {
        Some(d) if d.id == signal => Some((bit, d.target_hart)),
        _ => None,
    })
}

/// Among the pending bits in `candidates`, finds the one whose signal has
/// the lowest id and targets `hart`. Returns the bit index and source id.
pub(crate) fn next_pending(hart: usize, candidates: usize) -> Option<(usize, TrapSource)> {
    let table = SIGNALS.lock();
    let mut best: Option<(usize, TrapSource)> = None;
    for (bit, def) in table.iter().enumerate() {
        if candidates & (1 << bit) == 0 {
            continue;
        }
        if let Some(d) = def {
            if d.target_hart == hart && best.map_or(true, |(_, id)| d.id < id) {
                best = Some((bit, d.id));
            }
        }
    }
    best
}
