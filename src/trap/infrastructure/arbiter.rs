// hartirq/src/trap/infrastructure/arbiter.rs

//! # Priority and Level Arbiter
//!
//! Per-source priority and level plus the hart-wide thresholds, and the
//! masking decision the dispatcher consults before delivering an interrupt.
//! Priorities and levels are optional platform capabilities: when the board
//! reports no support, setters fail with `NotImplemented` and getters
//! return the `-1` sentinel, so portable callers can branch on either.

use crate::trap::ds::{HandlerSlot, InterruptContext, TrapError, TrapResult, TrapSource};

use super::hal::with_interrupts_disabled;
use super::registry::{self, upsert_slot};

/// Sets the delivery priority of a source. Priority 0 masks the source
/// unconditionally; 1 is the lowest priority that can fire.
pub fn set_priority(ctx: &InterruptContext, source: TrapSource, priority: u8) -> TrapResult {
    ctx.check_init()?;
    let max = ctx.hal().max_priority().ok_or(TrapError::NotImplemented)?;
    if priority > max {
        return Err(TrapError::InvalidArgument);
    }
    if !registry::valid_source(ctx, source) {
        return Err(TrapError::InvalidSource);
    }
    with_interrupts_disabled(ctx.hal(), || {
        upsert_slot(ctx, source, |slot| slot.priority = priority)
    })
}

/// The priority of a source, or -1 when the query is invalid or priorities
/// are unsupported. Sources never assigned a priority report the default
/// of 1.
pub fn priority(ctx: &InterruptContext, source: TrapSource) -> i32 {
    if ctx.check_init().is_err()
        || ctx.hal().max_priority().is_none()
        || !registry::valid_source(ctx, source)
    {
        return -1;
    }
    registry::slot_for(ctx, source).map_or(1, |slot| slot.priority as i32)
}

/// Sets the hart-wide priority threshold. Sources with priority at or
/// below the threshold are masked.
pub fn set_priority_threshold(ctx: &InterruptContext, threshold: u8) -> TrapResult {
    ctx.check_init()?;
    let max = ctx.hal().max_priority().ok_or(TrapError::NotImplemented)?;
    if threshold > max {
        return Err(TrapError::InvalidArgument);
    }
    ctx.priority_threshold.set(threshold);
    Ok(())
}

/// The hart-wide priority threshold, or -1 when unsupported or the context
/// is not initialized.
pub fn priority_threshold(ctx: &InterruptContext) -> i32 {
    if ctx.check_init().is_err() || ctx.hal().max_priority().is_none() {
        return -1;
    }
    ctx.priority_threshold.get() as i32
}

/// Sets the preemption level of a source. Level 0 is base level.
pub fn set_level(ctx: &InterruptContext, source: TrapSource, level: u8) -> TrapResult {
    ctx.check_init()?;
    let max = ctx.hal().max_level().ok_or(TrapError::NotImplemented)?;
    if level > max {
        return Err(TrapError::InvalidArgument);
    }
    if !registry::valid_source(ctx, source) {
        return Err(TrapError::InvalidSource);
    }
    with_interrupts_disabled(ctx.hal(), || {
        upsert_slot(ctx, source, |slot| slot.level = level)
    })
}

/// The level of a source, or -1 when the query is invalid or levels are
/// unsupported.
pub fn level(ctx: &InterruptContext, source: TrapSource) -> i32 {
    if ctx.check_init().is_err()
        || ctx.hal().max_level().is_none()
        || !registry::valid_source(ctx, source)
    {
        return -1;
    }
    registry::slot_for(ctx, source).map_or(0, |slot| slot.level as i32)
}

/// Sets the hart-wide level threshold participating in preemption
/// decisions.
pub fn set_level_threshold(ctx: &InterruptContext, threshold: u8) -> TrapResult {
    ctx.check_init()?;
    let max = ctx.hal().max_level().ok_or(TrapError::NotImplemented)?;
    if threshold > max {
        return Err(TrapError::InvalidArgument);
    }
    ctx.level_threshold.set(threshold);
    Ok(())
}

/// The hart-wide level threshold, or -1 when unsupported or the context is
/// not initialized.
pub fn level_threshold(ctx: &InterruptContext) -> i32 {
    if ctx.check_init().is_err() || ctx.hal().max_level().is_none() {
        return -1;
    }
    ctx.level_threshold.get() as i32
}

/// The masking decision for an interrupt entry.
///
/// Priority: 0 never fires; otherwise the priority must exceed the hart
/// threshold. Level: while an interrupt is being serviced, only entries
/// with level strictly above max(level threshold, active level) may
/// preempt; at base level a threshold of 0 blocks nothing.
pub(crate) fn permits(ctx: &InterruptContext, slot: &HandlerSlot) -> bool {
    if slot.priority == 0 || slot.priority <= ctx.priority_threshold.get() {
        return false;
    }
    let threshold = ctx.level_threshold.get();
    if ctx.nesting.get() > 0 {
        let blocking = threshold.max(ctx.active_level.get());
        slot.level > blocking
    } else {
        threshold == 0 || slot.level > threshold
    }
}
