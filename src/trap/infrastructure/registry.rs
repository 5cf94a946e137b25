// hartirq/src/trap/infrastructure/registry.rs

//! # Trap Source Registry
//!
//! The per-hart table mapping each source to its handler slot. Registration
//! replaces, never duplicates: a second registration for the same source
//! rewrites the existing slot in place, and registering no handler clears
//! the slot and releases its capacity. Every mutation here runs with
//! interrupts disabled so the dispatcher can never observe a half-written
//! slot.

use core::ffi::c_void;

use crate::trap::ds::{
    DispatchKind, HandlerSlot, InterruptContext, Isr, PrivilegeMode, RawIsr, TrapError,
    TrapResult, TrapSource,
};

use super::hal::with_interrupts_disabled;
use super::signal;

/// Whether `source` names a standard source, a board-enumerated source, or
/// a defined software signal.
pub(crate) fn valid_source(ctx: &InterruptContext, source: TrapSource) -> bool {
    source < ctx.hal().total_sources() || signal::is_defined(source)
}

/// Copy of the slot registered for `source`, if any.
pub(crate) fn slot_for(ctx: &InterruptContext, source: TrapSource) -> Option<HandlerSlot> {
    ctx.slots.find(|slot| slot.source == source)
}

/// Whether user mode has been granted `source` on this hart.
pub(crate) fn user_permitted(ctx: &InterruptContext, source: TrapSource) -> bool {
    slot_for(ctx, source).map_or(false, |slot| slot.user_permitted)
}

/// Rewrites the slot for `source` in place, materializing it first when
/// absent. Fails with `OutOfCapacity` when a new slot is needed and the
/// arena is full.
pub(crate) fn upsert_slot(
    ctx: &InterruptContext,
    source: TrapSource,
    f: impl Fn(&mut HandlerSlot),
) -> TrapResult {
    if ctx.slots.update(|slot| slot.source == source, &f) {
        return Ok(());
    }
    let mut slot = HandlerSlot::placeholder(source);
    f(&mut slot);
    ctx.slots
        .insert(slot)
        .map_err(|_| TrapError::OutOfCapacity)
}

/// Registers, replaces, or unregisters the handler for `source` under
/// `mode`.
///
/// Passing `None` unregisters: the slot is cleared, its capacity freed, and
/// the hardware routing gated. Passing a handler transparently opens the
/// hardware routing for the source. User-mode registration requires a prior
/// permission grant for the source on this hart.
pub fn register(
    ctx: &InterruptContext,
    isr: Option<Isr>,
    isr_ctx: *mut c_void,
    source: TrapSource,
    mode: PrivilegeMode,
) -> TrapResult {
    ctx.check_init()?;
    if !valid_source(ctx, source) {
        return Err(TrapError::InvalidSource);
    }

    with_interrupts_disabled(ctx.hal(), || {
        let existing = slot_for(ctx, source);

        if mode == PrivilegeMode::User {
            match existing {
                Some(slot) if slot.user_permitted => {}
                _ => return Err(TrapError::PermissionDenied),
            }
        }

        match isr {
            Some(isr) => {
                upsert_slot(ctx, source, |slot| {
                    slot.kind = Some(DispatchKind::Routed { isr, isr_ctx });
                    slot.mode = mode;
                    slot.enabled = true;
                })?;
                ctx.hal().enable_source(source);
                Ok(())
            }
            None => {
                match existing {
                    None => Ok(()), // nothing registered; defined no-op
                    Some(slot) if mode == PrivilegeMode::User && slot.mode != PrivilegeMode::User => {
                        Err(TrapError::PermissionDenied)
                    }
                    Some(_) => {
                        ctx.slots.take(|slot| slot.source == source);
                        ctx.hal().disable_source(source);
                        Ok(())
                    }
                }
            }
        }
    })
}

/// Installs or removes a raw override for `source`.
///
/// A raw override and a routed handler are mutually exclusive; whichever
/// was registered last wins. Machine mode only.
pub fn register_raw(
    ctx: &InterruptContext,
    handler: Option<RawIsr>,
    source: TrapSource,
) -> TrapResult {
    ctx.check_init()?;
    if !valid_source(ctx, source) {
        return Err(TrapError::InvalidSource);
    }

    with_interrupts_disabled(ctx.hal(), || match handler {
        Some(handler) => {
            upsert_slot(ctx, source, |slot| {
                slot.kind = Some(DispatchKind::Raw { handler });
                slot.mode = PrivilegeMode::Machine;
                slot.enabled = true;
            })?;
            ctx.hal().enable_source(source);
            Ok(())
        }
        None => {
            let is_raw = matches!(
                slot_for(ctx, source),
                Some(HandlerSlot {
                    kind: Some(DispatchKind::Raw { .. }),
                    ..
                })
            );
            if is_raw {
                ctx.slots.take(|slot| slot.source == source);
                ctx.hal().disable_source(source);
            }
            Ok(())
        }
    })
}

/// Grants or revokes user-mode access to `source`. Machine mode only; every
/// source starts out not permitted.
///
/// A grant on a not-yet-registered source materializes its slot, consuming
/// one entry of capacity until the grant is revoked or the source
/// unregistered.
pub fn set_user_permission(
    ctx: &InterruptContext,
    source: TrapSource,
    permitted: bool,
) -> TrapResult {
    ctx.check_init()?;
    if !valid_source(ctx, source) {
        return Err(TrapError::InvalidSource);
    }

    with_interrupts_disabled(ctx.hal(), || {
        if permitted {
            upsert_slot(ctx, source, |slot| slot.user_permitted = true)
        } else {
            match slot_for(ctx, source) {
                Some(slot) if slot.kind.is_none() => {
                    // Placeholder slot existed only for the grant.
                    ctx.slots.take(|slot| slot.source == source);
                    Ok(())
                }
                Some(_) => {
                    ctx.slots
                        .update(|slot| slot.source == source, |slot| slot.user_permitted = false);
                    Ok(())
                }
                None => Ok(()),
            }
        }
    })
}

/// Opens delivery for `source`. Machine mode. This only gates the routing
/// path; device drivers may hold their own interrupt controls.
pub fn enable_source(ctx: &InterruptContext, source: TrapSource) -> TrapResult {
    set_source_enabled(ctx, source, true, PrivilegeMode::Machine)
}

/// Gates delivery for `source`. Machine mode.
pub fn disable_source(ctx: &InterruptContext, source: TrapSource) -> TrapResult {
    set_source_enabled(ctx, source, false, PrivilegeMode::Machine)
}

/// User-mode enable. Only affects a source whose entry is user-owned;
/// otherwise it is a defined no-op.
pub fn enable_user_source(ctx: &InterruptContext, source: TrapSource) -> TrapResult {
    set_source_enabled(ctx, source, true, PrivilegeMode::User)
}

/// User-mode disable. Only affects a source whose entry is user-owned.
pub fn disable_user_source(ctx: &InterruptContext, source: TrapSource) -> TrapResult {
    set_source_enabled(ctx, source, false, PrivilegeMode::User)
}

fn set_source_enabled(
    ctx: &InterruptContext,
    source: TrapSource,
    enabled: bool,
    mode: PrivilegeMode,
) -> TrapResult {
    ctx.check_init()?;
    if !valid_source(ctx, source) {
        return Err(TrapError::InvalidSource);
    }

    with_interrupts_disabled(ctx.hal(), || {
        match slot_for(ctx, source) {
            Some(slot) if mode == PrivilegeMode::User && slot.mode != PrivilegeMode::User => {
                // No user-mode handler registered; nothing to affect.
                return Ok(());
            }
            Some(_) => {
                ctx.slots
                    .update(|slot| slot.source == source, |slot| slot.enabled = enabled);
            }
            None if mode == PrivilegeMode::User => return Ok(()),
            None => {}
        }
        if mode == PrivilegeMode::Machine || slot_for(ctx, source).is_some() {
            if enabled {
                ctx.hal().enable_source(source);
            } else {
                ctx.hal().disable_source(source);
            }
        }
        Ok(())
    })
}

/// Clears every slot and gates every routed source; used when a context is
/// being torn down.
pub(crate) fn clear_all(ctx: &InterruptContext) {
    ctx.slots.for_each(|slot| {
        if slot.source < ctx.hal().total_sources() {
            ctx.hal().disable_source(slot.source);
        }
    });
    ctx.slots.clear();
}
