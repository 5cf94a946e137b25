// hartirq/src/trap/infrastructure/directory.rs

//! # Per-Hart Context Directory
//!
//! Tracks the one live [`InterruptContext`] per hart and hands user mode an
//! opaque integer handle in place of a pointer. The directory lock is only
//! ever held for a pointer read or a table update performed with interrupts
//! disabled, so the dispatcher can never deadlock against it on its own
//! hart.

use spin::Mutex;

use crate::trap::ds::{InterruptContext, TrapError, TrapResult, UserHandle};
use crate::MAX_HARTS;

static CONTEXTS: Mutex<[Option<&'static InterruptContext>; MAX_HARTS]> =
    Mutex::new([None; MAX_HARTS]);

/// Records `ctx` as its hart's live context. Fails when the hart already
/// has one or the hart id is out of range.
pub(crate) fn install(ctx: &'static InterruptContext) -> TrapResult {
    let hart = ctx.hart();
    if hart >= MAX_HARTS {
        return Err(TrapError::InvalidArgument);
    }
    let mut table = CONTEXTS.lock();
    if table[hart].is_some() {
        return Err(TrapError::InvalidArgument);
    }
    table[hart] = Some(ctx);
    Ok(())
}

/// Drops the hart's live context, returning it if one was present.
pub(crate) fn remove(hart: usize) -> Option<&'static InterruptContext> {
    if hart >= MAX_HARTS {
        return None;
    }
    CONTEXTS.lock()[hart].take()
}

/// The live context for `hart`, if any.
pub fn context_for(hart: usize) -> Option<&'static InterruptContext> {
    if hart >= MAX_HARTS {
        return None;
    }
    *CONTEXTS.lock().get(hart)?
}

/// Whether `hart` currently has an initialized context.
pub fn is_initialized(hart: usize) -> bool {
    context_for(hart).is_some()
}

/// The opaque handle user mode uses to name `hart`'s subsystem, or
/// [`UserHandle::NONE`] when the hart has no live context.
pub fn user_handle(hart: usize) -> UserHandle {
    if is_initialized(hart) {
        UserHandle(hart as u32 + 1)
    } else {
        UserHandle::NONE
    }
}

/// Resolves a user-mode handle back to its hart's context.
pub(crate) fn resolve(handle: UserHandle) -> TrapResult<&'static InterruptContext> {
    if !handle.is_valid() {
        return Err(TrapError::NotInitialized);
    }
    context_for(handle.0 as usize - 1).ok_or(TrapError::NotInitialized)
}
