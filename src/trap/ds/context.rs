// hartirq/src/trap/ds/context.rs

//! # Trap Frame and Per-Hart Registry Context
//!
//! [`TrapFrame`] is the register block the board's trap entry assembly saves
//! before handing control to the dispatcher. [`InterruptContext`] is the
//! per-hart arena backing every handler slot and the timeout scheduler; it is
//! carved out of a caller-supplied byte slice at initialization time, so its
//! capacity is fixed by the caller and nothing is ever heap-allocated.

use core::cell::Cell;
use core::mem;
use core::ptr;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::trap::collections::SlotPool;
use crate::trap::infrastructure::hal::HardwareController;

use super::handler::HandlerSlot;
use super::status::{TrapError, TrapResult};
use super::timeout::Timeout;
use super::types::{Cause, UnhandledPolicy};

/// # Trap Frame
///
/// This struct precisely matches the register layout saved by the board's
/// trap entry sequence. It holds the complete state of a hart at the moment
/// a trap occurs. The order and size of fields are critical and must not be
/// altered without updating the corresponding assembly code.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TrapFrame {
    /// General-purpose registers x0-x31.
    pub x: [usize; 32],
    /// Machine Status Register (`mstatus`).
    pub mstatus: usize,
    /// Machine Exception Program Counter (`mepc`).
    pub mepc: usize,
    /// Machine Cause Register (`mcause`).
    pub mcause: usize,
    /// Machine Trap Value Register (`mtval`).
    pub mtval: usize,
}

impl TrapFrame {
    /// Creates a new, zero-initialized `TrapFrame`.
    pub const fn new() -> Self {
        Self {
            x: [0; 32],
            mstatus: 0,
            mepc: 0,
            mcause: 0,
            mtval: 0,
        }
    }

    /// Interprets the `mcause` register to get the trap cause.
    pub fn cause(&self) -> Cause {
        Cause::from_bits(self.mcause)
    }

    /// Advances `mepc` past the trapping instruction, for exception handlers
    /// that resume after the faulting instruction.
    pub fn advance_mepc(&mut self) {
        self.mepc += 4;
    }
}

/// Marker distinguishing an initialized context from stale or cleared
/// memory.
const CONTEXT_MAGIC: u32 = 0x4951_5243; // "IQRC"

/// Returns the arena size in bytes needed for a context with room for
/// `slots` distinct handler entries. Allocating more permits additional
/// entries.
pub const fn context_size(slots: usize) -> usize {
    // Alignment slack for both regions is budgeted up front since the
    // caller's slice carries no alignment guarantee.
    mem::align_of::<InterruptContext>()
        + mem::size_of::<InterruptContext>()
        + mem::align_of::<Option<HandlerSlot>>()
        + slots * mem::size_of::<Option<HandlerSlot>>()
}

// The slack budgeted by context_size must stay below one slot, or a
// well-aligned arena would gain a surprise extra entry.
const _: () = assert!(
    mem::align_of::<InterruptContext>() + mem::align_of::<Option<HandlerSlot>>()
        < mem::size_of::<Option<HandlerSlot>>()
);

/// # Interrupt Context
///
/// The per-hart registry and scheduler state. Exactly one lives per hart at
/// any time, owned by machine-mode code; user mode refers to it only through
/// an opaque handle.
///
/// Interior mutability discipline: every field is either atomic or only
/// mutated inside an interrupts-disabled critical section on the owning
/// hart, with the dispatcher as the sole other reader. Cross-hart writes are
/// restricted to `pending_signals`.
pub struct InterruptContext {
    magic: AtomicU32,
    hart: usize,
    hal: &'static dyn HardwareController,
    policy: UnhandledPolicy,
    /// Handler slots carved from the caller's arena.
    pub(crate) slots: SlotPool<HandlerSlot>,
    /// Sources with priority at or below this value are masked.
    pub(crate) priority_threshold: Cell<u8>,
    /// Floor for the preemption decision.
    pub(crate) level_threshold: Cell<u8>,
    /// Level of the interrupt currently being serviced.
    pub(crate) active_level: Cell<u8>,
    /// Dispatcher nesting depth on this hart.
    pub(crate) nesting: Cell<u8>,
    /// One pending bit per defined software signal targeting this hart.
    pub(crate) pending_signals: AtomicUsize,
    /// Tick period in microseconds; 0 while the timer tick is off.
    pub(crate) tick_period_us: Cell<u32>,
    /// Head of the armed timeout list, in insertion order.
    pub(crate) timeouts: Cell<Option<&'static Timeout>>,
}

// SAFETY: shared access follows the single-mutator discipline described in
// the struct docs; the only field written from another hart is the atomic
// pending_signals word.
unsafe impl Sync for InterruptContext {}

impl InterruptContext {
    /// Carves a context out of `arena` and marks it initialized.
    ///
    /// Every byte left over after the header becomes handler-slot capacity.
    /// Fails with `InvalidArgument` when the arena cannot even hold the
    /// header.
    pub(crate) fn carve(
        hal: &'static dyn HardwareController,
        hart: usize,
        arena: &'static mut [u8],
        policy: UnhandledPolicy,
    ) -> TrapResult<&'static InterruptContext> {
        let base = arena.as_mut_ptr();
        let len = arena.len();

        let ctx_offset = base.align_offset(mem::align_of::<InterruptContext>());
        let slots_min = ctx_offset + mem::size_of::<InterruptContext>();
        if slots_min > len {
            return Err(TrapError::InvalidArgument);
        }

        // SAFETY: ctx_offset and slots_min are within the arena, checked
        // above; the arena is exclusively borrowed for 'static, so carving
        // it into a header and a slot array aliases nothing else.
        unsafe {
            let ctx_ptr = base.add(ctx_offset) as *mut InterruptContext;
            let tail = base.add(slots_min);
            let slot_offset = tail.align_offset(mem::align_of::<Option<HandlerSlot>>());
            let slots_start = slots_min + slot_offset;
            let capacity = len.saturating_sub(slots_start) / mem::size_of::<Option<HandlerSlot>>();
            let slot_ptr = base.add(slots_start.min(len)) as *mut Option<HandlerSlot>;
            for i in 0..capacity {
                ptr::write(slot_ptr.add(i), None);
            }

            ptr::write(
                ctx_ptr,
                InterruptContext {
                    magic: AtomicU32::new(CONTEXT_MAGIC),
                    hart,
                    hal,
                    policy,
                    slots: SlotPool::from_raw(slot_ptr, capacity),
                    priority_threshold: Cell::new(0),
                    level_threshold: Cell::new(0),
                    active_level: Cell::new(0),
                    nesting: Cell::new(0),
                    pending_signals: AtomicUsize::new(0),
                    tick_period_us: Cell::new(0),
                    timeouts: Cell::new(None),
                },
            );
            Ok(&*ctx_ptr)
        }
    }

    /// Fails unless the context is currently initialized.
    pub(crate) fn check_init(&self) -> TrapResult {
        if self.magic.load(Ordering::Acquire) == CONTEXT_MAGIC {
            Ok(())
        } else {
            Err(TrapError::NotInitialized)
        }
    }

    /// Marks the context uninitialized; the arena may be reused afterwards.
    pub(crate) fn invalidate(&self) {
        self.magic.store(0, Ordering::Release);
    }

    /// The hart this context belongs to.
    pub fn hart(&self) -> usize {
        self.hart
    }

    /// The board seam this context drives.
    pub fn hal(&self) -> &'static dyn HardwareController {
        self.hal
    }

    /// How unclaimed exceptions are treated.
    pub fn unhandled_policy(&self) -> UnhandledPolicy {
        self.policy
    }

    /// Number of distinct handler entries the arena can hold.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}
