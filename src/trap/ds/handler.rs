// hartirq/src/trap/ds/handler.rs

//! # Trap Handler Definitions
//!
//! Handler function signatures, the routed-versus-raw dispatch variant, and
//! the per-source registry slot.

use core::ffi::c_void;

use super::types::{PrivilegeMode, TrapSource};

/// The function signature for a registered trap handler.
///
/// Called with the source id the handler was registered for, the opaque
/// context pointer supplied at registration, and the trap value (`mtval`)
/// captured at trap entry.
pub type Isr = fn(source: TrapSource, isr_ctx: *mut c_void, tval: usize);

/// A raw override handler. It receives the undecoded `mcause` and `mtval`
/// values and is invoked before any arbitration or mode routing.
pub type RawIsr = fn(mcause: usize, mtval: usize);

/// How a source's trap is delivered.
///
/// A source is either routed through the dispatcher or overridden by a raw
/// handler; the two are mutually exclusive and the most recent registration
/// wins.
#[derive(Clone, Copy)]
pub enum DispatchKind {
    /// Full dispatch: arbitration, mode selection, then the handler.
    Routed { isr: Isr, isr_ctx: *mut c_void },
    /// Bypass: the raw handler runs immediately with the undecoded cause.
    Raw { handler: RawIsr },
}

/// # Handler Slot
///
/// All per-source registry state: the registered handler (if any), the
/// owning privilege mode, the enable flag, arbitration attributes, and the
/// user-mode permission grant. One slot exists per distinct source; a slot
/// without a handler carries only a permission grant or priority assignment.
#[derive(Clone, Copy)]
pub struct HandlerSlot {
    /// The source this slot belongs to.
    pub source: TrapSource,
    /// The registered handler, or `None` for a placeholder slot.
    pub kind: Option<DispatchKind>,
    /// The privilege mode the handler runs in.
    pub mode: PrivilegeMode,
    /// Whether delivery for this source is currently enabled.
    pub enabled: bool,
    /// Delivery priority. 0 means the source never fires; 1 is the lowest
    /// priority that can fire.
    pub priority: u8,
    /// Preemption level. 0 is base level.
    pub level: u8,
    /// Whether user mode has been granted this source.
    pub user_permitted: bool,
}

impl HandlerSlot {
    /// A fresh slot for `source` with default arbitration attributes and no
    /// handler.
    pub const fn placeholder(source: TrapSource) -> Self {
        Self {
            source,
            kind: None,
            mode: PrivilegeMode::Machine,
            enabled: false,
            priority: 1,
            level: 0,
            user_permitted: false,
        }
    }
}

/// Opaque user-mode reference to the current hart's interrupt subsystem.
///
/// User mode never sees a context pointer; it holds this integer capability
/// and every operation taking it is mediated by the machine-mode side. The
/// value 0 is never a valid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserHandle(pub u32);

impl UserHandle {
    /// The invalid handle.
    pub const NONE: Self = Self(0);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}
