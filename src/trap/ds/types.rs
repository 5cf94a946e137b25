// hartirq/src/trap/ds/types.rs

//! # Trap Type Definitions
//!
//! Source identifiers, mcause decoding, privilege modes, and the interrupt
//! enable word.
//!
//! A trap source is a dense integer that uniquely identifies a cause of trap
//! entry. The id space is split into three bands: the standard interrupt and
//! exception sources defined here, board-enumerated external sources starting
//! at [`NUM_STANDARD_SOURCES`] (the board publishes its own fencepost through
//! the hardware seam), and software-defined signals above the board range.
//! The values identify sources; they do not mirror mcause encodings.

use core::fmt;

/// Integer identifier for an interrupt or exception source.
pub type TrapSource = u16;

/// Number of standard sources; board-specific external sources are numbered
/// from this value upward.
pub const NUM_STANDARD_SOURCES: TrapSource = 16;

/// The standard trap sources present on every hart.
pub mod sources {
    use super::TrapSource;

    pub const NMI: TrapSource = 0;
    pub const MACHINE_SOFT_INTERRUPT: TrapSource = 1;
    pub const MACHINE_TIMER_INTERRUPT: TrapSource = 2;
    pub const INSTRUCTION_MISALIGNED: TrapSource = 3;
    pub const INSTRUCTION_ACCESS_FAULT: TrapSource = 4;
    pub const ILLEGAL_INSTRUCTION: TrapSource = 5;
    pub const BREAKPOINT: TrapSource = 6;
    pub const LOAD_MISALIGNED: TrapSource = 7;
    pub const LOAD_ACCESS_FAULT: TrapSource = 8;
    pub const STORE_MISALIGNED: TrapSource = 9;
    pub const STORE_ACCESS_FAULT: TrapSource = 10;
    pub const ECALL_FROM_UMODE: TrapSource = 11;
    pub const ECALL_FROM_MMODE: TrapSource = 12;
    pub const INSTRUCTION_PAGE_FAULT: TrapSource = 13;
    pub const LOAD_PAGE_FAULT: TrapSource = 14;
    pub const STORE_PAGE_FAULT: TrapSource = 15;
}

/// Privilege mode a handler entry belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrivilegeMode {
    Machine,
    User,
}

/// What the dispatcher does with an exception no handler claims.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnhandledPolicy {
    /// Report through the console sink, then stop the hart.
    Halt,
    /// Report through the console sink, then return to the interrupted
    /// context.
    Continue,
}

/// Machine-level interrupt codes as found in the mcause exception code field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum InterruptCode {
    MachineSoft = 3,
    MachineTimer = 7,
    MachineExternal = 11,
}

bitflags::bitflags! {
    /// The three interrupt-class enable bits of the mie CSR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptEnables: usize {
        /// Software interrupts (mie.MSIE).
        const SOFTWARE = 1 << 3;
        /// Timer interrupts (mie.MTIE).
        const TIMER = 1 << 7;
        /// External interrupts (mie.MEIE).
        const EXTERNAL = 1 << 11;
    }
}

/// A wrapper for the `mcause` register, providing a safe interface to
/// interpret its value.
#[derive(Copy, Clone)]
pub struct Cause {
    bits: usize,
}

impl Cause {
    /// Creates a `Cause` from the raw bits of the `mcause` register.
    pub const fn from_bits(bits: usize) -> Self {
        Self { bits }
    }

    /// Returns the raw bits of the `mcause` register.
    pub const fn bits(&self) -> usize {
        self.bits
    }

    /// Checks if the cause is an interrupt (as opposed to an exception).
    /// The most significant bit of `mcause` is set for interrupts.
    pub fn is_interrupt(&self) -> bool {
        self.bits >> (usize::BITS - 1) & 1 != 0
    }

    /// Returns the interrupt or exception code.
    pub fn code(&self) -> usize {
        self.bits & !(1 << (usize::BITS - 1))
    }

    /// Decodes an interrupt cause into its machine-level interrupt class.
    pub fn interrupt_code(&self) -> Option<InterruptCode> {
        if !self.is_interrupt() {
            return None;
        }
        match self.code() {
            3 => Some(InterruptCode::MachineSoft),
            7 => Some(InterruptCode::MachineTimer),
            11 => Some(InterruptCode::MachineExternal),
            _ => None,
        }
    }

    /// Maps an exception cause to its standard source id. External
    /// interrupts have no fixed mapping; the board resolves those through
    /// its claim mechanism.
    pub fn exception_source(&self) -> Option<TrapSource> {
        if self.is_interrupt() {
            return None;
        }
        match self.code() {
            0 => Some(sources::INSTRUCTION_MISALIGNED),
            1 => Some(sources::INSTRUCTION_ACCESS_FAULT),
            2 => Some(sources::ILLEGAL_INSTRUCTION),
            3 => Some(sources::BREAKPOINT),
            4 => Some(sources::LOAD_MISALIGNED),
            5 => Some(sources::LOAD_ACCESS_FAULT),
            6 => Some(sources::STORE_MISALIGNED),
            7 => Some(sources::STORE_ACCESS_FAULT),
            8 => Some(sources::ECALL_FROM_UMODE),
            11 => Some(sources::ECALL_FROM_MMODE),
            12 => Some(sources::INSTRUCTION_PAGE_FAULT),
            13 => Some(sources::LOAD_PAGE_FAULT),
            15 => Some(sources::STORE_PAGE_FAULT),
            _ => None,
        }
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_interrupt() {
            "Interrupt"
        } else {
            "Exception"
        };
        write!(
            f,
            "Cause::{} (code: {}, raw: {:#x})",
            kind,
            self.code(),
            self.bits()
        )
    }
}
