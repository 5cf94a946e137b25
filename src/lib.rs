// hartirq/src/lib.rs

//! # Per-Hart Trap Routing, Software Signals, and Tick-Driven Timeouts
//!
//! This crate is the interrupt and timer subsystem for a RISC-V machine-mode
//! environment: it routes traps to registered handlers, gates which sources
//! user mode may handle or raise, arbitrates priority and level among pending
//! interrupts, allocates software-defined signals, and schedules software
//! timeouts counted in periodic timer ticks.
//!
//! The crate performs no dynamic allocation. The per-hart registry lives in a
//! caller-supplied byte arena and every timeout handle is caller-owned
//! storage. All hardware access goes through the
//! [`trap::HardwareController`] seam, so the routing, arbitration, and
//! scheduling logic is portable and host-testable;
//! `trap::infrastructure::low_level` provides the CLINT-based machine
//! implementation.
//!
//! The board's trap entry assembly saves the register file into a
//! [`trap::TrapFrame`] and calls `hartirq_trap_dispatch`; everything from the
//! raw cause value onward is handled here.

#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod test;
pub mod trap;

/// Largest hart id (exclusive) the per-hart context directory can track.
pub const MAX_HARTS: usize = 8;
