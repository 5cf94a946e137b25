// hartirq/src/trap/infrastructure/low_level.rs

//! # Low-Level Trap Hardware Control
//!
//! The machine implementation of the hardware seam for CLINT-based
//! platforms (optionally with a PLIC for external sources), plus the
//! `extern "C"` bridge the board's trap entry assembly calls after saving
//! the register file.

use core::ptr::{read_volatile, write_volatile};

use riscv::register::mtvec::{self, Mtvec};
use riscv::register::{mhartid, mie, mstatus};

use crate::trap::ds::{sources, InterruptEnables, TrapFrame, TrapSource, NUM_STANDARD_SOURCES};

use super::dispatcher;
use super::directory;
use super::hal::HardwareController;

// CLINT register map offsets.
const CLINT_MSIP: usize = 0x0;
const CLINT_MTIMECMP: usize = 0x4000;
const CLINT_MTIME: usize = 0xBFF8;

// PLIC register map offsets, machine context per hart.
const PLIC_ENABLE: usize = 0x2000;
const PLIC_CLAIM: usize = 0x2004;
const PLIC_HART_STRIDE: usize = 0x100;

/// Optional PLIC wiring for boards with external interrupt routing.
#[derive(Debug, Clone, Copy)]
pub struct PlicPorts {
    /// PLIC MMIO base address.
    pub base: usize,
    /// Number of external interrupt lines the board enumerates.
    pub external_sources: u16,
    /// Highest priority value the PLIC implements.
    pub max_priority: u8,
}

/// CLINT-backed implementation of [`HardwareController`].
///
/// The board constructs one of these with its memory map and trap entry
/// address and hands it to `interrupts_init`. External source ids follow
/// the standard range: PLIC line `n` is source `NUM_STANDARD_SOURCES + n - 1`.
pub struct ClintController {
    clint_base: usize,
    plic: Option<PlicPorts>,
    /// Address of the board's trap entry sequence.
    trap_entry: usize,
    /// Board console sink for unhandled-exception reports.
    console: fn(&str),
}

impl ClintController {
    pub const fn new(
        clint_base: usize,
        plic: Option<PlicPorts>,
        trap_entry: usize,
        console: fn(&str),
    ) -> Self {
        Self {
            clint_base,
            plic,
            trap_entry,
            console,
        }
    }

    fn plic_line(&self, source: TrapSource) -> Option<(usize, u32)> {
        let plic = self.plic?;
        if source < NUM_STANDARD_SOURCES || source >= NUM_STANDARD_SOURCES + plic.external_sources {
            return None;
        }
        Some((plic.base, (source - NUM_STANDARD_SOURCES) as u32 + 1))
    }
}

impl HardwareController for ClintController {
    fn hart_id(&self) -> usize {
        mhartid::read()
    }

    #[inline]
    fn disable_interrupts(&self) -> bool {
        let was_enabled = mstatus::read().mie();
        unsafe { mstatus::clear_mie() };
        was_enabled
    }

    #[inline]
    fn restore_interrupts(&self, was_enabled: bool) {
        if was_enabled {
            unsafe { mstatus::set_mie() };
        }
    }

    fn set_interrupt_enables(&self, enables: InterruptEnables) -> InterruptEnables {
        let current = mie::read();
        let mut previous = InterruptEnables::empty();
        previous.set(InterruptEnables::SOFTWARE, current.msoft());
        previous.set(InterruptEnables::TIMER, current.mtimer());
        previous.set(InterruptEnables::EXTERNAL, current.mext());

        unsafe {
            if enables.contains(InterruptEnables::SOFTWARE) {
                mie::set_msoft();
            } else {
                mie::clear_msoft();
            }
            if enables.contains(InterruptEnables::TIMER) {
                mie::set_mtimer();
            } else {
                mie::clear_mtimer();
            }
            if enables.contains(InterruptEnables::EXTERNAL) {
                mie::set_mext();
            } else {
                mie::clear_mext();
            }
        }
        previous
    }

    fn enable_source(&self, source: TrapSource) {
        match source {
            sources::MACHINE_SOFT_INTERRUPT => unsafe {
                mie::set_msoft();
            },
            sources::MACHINE_TIMER_INTERRUPT => unsafe {
                mie::set_mtimer();
            },
            _ => {
                if let Some((base, line)) = self.plic_line(source) {
                    let hart = self.hart_id();
                    unsafe {
                        let addr = base + PLIC_ENABLE + hart * PLIC_HART_STRIDE;
                        let word = read_volatile(addr as *const u32);
                        write_volatile(addr as *mut u32, word | (1 << (line % 32)));
                    }
                }
                // Exceptions and sources without a controller line have no
                // hardware gate.
            }
        }
    }

    fn disable_source(&self, source: TrapSource) {
        match source {
            sources::MACHINE_SOFT_INTERRUPT => unsafe {
                mie::clear_msoft();
            },
            sources::MACHINE_TIMER_INTERRUPT => unsafe {
                mie::clear_mtimer();
            },
            _ => {
                if let Some((base, line)) = self.plic_line(source) {
                    let hart = self.hart_id();
                    unsafe {
                        let addr = base + PLIC_ENABLE + hart * PLIC_HART_STRIDE;
                        let word = read_volatile(addr as *const u32);
                        write_volatile(addr as *mut u32, word & !(1 << (line % 32)));
                    }
                }
            }
        }
    }

    fn total_sources(&self) -> TrapSource {
        NUM_STANDARD_SOURCES + self.plic.map_or(0, |plic| plic.external_sources)
    }

    fn max_priority(&self) -> Option<u8> {
        self.plic.map(|plic| plic.max_priority)
    }

    fn max_level(&self) -> Option<u8> {
        // Neither the CLINT nor the PLIC implements preemption levels.
        None
    }

    fn claim_external(&self) -> Option<TrapSource> {
        let plic = self.plic?;
        let hart = self.hart_id();
        let line = unsafe {
            read_volatile((plic.base + PLIC_CLAIM + hart * PLIC_HART_STRIDE) as *const u32)
        };
        if line == 0 {
            return None;
        }
        Some(NUM_STANDARD_SOURCES + line as TrapSource - 1)
    }

    fn complete_external(&self, source: TrapSource) {
        if let Some((base, line)) = self.plic_line(source) {
            let hart = self.hart_id();
            unsafe {
                write_volatile((base + PLIC_CLAIM + hart * PLIC_HART_STRIDE) as *mut u32, line);
            }
        }
    }

    fn send_soft_interrupt(&self, hart: usize) {
        unsafe {
            write_volatile((self.clint_base + CLINT_MSIP + hart * 0x4) as *mut u32, 1);
        }
    }

    fn clear_soft_interrupt(&self, hart: usize) {
        unsafe {
            write_volatile((self.clint_base + CLINT_MSIP + hart * 0x4) as *mut u32, 0);
        }
    }

    fn read_time(&self) -> u64 {
        unsafe { read_volatile((self.clint_base + CLINT_MTIME) as *const u64) }
    }

    fn set_time_compare(&self, hart: usize, deadline: u64) {
        unsafe {
            write_volatile(
                (self.clint_base + CLINT_MTIMECMP + hart * 0x8) as *mut u64,
                deadline,
            );
        }
    }

    fn install_trap_vector(&self) {
        let vector = Mtvec::new(self.trap_entry, mtvec::TrapMode::Direct);
        unsafe {
            mtvec::write(vector);
        }
    }

    fn console_write(&self, text: &str) {
        (self.console)(text);
    }

    fn halt(&self) -> ! {
        loop {
            #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
            unsafe {
                core::arch::asm!("wfi");
            }
        }
    }
}

/// The function the board's trap entry assembly calls once the register
/// file is saved. It bridges from the saved frame to the dispatcher for
/// the current hart's context; a hart with no initialized context ignores
/// the trap.
///
/// # Safety
///
/// Must only be called from trap entry with `frame` pointing at the frame
/// that sequence just saved.
#[no_mangle]
pub unsafe extern "C" fn hartirq_trap_dispatch(frame: *mut TrapFrame) {
    let frame = &mut *frame;
    if let Some(ctx) = directory::context_for(mhartid::read()) {
        dispatcher::dispatch(ctx, frame.mcause, frame.mtval);
    }
}
