// ibex_trapcore/src/trap/infrastructure/low_level.rs

//! # Low-Level Trap Hardware Control
//!
//! This module provides direct control over the RISC-V machine-mode trap
//! CSRs, the Ibex memory-mapped register file, and the MMIO blocks the trap
//! path touches. It also carries the assembly entry point and the
//! `critical-section` implementation for the hart.

use crate::config::{
    CLIC_BASE_ADDR, CLIC_NUM_LINES, MIP_MEIP, MIP_MTIP, MSTATUS_DEFAULT, PLIC_BASE_ADDR,
    PLIC_NUM_SOURCES, RF_BASE, TIMER_BASE_ADDR, TIMER_MTIMECMP,
};
use crate::trap::ds::{
    ContextFrame, RegisterContext, RegisterFile, TrapCause, TrapMode, FRAME_WORDS,
};
use crate::trap::infrastructure::controller::{ClicRegisters, PlicRegisters};
use crate::trap::infrastructure::di::traits::HardwareController;
use crate::trap::infrastructure::timer::Comparator;
use core::arch::{asm, global_asm};
use core::ptr::{read_volatile, write_volatile};
use critical_section::{set_impl, Impl, RawRestoreState};
use riscv::register::{mcause, mepc, mstatus, mtval};

global_asm!(include_str!("asm/trap_entry.S"));

extern "C" {
    /// The 64-byte aligned trap vector defined in `trap_entry.S`.
    fn __trap_entry();
}

/// Points `mtvec` at the trap entry stub.
pub fn init_trap_vector(mode: TrapMode) {
    let mtvec_value = __trap_entry as usize | mode as usize;
    unsafe {
        asm!("csrw mtvec, {}", in(reg) mtvec_value);
    }
}

/// Called by `__trap_entry` on the trap register bank, with interrupt
/// delivery disabled by hardware. `__trap_entry` returns through `mret`.
#[no_mangle]
extern "C" fn ctrap_entry() {
    if !crate::trap::infrastructure::di::dispatch_trap() {
        halt();
    }
}

/// Enables machine-level interrupts globally for the current hart.
///
/// # Returns
///
/// `true` if interrupts were previously enabled, `false` otherwise.
#[inline]
pub fn enable_interrupts() -> bool {
    let mut mstatus: usize;
    unsafe {
        asm!("csrrsi {}, mstatus, 1 << 3", out(reg) mstatus);
    }
    (mstatus & (1 << 3)) != 0
}

/// Disables machine-level interrupts globally for the current hart.
///
/// # Returns
///
/// `true` if interrupts were previously enabled, `false` otherwise.
#[inline]
pub fn disable_interrupts() -> bool {
    let mut mstatus: usize;
    unsafe {
        asm!("csrrci {}, mstatus, 1 << 3", out(reg) mstatus);
    }
    (mstatus & (1 << 3)) != 0
}

/// Restores the global interrupt enable state.
///
/// # Arguments
///
/// * `was_enabled` - The previous state of the interrupt flag, as returned by
///   `enable_interrupts` or `disable_interrupts`.
#[inline]
pub fn restore_interrupts(was_enabled: bool) {
    if was_enabled {
        unsafe {
            asm!("csrsi mstatus, 1 << 3");
        }
    }
}

#[inline]
pub fn interrupts_enabled() -> bool {
    mstatus::read().mie()
}

#[inline]
fn set_mie(bits: u32) {
    unsafe {
        asm!("csrs mie, {}", in(reg) bits as usize);
    }
}

#[inline]
fn clear_mie(bits: u32) {
    unsafe {
        asm!("csrc mie, {}", in(reg) bits as usize);
    }
}

/// Traps into the kernel so the scheduler can pick another thread.
#[inline]
pub fn ecall() {
    unsafe {
        asm!("ecall");
    }
}

/// Masks everything and parks the hart.
pub fn halt() -> ! {
    disable_interrupts();
    loop {
        unsafe {
            asm!("wfi");
        }
    }
}

fn bank_ptr(ctx: RegisterContext) -> *mut u32 {
    (RF_BASE + ctx as usize * core::mem::size_of::<RegisterFile>()) as *mut u32
}

/// `HardwareController` for the Ibex core this crate runs on.
pub struct LowLevelHardwareController;

impl HardwareController for LowLevelHardwareController {
    fn init_trap_vector(&mut self, mode: TrapMode) {
        init_trap_vector(mode);
    }

    fn clear_interrupt_enables(&mut self) {
        unsafe {
            asm!("csrw mie, zero");
        }
    }

    fn enable_external_interrupts(&mut self) {
        set_mie(MIP_MEIP);
    }

    fn set_default_status(&mut self) {
        unsafe {
            asm!("csrs mstatus, {}", in(reg) MSTATUS_DEFAULT as usize);
        }
    }

    fn enable_interrupts(&mut self) -> bool {
        enable_interrupts()
    }

    fn disable_interrupts(&mut self) -> bool {
        disable_interrupts()
    }

    fn restore_interrupts(&mut self, was_enabled: bool) {
        restore_interrupts(was_enabled);
    }

    fn interrupts_enabled(&self) -> bool {
        interrupts_enabled()
    }

    fn trap_cause(&self) -> TrapCause {
        TrapCause::from_bits(mcause::read().bits() as u32)
    }

    fn exception_pc(&self) -> u32 {
        mepc::read() as u32
    }

    fn set_exception_pc(&mut self, pc: u32) {
        unsafe {
            asm!("csrw mepc, {}", in(reg) pc as usize);
        }
    }

    fn trap_value(&self) -> u32 {
        mtval::read() as u32
    }

    fn global_pointer(&self) -> u32 {
        let gp: usize;
        unsafe {
            asm!("mv {}, gp", out(reg) gp);
        }
        gp as u32
    }

    fn read_bank(&self, ctx: RegisterContext) -> RegisterFile {
        let base = bank_ptr(ctx);
        let mut words = [0u32; FRAME_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = unsafe { read_volatile(base.add(i)) };
        }
        RegisterFile::from_words(&words)
    }

    fn write_bank(&mut self, ctx: RegisterContext, regs: &RegisterFile) {
        let base = bank_ptr(ctx);
        for (i, word) in regs.to_words().iter().enumerate() {
            unsafe { write_volatile(base.add(i), *word) };
        }
    }

    fn read_frame(&self, addr: u32) -> ContextFrame {
        // Frames live in RAM owned by the suspended thread.
        unsafe { read_volatile(addr as usize as *const ContextFrame) }
    }

    fn write_frame(&mut self, addr: u32, frame: &ContextFrame) {
        unsafe { write_volatile(addr as usize as *mut ContextFrame, *frame) };
    }

    fn halt(&mut self) -> ! {
        halt()
    }
}

/// The machine timer's `mtimecmp` register and the `MTIP` enable.
pub struct MmioComparator;

impl Comparator for MmioComparator {
    fn set_compare(&mut self, value: u64) {
        let lo = (TIMER_BASE_ADDR + TIMER_MTIMECMP) as *mut u32;
        unsafe {
            // Raise the low word first so no intermediate value fires.
            write_volatile(lo, u32::MAX);
            write_volatile(lo.add(1), (value >> 32) as u32);
            write_volatile(lo, value as u32);
        }
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        if enabled {
            set_mie(MIP_MTIP);
        } else {
            clear_mie(MIP_MTIP);
        }
    }
}

const PLIC_PRIORITY: usize = 0x0;
const PLIC_ENABLE: usize = 0x2000;
const PLIC_THRESHOLD: usize = 0x20_0000;
const PLIC_CLAIM: usize = 0x20_0004;

/// PLIC context 0 (machine mode, hart 0).
pub struct MmioPlic;

impl MmioPlic {
    fn reg(offset: usize) -> *mut u32 {
        (PLIC_BASE_ADDR + offset) as *mut u32
    }
}

impl PlicRegisters for MmioPlic {
    fn num_sources(&self) -> u32 {
        PLIC_NUM_SOURCES as u32
    }

    fn set_priority(&mut self, source: u32, priority: u32) {
        unsafe { write_volatile(Self::reg(PLIC_PRIORITY + 4 * source as usize), priority) };
    }

    fn set_enabled(&mut self, source: u32, enabled: bool) {
        let reg = Self::reg(PLIC_ENABLE + 4 * (source as usize / 32));
        let bit = 1u32 << (source % 32);
        unsafe {
            let cur = read_volatile(reg);
            write_volatile(reg, if enabled { cur | bit } else { cur & !bit });
        }
    }

    fn set_threshold(&mut self, threshold: u32) {
        unsafe { write_volatile(Self::reg(PLIC_THRESHOLD), threshold) };
    }

    fn claim(&mut self) -> u32 {
        unsafe { read_volatile(Self::reg(PLIC_CLAIM)) }
    }

    fn complete(&mut self, source: u32) {
        unsafe { write_volatile(Self::reg(PLIC_CLAIM), source) };
    }
}

const CLIC_MINTTHRESH: usize = 0x8;
const CLIC_INT: usize = 0x1000;
const CLIC_INT_IE: usize = 1;

/// CLIC with byte-wide per-line control registers.
pub struct MmioClic;

impl ClicRegisters for MmioClic {
    fn num_lines(&self) -> u32 {
        CLIC_NUM_LINES as u32
    }

    fn set_enabled(&mut self, line: u32, enabled: bool) {
        let ie = (CLIC_BASE_ADDR + CLIC_INT + 4 * line as usize + CLIC_INT_IE) as *mut u8;
        unsafe { write_volatile(ie, enabled as u8) };
    }

    fn set_threshold(&mut self, threshold: u32) {
        let reg = (CLIC_BASE_ADDR + CLIC_MINTTHRESH) as *mut u8;
        unsafe { write_volatile(reg, threshold as u8) };
    }
}

struct MachineCriticalSection;
set_impl!(MachineCriticalSection);

unsafe impl Impl for MachineCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        disable_interrupts()
    }

    unsafe fn release(was_active: RawRestoreState) {
        restore_interrupts(was_active);
    }
}
