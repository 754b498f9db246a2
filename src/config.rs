// ibex_trapcore/src/config.rs

//! # Board and Core Configuration
//!
//! Compile-time constants for the Ibex-class core this crate targets.
//! Controller selection and diagnostics are cargo features:
//! `plic` (default), `clic`, `bank-switch`, `develhelp`.

#[cfg(all(feature = "plic", feature = "clic"))]
compile_error!("features `plic` and `clic` select mutually exclusive interrupt controllers");

/// Core clock in Hz.
pub const CLOCK_CORECLOCK: u32 = 28_000_000;

/// Base address of the memory-mapped register file banks.
pub const RF_BASE: usize = 0x1_0000;

/// Machine timer block.
pub const TIMER_BASE_ADDR: usize = 0x3_0000;
pub const TIMER_MTIME: usize = 0x0;
pub const TIMER_MTIMECMP: usize = 0x8;

/// Platform-level interrupt controller.
pub const PLIC_BASE_ADDR: usize = 0x0c00_0000;
pub const PLIC_NUM_SOURCES: usize = 32;

/// Core-local interrupt controller.
pub const CLIC_BASE_ADDR: usize = 0x0280_0000;
pub const CLIC_NUM_LINES: usize = 64;

/// Stack alignment required by the RISC-V psABI.
pub const STACK_ALIGN: usize = 16;

/// Width of the `ecall` instruction skipped on return.
pub const ECALL_INSTRUCTION_LEN: u32 = 4;

/// `mstatus` bits.
pub const MSTATUS_MIE: u32 = 1 << 3;
pub const MSTATUS_MPIE: u32 = 1 << 7;
pub const MSTATUS_MPP: u32 = 0b11 << 11;

/// Status established at boot: return to machine mode with interrupts on.
pub const MSTATUS_DEFAULT: u32 = MSTATUS_MPP | MSTATUS_MPIE;

/// `mie`/`mip` bits.
pub const MIP_MTIP: u32 = 1 << 7;
pub const MIP_MEIP: u32 = 1 << 11;

/// Entries kept in the trap error log.
pub const ERROR_LOG_CAPACITY: usize = 16;

/// Error hooks that can be registered.
pub const ERROR_HANDLER_CAPACITY: usize = 4;
