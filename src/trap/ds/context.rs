// ibex_trapcore/src/trap/ds/context.rs

//! # Register File and Context Frame
//!
//! Defines the saved-register layout shared by the hardware register banks,
//! the trap entry code and the scheduler's thread descriptors.

use crate::config::STACK_ALIGN;
use core::mem::size_of;

/// # Register File
///
/// One bank of the hardware register file, and the layout of a saved thread
/// context. The field order is an ABI contract: the banks mapped at
/// `RF_BASE` use it, and so does every frame carved on a thread stack.
/// Do not reorder fields without updating `frame_offsets`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterFile {
    pub pc: u32,
    pub ra: u32,
    pub sp: u32,
    pub gp: u32,
    pub tp: u32,
    pub t0: u32,
    pub t1: u32,
    pub t2: u32,
    pub s0: u32,
    pub s1: u32,
    pub a0: u32,
    pub a1: u32,
    pub a2: u32,
    pub a3: u32,
    pub a4: u32,
    pub a5: u32,
    pub a6: u32,
    pub a7: u32,
    pub s2: u32,
    pub s3: u32,
    pub s4: u32,
    pub s5: u32,
    pub s6: u32,
    pub s7: u32,
    pub s8: u32,
    pub s9: u32,
    pub s10: u32,
    pub s11: u32,
    pub t3: u32,
    pub t4: u32,
    pub t5: u32,
    pub t6: u32,
}

/// A thread context saved on its own stack. Same layout as a register bank.
pub type ContextFrame = RegisterFile;

/// Size in bytes of a context frame.
pub const CONTEXT_FRAME_SIZE: u32 = size_of::<ContextFrame>() as u32;

/// Number of 32-bit words in a context frame.
pub const FRAME_WORDS: usize = size_of::<ContextFrame>() / size_of::<u32>();

/// Number of registers the context switch engine copies.
pub const TRACKED_REGISTERS: usize = 28;

const _: () = assert!(CONTEXT_FRAME_SIZE as usize % STACK_ALIGN == 0);
const _: () = assert!(FRAME_WORDS == 32);

/// Byte offsets of each field inside a frame, for code that addresses a
/// frame by absolute offset.
pub mod frame_offsets {
    use super::RegisterFile;
    use core::mem::offset_of;

    pub const PC: usize = offset_of!(RegisterFile, pc);
    pub const RA: usize = offset_of!(RegisterFile, ra);
    pub const SP: usize = offset_of!(RegisterFile, sp);
    pub const GP: usize = offset_of!(RegisterFile, gp);
    pub const TP: usize = offset_of!(RegisterFile, tp);
    pub const T0: usize = offset_of!(RegisterFile, t0);
    pub const T1: usize = offset_of!(RegisterFile, t1);
    pub const T2: usize = offset_of!(RegisterFile, t2);
    pub const S0: usize = offset_of!(RegisterFile, s0);
    pub const S1: usize = offset_of!(RegisterFile, s1);
    pub const A0: usize = offset_of!(RegisterFile, a0);
    pub const A1: usize = offset_of!(RegisterFile, a1);
    pub const A2: usize = offset_of!(RegisterFile, a2);
    pub const A3: usize = offset_of!(RegisterFile, a3);
    pub const A4: usize = offset_of!(RegisterFile, a4);
    pub const A5: usize = offset_of!(RegisterFile, a5);
    pub const A6: usize = offset_of!(RegisterFile, a6);
    pub const A7: usize = offset_of!(RegisterFile, a7);
    pub const S2: usize = offset_of!(RegisterFile, s2);
    pub const S3: usize = offset_of!(RegisterFile, s3);
    pub const S4: usize = offset_of!(RegisterFile, s4);
    pub const S5: usize = offset_of!(RegisterFile, s5);
    pub const S6: usize = offset_of!(RegisterFile, s6);
    pub const S7: usize = offset_of!(RegisterFile, s7);
    pub const S8: usize = offset_of!(RegisterFile, s8);
    pub const S9: usize = offset_of!(RegisterFile, s9);
    pub const S10: usize = offset_of!(RegisterFile, s10);
    pub const S11: usize = offset_of!(RegisterFile, s11);
    pub const T3: usize = offset_of!(RegisterFile, t3);
    pub const T4: usize = offset_of!(RegisterFile, t4);
    pub const T5: usize = offset_of!(RegisterFile, t5);
    pub const T6: usize = offset_of!(RegisterFile, t6);

    // Spot checks against the layout the trap entry code assumes.
    const _: () = assert!(PC == 0);
    const _: () = assert!(SP == 8);
    const _: () = assert!(S0 == 32);
    const _: () = assert!(A0 == 40);
    const _: () = assert!(S2 == 72);
    const _: () = assert!(T6 == 124);
}

impl RegisterFile {
    pub const fn new() -> Self {
        Self {
            pc: 0, ra: 0, sp: 0, gp: 0, tp: 0,
            t0: 0, t1: 0, t2: 0,
            s0: 0, s1: 0,
            a0: 0, a1: 0, a2: 0, a3: 0, a4: 0, a5: 0, a6: 0, a7: 0,
            s2: 0, s3: 0, s4: 0, s5: 0, s6: 0, s7: 0, s8: 0, s9: 0, s10: 0, s11: 0,
            t3: 0, t4: 0, t5: 0, t6: 0,
        }
    }

    /// Copies the registers that survive a context switch from `src`.
    ///
    /// `pc`, `sp`, `gp` and `tp` are left alone: the engine derives `pc` and
    /// `sp` itself, and `gp`/`tp` are shared by every thread. Save and load
    /// both go through here, so the saved set is always the restored set.
    pub fn copy_tracked_from(&mut self, src: &RegisterFile) {
        self.s0 = src.s0;
        self.s1 = src.s1;
        self.s2 = src.s2;
        self.s3 = src.s3;
        self.s4 = src.s4;
        self.s5 = src.s5;
        self.s6 = src.s6;
        self.s7 = src.s7;
        self.s8 = src.s8;
        self.s9 = src.s9;
        self.s10 = src.s10;
        self.s11 = src.s11;
        self.ra = src.ra;
        self.t0 = src.t0;
        self.t1 = src.t1;
        self.t2 = src.t2;
        self.t3 = src.t3;
        self.t4 = src.t4;
        self.t5 = src.t5;
        self.t6 = src.t6;
        self.a0 = src.a0;
        self.a1 = src.a1;
        self.a2 = src.a2;
        self.a3 = src.a3;
        self.a4 = src.a4;
        self.a5 = src.a5;
        self.a6 = src.a6;
        self.a7 = src.a7;
    }

    /// The frame as it sits in memory, one word per field.
    pub fn to_words(&self) -> [u32; FRAME_WORDS] {
        [
            self.pc, self.ra, self.sp, self.gp, self.tp,
            self.t0, self.t1, self.t2,
            self.s0, self.s1,
            self.a0, self.a1, self.a2, self.a3, self.a4, self.a5, self.a6, self.a7,
            self.s2, self.s3, self.s4, self.s5, self.s6, self.s7, self.s8, self.s9, self.s10, self.s11,
            self.t3, self.t4, self.t5, self.t6,
        ]
    }

    pub fn from_words(w: &[u32; FRAME_WORDS]) -> Self {
        Self {
            pc: w[0], ra: w[1], sp: w[2], gp: w[3], tp: w[4],
            t0: w[5], t1: w[6], t2: w[7],
            s0: w[8], s1: w[9],
            a0: w[10], a1: w[11], a2: w[12], a3: w[13], a4: w[14], a5: w[15], a6: w[16], a7: w[17],
            s2: w[18], s3: w[19], s4: w[20], s5: w[21], s6: w[22], s7: w[23], s8: w[24], s9: w[25],
            s10: w[26], s11: w[27],
            t3: w[28], t4: w[29], t5: w[30], t6: w[31],
        }
    }
}

/// The four hardware register banks. Exactly one is live at a time,
/// selected by the kind of trap being serviced.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum RegisterContext {
    Normal = 0,
    Exception = 1,
    Irq = 2,
    Ecall = 3,
}

impl RegisterContext {
    /// The banks used while a trap is being serviced.
    pub const TRAP_BANKS: [RegisterContext; 3] =
        [RegisterContext::Exception, RegisterContext::Irq, RegisterContext::Ecall];
}

/// Index of a thread as known to the scheduler.
pub type ThreadId = usize;

/// # Thread Descriptor
///
/// The part of a scheduler's thread record the context switch engine reads
/// and writes. While a thread is suspended, `sp` points at its saved frame
/// (stack-frame strategy) and `bank` holds its registers (register-bank
/// strategy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadDescriptor {
    pub sp: u32,
    pub bank: RegisterFile,
}

impl ThreadDescriptor {
    pub const fn new() -> Self {
        Self { sp: 0, bank: RegisterFile::new() }
    }
}

/// Rounds `addr` down to the stack alignment.
pub const fn align_stack(addr: u32) -> u32 {
    addr & !(STACK_ALIGN as u32 - 1)
}
