// ibex_trapcore/src/trap/ds/mod.rs

//! # Trap Data Structures Module
//!
//! Defines the core data structures for the trap subsystem: cause
//! decoding, the register file and context frame layout, fault records and
//! interrupt handler tables. Nothing in this module touches hardware.

pub mod types;
pub mod context;
pub mod error;
pub mod handler;

pub use self::types::{
    TrapCause, TrapMode, TrapType,
    Interrupt, Exception,
    MCAUSE_INTERRUPT, MCAUSE_CAUSE, MCAUSE_CAUSE_MSK,
};

pub use self::context::{
    RegisterFile, ContextFrame, RegisterContext, ThreadDescriptor, ThreadId,
    CONTEXT_FRAME_SIZE, FRAME_WORDS, TRACKED_REGISTERS,
    frame_offsets, align_stack,
};

pub use self::error::{
    TrapFault, SystemError, ErrorCode, ErrorResult,
    ErrorSource, ErrorLevel, ErrorLogEntry,
};

pub use self::handler::{
    IrqHandler, TimerCallback, HandlerError, HandlerTable,
};
