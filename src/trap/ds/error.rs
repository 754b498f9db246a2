// ibex_trapcore/src/trap/ds/error.rs

//! # Error Handling Data Structures
//!
//! Types for fatal trap conditions and the structured records the error
//! manager logs before the hart is halted. Nothing here allocates.

use super::context::ThreadId;
use super::types::TrapCause;
use core::fmt;

/// Defines the severity of an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ErrorLevel {
    /// An unrecoverable error requiring a system halt.
    Fatal = 0,
    /// A standard error that can likely be handled.
    Error = 1,
    /// A potential issue that does not prevent correct operation.
    Warning = 2,
}

/// Identifies the subsystem where an error originated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorSource {
    Unknown = 0,
    Interrupt = 1,
    Exception = 2,
    Context = 3,
}

/// A structured error code, combining source, level, and a specific code.
/// Format: 32-bit integer
/// - Bits 24-31: `ErrorSource`
/// - Bits 16-23: `ErrorLevel`
/// - Bits 0-15:  Specific error number (the trap cause code, where there is one)
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ErrorCode(u32);

impl ErrorCode {
    pub const fn new(source: ErrorSource, level: ErrorLevel, code: u16) -> Self {
        Self(((source as u32) << 24) | ((level as u32) << 16) | (code as u32))
    }

    pub fn source(&self) -> ErrorSource {
        match (self.0 >> 24) as u8 {
            1 => ErrorSource::Interrupt,
            2 => ErrorSource::Exception,
            3 => ErrorSource::Context,
            _ => ErrorSource::Unknown,
        }
    }

    pub fn level(&self) -> ErrorLevel {
        match ((self.0 >> 16) & 0xFF) as u8 {
            0 => ErrorLevel::Fatal,
            2 => ErrorLevel::Warning,
            _ => ErrorLevel::Error,
        }
    }

    pub fn number(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub fn is_fatal(&self) -> bool {
        self.level() == ErrorLevel::Fatal
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCode({:?}|{:?}|{})", self.source(), self.level(), self.number())
    }
}

/// A trap the core cannot service. Register and stack state are not
/// trusted afterwards, so every variant ends in a halt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrapFault {
    /// An interrupt line no configured controller claims.
    UnhandledInterrupt { cause: TrapCause, pc: u32 },
    /// Any exception other than an environment call.
    UnhandledException { cause: TrapCause, pc: u32, value: u32 },
    /// The scheduler named a thread it cannot produce a descriptor for.
    UnknownThread { id: ThreadId, pc: u32 },
}

impl TrapFault {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnhandledInterrupt { cause, .. } => {
                ErrorCode::new(ErrorSource::Interrupt, ErrorLevel::Fatal, cause.code() as u16)
            }
            Self::UnhandledException { cause, .. } => {
                ErrorCode::new(ErrorSource::Exception, ErrorLevel::Fatal, cause.short_code() as u16)
            }
            Self::UnknownThread { id, .. } => {
                ErrorCode::new(ErrorSource::Context, ErrorLevel::Fatal, *id as u16)
            }
        }
    }

    pub fn pc(&self) -> u32 {
        match self {
            Self::UnhandledInterrupt { pc, .. }
            | Self::UnhandledException { pc, .. }
            | Self::UnknownThread { pc, .. } => *pc,
        }
    }

    pub fn to_system_error(&self) -> SystemError {
        let (message, cause, address) = match self {
            Self::UnhandledInterrupt { cause, .. } => ("Unhandled interrupt", cause.bits(), None),
            Self::UnhandledException { cause, value, .. } => ("Unhandled trap", cause.bits(), Some(*value)),
            Self::UnknownThread { .. } => ("Unknown thread", 0, None),
        };
        SystemError::new(self.code(), message, cause, address, self.pc())
    }
}

impl fmt::Display for TrapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnhandledInterrupt { cause, pc } => {
                write!(f, "unhandled interrupt {} at {:#x}", cause.code(), pc)
            }
            Self::UnhandledException { cause, pc, value } => {
                write!(f, "unhandled exception {} at {:#x} (mtval {:#x})", cause.short_code(), pc, value)
            }
            Self::UnknownThread { id, pc } => {
                write!(f, "scheduler selected unknown thread {} at {:#x}", id, pc)
            }
        }
    }
}

/// A complete error record, with context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemError {
    pub code: ErrorCode,
    pub message: &'static str,
    /// Raw `mcause`, or 0 when the error did not come from a trap cause.
    pub cause: u32,
    /// Exception-specific trap value (`mtval`), if any.
    pub address: Option<u32>,
    /// `mepc` at the time of the trap.
    pub instruction_pointer: u32,
}

impl SystemError {
    pub const fn new(
        code: ErrorCode,
        message: &'static str,
        cause: u32,
        address: Option<u32>,
        instruction_pointer: u32,
    ) -> Self {
        Self { code, message, cause, address, instruction_pointer }
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SystemError {:?} at IP={:#x}: {} (mcause: {:#x})",
            self.code, self.instruction_pointer, self.message, self.cause
        )?;
        if let Some(addr) = self.address {
            write!(f, " (mtval: {:#x})", addr)?;
        }
        Ok(())
    }
}

/// The result of an error hook's execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorResult {
    /// The error was fully handled and processing can stop.
    Handled,
    /// Partially handled; later hooks still run.
    Partial,
    /// Not handled; processing continues.
    Unhandled,
}

/// An entry in the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLogEntry {
    pub error: SystemError,
    pub result: ErrorResult,
}
