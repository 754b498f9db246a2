// ibex_trapcore/src/trap/ds/types.rs

//! # Trap Type Definitions
//!
//! Enums and wrappers for the machine-mode trap cause register (`mcause`)
//! as delivered by a 32-bit RISC-V core.

use core::fmt;

/// Bit 31 of `mcause` is set for interrupts, clear for exceptions.
pub const MCAUSE_INTERRUPT: u32 = 1 << 31;

/// Mask of the cause field when the trap is an interrupt.
pub const MCAUSE_CAUSE: u32 = !MCAUSE_INTERRUPT;

/// Mask applied to exception codes and to vectored (CLIC) interrupt lines.
pub const MCAUSE_CAUSE_MSK: u32 = 0x0fff;

/// Mode bits written into the low two bits of `mtvec`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum TrapMode {
    /// All traps enter at the base address.
    Direct = 0,
    /// Signals CLIC usage to the core.
    Clic = 0b11,
}

/// Machine-level interrupt codes the core knows by name.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum Interrupt {
    MachineSoft = 3,
    MachineTimer = 7,
    MachineExternal = 11,
}

impl Interrupt {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            3 => Some(Self::MachineSoft),
            7 => Some(Self::MachineTimer),
            11 => Some(Self::MachineExternal),
            _ => None,
        }
    }
}

/// Machine-level exception codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum Exception {
    InstructionMisaligned = 0,
    InstructionFault = 1,
    IllegalInstruction = 2,
    Breakpoint = 3,
    LoadMisaligned = 4,
    LoadFault = 5,
    StoreMisaligned = 6,
    StoreFault = 7,
    UserEnvCall = 8,
    MachineEnvCall = 11,
}

impl Exception {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::InstructionMisaligned),
            1 => Some(Self::InstructionFault),
            2 => Some(Self::IllegalInstruction),
            3 => Some(Self::Breakpoint),
            4 => Some(Self::LoadMisaligned),
            5 => Some(Self::LoadFault),
            6 => Some(Self::StoreMisaligned),
            7 => Some(Self::StoreFault),
            8 => Some(Self::UserEnvCall),
            11 => Some(Self::MachineEnvCall),
            _ => None,
        }
    }
}

/// What the classifier does with a trap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrapType {
    /// Machine timer interrupt, serviced by the timer ISR.
    TimerInterrupt,
    /// Machine external interrupt, serviced by the interrupt controller.
    ExternalInterrupt,
    /// Any other interrupt line; only a vectored controller can take it.
    LocalInterrupt(u32),
    /// ECALL from user or machine mode, used as a yield request.
    EnvironmentCall,
    /// Every other exception. Always fatal.
    Exception(u32),
}

/// A wrapper for the raw `mcause` value.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct TrapCause {
    bits: u32,
}

impl TrapCause {
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    pub const fn bits(&self) -> u32 {
        self.bits
    }

    pub const fn is_interrupt(&self) -> bool {
        self.bits & MCAUSE_INTERRUPT != 0
    }

    /// The cause field with the interrupt flag stripped.
    pub const fn code(&self) -> u32 {
        self.bits & MCAUSE_CAUSE
    }

    /// The low cause field used for exception and CLIC line numbers.
    pub const fn short_code(&self) -> u32 {
        self.bits & MCAUSE_CAUSE_MSK
    }

    pub fn to_trap_type(&self) -> TrapType {
        if self.is_interrupt() {
            match Interrupt::from_code(self.code()) {
                Some(Interrupt::MachineTimer) => TrapType::TimerInterrupt,
                Some(Interrupt::MachineExternal) => TrapType::ExternalInterrupt,
                _ => TrapType::LocalInterrupt(self.short_code()),
            }
        } else {
            match Exception::from_code(self.short_code()) {
                Some(Exception::UserEnvCall) | Some(Exception::MachineEnvCall) => {
                    TrapType::EnvironmentCall
                }
                _ => TrapType::Exception(self.short_code()),
            }
        }
    }
}

impl fmt::Debug for TrapCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = if self.is_interrupt() { "Interrupt" } else { "Exception" };
        write!(
            f,
            "TrapCause::{}::{:?} (code: {}, raw: {:#x})",
            class,
            self.to_trap_type(),
            self.code(),
            self.bits()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_timer_and_external_are_named_interrupts() {
        assert_eq!(TrapCause::from_bits(MCAUSE_INTERRUPT | 7).to_trap_type(), TrapType::TimerInterrupt);
        assert_eq!(TrapCause::from_bits(MCAUSE_INTERRUPT | 11).to_trap_type(), TrapType::ExternalInterrupt);
    }

    #[test]
    fn both_ecall_codes_map_to_environment_call() {
        assert_eq!(TrapCause::from_bits(8).to_trap_type(), TrapType::EnvironmentCall);
        assert_eq!(TrapCause::from_bits(11).to_trap_type(), TrapType::EnvironmentCall);
    }

    #[test]
    fn software_interrupt_falls_back_to_local_line() {
        assert_eq!(TrapCause::from_bits(MCAUSE_INTERRUPT | 3).to_trap_type(), TrapType::LocalInterrupt(3));
        assert_eq!(TrapCause::from_bits(MCAUSE_INTERRUPT | 0x1013).to_trap_type(), TrapType::LocalInterrupt(0x13));
    }

    #[test]
    fn exception_code_is_masked_to_low_field() {
        let cause = TrapCause::from_bits(0x1002);
        assert!(!cause.is_interrupt());
        assert_eq!(cause.to_trap_type(), TrapType::Exception(2));
    }

    #[test]
    fn clic_mode_sets_both_low_bits() {
        assert_eq!(TrapMode::Clic as u32, 0b11);
        assert_eq!(TrapMode::Direct as u32, 0);
    }
}
