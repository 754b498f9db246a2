// ibex_trapcore/src/trap/mod.rs

//! # RISC-V Trap and Context Switch Subsystem
//!
//! Owns the machine trap vector of an Ibex-class core: it classifies every
//! trap, services the timer and external interrupt lines, turns `ecall` into
//! a yield, and swaps thread register state when the scheduler asks for it.
//! Faults it cannot service are reported and end in a halt.

// Make submodules accessible within the trap crate.
pub mod collections;
pub mod ds;
pub mod infrastructure;
mod api;

// Publicly re-export the entire API module.
pub use self::api::*;

// Re-export key data structures that users of the API might need directly.
pub use self::ds::{
    TrapType, TrapMode, Interrupt, Exception, TrapCause,        // Core trap types
    RegisterFile, ContextFrame, RegisterContext,                 // Register state
    ThreadDescriptor, ThreadId, CONTEXT_FRAME_SIZE,              // Thread bookkeeping
    IrqHandler, TimerCallback, HandlerError,                     // Handler signatures
    SystemError, ErrorCode, ErrorSource, ErrorLevel, ErrorResult, // Error structures
    TrapFault,
};

pub use self::infrastructure::di::container::{TrapComponents, TrapSystem};
pub use self::infrastructure::di::traits::{
    ContextStrategy, ErrorManager, HardwareController, InterruptController, Scheduler, TimerIsr,
};
pub use self::infrastructure::context_manager::{
    DefaultContextStrategy, RegisterBankSwitch, StackFrameSwitch, SwitchOutcome, DEFAULT_STRATEGY,
};
pub use self::infrastructure::controller::{Clic, ClicRegisters, NoController, Plic, PlicRegisters};
pub use self::infrastructure::error_manager::RingErrorManager;
pub use self::infrastructure::timer::{Comparator, MachineTimer};

/// Initializes the entire trap subsystem.
///
/// Must be called once during kernel startup with interrupts still off. The
/// hart is booted with `components` (trap banks, vector, `mie`, controller,
/// `mstatus`), the system is installed for the trap entry, and global
/// interrupts are enabled last.
///
/// # Arguments
/// * `components` - The collaborators the trap path runs on.
/// * `trap_stack_top` - Initial `sp` of the exception, IRQ and ECALL banks.
pub fn init(components: TrapComponents<'static>, trap_stack_top: u32) -> Result<(), TrapApiError> {
    if infrastructure::di::is_initialized() {
        return Err(TrapApiError::AlreadyInitialized);
    }
    infrastructure::di::initialize_trap_system(components, trap_stack_top);
    crate::info_print!("Trap subsystem initialized.");
    Ok(())
}
