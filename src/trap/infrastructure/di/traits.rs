// ibex_trapcore/src/trap/infrastructure/di/traits.rs

//! # Dependency Injection Traits
//!
//! The interfaces between the trap core and everything it does not own:
//! the hart's CSRs and register banks, the scheduler, the external
//! interrupt controller, the timer peripheral and the error sink.
//! All of them are object safe so the `TrapSystem` can hold trait objects.

use crate::trap::ds::{
    self, ContextFrame, ErrorLevel, HandlerError, ErrorResult, ErrorSource, RegisterContext, RegisterFile,
    SystemError, ThreadDescriptor, ThreadId, TrapCause,
};

/// Interface for Hardware Control.
///
/// Everything the core needs from the hart. The RISC-V implementation is
/// `LowLevelHardwareController`; the simulator implements it in memory.
pub trait HardwareController: Send {
    /// Installs the trap entry stub into `mtvec`.
    fn init_trap_vector(&mut self, mode: ds::TrapMode);

    /// Clears every bit of `mie`.
    fn clear_interrupt_enables(&mut self);

    /// Sets `mie.MEIP`.
    fn enable_external_interrupts(&mut self);

    /// Establishes the boot-time `mstatus` (previous mode M, MPIE set).
    fn set_default_status(&mut self);

    /// Enables global interrupt delivery.
    /// Returns `true` if interrupts were previously enabled.
    fn enable_interrupts(&mut self) -> bool;

    /// Disables global interrupt delivery.
    /// Returns `true` if interrupts were previously enabled.
    fn disable_interrupts(&mut self) -> bool;

    /// Restores the state returned by `enable_interrupts`/`disable_interrupts`.
    fn restore_interrupts(&mut self, was_enabled: bool);

    fn interrupts_enabled(&self) -> bool;

    /// `mcause` of the trap being serviced.
    fn trap_cause(&self) -> TrapCause;

    /// `mepc`: where the interrupted context resumes.
    fn exception_pc(&self) -> u32;

    fn set_exception_pc(&mut self, pc: u32);

    /// `mtval`: the exception-specific trap value.
    fn trap_value(&self) -> u32;

    /// The global pointer of the running image.
    fn global_pointer(&self) -> u32;

    fn read_bank(&self, ctx: RegisterContext) -> RegisterFile;

    fn write_bank(&mut self, ctx: RegisterContext, regs: &RegisterFile);

    /// Reads the context frame stored at `addr`.
    ///
    /// `addr` must come from a thread descriptor, i.e. point at a frame
    /// previously written by `write_frame` or by thread preparation.
    fn read_frame(&self, addr: u32) -> ContextFrame;

    /// Writes a context frame at `addr`, which must lie inside the owning
    /// thread's stack.
    fn write_frame(&mut self, addr: u32, frame: &ContextFrame);

    /// Stops the hart for good.
    fn halt(&mut self) -> !;
}

/// Interface to the external scheduler.
///
/// The core only asks it to pick the next thread and to hand out the
/// descriptor of a thread by id.
pub trait Scheduler: Send {
    /// The thread currently considered running, if any.
    fn active_thread(&self) -> Option<ThreadId>;

    /// Selects the next runnable thread. Returns `true` if the active
    /// thread may have changed.
    fn run(&mut self) -> bool;

    fn thread(&mut self, id: ThreadId) -> Option<&mut ThreadDescriptor>;
}

/// Interface for the external interrupt controller.
pub trait InterruptController: Send {
    /// Programs thresholds and enables. Safe to call more than once.
    fn initialize(&mut self);

    /// Delivers the highest-priority pending external interrupt to its
    /// handler. Nothing pending is not an error.
    fn dispatch_pending(&mut self);

    /// Delivers an interrupt line that is neither the timer nor the external
    /// interrupt. Returns `false` when the controller cannot take it.
    fn dispatch_local(&mut self, code: u32) -> bool {
        let _ = code;
        false
    }
}

/// Interface to the timer peripheral's interrupt service routine.
pub trait TimerIsr: Send {
    fn timer_isr(&mut self);
}

/// The context save/restore capability.
///
/// `save` captures the live register bank into the thread, `load` puts a
/// thread back into the live bank. Implementations must restore exactly
/// what they saved.
pub trait ContextStrategy: Sync {
    fn save(&self, hw: &mut dyn HardwareController, thread: &mut ThreadDescriptor);

    fn load(&self, hw: &mut dyn HardwareController, thread: &mut ThreadDescriptor);

    /// Sets up a fresh thread so that its first `load` starts `entry(arg)`
    /// on a stack ending at `stack_top`, returning into `exit`.
    fn prepare(
        &self,
        hw: &mut dyn HardwareController,
        thread: &mut ThreadDescriptor,
        stack_top: u32,
        entry: u32,
        arg: u32,
        exit: u32,
    );
}

/// Interface for the Error Manager.
pub trait ErrorManager: Sync {
    /// Registers an error hook. Hooks run in ascending priority order.
    fn register_handler(
        &self,
        priority: u8,
        source: Option<ErrorSource>,
        level: Option<ErrorLevel>,
        handler: fn(&SystemError) -> ErrorResult,
    ) -> Result<(), HandlerError>;

    /// Runs the hooks for `error` and logs the outcome.
    fn handle_error(&self, error: SystemError) -> ErrorResult;

    fn log_error(&self, error: SystemError, result: ErrorResult);

    /// The most recently logged error.
    fn last_error(&self) -> Option<SystemError>;

    fn is_panic_mode(&self) -> bool;

    fn enter_panic_mode(&self);
}
