// ibex_trapcore/src/trap/infrastructure/di/container.rs

//! # Trap System Dependency Injection Container
//!
//! Defines the `TrapSystem` struct, which acts as the central container
//! for everything a trap touches: the hart, the scheduler, the interrupt
//! controller, the timer, the context strategy and the error manager.

use super::traits::{
    ContextStrategy, ErrorManager, HardwareController, InterruptController, Scheduler, TimerIsr,
};
use crate::error_print;
use crate::trap::ds::{RegisterContext, ThreadId, TrapFault, TrapMode, TrapType};
use crate::trap::infrastructure::classifier;
use crate::trap::infrastructure::context_manager::{switch_context, SwitchOutcome};
use crate::trap::infrastructure::state::TrapState;

/// The collaborators a `TrapSystem` is built from.
pub struct TrapComponents<'a> {
    pub hardware: &'a mut dyn HardwareController,
    pub scheduler: &'a mut dyn Scheduler,
    pub controller: &'a mut dyn InterruptController,
    pub timer: &'a mut dyn TimerIsr,
    pub strategy: &'a dyn ContextStrategy,
    pub errors: &'a dyn ErrorManager,
}

pub struct TrapSystem<'a> {
    hardware: &'a mut dyn HardwareController,
    scheduler: &'a mut dyn Scheduler,
    controller: &'a mut dyn InterruptController,
    timer: &'a mut dyn TimerIsr,
    strategy: &'a dyn ContextStrategy,
    errors: &'a dyn ErrorManager,
    state: &'a TrapState,
}

/// Trap vector mode matching the compiled-in controller.
pub const fn trap_mode() -> TrapMode {
    if cfg!(feature = "clic") {
        TrapMode::Clic
    } else {
        TrapMode::Direct
    }
}

impl<'a> TrapSystem<'a> {
    /// Creates a new `TrapSystem` by injecting its dependencies.
    pub fn new(components: TrapComponents<'a>, state: &'a TrapState) -> Self {
        Self {
            hardware: components.hardware,
            scheduler: components.scheduler,
            controller: components.controller,
            timer: components.timer,
            strategy: components.strategy,
            errors: components.errors,
            state,
        }
    }

    /// Brings the hart to the point where only the global interrupt enable
    /// is missing. `trap_stack_top` is where the trap banks' stack starts.
    pub fn boot(&mut self, trap_stack_top: u32) {
        let gp = self.hardware.global_pointer();
        for ctx in RegisterContext::TRAP_BANKS {
            let mut bank = self.hardware.read_bank(ctx);
            bank.sp = trap_stack_top;
            bank.gp = gp;
            self.hardware.write_bank(ctx, &bank);
        }

        self.hardware.init_trap_vector(trap_mode());
        self.hardware.clear_interrupt_enables();
        self.controller.initialize();
        self.hardware.enable_external_interrupts();
        self.hardware.set_default_status();
    }

    /// Turns on global interrupt delivery. Call after `boot`.
    pub fn start(&mut self) {
        self.hardware.enable_interrupts();
    }

    /// Classifies the latched trap and runs the switch decision.
    ///
    /// A fault is returned before any register state is changed by the
    /// engine; the caller decides how to stop.
    pub fn service_trap(&mut self) -> Result<(TrapType, SwitchOutcome), TrapFault> {
        let trap_type = classifier::handle_trap(
            &mut *self.hardware,
            &mut *self.controller,
            &mut *self.timer,
            self.state,
        )?;

        let prev = self.scheduler.active_thread();
        let outcome = switch_context(
            &mut *self.hardware,
            &mut *self.scheduler,
            self.strategy,
            self.state,
            prev,
        )?;
        Ok((trap_type, outcome))
    }

    /// The trap body run by the entry stub. Faults do not return.
    pub fn handle_trap(&mut self) {
        if let Err(fault) = self.service_trap() {
            self.escalate(fault);
        }
    }

    /// Reports `fault` and halts the hart.
    pub fn escalate(&mut self, fault: TrapFault) -> ! {
        let error = fault.to_system_error();
        if cfg!(feature = "develhelp") {
            error_print!("{}", fault);
            error_print!(
                "mcause={:#x} mepc={:#x} mtval={:#x}",
                self.hardware.trap_cause().bits(),
                self.hardware.exception_pc(),
                self.hardware.trap_value()
            );
        }
        self.errors.handle_error(error);
        self.hardware.halt()
    }

    /// Provides access to the `HardwareController`.
    pub fn hardware_controller(&mut self) -> &mut dyn HardwareController {
        &mut *self.hardware
    }

    pub fn scheduler(&mut self) -> &mut dyn Scheduler {
        &mut *self.scheduler
    }

    pub fn state(&self) -> &TrapState {
        self.state
    }

    /// Sets up a fresh thread with the configured context strategy.
    pub fn prepare_thread(&mut self, id: ThreadId, stack_top: u32, entry: u32, arg: u32, exit: u32) -> bool {
        match self.scheduler.thread(id) {
            Some(thread) => {
                self.strategy
                    .prepare(&mut *self.hardware, thread, stack_top, entry, arg, exit);
                true
            }
            None => false,
        }
    }
}
