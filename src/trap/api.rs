// ibex_trapcore/src/trap/api.rs

//! # Public API for the Trap Subsystem
//!
//! Provides a stable, unified interface for scheduler and application code:
//! the context-switch request flag, ISR state, global interrupt control and
//! the error hooks that run before a fatal trap halts the hart.

use crate::trap::ds::{ErrorLevel, ErrorResult, ErrorSource, SystemError};
use crate::trap::infrastructure::di;
use crate::trap::infrastructure::state::TRAP_STATE;

/// Errors that can occur when interacting with the Trap API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapApiError {
    SystemNotInitialized,
    AlreadyInitialized,
    RegistrationFailed,
}

impl core::fmt::Display for TrapApiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SystemNotInitialized => write!(f, "Trap system has not been initialized."),
            Self::AlreadyInitialized => write!(f, "Trap system is already initialized."),
            Self::RegistrationFailed => write!(f, "Error handler registration failed."),
        }
    }
}

/// Asks for a context switch at the end of the current or next trap.
pub fn request_context_switch() {
    TRAP_STATE.request_switch();
}

/// Whether a context switch is pending.
pub fn context_switch_requested() -> bool {
    TRAP_STATE.switch_requested()
}

/// `true` while a trap is being classified.
pub fn irq_is_in() -> bool {
    TRAP_STATE.in_isr()
}

/// Lets the scheduler run another thread.
///
/// From trap context the switch is deferred to the end of the trap; from
/// thread context an `ecall` enters the trap immediately.
#[cfg(target_arch = "riscv32")]
pub fn yield_higher() {
    if irq_is_in() {
        request_context_switch();
    } else {
        crate::trap::infrastructure::low_level::ecall();
    }
}

/// Enables machine-level interrupts. Returns the previous state.
#[cfg(target_arch = "riscv32")]
pub fn enable_interrupts() -> bool {
    crate::trap::infrastructure::low_level::enable_interrupts()
}

/// Disables machine-level interrupts. Returns the previous state.
#[cfg(target_arch = "riscv32")]
pub fn disable_interrupts() -> bool {
    crate::trap::infrastructure::low_level::disable_interrupts()
}

/// Restores global interrupt state.
#[cfg(target_arch = "riscv32")]
pub fn restore_interrupts(was_enabled: bool) {
    crate::trap::infrastructure::low_level::restore_interrupts(was_enabled);
}

#[cfg(target_arch = "riscv32")]
pub fn interrupts_enabled() -> bool {
    crate::trap::infrastructure::low_level::interrupts_enabled()
}

// --- Error Handling API ---
//
// These go straight to the error manager, not through the system lock, so
// timer callbacks, interrupt handlers and error hooks may call them.

type ErrorHandlerFn = fn(&SystemError) -> ErrorResult;

/// Registers a hook run on every reported error, before a fatal trap halts.
/// Lower `priority` values run first.
pub fn register_error_handler(
    priority: u8,
    source: Option<ErrorSource>,
    level: Option<ErrorLevel>,
    handler: ErrorHandlerFn,
) -> Result<(), TrapApiError> {
    di::error_manager()
        .ok_or(TrapApiError::SystemNotInitialized)?
        .register_handler(priority, source, level, handler)
        .map_err(|_| TrapApiError::RegistrationFailed)
}

/// Reports a system error to be handled by the error management system.
pub fn report_system_error(error: SystemError) -> ErrorResult {
    di::error_manager().map_or(ErrorResult::Unhandled, |errors| errors.handle_error(error))
}

/// The most recently logged error, if any.
pub fn last_error() -> Option<SystemError> {
    di::error_manager().and_then(|errors| errors.last_error())
}

pub fn is_initialized() -> bool {
    di::is_initialized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trap::ds::{ErrorCode, RegisterContext, CONTEXT_FRAME_SIZE, MCAUSE_INTERRUPT};
    use crate::trap::infrastructure::context_manager::StackFrameSwitch;
    use crate::trap::infrastructure::controller::Plic;
    use crate::trap::infrastructure::di::container::TrapComponents;
    use crate::trap::infrastructure::di::with_trap_system;
    use crate::trap::infrastructure::error_manager::RingErrorManager;
    use crate::trap::infrastructure::sim::{
        SimComparator, SimPlic, SimScheduler, SimulatedHart, SIM_MEMORY_BASE,
    };
    use crate::trap::infrastructure::timer::MachineTimer;
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::boxed::Box;

    static CAUSE: AtomicU32 = AtomicU32::new(0);
    static TICK_SAW_ISR: AtomicBool = AtomicBool::new(false);
    static TICK_REPORTED: AtomicBool = AtomicBool::new(false);

    const T0_SP: u32 = SIM_MEMORY_BASE + 0x400;
    const T1_STACK: u32 = SIM_MEMORY_BASE + 0x800;
    const T1_ENTRY: u32 = 0x2000_0400;

    fn leak<T>(value: T) -> &'static mut T {
        Box::leak(Box::new(value))
    }

    fn partial_hook(_: &SystemError) -> ErrorResult {
        ErrorResult::Partial
    }

    fn late_tick() -> SystemError {
        SystemError::new(
            ErrorCode::new(ErrorSource::Context, ErrorLevel::Warning, 2),
            "tick overran",
            0,
            None,
            0,
        )
    }

    // Runs with the system lock held by the trap path.
    fn report_from_tick(_arg: usize, _channel: u32) {
        TICK_SAW_ISR.store(irq_is_in(), Ordering::SeqCst);
        let result = report_system_error(late_tick());
        let logged = last_error() == Some(late_tick());
        let hooked = register_error_handler(9, Some(ErrorSource::Context), None, partial_hook).is_ok();
        TICK_REPORTED.store(result == ErrorResult::Partial && logged && hooked, Ordering::SeqCst);
    }

    fn tick() -> bool {
        CAUSE.store(MCAUSE_INTERRUPT | 7, Ordering::SeqCst);
        di::dispatch_trap()
    }

    // Everything touching the global system lives in this one test so
    // parallel test threads never observe each other's state.
    #[test]
    fn installed_system_services_traps_and_api_calls() {
        assert!(!is_initialized());
        assert_eq!(
            register_error_handler(0, None, None, partial_hook),
            Err(TrapApiError::SystemNotInitialized)
        );
        assert_eq!(last_error(), None);
        assert!(!di::dispatch_trap());

        let timer = leak(MachineTimer::new(SimComparator::new()));
        timer.set_callback(report_from_tick, 0);

        let scheduler = leak(SimScheduler::<2>::new());
        scheduler.set_active(Some(0));
        scheduler.select_next(1);

        di::initialize_trap_system(
            TrapComponents {
                hardware: leak(SimulatedHart::with_cause_latch(&CAUSE)),
                scheduler,
                controller: leak(Plic::<SimPlic, 4>::new(SimPlic::new())),
                timer,
                strategy: &StackFrameSwitch,
                errors: leak(RingErrorManager::new()),
            },
            SIM_MEMORY_BASE + 0x1000,
        );
        assert!(is_initialized());
        assert_eq!(register_error_handler(0, None, None, partial_hook), Ok(()));

        let prepared = with_trap_system(|ts| {
            assert!(ts.hardware_controller().interrupts_enabled());
            let hw = ts.hardware_controller();
            let mut live = hw.read_bank(RegisterContext::Normal);
            live.sp = T0_SP;
            hw.write_bank(RegisterContext::Normal, &live);
            hw.set_exception_pc(0x100);
            ts.prepare_thread(1, T1_STACK, T1_ENTRY, 0, 0)
        });
        assert_eq!(prepared, Some(true));

        // No request pending: the tick leaves the running thread alone. Its
        // callback reports through the error API while the trap is in flight.
        assert!(tick());
        assert!(!irq_is_in());
        assert!(TICK_SAW_ISR.load(Ordering::SeqCst));
        assert!(TICK_REPORTED.load(Ordering::SeqCst));
        assert_eq!(last_error(), Some(late_tick()));
        assert_eq!(with_trap_system(|ts| ts.hardware_controller().exception_pc()), Some(0x100));
        assert_eq!(with_trap_system(|ts| ts.scheduler().active_thread()), Some(Some(0)));

        // A request from thread code is honoured on the next trap.
        request_context_switch();
        assert!(context_switch_requested());
        assert!(tick());
        assert!(!context_switch_requested());
        assert_eq!(with_trap_system(|ts| ts.scheduler().active_thread()), Some(Some(1)));
        assert_eq!(
            with_trap_system(|ts| ts.scheduler().thread(0).map(|t| t.sp)),
            Some(Some(T0_SP - CONTEXT_FRAME_SIZE))
        );
        assert_eq!(
            with_trap_system(|ts| ts.hardware_controller().exception_pc()),
            Some(T1_ENTRY)
        );

        let reported = SystemError::new(
            ErrorCode::new(ErrorSource::Context, ErrorLevel::Warning, 1),
            "late wakeup",
            0,
            None,
            0,
        );
        assert_eq!(report_system_error(reported), ErrorResult::Partial);
        assert_eq!(last_error(), Some(reported));
    }
}
