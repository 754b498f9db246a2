// ibex_trapcore/src/trap/infrastructure/classifier.rs

//! # Trap Classifier
//!
//! Turns the latched `mcause` into an action: the timer ISR, the external
//! controller, a yield request, or a fault the caller must escalate.

use crate::config::ECALL_INSTRUCTION_LEN;
use crate::trap::ds::{TrapFault, TrapType};
use crate::trap::infrastructure::di::traits::{HardwareController, InterruptController, TimerIsr};
use crate::trap::infrastructure::state::TrapState;

/// Services the trap currently latched in `hw`.
///
/// The In-ISR flag is held for the duration of the call and is clear again
/// when this returns, on the fault path as well.
pub fn handle_trap(
    hw: &mut dyn HardwareController,
    controller: &mut dyn InterruptController,
    timer: &mut dyn TimerIsr,
    state: &TrapState,
) -> Result<TrapType, TrapFault> {
    let _isr = state.enter_isr();
    let cause = hw.trap_cause();
    let trap_type = cause.to_trap_type();

    match trap_type {
        TrapType::TimerInterrupt => timer.timer_isr(),
        TrapType::ExternalInterrupt => controller.dispatch_pending(),
        TrapType::LocalInterrupt(code) => {
            if !controller.dispatch_local(code) {
                return Err(TrapFault::UnhandledInterrupt { cause, pc: hw.exception_pc() });
            }
        }
        TrapType::EnvironmentCall => {
            state.request_switch();
            // Resume after the ecall, not on it.
            let pc = hw.exception_pc();
            hw.set_exception_pc(pc.wrapping_add(ECALL_INSTRUCTION_LEN));
        }
        TrapType::Exception(_) => {
            return Err(TrapFault::UnhandledException {
                cause,
                pc: hw.exception_pc(),
                value: hw.trap_value(),
            });
        }
    }

    Ok(trap_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trap::ds::MCAUSE_INTERRUPT;
    use crate::trap::infrastructure::controller::{NoController, Plic};
    use crate::trap::infrastructure::sim::{SimComparator, SimPlic, SimulatedHart};
    use crate::trap::infrastructure::timer::MachineTimer;
    use core::sync::atomic::{AtomicBool, Ordering};

    static CLAIM_STATE: TrapState = TrapState::new();
    static CLAIM_SAW_ISR: AtomicBool = AtomicBool::new(false);

    fn note_isr(_source: u32) {
        CLAIM_SAW_ISR.store(CLAIM_STATE.in_isr(), Ordering::SeqCst);
    }

    fn fixtures() -> (SimulatedHart, Plic<SimPlic, 8>, MachineTimer<SimComparator>, TrapState) {
        let mut plic = Plic::new(SimPlic::new());
        plic.initialize();
        (SimulatedHart::new(), plic, MachineTimer::new(SimComparator::new()), TrapState::new())
    }

    #[test]
    fn timer_interrupt_runs_timer_isr() {
        let (mut hw, mut plic, mut timer, state) = fixtures();
        hw.raise(MCAUSE_INTERRUPT | 7, 0);
        hw.mepc = 0x8000_0040;

        let result = handle_trap(&mut hw, &mut plic, &mut timer, &state);
        assert_eq!(result, Ok(TrapType::TimerInterrupt));
        assert_eq!(timer.comparator().compare, u64::MAX);
        assert_eq!(hw.mepc, 0x8000_0040);
        assert!(!state.switch_requested());
        assert!(!state.in_isr());
    }

    #[test]
    fn external_interrupt_claims_from_controller() {
        let (mut hw, mut plic, mut timer, state) = fixtures();
        hw.raise(MCAUSE_INTERRUPT | 11, 0);

        assert_eq!(handle_trap(&mut hw, &mut plic, &mut timer, &state), Ok(TrapType::ExternalInterrupt));
        assert_eq!(plic.registers().claims, 1);
    }

    #[test]
    fn external_handler_runs_inside_isr() {
        let (mut hw, mut plic, mut timer, _) = fixtures();
        assert_eq!(plic.register(3, 2, note_isr), Ok(()));
        plic.registers_mut().pending[3] = true;
        hw.raise(MCAUSE_INTERRUPT | 11, 0);

        assert!(!CLAIM_STATE.in_isr());
        let result = handle_trap(&mut hw, &mut plic, &mut timer, &CLAIM_STATE);
        assert_eq!(result, Ok(TrapType::ExternalInterrupt));
        assert!(CLAIM_SAW_ISR.load(Ordering::SeqCst));
        assert!(!CLAIM_STATE.in_isr());
        assert_eq!(plic.registers().completed, Some(3));
    }

    #[test]
    fn ecall_requests_switch_and_skips_instruction() {
        for code in [8, 11] {
            let (mut hw, mut plic, mut timer, state) = fixtures();
            hw.raise(code, 0);
            hw.mepc = 0x8000_0100;

            assert_eq!(handle_trap(&mut hw, &mut plic, &mut timer, &state), Ok(TrapType::EnvironmentCall));
            assert_eq!(hw.mepc, 0x8000_0104);
            assert!(state.switch_requested());
        }
    }

    #[test]
    fn other_exceptions_are_faults() {
        let (mut hw, mut plic, mut timer, state) = fixtures();
        hw.raise(2, 0x0000_dead);
        hw.mepc = 0x8000_0200;

        let fault = handle_trap(&mut hw, &mut plic, &mut timer, &state).unwrap_err();
        assert_eq!(
            fault,
            TrapFault::UnhandledException {
                cause: hw.cause(),
                pc: 0x8000_0200,
                value: 0x0000_dead,
            }
        );
        assert!(!state.in_isr());
        assert!(!state.switch_requested());
    }

    #[test]
    fn unknown_interrupt_without_fallback_is_a_fault() {
        let (mut hw, _, mut timer, state) = fixtures();
        hw.raise(MCAUSE_INTERRUPT | 3, 0);

        let mut none = NoController;
        let result = handle_trap(&mut hw, &mut none, &mut timer, &state);
        assert!(matches!(result, Err(TrapFault::UnhandledInterrupt { .. })));
        assert!(!state.in_isr());
    }
}
