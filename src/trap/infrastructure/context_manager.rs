// ibex_trapcore/src/trap/infrastructure/context_manager.rs

//! # Context Switch Engine
//!
//! Decides, once per trap, whether the running thread is replaced, and
//! moves register state between the live bank and thread descriptors.
//! Two save/restore strategies are provided; `DefaultContextStrategy` picks
//! one at compile time.

use crate::trap::ds::{
    align_stack, ContextFrame, RegisterContext, ThreadDescriptor, ThreadId, TrapFault,
    CONTEXT_FRAME_SIZE,
};
use crate::trap::infrastructure::di::traits::{ContextStrategy, HardwareController, Scheduler};
use crate::trap::infrastructure::state::TrapState;

/// What the engine did for one trap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The interrupted context resumes unchanged.
    Resumed,
    /// `to` resumes; `from` was saved if there was one.
    Switched { from: Option<ThreadId>, to: ThreadId },
}

/// Runs the context switch decision for the trap being serviced.
///
/// `prev` is the thread that was active when the trap arrived, captured
/// before the scheduler is consulted.
pub fn switch_context(
    hw: &mut dyn HardwareController,
    scheduler: &mut dyn Scheduler,
    strategy: &dyn ContextStrategy,
    state: &TrapState,
    prev: Option<ThreadId>,
) -> Result<SwitchOutcome, TrapFault> {
    if !state.take_switch_request() || !scheduler.run() {
        return Ok(SwitchOutcome::Resumed);
    }

    let next = match scheduler.active_thread() {
        Some(next) if Some(next) != prev => next,
        _ => return Ok(SwitchOutcome::Resumed),
    };

    if let Some(prev_id) = prev {
        let pc = hw.exception_pc();
        let thread = scheduler
            .thread(prev_id)
            .ok_or(TrapFault::UnknownThread { id: prev_id, pc })?;
        strategy.save(hw, thread);
    }

    let pc = hw.exception_pc();
    let thread = scheduler
        .thread(next)
        .ok_or(TrapFault::UnknownThread { id: next, pc })?;
    strategy.load(hw, thread);

    Ok(SwitchOutcome::Switched { from: prev, to: next })
}

/// Saves a thread as a frame carved just below its live stack pointer.
///
/// While the thread is suspended, `ThreadDescriptor::sp` is the frame
/// address and the frame belongs to that descriptor alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct StackFrameSwitch;

impl ContextStrategy for StackFrameSwitch {
    fn save(&self, hw: &mut dyn HardwareController, thread: &mut ThreadDescriptor) {
        let live = hw.read_bank(RegisterContext::Normal);
        let frame_addr = live.sp.wrapping_sub(CONTEXT_FRAME_SIZE);

        let mut frame = ContextFrame::new();
        frame.copy_tracked_from(&live);
        frame.pc = hw.exception_pc();
        hw.write_frame(frame_addr, &frame);

        thread.sp = frame_addr;
    }

    fn load(&self, hw: &mut dyn HardwareController, thread: &mut ThreadDescriptor) {
        let frame = hw.read_frame(thread.sp);
        let mut live = hw.read_bank(RegisterContext::Normal);

        live.copy_tracked_from(&frame);
        live.sp = thread.sp.wrapping_add(CONTEXT_FRAME_SIZE);
        hw.write_bank(RegisterContext::Normal, &live);
        hw.set_exception_pc(frame.pc);
    }

    fn prepare(
        &self,
        hw: &mut dyn HardwareController,
        thread: &mut ThreadDescriptor,
        stack_top: u32,
        entry: u32,
        arg: u32,
        exit: u32,
    ) {
        let frame_addr = align_stack(stack_top).wrapping_sub(CONTEXT_FRAME_SIZE);

        let mut frame = ContextFrame::new();
        frame.pc = entry;
        frame.a0 = arg;
        frame.ra = exit;
        hw.write_frame(frame_addr, &frame);

        thread.sp = frame_addr;
    }
}

/// Saves a thread into the register bank embedded in its descriptor.
/// `pc` travels in `bank.pc`; `sp` mirrors `bank.sp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegisterBankSwitch;

impl ContextStrategy for RegisterBankSwitch {
    fn save(&self, hw: &mut dyn HardwareController, thread: &mut ThreadDescriptor) {
        let live = hw.read_bank(RegisterContext::Normal);

        thread.bank.copy_tracked_from(&live);
        thread.bank.sp = live.sp;
        thread.bank.pc = hw.exception_pc();
        thread.sp = live.sp;
    }

    fn load(&self, hw: &mut dyn HardwareController, thread: &mut ThreadDescriptor) {
        let mut live = hw.read_bank(RegisterContext::Normal);

        live.copy_tracked_from(&thread.bank);
        live.sp = thread.bank.sp;
        hw.write_bank(RegisterContext::Normal, &live);
        hw.set_exception_pc(thread.bank.pc);
    }

    fn prepare(
        &self,
        _hw: &mut dyn HardwareController,
        thread: &mut ThreadDescriptor,
        stack_top: u32,
        entry: u32,
        arg: u32,
        exit: u32,
    ) {
        let sp = align_stack(stack_top);

        thread.bank = ContextFrame::new();
        thread.bank.pc = entry;
        thread.bank.a0 = arg;
        thread.bank.ra = exit;
        thread.bank.sp = sp;
        thread.sp = sp;
    }
}

#[cfg(not(feature = "bank-switch"))]
pub type DefaultContextStrategy = StackFrameSwitch;

#[cfg(feature = "bank-switch")]
pub type DefaultContextStrategy = RegisterBankSwitch;

/// The strategy installed by `trap::init` unless the board supplies its own.
pub static DEFAULT_STRATEGY: DefaultContextStrategy = DefaultContextStrategy {};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trap::ds::{RegisterFile, FRAME_WORDS};
    use crate::trap::infrastructure::sim::{SimScheduler, SimulatedHart, SIM_MEMORY_BASE};

    const STACK_A: u32 = SIM_MEMORY_BASE + 0x400;
    const STACK_B: u32 = SIM_MEMORY_BASE + 0x800;
    const ENTRY_A: u32 = 0x2000_0100;
    const ENTRY_B: u32 = 0x2000_0200;

    fn filled(seed: u32) -> RegisterFile {
        let mut words = [0u32; FRAME_WORDS];
        for (i, w) in words.iter_mut().enumerate() {
            *w = seed.wrapping_mul(0x0101_0101).wrapping_add(i as u32);
        }
        RegisterFile::from_words(&words)
    }

    /// Live bank as thread A would have it: arbitrary registers, its own sp,
    /// the shared gp/tp of the hart.
    fn running_as(hw: &mut SimulatedHart, seed: u32, sp: u32, pc: u32) -> RegisterFile {
        let mut regs = filled(seed);
        let live = hw.read_bank(RegisterContext::Normal);
        regs.sp = sp;
        regs.gp = live.gp;
        regs.tp = live.tp;
        regs.pc = live.pc;
        hw.write_bank(RegisterContext::Normal, &regs);
        hw.set_exception_pc(pc);
        regs
    }

    fn round_trip_with(strategy: &dyn ContextStrategy) {
        let mut hw = SimulatedHart::new();
        let mut a = ThreadDescriptor::new();
        let mut b = ThreadDescriptor::new();
        strategy.prepare(&mut hw, &mut b, STACK_B, ENTRY_B, 7, 0);

        let regs_a = running_as(&mut hw, 0xA5, STACK_A - 0x40, 0x2000_0144);

        strategy.save(&mut hw, &mut a);
        strategy.load(&mut hw, &mut b);
        assert_eq!(hw.exception_pc(), ENTRY_B);
        assert_eq!(hw.read_bank(RegisterContext::Normal).a0, 7);
        assert_eq!(hw.read_bank(RegisterContext::Normal).sp, STACK_B);

        let regs_b = running_as(&mut hw, 0x5A, STACK_B - 0x20, 0x2000_0222);
        strategy.save(&mut hw, &mut b);
        strategy.load(&mut hw, &mut a);

        assert_eq!(hw.read_bank(RegisterContext::Normal), regs_a);
        assert_eq!(hw.exception_pc(), 0x2000_0144);

        strategy.save(&mut hw, &mut a);
        strategy.load(&mut hw, &mut b);
        assert_eq!(hw.read_bank(RegisterContext::Normal), regs_b);
        assert_eq!(hw.exception_pc(), 0x2000_0222);
    }

    #[test]
    fn stack_frame_round_trip_restores_every_register() {
        round_trip_with(&StackFrameSwitch);
    }

    #[test]
    fn register_bank_round_trip_restores_every_register() {
        round_trip_with(&RegisterBankSwitch);
    }

    #[test]
    fn default_strategy_round_trip() {
        round_trip_with(&DEFAULT_STRATEGY);
    }

    #[test]
    fn stack_frame_is_carved_below_live_sp() {
        let mut hw = SimulatedHart::new();
        let mut a = ThreadDescriptor::new();
        running_as(&mut hw, 1, STACK_A, 0x2000_0010);

        StackFrameSwitch.save(&mut hw, &mut a);
        assert_eq!(a.sp, STACK_A - CONTEXT_FRAME_SIZE);
        assert_eq!(hw.read_frame(a.sp).pc, 0x2000_0010);

        StackFrameSwitch.load(&mut hw, &mut a);
        assert_eq!(hw.read_bank(RegisterContext::Normal).sp, STACK_A);
    }

    #[test]
    fn prepared_frame_starts_on_aligned_stack() {
        let mut hw = SimulatedHart::new();
        let mut t = ThreadDescriptor::new();
        StackFrameSwitch.prepare(&mut hw, &mut t, STACK_A + 0xc, ENTRY_A, 3, 0x2000_0ff0);
        assert_eq!(t.sp, STACK_A - CONTEXT_FRAME_SIZE);

        StackFrameSwitch.load(&mut hw, &mut t);
        let live = hw.read_bank(RegisterContext::Normal);
        assert_eq!(live.sp, STACK_A);
        assert_eq!(live.a0, 3);
        assert_eq!(live.ra, 0x2000_0ff0);
        assert_eq!(hw.exception_pc(), ENTRY_A);
    }

    #[test]
    #[should_panic(expected = "outside simulated memory")]
    fn prepare_below_frame_size_wraps_instead_of_overflowing() {
        let mut hw = SimulatedHart::new();
        let mut t = ThreadDescriptor::new();
        // The frame address wraps to the top of the address space, which the
        // simulated hart then refuses as a write target.
        StackFrameSwitch.prepare(&mut hw, &mut t, 0x40, ENTRY_A, 0, 0);
    }

    #[test]
    fn engine_resumes_without_request() {
        let state = TrapState::new();
        let mut hw = SimulatedHart::new();
        let mut sched: SimScheduler<2> = SimScheduler::new();
        sched.set_active(Some(0));
        sched.select_next(1);
        let before = running_as(&mut hw, 9, STACK_A, ENTRY_A);

        let outcome = switch_context(&mut hw, &mut sched, &StackFrameSwitch, &state, Some(0));
        assert_eq!(outcome, Ok(SwitchOutcome::Resumed));
        assert_eq!(sched.runs(), 0);
        assert_eq!(hw.read_bank(RegisterContext::Normal), before);
        assert_eq!(hw.exception_pc(), ENTRY_A);
    }

    #[test]
    fn engine_leaves_frames_alone_when_scheduler_keeps_thread() {
        let state = TrapState::new();
        let mut hw = SimulatedHart::new();
        let mut sched: SimScheduler<2> = SimScheduler::new();
        sched.set_active(Some(0));
        let before = running_as(&mut hw, 9, STACK_A, ENTRY_A);

        state.request_switch();
        let outcome = switch_context(&mut hw, &mut sched, &StackFrameSwitch, &state, Some(0));
        assert_eq!(outcome, Ok(SwitchOutcome::Resumed));
        assert_eq!(sched.runs(), 1);
        assert!(!state.switch_requested());
        assert_eq!(sched.thread(0).map(|t| t.sp), Some(0));
        assert_eq!(hw.read_bank(RegisterContext::Normal), before);
    }

    #[test]
    fn cold_boot_loads_first_thread_without_saving() {
        let state = TrapState::new();
        let mut hw = SimulatedHart::new();
        let mut sched: SimScheduler<2> = SimScheduler::new();
        if let Some(t) = sched.thread(1) {
            StackFrameSwitch.prepare(&mut hw, t, STACK_B, ENTRY_B, 0, 0);
        }
        sched.select_next(1);
        state.request_switch();

        let outcome = switch_context(&mut hw, &mut sched, &StackFrameSwitch, &state, None);
        assert_eq!(outcome, Ok(SwitchOutcome::Switched { from: None, to: 1 }));
        assert_eq!(hw.exception_pc(), ENTRY_B);
        assert_eq!(hw.read_bank(RegisterContext::Normal).sp, STACK_B);
    }

    #[test]
    fn unknown_thread_is_a_fault() {
        let state = TrapState::new();
        let mut hw = SimulatedHart::new();
        let mut sched: SimScheduler<1> = SimScheduler::new();
        sched.select_next(5);
        state.request_switch();

        let outcome = switch_context(&mut hw, &mut sched, &StackFrameSwitch, &state, None);
        assert!(matches!(outcome, Err(TrapFault::UnknownThread { id: 5, .. })));
    }
}
