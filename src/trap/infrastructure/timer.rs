// ibex_trapcore/src/trap/infrastructure/timer.rs

//! # Machine Timer Service
//!
//! The timer side of trap handling: the comparator is disarmed, the
//! registered callback runs, and the interrupt is unmasked again. Programming
//! the next deadline is the callback's business.

use crate::trap::ds::TimerCallback;
use crate::trap::infrastructure::di::traits::TimerIsr;

/// Timer channel reported to callbacks. The machine timer has one.
pub const TIMER_CHANNEL: u32 = 0;

/// Access to a 64-bit `mtimecmp` comparator and its interrupt enable.
pub trait Comparator: Send {
    fn set_compare(&mut self, value: u64);

    /// Sets or clears `mie.MTIP`.
    fn set_interrupt_enabled(&mut self, enabled: bool);
}

/// The machine timer with one callback slot.
pub struct MachineTimer<C: Comparator> {
    comparator: C,
    callback: Option<(TimerCallback, usize)>,
}

impl<C: Comparator> MachineTimer<C> {
    pub const fn new(comparator: C) -> Self {
        Self { comparator, callback: None }
    }

    /// Registers the function run on every timer interrupt, together with
    /// the argument it is called with. Replaces any earlier registration.
    pub fn set_callback(&mut self, callback: TimerCallback, arg: usize) {
        self.callback = Some((callback, arg));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    pub fn comparator_mut(&mut self) -> &mut C {
        &mut self.comparator
    }
}

impl<C: Comparator> TimerIsr for MachineTimer<C> {
    fn timer_isr(&mut self) {
        self.comparator.set_interrupt_enabled(false);
        // Park the comparator so the line stays quiet until rearmed.
        self.comparator.set_compare(u64::MAX);

        if let Some((callback, arg)) = self.callback {
            callback(arg, TIMER_CHANNEL);
        }

        self.comparator.set_interrupt_enabled(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trap::infrastructure::sim::{ComparatorLatch, SimComparator};
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use spin::Mutex;

    static CALLS: AtomicU32 = AtomicU32::new(0);
    static LAST_ARG: AtomicUsize = AtomicUsize::new(0);

    fn on_tick(arg: usize, channel: u32) {
        assert_eq!(channel, TIMER_CHANNEL);
        CALLS.fetch_add(1, Ordering::SeqCst);
        LAST_ARG.store(arg, Ordering::SeqCst);
    }

    #[test]
    fn isr_parks_comparator_and_runs_callback() {
        let mut timer = MachineTimer::new(SimComparator::new());
        timer.comparator_mut().compare = 1000;
        timer.set_callback(on_tick, 0x55);

        let before = CALLS.load(Ordering::SeqCst);
        timer.timer_isr();

        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
        assert_eq!(LAST_ARG.load(Ordering::SeqCst), 0x55);
        assert_eq!(timer.comparator().compare, u64::MAX);
        assert!(timer.comparator().enabled);
    }

    static LATCH: ComparatorLatch = ComparatorLatch::new();
    static SEEN: Mutex<Option<(u64, bool)>> = Mutex::new(None);

    fn observe(_arg: usize, _channel: u32) {
        *SEEN.lock() = Some(LATCH.get());
    }

    #[test]
    fn callback_runs_on_parked_and_masked_comparator() {
        let mut timer = MachineTimer::new(SimComparator::with_latch(&LATCH));
        timer.comparator_mut().set_compare(5000);
        timer.set_callback(observe, 0);

        timer.timer_isr();

        assert_eq!(*SEEN.lock(), Some((u64::MAX, false)));
        assert_eq!(LATCH.get(), (u64::MAX, true));
    }

    #[test]
    fn isr_without_callback_still_rearms_line() {
        let mut timer = MachineTimer::new(SimComparator::new());
        timer.comparator_mut().enabled = false;
        timer.timer_isr();
        assert!(timer.comparator().enabled);
        assert_eq!(timer.comparator().compare, u64::MAX);
    }
}
