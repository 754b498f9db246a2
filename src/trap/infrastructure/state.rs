// ibex_trapcore/src/trap/infrastructure/state.rs

//! # Process-wide Trap State
//!
//! The In-ISR flag and the context-switch request flag. Only the trap in
//! flight writes them from trap context; thread code may set the switch
//! request, which is a single atomic store and needs no masking.

use core::sync::atomic::{AtomicBool, Ordering};

pub struct TrapState {
    in_isr: AtomicBool,
    switch_request: AtomicBool,
}

/// The state the installed trap system and the public API share.
pub static TRAP_STATE: TrapState = TrapState::new();

impl TrapState {
    pub const fn new() -> Self {
        Self {
            in_isr: AtomicBool::new(false),
            switch_request: AtomicBool::new(false),
        }
    }

    pub fn in_isr(&self) -> bool {
        self.in_isr.load(Ordering::SeqCst)
    }

    /// Marks the start of trap servicing. The flag drops back to `false`
    /// when the returned guard goes out of scope, whatever path is taken.
    pub fn enter_isr(&self) -> IsrGuard<'_> {
        self.in_isr.store(true, Ordering::SeqCst);
        IsrGuard { state: self }
    }

    pub fn request_switch(&self) {
        self.switch_request.store(true, Ordering::SeqCst);
    }

    pub fn switch_requested(&self) -> bool {
        self.switch_request.load(Ordering::SeqCst)
    }

    /// Reads and clears the switch request in one step.
    pub fn take_switch_request(&self) -> bool {
        self.switch_request.swap(false, Ordering::SeqCst)
    }
}

impl Default for TrapState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct IsrGuard<'a> {
    state: &'a TrapState,
}

impl Drop for IsrGuard<'_> {
    fn drop(&mut self) {
        self.state.in_isr.store(false, Ordering::SeqCst);
    }
}
