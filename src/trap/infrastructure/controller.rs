// ibex_trapcore/src/trap/infrastructure/controller.rs

//! # Interrupt Controller Adapters
//!
//! `InterruptController` implementations for the two controller styles the
//! core can be wired to, plus a no-op stand-in. Register access goes through
//! small traits so the dispatch logic runs the same against MMIO and the
//! simulator.

use crate::trap::ds::{HandlerError, HandlerTable, IrqHandler};
use crate::trap::infrastructure::di::traits::InterruptController;

/// Register interface of a priority-vectored (PLIC-style) controller.
/// Source 0 is reserved and means "nothing pending".
pub trait PlicRegisters: Send {
    fn num_sources(&self) -> u32;
    fn set_priority(&mut self, source: u32, priority: u32);
    fn set_enabled(&mut self, source: u32, enabled: bool);
    fn set_threshold(&mut self, threshold: u32);
    /// Claims the highest-priority pending source.
    fn claim(&mut self) -> u32;
    fn complete(&mut self, source: u32);
}

/// Register interface of a level-vectored (CLIC-style) controller.
pub trait ClicRegisters: Send {
    fn num_lines(&self) -> u32;
    fn set_enabled(&mut self, line: u32, enabled: bool);
    fn set_threshold(&mut self, threshold: u32);
}

/// Adapter for a PLIC-style controller with `N` handler slots.
pub struct Plic<R: PlicRegisters, const N: usize> {
    regs: R,
    handlers: HandlerTable<N>,
}

impl<R: PlicRegisters, const N: usize> Plic<R, N> {
    pub const fn new(regs: R) -> Self {
        Self { regs, handlers: HandlerTable::new() }
    }

    /// Attaches `handler` to `source` and unmasks it at `priority`.
    pub fn register(&mut self, source: u32, priority: u32, handler: IrqHandler) -> Result<(), HandlerError> {
        if source == 0 || source >= self.regs.num_sources() {
            return Err(HandlerError::SourceOutOfRange);
        }
        self.handlers.register(source, handler)?;
        self.regs.set_priority(source, priority);
        self.regs.set_enabled(source, true);
        Ok(())
    }

    pub fn unregister(&mut self, source: u32) -> Result<(), HandlerError> {
        self.handlers.unregister(source)?;
        self.regs.set_enabled(source, false);
        Ok(())
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }
}

impl<R: PlicRegisters, const N: usize> InterruptController for Plic<R, N> {
    fn initialize(&mut self) {
        for source in 1..self.regs.num_sources() {
            let live = self.handlers.get(source).is_some();
            self.regs.set_enabled(source, live);
            if !live {
                self.regs.set_priority(source, 0);
            }
        }
        self.regs.set_threshold(0);
    }

    fn dispatch_pending(&mut self) {
        let source = self.regs.claim();
        if source == 0 {
            // Spurious: another claim already took it.
            return;
        }
        if !self.handlers.dispatch(source) {
            // Nobody owns this source; mask it so it cannot storm.
            self.regs.set_enabled(source, false);
        }
        self.regs.complete(source);
    }
}

/// Adapter for a CLIC-style controller. Lines arrive through `mcause`.
pub struct Clic<R: ClicRegisters, const N: usize> {
    regs: R,
    handlers: HandlerTable<N>,
}

impl<R: ClicRegisters, const N: usize> Clic<R, N> {
    pub const fn new(regs: R) -> Self {
        Self { regs, handlers: HandlerTable::new() }
    }

    pub fn register(&mut self, line: u32, handler: IrqHandler) -> Result<(), HandlerError> {
        if line >= self.regs.num_lines() {
            return Err(HandlerError::SourceOutOfRange);
        }
        self.handlers.register(line, handler)?;
        self.regs.set_enabled(line, true);
        Ok(())
    }

    pub fn unregister(&mut self, line: u32) -> Result<(), HandlerError> {
        self.handlers.unregister(line)?;
        self.regs.set_enabled(line, false);
        Ok(())
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }
}

impl<R: ClicRegisters, const N: usize> InterruptController for Clic<R, N> {
    fn initialize(&mut self) {
        for line in 0..self.regs.num_lines() {
            let live = self.handlers.get(line).is_some();
            self.regs.set_enabled(line, live);
        }
        self.regs.set_threshold(0);
    }

    fn dispatch_pending(&mut self) {}

    fn dispatch_local(&mut self, code: u32) -> bool {
        self.handlers.dispatch(code)
    }
}

/// For boards without an external interrupt controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoController;

impl InterruptController for NoController {
    fn initialize(&mut self) {}

    fn dispatch_pending(&mut self) {}
}
