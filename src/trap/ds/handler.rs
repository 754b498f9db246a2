// ibex_trapcore/src/trap/ds/handler.rs

//! # Interrupt Handler Definitions
//!
//! Handler signatures for external interrupt sources and the timer, and the
//! fixed-size table the interrupt controller adapters dispatch through.

use core::fmt;

/// Handler for one external interrupt source. Receives the source number.
pub type IrqHandler = fn(source: u32);

/// Timer callback. Receives the registered argument and the channel.
pub type TimerCallback = fn(arg: usize, channel: u32);

/// Errors returned when claiming or releasing an interrupt source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerError {
    /// The source number is outside the controller's range.
    SourceOutOfRange,
    /// A handler is already registered for this source.
    SourceInUse,
    /// No handler is registered for this source.
    NotRegistered,
    /// Every slot of a fixed-size table is taken.
    TableFull,
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceOutOfRange => write!(f, "interrupt source out of range"),
            Self::SourceInUse => write!(f, "interrupt source already has a handler"),
            Self::NotRegistered => write!(f, "no handler registered for interrupt source"),
            Self::TableFull => write!(f, "handler table is full"),
        }
    }
}

/// A table of per-source handlers, indexed by source number.
pub struct HandlerTable<const N: usize> {
    handlers: [Option<IrqHandler>; N],
}

impl<const N: usize> HandlerTable<N> {
    pub const fn new() -> Self {
        Self { handlers: [None; N] }
    }

    pub fn register(&mut self, source: u32, handler: IrqHandler) -> Result<(), HandlerError> {
        let slot = self
            .handlers
            .get_mut(source as usize)
            .ok_or(HandlerError::SourceOutOfRange)?;
        if slot.is_some() {
            return Err(HandlerError::SourceInUse);
        }
        *slot = Some(handler);
        Ok(())
    }

    pub fn unregister(&mut self, source: u32) -> Result<(), HandlerError> {
        self.handlers
            .get_mut(source as usize)
            .ok_or(HandlerError::SourceOutOfRange)?
            .take()
            .map(|_| ())
            .ok_or(HandlerError::NotRegistered)
    }

    pub fn get(&self, source: u32) -> Option<IrqHandler> {
        self.handlers.get(source as usize).copied().flatten()
    }

    /// Calls the handler for `source`. Returns `false` if there is none.
    pub fn dispatch(&self, source: u32) -> bool {
        match self.get(source) {
            Some(handler) => {
                handler(source);
                true
            }
            None => false,
        }
    }
}

impl<const N: usize> Default for HandlerTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static LAST_SOURCE: AtomicU32 = AtomicU32::new(0);

    fn record(source: u32) {
        LAST_SOURCE.store(source, Ordering::SeqCst);
    }

    #[test]
    fn register_dispatch_unregister() {
        let mut table: HandlerTable<8> = HandlerTable::new();
        assert_eq!(table.register(5, record), Ok(()));
        assert_eq!(table.register(5, record), Err(HandlerError::SourceInUse));
        assert!(table.dispatch(5));
        assert_eq!(LAST_SOURCE.load(Ordering::SeqCst), 5);
        assert_eq!(table.unregister(5), Ok(()));
        assert_eq!(table.unregister(5), Err(HandlerError::NotRegistered));
        assert!(!table.dispatch(5));
    }

    #[test]
    fn out_of_range_sources_are_rejected() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        assert_eq!(table.register(4, record), Err(HandlerError::SourceOutOfRange));
        assert!(!table.dispatch(100));
    }
}
