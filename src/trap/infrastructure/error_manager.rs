// ibex_trapcore/src/trap/infrastructure/error_manager.rs

//! # Ring-buffered Error Manager Implementation
//!
//! An implementation of the `ErrorManager` trait with a fixed hook table and
//! a `RingBuffer` log, usable from a `static` and from trap context.

use crate::config::{ERROR_HANDLER_CAPACITY, ERROR_LOG_CAPACITY};
use crate::trap::collections::RingBuffer;
use crate::trap::ds::{
    ErrorLevel, ErrorLogEntry, ErrorResult, ErrorSource, HandlerError, SystemError,
};
use crate::trap::infrastructure::di::traits::ErrorManager;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

type ErrorHandlerFn = fn(&SystemError) -> ErrorResult;

#[derive(Clone, Copy)]
struct ErrorHandlerEntry {
    priority: u8,
    source: Option<ErrorSource>,
    level: Option<ErrorLevel>,
    handler: ErrorHandlerFn,
}

impl ErrorHandlerEntry {
    fn matches(&self, error: &SystemError) -> bool {
        self.source.map_or(true, |src| src == error.code.source())
            && self.level.map_or(true, |lvl| lvl == error.code.level())
    }
}

pub struct RingErrorManager {
    // Kept sorted by priority; occupied slots come first.
    handlers: Mutex<[Option<ErrorHandlerEntry>; ERROR_HANDLER_CAPACITY]>,
    log: Mutex<RingBuffer<ErrorLogEntry, ERROR_LOG_CAPACITY>>,
    panic_mode: AtomicBool,
}

impl RingErrorManager {
    pub const fn new() -> Self {
        Self {
            handlers: Mutex::new([None; ERROR_HANDLER_CAPACITY]),
            log: Mutex::new(RingBuffer::new()),
            panic_mode: AtomicBool::new(false),
        }
    }

    /// Number of entries currently in the log.
    pub fn logged(&self) -> usize {
        self.log.lock().len()
    }
}

impl Default for RingErrorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorManager for RingErrorManager {
    fn register_handler(
        &self,
        priority: u8,
        source: Option<ErrorSource>,
        level: Option<ErrorLevel>,
        handler: ErrorHandlerFn,
    ) -> Result<(), HandlerError> {
        let mut handlers = self.handlers.lock();
        let used = handlers.iter().take_while(|slot| slot.is_some()).count();
        if used == handlers.len() {
            return Err(HandlerError::TableFull);
        }

        // Equal priorities keep registration order.
        let at = handlers[..used]
            .iter()
            .position(|slot| matches!(slot, Some(e) if e.priority > priority))
            .unwrap_or(used);
        handlers[at..=used].rotate_right(1);
        handlers[at] = Some(ErrorHandlerEntry { priority, source, level, handler });
        Ok(())
    }

    fn handle_error(&self, error: SystemError) -> ErrorResult {
        if self.is_panic_mode() && !error.code.is_fatal() {
            // Once panicking, only fatal errors reach the hooks.
            self.log_error(error, ErrorResult::Unhandled);
            return ErrorResult::Unhandled;
        }

        if error.code.is_fatal() {
            self.enter_panic_mode();
        }

        // Copy the table out so hooks may register further hooks.
        let handlers = *self.handlers.lock();
        let mut final_result = ErrorResult::Unhandled;

        for entry in handlers.iter().flatten().filter(|e| e.matches(&error)) {
            match (entry.handler)(&error) {
                ErrorResult::Handled => {
                    self.log_error(error, ErrorResult::Handled);
                    return ErrorResult::Handled;
                }
                ErrorResult::Partial => final_result = ErrorResult::Partial,
                ErrorResult::Unhandled => {}
            }
        }

        self.log_error(error, final_result);
        final_result
    }

    fn log_error(&self, error: SystemError, result: ErrorResult) {
        self.log.lock().push(ErrorLogEntry { error, result });
    }

    fn last_error(&self) -> Option<SystemError> {
        self.log.lock().back().map(|entry| entry.error)
    }

    fn is_panic_mode(&self) -> bool {
        self.panic_mode.load(Ordering::Relaxed)
    }

    fn enter_panic_mode(&self) {
        self.panic_mode.store(true, Ordering::SeqCst);
    }
}
