// ibex_trapcore/src/trap/infrastructure/di/mod.rs

//! # Dependency Injection System - Global Access and Initialization
//!
//! Manages the global instance of the `TrapSystem` and provides safe
//! mechanisms for its initialization and access.

pub mod container;
pub mod traits;

use self::container::{TrapComponents, TrapSystem};
use self::traits::ErrorManager;
use crate::trap::infrastructure::state::TRAP_STATE;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::{Mutex, Once};

/// The global `TrapSystem` instance, protected by a `Mutex` for safe access.
static GLOBAL_TRAP_SYSTEM: Mutex<Option<TrapSystem<'static>>> = Mutex::new(None);

/// The installed system's error manager. Reachable without the system lock,
/// so ISR callbacks and error hooks can report errors mid-trap.
static ERROR_MANAGER: Once<&'static dyn ErrorManager> = Once::new();

/// Flag to ensure the trap system is initialized only once.
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global trap system.
///
/// Boots the hart with the given components, installs the system where the
/// trap entry can find it, and only then enables global interrupts.
///
/// # Panics
/// Panics if called more than once.
pub fn initialize_trap_system(components: TrapComponents<'static>, trap_stack_top: u32) {
    if INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_err()
    {
        panic!("Trap system already initialized!");
    }

    let errors = components.errors;
    ERROR_MANAGER.call_once(|| errors);

    let mut trap_system = TrapSystem::new(components, &TRAP_STATE);
    trap_system.boot(trap_stack_top);

    critical_section::with(|_| {
        let mut slot = GLOBAL_TRAP_SYSTEM.lock();
        *slot = Some(trap_system);
        if let Some(ts) = slot.as_mut() {
            ts.start();
        }
    });
}

/// Runs `f` on the global `TrapSystem` with interrupts masked.
///
/// Returns `None` if the trap system has not been initialized. The trap
/// path holds the same lock, so callbacks run by a trap must not call this.
pub fn with_trap_system<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut TrapSystem<'static>) -> R,
{
    critical_section::with(|_| GLOBAL_TRAP_SYSTEM.lock().as_mut().map(f))
}

/// The error manager of the installed system, if any.
pub fn error_manager() -> Option<&'static dyn ErrorManager> {
    ERROR_MANAGER.get().copied()
}

/// Services the current trap on the installed system.
///
/// Called from the trap entry with delivery already disabled by hardware.
/// Returns `false` if there is no system to run it on, or if the trap was
/// taken while non-trap code held the system.
pub fn dispatch_trap() -> bool {
    match GLOBAL_TRAP_SYSTEM.try_lock() {
        Some(mut guard) => match guard.as_mut() {
            Some(ts) => {
                ts.handle_trap();
                true
            }
            None => false,
        },
        None => false,
    }
}

/// Checks if the trap system has been initialized.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Relaxed)
}
