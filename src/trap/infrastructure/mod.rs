// ibex_trapcore/src/trap/infrastructure/mod.rs

//! # Trap Infrastructure Module
//!
//! This module provides the core implementation of the trap handling subsystem.
//! It includes the low-level hardware layer, the dependency injection (DI)
//! framework, the classifier and context switch engine, and the concrete
//! collaborators they are wired to.

// The Dependency Injection (DI) framework.
pub mod di;

// Low-level hardware interaction layer. Only meaningful on the target.
#[cfg(target_arch = "riscv32")]
pub mod low_level;

// Trap servicing.
pub mod state;
pub mod classifier;
pub mod context_manager;

// Concrete collaborators.
pub mod controller;
pub mod timer;
pub mod error_manager;

// In-memory hardware for tests and self tests.
pub mod sim;

// Re-export the main initialization function for the trap system.
pub use di::initialize_trap_system;
