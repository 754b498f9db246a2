// ibex_trapcore/src/trap/collections/mod.rs

//! # Collections for the Trap Subsystem
//!
//! Allocation-free containers usable from trap context.

pub mod ring_buffer;

pub use self::ring_buffer::RingBuffer;
