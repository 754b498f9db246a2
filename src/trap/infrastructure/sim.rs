// ibex_trapcore/src/trap/infrastructure/sim.rs

//! # Simulated Hart
//!
//! In-memory stand-ins for the hart, the scheduler, the PLIC and the timer
//! comparator. The unit tests and the on-device self tests drive the real
//! classifier and context switch engine against these.

use crate::config::{MIP_MEIP, MSTATUS_DEFAULT, MSTATUS_MIE};
use crate::trap::ds::{
    ContextFrame, RegisterContext, RegisterFile, ThreadDescriptor, ThreadId, TrapCause,
    TrapMode, FRAME_WORDS,
};
use crate::trap::infrastructure::controller::PlicRegisters;
use crate::trap::infrastructure::di::traits::{HardwareController, Scheduler};
use crate::trap::infrastructure::timer::Comparator;
use core::sync::atomic::{AtomicU32, Ordering};
use spin::Mutex;

/// Lowest address of simulated RAM.
pub const SIM_MEMORY_BASE: u32 = 0x8000_0000;

/// Size of simulated RAM in words.
pub const SIM_MEMORY_WORDS: usize = 1024;

/// Global pointer value the simulated image runs with.
pub const SIM_GLOBAL_POINTER: u32 = 0x8000_0800;

const TRACE_CAPACITY: usize = 32;

/// A hardware-visible action, recorded in the order it happened.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HwEvent {
    TrapVector(TrapMode),
    ClearInterruptEnables,
    EnableExternalInterrupts,
    DefaultStatus,
    EnableInterrupts,
    DisableInterrupts,
    ControllerInitialized,
    Halt,
}

/// A shared, bounded event log. Events past the capacity are dropped.
pub struct SimTrace {
    events: Mutex<([Option<HwEvent>; TRACE_CAPACITY], usize)>,
}

impl SimTrace {
    pub const fn new() -> Self {
        Self { events: Mutex::new(([None; TRACE_CAPACITY], 0)) }
    }

    pub fn record(&self, event: HwEvent) {
        let mut guard = self.events.lock();
        let (events, len) = &mut *guard;
        if *len < TRACE_CAPACITY {
            events[*len] = Some(event);
            *len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the first occurrence of `event`.
    pub fn position(&self, event: HwEvent) -> Option<usize> {
        let guard = self.events.lock();
        guard.0[..guard.1].iter().position(|e| *e == Some(event))
    }
}

impl Default for SimTrace {
    fn default() -> Self {
        Self::new()
    }
}

/// A hart whose CSRs, register banks and RAM live in plain memory.
pub struct SimulatedHart {
    banks: [RegisterFile; 4],
    memory: [u32; SIM_MEMORY_WORDS],
    pub mcause: u32,
    pub mepc: u32,
    pub mtval: u32,
    pub mstatus: u32,
    pub mie: u32,
    pub mtvec: Option<TrapMode>,
    trace: Option<&'static SimTrace>,
    cause_latch: Option<&'static AtomicU32>,
}

impl SimulatedHart {
    pub fn new() -> Self {
        let mut banks = [RegisterFile::new(); 4];
        for bank in banks.iter_mut() {
            bank.gp = SIM_GLOBAL_POINTER;
        }
        Self {
            banks,
            memory: [0; SIM_MEMORY_WORDS],
            mcause: 0,
            mepc: 0,
            mtval: 0,
            mstatus: 0,
            mie: 0,
            mtvec: None,
            trace: None,
            cause_latch: None,
        }
    }

    pub fn with_trace(trace: &'static SimTrace) -> Self {
        let mut hart = Self::new();
        hart.trace = Some(trace);
        hart
    }

    /// A hart whose `mcause` is read from `latch`, so a test can raise traps
    /// after the hart has been handed to an installed system.
    pub fn with_cause_latch(latch: &'static AtomicU32) -> Self {
        let mut hart = Self::new();
        hart.cause_latch = Some(latch);
        hart
    }

    /// Latches a trap as the hardware would before entering the vector.
    pub fn raise(&mut self, cause: u32, mtval: u32) {
        self.mcause = cause;
        self.mtval = mtval;
    }

    pub fn cause(&self) -> TrapCause {
        TrapCause::from_bits(self.mcause)
    }

    fn record(&self, event: HwEvent) {
        if let Some(trace) = self.trace {
            trace.record(event);
        }
    }

    fn word_index(addr: u32) -> usize {
        assert!(addr % 4 == 0, "unaligned frame address {:#x}", addr);
        let index = addr.wrapping_sub(SIM_MEMORY_BASE) as usize / 4;
        assert!(
            index + FRAME_WORDS <= SIM_MEMORY_WORDS,
            "frame address {:#x} outside simulated memory",
            addr
        );
        index
    }
}

impl Default for SimulatedHart {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareController for SimulatedHart {
    fn init_trap_vector(&mut self, mode: TrapMode) {
        self.mtvec = Some(mode);
        self.record(HwEvent::TrapVector(mode));
    }

    fn clear_interrupt_enables(&mut self) {
        self.mie = 0;
        self.record(HwEvent::ClearInterruptEnables);
    }

    fn enable_external_interrupts(&mut self) {
        self.mie |= MIP_MEIP;
        self.record(HwEvent::EnableExternalInterrupts);
    }

    fn set_default_status(&mut self) {
        self.mstatus |= MSTATUS_DEFAULT;
        self.record(HwEvent::DefaultStatus);
    }

    fn enable_interrupts(&mut self) -> bool {
        let was = self.mstatus & MSTATUS_MIE != 0;
        self.mstatus |= MSTATUS_MIE;
        self.record(HwEvent::EnableInterrupts);
        was
    }

    fn disable_interrupts(&mut self) -> bool {
        let was = self.mstatus & MSTATUS_MIE != 0;
        self.mstatus &= !MSTATUS_MIE;
        self.record(HwEvent::DisableInterrupts);
        was
    }

    fn restore_interrupts(&mut self, was_enabled: bool) {
        if was_enabled {
            self.mstatus |= MSTATUS_MIE;
        }
    }

    fn interrupts_enabled(&self) -> bool {
        self.mstatus & MSTATUS_MIE != 0
    }

    fn trap_cause(&self) -> TrapCause {
        match self.cause_latch {
            Some(latch) => TrapCause::from_bits(latch.load(Ordering::SeqCst)),
            None => TrapCause::from_bits(self.mcause),
        }
    }

    fn exception_pc(&self) -> u32 {
        self.mepc
    }

    fn set_exception_pc(&mut self, pc: u32) {
        self.mepc = pc;
    }

    fn trap_value(&self) -> u32 {
        self.mtval
    }

    fn global_pointer(&self) -> u32 {
        SIM_GLOBAL_POINTER
    }

    fn read_bank(&self, ctx: RegisterContext) -> RegisterFile {
        self.banks[ctx as usize]
    }

    fn write_bank(&mut self, ctx: RegisterContext, regs: &RegisterFile) {
        self.banks[ctx as usize] = *regs;
    }

    fn read_frame(&self, addr: u32) -> ContextFrame {
        let index = Self::word_index(addr);
        let mut words = [0u32; FRAME_WORDS];
        words.copy_from_slice(&self.memory[index..index + FRAME_WORDS]);
        ContextFrame::from_words(&words)
    }

    fn write_frame(&mut self, addr: u32, frame: &ContextFrame) {
        let index = Self::word_index(addr);
        self.memory[index..index + FRAME_WORDS].copy_from_slice(&frame.to_words());
    }

    fn halt(&mut self) -> ! {
        self.record(HwEvent::Halt);
        panic!("hart halted (mcause {:#x}, mepc {:#x})", self.mcause, self.mepc);
    }
}

/// A scheduler with a fixed thread table whose next choice is scripted.
pub struct SimScheduler<const N: usize> {
    threads: [ThreadDescriptor; N],
    active: Option<ThreadId>,
    next: Option<ThreadId>,
    runs: usize,
}

impl<const N: usize> SimScheduler<N> {
    pub const fn new() -> Self {
        Self {
            threads: [ThreadDescriptor::new(); N],
            active: None,
            next: None,
            runs: 0,
        }
    }

    pub fn set_active(&mut self, id: Option<ThreadId>) {
        self.active = id;
    }

    /// The thread the next `run` will pick.
    pub fn select_next(&mut self, id: ThreadId) {
        self.next = Some(id);
    }

    pub fn runs(&self) -> usize {
        self.runs
    }
}

impl<const N: usize> Default for SimScheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Scheduler for SimScheduler<N> {
    fn active_thread(&self) -> Option<ThreadId> {
        self.active
    }

    fn run(&mut self) -> bool {
        self.runs += 1;
        match self.next.take() {
            Some(next) if Some(next) != self.active => {
                self.active = Some(next);
                true
            }
            _ => false,
        }
    }

    fn thread(&mut self, id: ThreadId) -> Option<&mut ThreadDescriptor> {
        self.threads.get_mut(id)
    }
}

const SIM_PLIC_SOURCES: usize = 8;

/// PLIC registers backed by arrays. Claims hand out the highest-priority
/// pending, enabled source above the threshold.
pub struct SimPlic {
    pub priority: [u32; SIM_PLIC_SOURCES],
    pub enabled: [bool; SIM_PLIC_SOURCES],
    pub pending: [bool; SIM_PLIC_SOURCES],
    pub threshold: u32,
    pub claims: usize,
    pub completed: Option<u32>,
    trace: Option<&'static SimTrace>,
}

impl SimPlic {
    pub const fn new() -> Self {
        Self {
            priority: [0; SIM_PLIC_SOURCES],
            enabled: [false; SIM_PLIC_SOURCES],
            pending: [false; SIM_PLIC_SOURCES],
            threshold: 0xff,
            claims: 0,
            completed: None,
            trace: None,
        }
    }

    pub const fn with_trace(trace: &'static SimTrace) -> Self {
        let mut plic = Self::new();
        plic.trace = Some(trace);
        plic
    }
}

impl Default for SimPlic {
    fn default() -> Self {
        Self::new()
    }
}

impl PlicRegisters for SimPlic {
    fn num_sources(&self) -> u32 {
        SIM_PLIC_SOURCES as u32
    }

    fn set_priority(&mut self, source: u32, priority: u32) {
        self.priority[source as usize] = priority;
    }

    fn set_enabled(&mut self, source: u32, enabled: bool) {
        self.enabled[source as usize] = enabled;
    }

    fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
        if let Some(trace) = self.trace {
            trace.record(HwEvent::ControllerInitialized);
        }
    }

    fn claim(&mut self) -> u32 {
        self.claims += 1;
        let best = (1..SIM_PLIC_SOURCES)
            .filter(|&s| self.pending[s] && self.enabled[s] && self.priority[s] > self.threshold)
            .max_by_key(|&s| (self.priority[s], core::cmp::Reverse(s)));
        match best {
            Some(source) => {
                self.pending[source] = false;
                source as u32
            }
            None => 0,
        }
    }

    fn complete(&mut self, source: u32) {
        self.completed = Some(source);
    }
}

/// Shared copy of a comparator's `(compare, enabled)` state, readable from
/// a timer callback while the ISR still owns the comparator.
#[derive(Debug)]
pub struct ComparatorLatch(Mutex<(u64, bool)>);

impl ComparatorLatch {
    pub const fn new() -> Self {
        Self(Mutex::new((0, true)))
    }

    pub fn get(&self) -> (u64, bool) {
        *self.0.lock()
    }
}

impl Default for ComparatorLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer comparator that remembers what was programmed.
#[derive(Debug)]
pub struct SimComparator {
    pub compare: u64,
    pub enabled: bool,
    latch: Option<&'static ComparatorLatch>,
}

impl SimComparator {
    pub const fn new() -> Self {
        Self { compare: 0, enabled: true, latch: None }
    }

    /// A comparator that mirrors every write into `latch`.
    pub fn with_latch(latch: &'static ComparatorLatch) -> Self {
        let mut comparator = Self::new();
        comparator.latch = Some(latch);
        comparator.publish();
        comparator
    }

    fn publish(&self) {
        if let Some(latch) = self.latch {
            *latch.0.lock() = (self.compare, self.enabled);
        }
    }
}

impl Default for SimComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparator for SimComparator {
    fn set_compare(&mut self, value: u64) {
        self.compare = value;
        self.publish();
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.publish();
    }
}
