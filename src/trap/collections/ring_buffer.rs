// ibex_trapcore/src/trap/collections/ring_buffer.rs

//! # Fixed-Capacity Ring Buffer
//!
//! A statically sized circular queue that overwrites the oldest element
//! when full. Backed by an array so it can live in a `static`.

use core::fmt;

pub struct RingBuffer<T, const N: usize> {
    buffer: [Option<T>; N],
    head: usize,
    tail: usize,
    count: usize,
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    /// # Panics
    /// Fails to compile if `N` is 0.
    pub const fn new() -> Self {
        assert!(N > 0, "RingBuffer capacity cannot be zero");
        Self {
            buffer: [None; N],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Pushes an element, overwriting the oldest one if full.
    pub fn push(&mut self, item: T) {
        self.buffer[self.head] = Some(item);
        self.head = (self.head + 1) % N;

        if self.is_full() {
            self.tail = (self.tail + 1) % N;
        } else {
            self.count += 1;
        }
    }

    /// Removes and returns the oldest element.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.buffer[self.tail].take();
        self.tail = (self.tail + 1) % N;
        self.count -= 1;
        item
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.buffer[self.tail].as_ref()
        }
    }

    /// The newest element, just before `head`.
    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.buffer[(self.head + N - 1) % N].as_ref()
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == N
    }

    pub fn clear(&mut self) {
        for item in self.buffer.iter_mut() {
            item.take();
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> Iter<'_, T, N> {
        Iter {
            buffer: self,
            index: self.tail,
            remaining: self.count,
        }
    }
}

pub struct Iter<'a, T, const N: usize> {
    buffer: &'a RingBuffer<T, N>,
    index: usize,
    remaining: usize,
}

impl<'a, T, const N: usize> Iterator for Iter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.buffer.buffer[self.index].as_ref();
        self.index = (self.index + 1) % N;
        self.remaining -= 1;
        item
    }
}

impl<T: Copy + fmt::Debug, const N: usize> fmt::Debug for RingBuffer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
