//! Fixed-Size Circular Buffer for Measurement Smoothing
//!
//! ## Overview
//!
//! Each probe keeps a short rolling window of its most recent valid
//! measurements and publishes their mean. The window has a compile-time
//! capacity via const generics; the oldest entry is overwritten once the
//! buffer is full, so it never grows.
//!
//! ```rust
//! use aquaguard_core::buffer::{CircularBuffer, TimestampedValue};
//!
//! let mut window: CircularBuffer<4> = CircularBuffer::new();
//! window.push(TimestampedValue { value: 1.0, timestamp: 1000 });
//! window.push(TimestampedValue { value: 3.0, timestamp: 2000 });
//!
//! assert_eq!(window.mean(), Some(2.0));
//! assert_eq!(window.last().map(|r| r.timestamp), Some(2000));
//! ```

use crate::time::Timestamp;

/// Single value with the time it was taken
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimestampedValue {
    pub value: f32,
    pub timestamp: Timestamp,
}

/// Rolling window of the last `N` values
///
/// `head < N` and `len <= N`; iteration runs oldest to newest.
#[derive(Debug, Clone)]
pub struct CircularBuffer<const N: usize> {
    slots: [Option<TimestampedValue>; N],
    /// Slot the next push writes
    head: usize,
    len: usize,
}

impl<const N: usize> CircularBuffer<N> {
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            head: 0,
            len: 0,
        }
    }

    /// Adds a value, overwriting the oldest one when full
    pub fn push(&mut self, reading: TimestampedValue) {
        if N == 0 {
            return;
        }

        self.slots[self.head] = Some(reading);
        self.head = (self.head + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Capacity of the buffer
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recent value
    pub fn last(&self) -> Option<&TimestampedValue> {
        if self.is_empty() {
            return None;
        }

        self.slots[(self.head + N - 1) % N].as_ref()
    }

    /// Arithmetic mean of the stored values
    pub fn mean(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }

        let sum: f32 = self.iter().map(|r| r.value).sum();
        Some(sum / self.len as f32)
    }

    /// Iterate over values from oldest to newest
    pub fn iter(&self) -> CircularBufferIter<'_, N> {
        CircularBufferIter {
            buffer: self,
            index: 0,
        }
    }

    /// Clear all values
    pub fn clear(&mut self) {
        self.slots = [None; N];
        self.head = 0;
        self.len = 0;
    }

    /// Value by logical index (0 = oldest, len-1 = newest)
    fn get(&self, index: usize) -> Option<&TimestampedValue> {
        if index >= self.len {
            return None;
        }

        // Until the window fills, slot 0 holds the oldest value
        let oldest = if self.len < N { 0 } else { self.head };
        self.slots[(oldest + index) % N].as_ref()
    }
}

pub struct CircularBufferIter<'a, const N: usize> {
    buffer: &'a CircularBuffer<N>,
    index: usize,
}

impl<'a, const N: usize> Iterator for CircularBufferIter<'a, N> {
    type Item = &'a TimestampedValue;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }
}

impl<const N: usize> Default for CircularBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: f32, timestamp: Timestamp) -> TimestampedValue {
        TimestampedValue { value, timestamp }
    }

    #[test]
    fn starts_empty() {
        let buffer: CircularBuffer<5> = CircularBuffer::default();
        assert_eq!((buffer.len(), buffer.capacity()), (0, 5));
        assert!(buffer.last().is_none());
        assert!(buffer.mean().is_none());
    }

    #[test]
    fn oldest_values_are_overwritten() {
        let mut buffer = CircularBuffer::<3>::new();
        for step in 0..5u64 {
            buffer.push(at(step as f32, step * 1000));
        }
        assert!(buffer.is_full());

        let values: heapless::Vec<f32, 3> = buffer.iter().map(|r| r.value).collect();
        assert_eq!(values.as_slice(), &[2.0, 3.0, 4.0]);
        assert_eq!(buffer.last().unwrap().value, 4.0);
    }

    #[test]
    fn mean_tracks_window() {
        let mut buffer = CircularBuffer::<2>::new();
        buffer.push(at(10.0, 1));
        assert_eq!(buffer.mean(), Some(10.0));

        buffer.push(at(20.0, 2));
        buffer.push(at(40.0, 3));
        assert_eq!(buffer.mean(), Some(30.0));
    }

    #[test]
    fn clear_resets() {
        let mut buffer = CircularBuffer::<2>::new();
        buffer.push(at(1.0, 1));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.iter().count(), 0);
    }
}
