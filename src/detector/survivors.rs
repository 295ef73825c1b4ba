//! Lock-free append buffers and the phase hand-off contract.
//!
//! Every phase appends its survivors with an increment-and-store: a writer
//! claims a slot with `fetch_add` on the cursor and stores into it. Order is
//! unspecified. Writes past capacity are dropped and show up in
//! [`AppendBuffer::dropped`]. Readers only look at a buffer after the
//! parallel section that filled it has joined.

use crate::error::{try_alloc, ResourceError};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Values that fit in one 64-bit slot.
pub trait SlotValue: Copy {
    fn to_slot(self) -> u64;
    fn from_slot(raw: u64) -> Self;
}

/// Anchor indices inside one scale's grid.
impl SlotValue for u32 {
    #[inline]
    fn to_slot(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_slot(raw: u64) -> Self {
        raw as u32
    }
}

/// Window accepted by every stage at its scale, in scanned-image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DetectionWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Packed as four 16-bit fields. Frame dimensions are validated against
/// `u16::MAX` at detector construction.
impl SlotValue for DetectionWindow {
    #[inline]
    fn to_slot(self) -> u64 {
        (self.x as u64 & 0xFFFF)
            | (self.y as u64 & 0xFFFF) << 16
            | (self.width as u64 & 0xFFFF) << 32
            | (self.height as u64 & 0xFFFF) << 48
    }

    #[inline]
    fn from_slot(raw: u64) -> Self {
        Self {
            x: (raw & 0xFFFF) as u32,
            y: (raw >> 16 & 0xFFFF) as u32,
            width: (raw >> 32 & 0xFFFF) as u32,
            height: (raw >> 48 & 0xFFFF) as u32,
        }
    }
}

pub struct AppendBuffer<T: SlotValue> {
    slots: Vec<AtomicU64>,
    cursor: AtomicUsize,
    _marker: PhantomData<T>,
}

impl<T: SlotValue> AppendBuffer<T> {
    pub fn with_capacity(capacity: usize, what: &'static str) -> Result<Self, ResourceError> {
        let mut slots = try_alloc(capacity, what)?;
        slots.resize_with(capacity, || AtomicU64::new(0));
        Ok(Self {
            slots,
            cursor: AtomicUsize::new(0),
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Appends `value`; returns `false` when the buffer is full.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        match self.slots.get(idx) {
            Some(slot) => {
                slot.store(value.to_slot(), Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.slots.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends rejected because the buffer was full.
    pub fn dropped(&self) -> usize {
        self.cursor
            .load(Ordering::Acquire)
            .saturating_sub(self.slots.len())
    }

    #[inline]
    pub fn get(&self, idx: usize) -> T {
        T::from_slot(self.slots[idx].load(Ordering::Relaxed))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(move |idx| self.get(idx))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Resets the counter; slot contents are left stale.
    pub fn clear(&mut self) {
        *self.cursor.get_mut() = 0;
    }
}

/// Launch size for the next phase, read from the previous phase's counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub work_items: usize,
}

/// Ping-pong survivor buffers for one scale.
///
/// The producing phase writes `current`. [`SurvivorBuffers::handoff`] moves
/// those survivors to `previous`, clears `current` for reuse, and returns the
/// consumer's launch size.
pub struct SurvivorBuffers {
    current: AppendBuffer<u32>,
    previous: AppendBuffer<u32>,
}

impl SurvivorBuffers {
    pub fn new(capacity: usize) -> Result<Self, ResourceError> {
        Ok(Self {
            current: AppendBuffer::with_capacity(capacity, "survivor buffer")?,
            previous: AppendBuffer::with_capacity(capacity, "survivor buffer")?,
        })
    }

    #[inline]
    pub fn current(&self) -> &AppendBuffer<u32> {
        &self.current
    }

    #[inline]
    pub fn previous(&self) -> &AppendBuffer<u32> {
        &self.previous
    }

    pub fn handoff(&mut self) -> Dispatch {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.clear();
        Dispatch {
            work_items: self.previous.len(),
        }
    }

    pub fn reset(&mut self) {
        self.current.clear();
        self.previous.clear();
    }

    pub fn capacity(&self) -> usize {
        self.current.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn concurrent_pushes_land_in_distinct_slots() {
        let buffer = AppendBuffer::<u32>::with_capacity(10_000, "test").expect("alloc");
        (0..10_000u32).into_par_iter().for_each(|v| {
            assert!(buffer.push(v));
        });
        let mut values = buffer.to_vec();
        values.sort_unstable();
        assert_eq!(values, (0..10_000).collect::<Vec<_>>());
        assert_eq!(buffer.dropped(), 0);
    }

    #[test]
    fn overflow_is_counted_not_stored() {
        let buffer = AppendBuffer::<u32>::with_capacity(4, "test").expect("alloc");
        let accepted = (0..10u32).filter(|&v| buffer.push(v)).count();
        assert_eq!(accepted, 4);
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.dropped(), 6);
    }

    #[test]
    fn detection_windows_pack_into_one_slot() {
        let window = DetectionWindow {
            x: 65_535,
            y: 1,
            width: 300,
            height: 4_096,
        };
        assert_eq!(DetectionWindow::from_slot(window.to_slot()), window);
    }

    #[test]
    fn handoff_moves_survivors_and_recycles_buffer() {
        let mut buffers = SurvivorBuffers::new(8).expect("alloc");
        for v in [3u32, 5, 7] {
            buffers.current().push(v);
        }
        let dispatch = buffers.handoff();
        assert_eq!(dispatch, Dispatch { work_items: 3 });
        assert!(buffers.current().is_empty());
        assert_eq!(buffers.previous().to_vec(), vec![3, 5, 7]);

        buffers.current().push(5);
        assert_eq!(buffers.handoff().work_items, 1);
        assert_eq!(buffers.previous().to_vec(), vec![5]);

        buffers.reset();
        assert!(buffers.current().is_empty() && buffers.previous().is_empty());
    }
}
