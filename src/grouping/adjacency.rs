//! Overlap graph over one frame's surviving windows.
//!
//! Built in two parallel passes. The first counts each node's neighbors and
//! reserves a contiguous range of the shared entry array with a single
//! `fetch_add`, so ranges are disjoint and their order across nodes is
//! arbitrary. A node without neighbors still reserves one slot, which keeps
//! every offset unique. The second pass writes neighbor indices into the
//! reserved range.

use crate::detector::DetectionWindow;
use crate::error::{try_alloc, ResourceError};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// Overlap predicate: origins and far corners each within
/// `eps * (min width + min height) / 2` on both axes.
pub fn windows_overlap(a: &DetectionWindow, b: &DetectionWindow, eps: f32) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f32 * 0.5;
    let close = |p: u32, q: u32| (p as f32 - q as f32).abs() <= delta;
    close(a.x, b.x)
        && close(a.y, b.y)
        && close(a.x + a.width, b.x + b.width)
        && close(a.y + a.height, b.y + b.height)
}

/// Fixed-capacity storage for the adjacency of up to `capacity` nodes.
pub struct AdjacencyScratch {
    capacity: usize,
    counts: Vec<u32>,
    offsets: Vec<u32>,
    entries: Vec<AtomicU32>,
    cursor: AtomicUsize,
    marks: Vec<AtomicBool>,
}

impl AdjacencyScratch {
    pub fn new(capacity: usize) -> Result<Self, ResourceError> {
        let entry_count = capacity
            .checked_mul(capacity)
            .filter(|&n| n <= u32::MAX as usize)
            .ok_or(ResourceError::Allocation {
                what: "adjacency entries",
                requested: usize::MAX,
            })?;
        let mut counts = try_alloc(capacity, "adjacency counts")?;
        counts.resize(capacity, 0);
        let mut offsets = try_alloc(capacity, "adjacency offsets")?;
        offsets.resize(capacity, 0);
        let mut entries = try_alloc(entry_count, "adjacency entries")?;
        entries.resize_with(entry_count, || AtomicU32::new(0));
        let mut marks = try_alloc(capacity, "cluster marks")?;
        marks.resize_with(capacity, || AtomicBool::new(false));
        Ok(Self {
            capacity,
            counts,
            offsets,
            entries,
            cursor: AtomicUsize::new(0),
            marks,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Read-only adjacency view borrowed from an [`AdjacencyScratch`].
pub struct Adjacency<'s> {
    counts: &'s [u32],
    offsets: &'s [u32],
    entries: &'s [AtomicU32],
    marks: &'s [AtomicBool],
    edges: usize,
    reserved: usize,
}

impl<'s> Adjacency<'s> {
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn neighbor_count(&self, node: usize) -> usize {
        self.counts[node] as usize
    }

    #[inline]
    pub fn offset(&self, node: usize) -> usize {
        self.offsets[node] as usize
    }

    /// Total number of directed entries (twice the undirected edge count).
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.edges
    }

    /// Slots reserved in the entry array, including the placeholder slot of
    /// each isolated node.
    #[inline]
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self.offset(node);
        self.entries[start..start + self.neighbor_count(node)]
            .iter()
            .map(|e| e.load(Ordering::Relaxed) as usize)
    }

    /// Per-node marks used by the flood-fill clustering.
    pub(crate) fn marks(&self) -> &'s [AtomicBool] {
        self.marks
    }
}

/// Builds the overlap graph for `windows`. Windows beyond the scratch
/// capacity are ignored.
pub fn build_adjacency<'s>(
    windows: &[DetectionWindow],
    eps: f32,
    scratch: &'s mut AdjacencyScratch,
) -> Adjacency<'s> {
    let n = windows.len().min(scratch.capacity);
    let windows = &windows[..n];
    let AdjacencyScratch {
        counts,
        offsets,
        entries,
        cursor,
        marks,
        ..
    } = scratch;
    *cursor.get_mut() = 0;

    let cursor = &*cursor;
    counts[..n]
        .par_iter_mut()
        .zip(offsets[..n].par_iter_mut())
        .enumerate()
        .for_each(|(i, (count, offset))| {
            let k = neighbors_of(windows, i, eps).count();
            *count = k as u32;
            *offset = cursor.fetch_add(k.max(1), Ordering::Relaxed) as u32;
        });

    let (counts, offsets, entries) = (&counts[..n], &offsets[..n], &entries[..]);
    (0..n).into_par_iter().for_each(|i| {
        let start = offsets[i] as usize;
        for (slot, j) in entries[start..start + counts[i] as usize]
            .iter()
            .zip(neighbors_of(windows, i, eps))
        {
            slot.store(j as u32, Ordering::Relaxed);
        }
    });

    Adjacency {
        counts,
        offsets,
        entries,
        marks: &marks[..n],
        edges: counts.iter().map(|&c| c as usize).sum(),
        reserved: cursor.load(Ordering::Acquire),
    }
}

fn neighbors_of(
    windows: &[DetectionWindow],
    i: usize,
    eps: f32,
) -> impl Iterator<Item = usize> + '_ {
    let a = windows[i];
    windows
        .iter()
        .enumerate()
        .filter(move |&(j, b)| j != i && windows_overlap(&a, b, eps))
        .map(|(j, _)| j)
}
