//! Stable object handles for tracked simulation objects.
//!
//! An [`ObjectHandle`] packs a *generation* counter in the high 32 bits and a
//! slot *index* in the low 32 bits. Histories in the
//! [`HistoryArena`](crate::arena::HistoryArena) are addressed by handle, never
//! by pointer, so growing a channel buffer can never invalidate another
//! object's reference to its own history. Recycling a slot bumps its
//! generation, which turns every outstanding handle to the old occupant stale.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// ObjectHandle
// ---------------------------------------------------------------------------

/// A generational handle to a simulation object.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    /// Construct a handle from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// HandleAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`ObjectHandle`]s with generational tracking.
///
/// Free slots are reused in FIFO order so generations spread across slots
/// instead of piling up on one hot index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_indices: VecDeque<u32>,
}

impl HandleAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle, recycling a free slot when one exists.
    pub fn allocate(&mut self) -> ObjectHandle {
        if let Some(index) = self.free_indices.pop_front() {
            // Generation was already bumped on release.
            self.alive[index as usize] = true;
            ObjectHandle::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            ObjectHandle::new(index, 0)
        }
    }

    /// Release a handle so its slot can be recycled.
    ///
    /// Returns `false` if the handle was already released or is stale.
    pub fn release(&mut self, handle: ObjectHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        let idx = handle.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(handle.index());
        true
    }

    /// Whether `handle` refers to a live slot with a matching generation.
    pub fn is_alive(&self, handle: ObjectHandle) -> bool {
        let idx = handle.index() as usize;
        idx < self.generations.len()
            && self.alive[idx]
            && self.generations[idx] == handle.generation()
    }

    /// Number of live handles.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
