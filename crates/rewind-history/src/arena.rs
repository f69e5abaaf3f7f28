//! Arena of per-object histories addressed by [`ObjectHandle`].
//!
//! Histories live in a slot vector indexed by the handle's slot index; the
//! stored handle carries the generation, so a recycled slot never aliases an
//! old object's history. Passes iterate slots in index order, which keeps
//! recording and scrubbing deterministic.
//!
//! Objects are not tracked the moment they ask to be. Requests go onto a
//! pending list that the rewinder drains at the start of each tick, so a
//! history never appears halfway through a pass.

use tracing::{debug, warn};

use crate::handle::ObjectHandle;
use crate::history::TrackedHistory;
use crate::RewindError;

/// Histories of every tracked object plus pending tracking requests.
#[derive(Debug, Clone, Default)]
pub struct HistoryArena {
    slots: Vec<Option<(ObjectHandle, TrackedHistory)>>,
    pending: Vec<ObjectHandle>,
    tracked: usize,
}

impl HistoryArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `handle` for tracking at the next drain.
    pub fn request_tracking(&mut self, handle: ObjectHandle) {
        if !self.pending.contains(&handle) {
            self.pending.push(handle);
        }
    }

    /// Number of tracking requests waiting for the next drain.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Allocate histories for every pending request.
    ///
    /// Requests for handles that are already tracked are ignored. A request
    /// whose slot still holds an older generation replaces that history.
    /// Returns the number of newly tracked objects.
    pub fn drain_pending(&mut self) -> usize {
        let mut added = 0;
        for handle in std::mem::take(&mut self.pending) {
            let idx = handle.index() as usize;
            if idx >= self.slots.len() {
                self.slots.resize_with(idx + 1, || None);
            }
            match &self.slots[idx] {
                Some((existing, _)) if *existing == handle => continue,
                Some((existing, _)) => {
                    warn!(old = %existing, new = %handle, "replacing history of a stale handle");
                    self.tracked -= 1;
                }
                None => {}
            }
            self.slots[idx] = Some((handle, TrackedHistory::new()));
            self.tracked += 1;
            added += 1;
            debug!(%handle, "tracking started");
        }
        added
    }

    /// Stop tracking `handle` and release its buffers.
    ///
    /// # Errors
    ///
    /// [`RewindError::StaleHandle`] if `handle` is not tracked.
    pub fn untrack(&mut self, handle: ObjectHandle) -> Result<TrackedHistory, RewindError> {
        self.pending.retain(|h| *h != handle);
        let slot = self
            .slots
            .get_mut(handle.index() as usize)
            .filter(|s| matches!(s, Some((h, _)) if *h == handle))
            .ok_or(RewindError::StaleHandle { handle })?;
        let (_, history) = slot.take().ok_or(RewindError::StaleHandle { handle })?;
        self.tracked -= 1;
        debug!(%handle, bytes = history.footprint_bytes(), "tracking stopped");
        Ok(history)
    }

    /// Whether `handle` has a history.
    pub fn is_tracked(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// History of `handle`.
    pub fn get(&self, handle: ObjectHandle) -> Option<&TrackedHistory> {
        match self.slots.get(handle.index() as usize) {
            Some(Some((h, history))) if *h == handle => Some(history),
            _ => None,
        }
    }

    /// Number of tracked objects.
    pub fn len(&self) -> usize {
        self.tracked
    }

    /// Whether no object is tracked.
    pub fn is_empty(&self) -> bool {
        self.tracked == 0
    }

    /// Tracked histories in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &TrackedHistory)> {
        self.slots.iter().flatten().map(|(h, history)| (*h, history))
    }

    /// Tracked histories in slot order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectHandle, &mut TrackedHistory)> {
        self.slots
            .iter_mut()
            .flatten()
            .map(|(h, history)| (*h, history))
    }

    /// Bytes held by every history.
    pub fn footprint_bytes(&self) -> usize {
        self.iter().map(|(_, h)| h.footprint_bytes()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
