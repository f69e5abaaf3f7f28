//! Delta channel buffers: the history of one attribute of one object.
//!
//! A [`DeltaChannel`] keeps two append-only sequences:
//!
//! - **base frames**: keyframe samples, written on keyframe ticks when the
//!   value differs from the channel's reference (the very first base sample);
//! - **tween frames**: delta samples, written on every other tick whose value
//!   differs from the previous tick's value.
//!
//! "Differs" is bitwise (see [`ChannelValue::identical`]), so whatever is
//! resolved later is exactly what was sampled.
//!
//! Which ticks actually stored a sample is not known to the channel itself;
//! that lives in the object's [`ChangeMaskLog`](crate::mask::ChangeMaskLog).
//! The channel only keeps a read cursor into the tween sequence, moved one
//! step at a time by the scrub pass.

use crate::value::ChannelValue;

/// Where a channel's value at the seek tick comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// The tween sample under the cursor.
    Tween,
    /// The tween sample at the given index of `tween_frames`.
    TweenSlot(usize),
    /// The base sample at the given slot of `base_frames`.
    Keyframe(usize),
    /// `base_frames[0]`: the keyframe value did not differ from it.
    Reference,
}

/// Keyframe + delta history of a single attribute.
///
/// Invariant: `-1 <= tween_cursor < tween_frames.len()`.
#[derive(Debug, Clone)]
pub struct DeltaChannel<T> {
    base_frames: Vec<T>,
    tween_frames: Vec<T>,
    tween_cursor: isize,
    /// Value at the newest recorded tick, used for delta comparison.
    head: Option<T>,
}

impl<T: ChannelValue> Default for DeltaChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ChannelValue> DeltaChannel<T> {
    /// An empty channel. The cursor starts at `-1` (no delta consumed).
    pub fn new() -> Self {
        Self {
            base_frames: Vec::new(),
            tween_frames: Vec::new(),
            tween_cursor: -1,
            head: None,
        }
    }

    /// Record the live value for the tick being appended.
    ///
    /// Returns `true` when a sample was stored, which is the channel's
    /// change bit for this tick.
    pub fn record(&mut self, value: T, keyframe: bool) -> bool {
        let stored = if keyframe {
            // Keyframes compare against the reference sample, not the
            // most recent keyframe.
            let differs = self.base_frames.first().map_or(true, |r| !r.identical(&value));
            if differs {
                self.base_frames.push(value);
            }
            differs
        } else {
            let differs = self.head.map_or(true, |h| !h.identical(&value));
            if differs {
                self.tween_frames.push(value);
                self.tween_cursor += 1;
            }
            differs
        };
        self.head = Some(value);
        stored
    }

    /// Move the cursor one tween sample back.
    pub fn step_back(&mut self) {
        self.tween_cursor = (self.tween_cursor - 1).max(-1);
    }

    /// Move the cursor one tween sample forward.
    pub fn step_forward(&mut self) {
        let last = self.tween_frames.len() as isize - 1;
        self.tween_cursor = (self.tween_cursor + 1).min(last);
    }

    /// Read the value from the given source.
    ///
    /// Returns `None` only if the addressed sequence has no such entry, which
    /// cannot happen for a channel with at least one recorded tick.
    pub fn resolve(&self, source: ValueSource) -> Option<T> {
        match source {
            ValueSource::Tween => usize::try_from(self.tween_cursor)
                .ok()
                .and_then(|i| self.tween_frames.get(i))
                .copied(),
            ValueSource::TweenSlot(slot) => self.tween_frames.get(slot).copied(),
            ValueSource::Keyframe(slot) => self.base_frames.get(slot).copied(),
            ValueSource::Reference => self.base_frames.first().copied(),
        }
    }

    /// Drop every sample recorded after the truncation point.
    ///
    /// `keep_base` / `keep_tween` are the number of base and tween samples that
    /// belong to ticks at or before the new timeline head, whose value is
    /// `head`. The cursor ends on the last kept tween sample.
    pub fn truncate(&mut self, keep_base: usize, keep_tween: usize, head: Option<T>) {
        self.base_frames.truncate(keep_base);
        self.tween_frames.truncate(keep_tween);
        self.tween_cursor = self.tween_frames.len() as isize - 1;
        self.head = head;
    }

    /// Drop everything, returning the channel to its freshly created state.
    pub fn clear(&mut self) {
        self.base_frames.clear();
        self.tween_frames.clear();
        self.tween_cursor = -1;
        self.head = None;
    }

    /// Keyframe samples, oldest first.
    pub fn base_frames(&self) -> &[T] {
        &self.base_frames
    }

    /// Delta samples, oldest first.
    pub fn tween_frames(&self) -> &[T] {
        &self.tween_frames
    }

    /// Index of the tween sample at or before the seek tick, or `-1`.
    pub fn tween_cursor(&self) -> isize {
        self.tween_cursor
    }

    /// Value at the newest recorded tick.
    pub fn head(&self) -> Option<T> {
        self.head
    }

    /// Bytes held by stored samples.
    pub fn footprint_bytes(&self) -> usize {
        T::SAMPLE_BYTES * (self.base_frames.len() + self.tween_frames.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
