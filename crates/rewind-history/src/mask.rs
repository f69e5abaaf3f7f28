//! Per-tick change masks.
//!
//! Every recorded tick appends one [`ChangeBits`] value per tracked object.
//! A set bit means the channel stored a sample on that tick; a clear bit means
//! the value was identical to what the channel already held and nothing was
//! stored. Seeking relies on this log to know which samples belong to which
//! tick, since the channels themselves only hold values.
//!
//! Ticks are 1-based: tick `t` lives at index `t - 1`.

use bitflags::bitflags;

bitflags! {
    /// Which channels stored a sample on a given tick.
    #[derive(Default)]
    pub struct ChangeBits: u8 {
        /// Horizontal position changed.
        const X_POSITION = 1 << 0;
        /// Vertical position changed.
        const Y_POSITION = 1 << 1;
        /// Animation frame index changed.
        const ANIMATION_FRAME = 1 << 2;
        /// Animation timer changed.
        const ANIMATION_TIMER = 1 << 3;
        /// Velocity changed.
        const VELOCITY = 1 << 4;
    }
}

/// Whether local tick `tick` (1-based) is a keyframe tick for `period`.
#[inline]
pub(crate) fn is_keyframe_tick(tick: u32, period: u32) -> bool {
    (tick - 1) % period == 0
}

/// Index of the keyframe window containing `tick`: `floor((tick - 1) / period)`.
#[inline]
pub(crate) fn keyframe_index(tick: u32, period: u32) -> u32 {
    (tick - 1) / period
}

/// First tick of keyframe window `index`.
#[inline]
pub(crate) fn keyframe_tick(index: u32, period: u32) -> u32 {
    index * period + 1
}

// ---------------------------------------------------------------------------
// ChangeMaskLog
// ---------------------------------------------------------------------------

/// Ordered sequence of change masks, one per recorded tick.
#[derive(Debug, Clone, Default)]
pub struct ChangeMaskLog {
    masks: Vec<ChangeBits>,
}

impl ChangeMaskLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the mask of the next tick.
    pub fn push(&mut self, bits: ChangeBits) {
        self.masks.push(bits);
    }

    /// Mask of tick `tick` (1-based), or `None` past the end.
    pub fn get(&self, tick: u32) -> Option<ChangeBits> {
        let index = (tick as usize).checked_sub(1)?;
        self.masks.get(index).copied()
    }

    /// Whether tick `tick` stored a sample for `bit`.
    pub fn changed(&self, tick: u32, bit: ChangeBits) -> bool {
        self.get(tick).is_some_and(|m| m.contains(bit))
    }

    /// Number of recorded ticks.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Keep the first `ticks` masks, dropping the rest in place.
    pub fn truncate(&mut self, ticks: usize) {
        self.masks.truncate(ticks);
    }

    /// Drop every mask.
    pub fn clear(&mut self) {
        self.masks.clear();
    }

    /// All masks, oldest first.
    pub fn as_slice(&self) -> &[ChangeBits] {
        &self.masks
    }

    /// Whether any non-keyframe tick in `(from, to]` stored a sample for `bit`.
    ///
    /// Used with `from` set to a keyframe tick to ask whether the window holds
    /// a tween sample at or before `to`.
    pub(crate) fn tween_stored_in(&self, bit: ChangeBits, from: u32, to: u32) -> bool {
        let start = from as usize;
        let end = (to as usize).min(self.masks.len());
        start < end && self.masks[start..end].iter().any(|m| m.contains(bit))
    }

    /// Number of keyframe ticks among `1..=up_to` that stored a base sample
    /// for `bit`. This is the length of the channel's `base_frames` prefix
    /// belonging to those ticks.
    pub(crate) fn base_samples_through(&self, bit: ChangeBits, up_to: u32, period: u32) -> usize {
        let end = (up_to as usize).min(self.masks.len());
        self.masks[..end]
            .iter()
            .step_by(period as usize)
            .filter(|m| m.contains(bit))
            .count()
    }

    /// Number of non-keyframe ticks among `1..=up_to` that stored a tween
    /// sample for `bit`.
    pub(crate) fn tween_samples_through(&self, bit: ChangeBits, up_to: u32, period: u32) -> usize {
        let end = (up_to as usize).min(self.masks.len());
        self.masks[..end]
            .iter()
            .enumerate()
            .filter(|(i, m)| i % period as usize != 0 && m.contains(bit))
            .count()
    }

    /// Bytes held by the log (one byte per tick).
    pub fn footprint_bytes(&self) -> usize {
        self.masks.len() * std::mem::size_of::<ChangeBits>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const K: u32 = 120;

    #[test]
    fn keyframe_mapping_follows_window_boundaries() {
        assert!(is_keyframe_tick(1, K));
        assert!(!is_keyframe_tick(2, K));
        assert!(!is_keyframe_tick(120, K));
        assert!(is_keyframe_tick(121, K));
        assert_eq!(keyframe_index(1, K), 0);
        assert_eq!(keyframe_index(120, K), 0);
        assert_eq!(keyframe_index(121, K), 1);
        assert_eq!(keyframe_index(240, K), 1);
        assert_eq!(keyframe_index(241, K), 2);
        assert_eq!(keyframe_tick(2, K), 241);
        assert_eq!(keyframe_tick(keyframe_index(200, K), K), 121);
        assert!(is_keyframe_tick(241, K));
    }

    #[test]
    fn get_is_one_based() {
        let mut log = ChangeMaskLog::new();
        log.push(ChangeBits::X_POSITION);
        log.push(ChangeBits::empty());
        assert_eq!(log.get(0), None);
        assert_eq!(log.get(1), Some(ChangeBits::X_POSITION));
        assert_eq!(log.get(2), Some(ChangeBits::empty()));
        assert_eq!(log.get(3), None);
        assert!(log.changed(1, ChangeBits::X_POSITION));
        assert!(!log.changed(2, ChangeBits::X_POSITION));
    }

    #[test]
    fn counts_split_keyframe_and_tween_ticks() {
        let period = 4;
        let mut log = ChangeMaskLog::new();
        // Ticks 1..=9; keyframes at 1, 5, 9.
        for _ in 0..9 {
            log.push(ChangeBits::VELOCITY);
        }
        assert_eq!(log.base_samples_through(ChangeBits::VELOCITY, 9, period), 3);
        assert_eq!(log.tween_samples_through(ChangeBits::VELOCITY, 9, period), 6);
        assert_eq!(log.base_samples_through(ChangeBits::VELOCITY, 4, period), 1);
        assert_eq!(log.tween_samples_through(ChangeBits::VELOCITY, 4, period), 3);
        assert_eq!(log.base_samples_through(ChangeBits::X_POSITION, 9, period), 0);
    }

    #[test]
    fn tween_window_query_excludes_the_keyframe_tick() {
        let mut log = ChangeMaskLog::new();
        log.push(ChangeBits::X_POSITION); // tick 1, keyframe
        log.push(ChangeBits::empty()); // tick 2
        log.push(ChangeBits::X_POSITION); // tick 3
        assert!(!log.tween_stored_in(ChangeBits::X_POSITION, 1, 1));
        assert!(!log.tween_stored_in(ChangeBits::X_POSITION, 1, 2));
        assert!(log.tween_stored_in(ChangeBits::X_POSITION, 1, 3));
    }

    #[test]
    fn truncate_and_footprint() {
        let mut log = ChangeMaskLog::new();
        for _ in 0..10 {
            log.push(ChangeBits::all());
        }
        assert_eq!(log.footprint_bytes(), 10);
        log.truncate(4);
        assert_eq!(log.len(), 4);
        assert_eq!(log.footprint_bytes(), 4);
    }
}
