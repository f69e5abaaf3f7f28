//! The playback clock: seek position, timeline head, speed and control latches.
//!
//! There is exactly one clock per timeline. Both passes read it every tick;
//! control input writes the speed and the scrubbing flag, the record pass
//! advances the head, the scrub pass moves the seek position.
//!
//! # State machine
//!
//! ```text
//!            rewind held
//!   Recording ───────────▶ Scrubbing
//!       ▲                      │
//!       └──────────────────────┘
//!         rewind released (truncate)
//! ```
//!
//! Transitions happen on the tick the input is observed; there are no
//! intermediate states.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PlaybackSpeed
// ---------------------------------------------------------------------------

/// Signed scrub rate in ticks per simulation tick.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    /// Eight ticks backward per tick.
    Reverse8 = -8,
    /// Four ticks backward per tick.
    Reverse4 = -4,
    /// Two ticks backward per tick.
    Reverse2 = -2,
    /// One tick backward per tick.
    Reverse1 = -1,
    /// Paused on the seek tick.
    Frozen = 0,
    /// One tick forward per tick.
    Forward1 = 1,
    /// Two ticks forward per tick.
    Forward2 = 2,
    /// Four ticks forward per tick.
    Forward4 = 4,
    /// Eight ticks forward per tick.
    Forward8 = 8,
}

impl PlaybackSpeed {
    /// Every speed, from full reverse to full forward.
    pub const LADDER: [Self; 9] = [
        Self::Reverse8,
        Self::Reverse4,
        Self::Reverse2,
        Self::Reverse1,
        Self::Frozen,
        Self::Forward1,
        Self::Forward2,
        Self::Forward4,
        Self::Forward8,
    ];

    /// Signed tick rate.
    #[inline]
    pub fn value(self) -> i8 {
        self as i8
    }

    /// Direction of travel: `-1`, `0` or `1`.
    #[inline]
    pub fn direction(self) -> i8 {
        self.value().signum()
    }

    /// Inner scrub iterations per tick: `max(1, |speed|)`.
    #[inline]
    pub fn steps(self) -> u32 {
        u32::from(self.value().unsigned_abs()).max(1)
    }

    /// One step toward [`Forward8`](Self::Forward8); saturates there.
    pub fn faster(self) -> Self {
        let i = self.ladder_position();
        Self::LADDER[(i + 1).min(Self::LADDER.len() - 1)]
    }

    /// One step toward [`Reverse8`](Self::Reverse8); saturates there.
    pub fn slower(self) -> Self {
        let i = self.ladder_position();
        Self::LADDER[i.saturating_sub(1)]
    }

    fn ladder_position(self) -> usize {
        Self::LADDER
            .iter()
            .position(|s| *s == self)
            .unwrap_or(Self::LADDER.len() / 2)
    }
}

impl Default for PlaybackSpeed {
    /// The default reverse rate.
    fn default() -> Self {
        Self::Reverse1
    }
}

// ---------------------------------------------------------------------------
// Control input
// ---------------------------------------------------------------------------

/// Hold states of the rewind controls for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlInput {
    /// The rewind button is held.
    pub rewind_held: bool,
    /// The speed-increase button is held.
    pub speed_up_held: bool,
    /// The speed-decrease button is held.
    pub speed_down_held: bool,
}

/// Current and previous-tick hold state of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeLatch {
    held: bool,
    previous: bool,
}

impl EdgeLatch {
    /// Shift the current state into the previous slot and store `held`.
    pub fn update(&mut self, held: bool) {
        self.previous = self.held;
        self.held = held;
    }

    /// Held now.
    pub fn held(self) -> bool {
        self.held
    }

    /// Went from released to held on the last update.
    pub fn pressed(self) -> bool {
        self.held && !self.previous
    }

    /// Went from held to released on the last update.
    pub fn released(self) -> bool {
        !self.held && self.previous
    }
}

/// Which state change, if any, the last observed input caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTransition {
    /// No change of state.
    None,
    /// Recording → Scrubbing.
    Started,
    /// Scrubbing → Recording; the timeline must be truncated this tick.
    Released,
}

// ---------------------------------------------------------------------------
// PlaybackClock
// ---------------------------------------------------------------------------

/// Authoritative scrub state shared by every tracked object.
///
/// Invariant: `1 <= seek_tick <= max_tick` whenever `max_tick > 0`.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    speed: PlaybackSpeed,
    max_tick: u32,
    seek_tick: u32,
    scrubbing: bool,
    rewind: EdgeLatch,
    speed_up: EdgeLatch,
    speed_down: EdgeLatch,
}

impl PlaybackClock {
    /// A clock with nothing recorded, speed at the default reverse rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current playback speed.
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Highest recorded tick (0 before the first record).
    pub fn max_tick(&self) -> u32 {
        self.max_tick
    }

    /// Current seek position (1-based; 0 before the first record).
    pub fn seek_tick(&self) -> u32 {
        self.seek_tick
    }

    /// Whether the timeline is being scrubbed.
    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// Whether the rewind button was held on the last observed tick.
    pub fn rewind_held(&self) -> bool {
        self.rewind.held()
    }

    /// One step toward full-forward. No-op at `8`.
    pub fn increase_speed(&mut self) {
        self.speed = self.speed.faster();
    }

    /// One step toward full-reverse. No-op at `-8`.
    pub fn decrease_speed(&mut self) {
        self.speed = self.speed.slower();
    }

    /// Feed one tick of control input.
    ///
    /// Speed buttons act on their press edge only. The scrubbing flag follows
    /// the rewind hold with one tick of latency.
    pub fn observe(&mut self, input: &ControlInput) -> ClockTransition {
        self.rewind.update(input.rewind_held);
        self.speed_up.update(input.speed_up_held);
        self.speed_down.update(input.speed_down_held);

        if self.speed_up.pressed() {
            self.increase_speed();
        }
        if self.speed_down.pressed() {
            self.decrease_speed();
        }

        if self.rewind.held() {
            if self.scrubbing {
                ClockTransition::None
            } else {
                self.scrubbing = true;
                ClockTransition::Started
            }
        } else if self.scrubbing && self.rewind.released() {
            self.scrubbing = false;
            ClockTransition::Released
        } else {
            ClockTransition::None
        }
    }

    /// The tick the next record pass writes.
    pub fn next_record_tick(&self) -> u32 {
        self.max_tick + 1
    }

    /// A tick has been recorded: the head moves and the seek follows it.
    pub(crate) fn advance_head(&mut self) {
        self.max_tick += 1;
        self.seek_tick = self.max_tick;
    }

    /// Move the seek position one step in the speed's direction.
    ///
    /// Clamped into `[1, max(1, max_tick - 1)]`. Returns the previous and new
    /// seek ticks. Must not be called before the first record.
    pub(crate) fn step_seek(&mut self) -> (u32, u32) {
        let previous = self.seek_tick;
        let upper = i64::from(self.max_tick.saturating_sub(1).max(1));
        let next = (i64::from(previous) + i64::from(self.speed.direction())).clamp(1, upper);
        self.seek_tick = next as u32;
        (previous, self.seek_tick)
    }

    /// Make the seek tick the new head and reset the speed.
    pub(crate) fn truncate_to_seek(&mut self) {
        self.max_tick = self.seek_tick;
        self.speed = PlaybackSpeed::Reverse1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rewind(held: bool) -> ControlInput {
        ControlInput {
            rewind_held: held,
            ..Default::default()
        }
    }

    // -- 1. Speed ladder ------------------------------------------------------

    #[test]
    fn increase_saturates_at_forward8() {
        let mut clock = PlaybackClock::new();
        clock.increase_speed();
        clock.increase_speed();
        assert_eq!(clock.speed(), PlaybackSpeed::Forward1);
        for _ in 0..9 {
            clock.increase_speed();
        }
        assert_eq!(clock.speed(), PlaybackSpeed::Forward8);
    }

    #[test]
    fn decrease_saturates_at_reverse8() {
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.speed(), PlaybackSpeed::Reverse1);
        for _ in 0..9 {
            clock.decrease_speed();
        }
        assert_eq!(clock.speed(), PlaybackSpeed::Reverse8);
    }

    #[test]
    fn ladder_is_symmetric() {
        for speed in PlaybackSpeed::LADDER {
            if speed != PlaybackSpeed::Forward8 {
                assert_eq!(speed.faster().slower(), speed);
            }
        }
        assert_eq!(PlaybackSpeed::Frozen.steps(), 1);
        assert_eq!(PlaybackSpeed::Reverse4.steps(), 4);
        assert_eq!(PlaybackSpeed::Forward8.direction(), 1);
        assert_eq!(PlaybackSpeed::Frozen.direction(), 0);
    }

    // -- 2. Edge detection ----------------------------------------------------

    #[test]
    fn speed_buttons_act_on_press_edge_only() {
        let mut clock = PlaybackClock::new();
        let held = ControlInput {
            speed_up_held: true,
            ..Default::default()
        };
        clock.observe(&held);
        clock.observe(&held);
        clock.observe(&held);
        assert_eq!(clock.speed(), PlaybackSpeed::Frozen, "held is one press");

        clock.observe(&ControlInput::default());
        clock.observe(&held);
        assert_eq!(clock.speed(), PlaybackSpeed::Forward1);
    }

    #[test]
    fn scrubbing_follows_rewind_hold() {
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.observe(&rewind(false)), ClockTransition::None);
        assert_eq!(clock.observe(&rewind(true)), ClockTransition::Started);
        assert!(clock.is_scrubbing());
        assert_eq!(clock.observe(&rewind(true)), ClockTransition::None);
        assert_eq!(clock.observe(&rewind(false)), ClockTransition::Released);
        assert!(!clock.is_scrubbing());
        assert_eq!(clock.observe(&rewind(false)), ClockTransition::None);
    }

    // -- 3. Seek stepping -----------------------------------------------------

    #[test]
    fn seek_clamps_below_head_and_above_one() {
        let mut clock = PlaybackClock::new();
        for _ in 0..5 {
            clock.advance_head();
        }
        assert_eq!(clock.seek_tick(), 5);

        clock.speed = PlaybackSpeed::Forward1;
        assert_eq!(clock.step_seek(), (5, 4));

        clock.speed = PlaybackSpeed::Reverse1;
        for _ in 0..10 {
            clock.step_seek();
        }
        assert_eq!(clock.seek_tick(), 1);
    }

    #[test]
    fn truncate_moves_head_and_resets_speed() {
        let mut clock = PlaybackClock::new();
        for _ in 0..10 {
            clock.advance_head();
        }
        clock.speed = PlaybackSpeed::Reverse4;
        clock.step_seek();
        clock.truncate_to_seek();
        assert_eq!(clock.max_tick(), 9);
        assert_eq!(clock.seek_tick(), 9);
        assert_eq!(clock.speed(), PlaybackSpeed::Reverse1);
        assert_eq!(clock.next_record_tick(), 10);
    }
}
