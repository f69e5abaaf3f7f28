//! The per-tick driver tying the clock, the arena and both passes together.
//!
//! Each simulation tick the owner calls [`Rewinder::begin_tick`] with the
//! tick's control input, runs its own gameplay systems if the rewinder is not
//! scrubbing, and then calls [`Rewinder::run_pass`]. [`Rewinder::tick`] does
//! both back to back for callers without gameplay systems.
//!
//! ```
//! use rewind_history::prelude::*;
//!
//! struct Ball { handle: ObjectHandle, x: f32 }
//!
//! impl RewindTarget for Ball {
//!     fn sample(&self, handle: ObjectHandle) -> Option<ObjectSample> {
//!         (handle == self.handle).then(|| ObjectSample::at(self.x, 0.0))
//!     }
//!     fn apply(&mut self, _handle: ObjectHandle, state: &ObjectSample) {
//!         self.x = state.position.x;
//!     }
//! }
//!
//! let mut handles = HandleAllocator::new();
//! let mut ball = Ball { handle: handles.allocate(), x: 0.0 };
//! let mut rewinder = Rewinder::new(RewindConfig::default()).unwrap();
//! rewinder.request_tracking(ball.handle);
//!
//! for _ in 0..10 {
//!     rewinder.tick(&ControlInput::default(), &mut ball);
//!     ball.x += 1.0;
//! }
//! assert_eq!(rewinder.clock().max_tick(), 10);
//!
//! let hold = ControlInput { rewind_held: true, ..Default::default() };
//! rewinder.tick(&hold, &mut ball);
//! assert_eq!(rewinder.clock().seek_tick(), 9);
//! assert_eq!(ball.x, 8.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arena::HistoryArena;
use crate::clock::{ClockTransition, ControlInput, PlaybackClock};
use crate::handle::ObjectHandle;
use crate::record::record_pass;
use crate::scrub::{release, scrub_pass};
use crate::telemetry::{HistoryTelemetry, PlayStatus};
use crate::value::ObjectSample;
use crate::{RewindError, RewindTarget, DEFAULT_KEYFRAME_PERIOD};

// ---------------------------------------------------------------------------
// RewindConfig
// ---------------------------------------------------------------------------

/// Tunables of the history encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindConfig {
    /// Ticks between keyframes. Must be positive.
    pub keyframe_period: u32,
}

impl Default for RewindConfig {
    fn default() -> Self {
        Self {
            keyframe_period: DEFAULT_KEYFRAME_PERIOD,
        }
    }
}

impl RewindConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// [`RewindError::InvalidKeyframePeriod`] for a zero period.
    pub fn validate(&self) -> Result<(), RewindError> {
        if self.keyframe_period == 0 {
            return Err(RewindError::InvalidKeyframePeriod {
                period: self.keyframe_period,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TickPhase
// ---------------------------------------------------------------------------

/// What the rewinder did on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickPhase {
    /// Live state was recorded as `tick`.
    Recorded {
        /// The recorded tick.
        tick: u32,
    },
    /// History was scrubbed; live objects show `seek_tick`.
    Scrubbed {
        /// The new seek tick.
        seek_tick: u32,
    },
    /// Rewind was released: the timeline was cut at `head` and recording
    /// resumed with `tick`.
    Released {
        /// The new timeline head.
        head: u32,
        /// The tick recorded right after truncation.
        tick: u32,
    },
    /// Rewind is held but there is nothing to scrub yet.
    Waiting,
}

// ---------------------------------------------------------------------------
// Rewinder
// ---------------------------------------------------------------------------

/// Owns the playback clock and every tracked history.
#[derive(Debug, Clone)]
pub struct Rewinder {
    period: u32,
    clock: PlaybackClock,
    arena: HistoryArena,
}

impl Rewinder {
    /// Create a rewinder with nothing recorded.
    ///
    /// # Errors
    ///
    /// Returns the validation error of an invalid `config`.
    pub fn new(config: RewindConfig) -> Result<Self, RewindError> {
        config.validate()?;
        Ok(Self {
            period: config.keyframe_period,
            clock: PlaybackClock::new(),
            arena: HistoryArena::new(),
        })
    }

    /// Ticks between keyframes.
    pub fn keyframe_period(&self) -> u32 {
        self.period
    }

    /// The playback clock.
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// The playback clock, mutably (speed adjustment outside of input).
    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// The tracked histories.
    pub fn arena(&self) -> &HistoryArena {
        &self.arena
    }

    /// Whether the timeline is being scrubbed.
    pub fn is_scrubbing(&self) -> bool {
        self.clock.is_scrubbing()
    }

    /// Drop every history and rewind the clock to its initial state. The
    /// keyframe period is kept.
    pub fn reset(&mut self) {
        self.clock = PlaybackClock::new();
        self.arena = HistoryArena::new();
        debug!("history reset");
    }

    /// Start tracking `handle` at the beginning of the next tick.
    pub fn request_tracking(&mut self, handle: ObjectHandle) {
        self.arena.request_tracking(handle);
    }

    /// Stop tracking `handle` and free its buffers.
    ///
    /// # Errors
    ///
    /// [`RewindError::StaleHandle`] if `handle` is not tracked.
    pub fn untrack(&mut self, handle: ObjectHandle) -> Result<(), RewindError> {
        self.arena.untrack(handle).map(|_| ())
    }

    /// Recorded state of `handle` at global tick `tick`.
    pub fn state_at(&self, handle: ObjectHandle, tick: u32) -> Option<ObjectSample> {
        self.arena.get(handle)?.state_at(tick, self.period)
    }

    /// Start a tick: drain pending tracking requests, then feed the control
    /// input to the clock.
    pub fn begin_tick(&mut self, controls: &ControlInput) -> ClockTransition {
        let added = self.arena.drain_pending();
        if added > 0 {
            debug!(added, tracked = self.arena.len(), "drained pending tracking");
        }
        let transition = self.clock.observe(controls);
        if transition == ClockTransition::Started {
            info!(
                seek = self.clock.seek_tick(),
                speed = self.clock.speed().value(),
                "scrubbing started"
            );
        }
        transition
    }

    /// Finish a tick with the scrub pass or the record pass.
    ///
    /// On the release tick the timeline is truncated first and the tick is
    /// then recorded as usual.
    pub fn run_pass<W: RewindTarget + ?Sized>(
        &mut self,
        transition: ClockTransition,
        target: &mut W,
    ) -> TickPhase {
        if self.clock.is_scrubbing() {
            return match self.scrub(target) {
                Ok(seek_tick) => TickPhase::Scrubbed { seek_tick },
                Err(err) => {
                    debug!(%err, "scrub skipped");
                    TickPhase::Waiting
                }
            };
        }
        let released = (transition == ClockTransition::Released).then(|| {
            let head = self.release();
            info!(head, "scrubbing released");
            head
        });
        match (self.record(target), released) {
            (Ok(tick), Some(head)) => TickPhase::Released { head, tick },
            (Ok(tick), None) => TickPhase::Recorded { tick },
            (Err(err), _) => {
                debug!(%err, "record skipped");
                TickPhase::Waiting
            }
        }
    }

    /// [`begin_tick`](Self::begin_tick) followed by
    /// [`run_pass`](Self::run_pass).
    pub fn tick<W: RewindTarget + ?Sized>(
        &mut self,
        controls: &ControlInput,
        target: &mut W,
    ) -> TickPhase {
        let transition = self.begin_tick(controls);
        self.run_pass(transition, target)
    }

    /// Run the record pass directly. Returns the recorded tick.
    ///
    /// # Errors
    ///
    /// [`RewindError::Scrubbing`] while scrubbing; release first.
    pub fn record<W: RewindTarget + ?Sized>(&mut self, target: &W) -> Result<u32, RewindError> {
        record_pass(&mut self.clock, &mut self.arena, target, self.period)
    }

    /// Run the scrub pass directly. Returns the new seek tick.
    ///
    /// # Errors
    ///
    /// [`RewindError::NothingRecorded`] before the first record.
    pub fn scrub<W: RewindTarget + ?Sized>(&mut self, target: &mut W) -> Result<u32, RewindError> {
        scrub_pass(&mut self.clock, &mut self.arena, target, self.period)
    }

    /// Truncate the timeline at the seek tick. Returns the new head.
    pub fn release(&mut self) -> u32 {
        release(&mut self.clock, &mut self.arena, self.period)
    }

    /// Counters for an external display.
    pub fn telemetry(&self) -> HistoryTelemetry {
        HistoryTelemetry {
            max_tick: self.clock.max_tick(),
            seek_tick: self.clock.seek_tick(),
            footprint_bytes: self.arena.footprint_bytes(),
            tracked_objects: self.arena.len(),
            status: PlayStatus::from_clock(&self.clock),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleAllocator;
    use crate::value::Vec2;

    struct Dot {
        handle: ObjectHandle,
        position: Vec2,
        applied: u32,
    }

    impl RewindTarget for Dot {
        fn sample(&self, handle: ObjectHandle) -> Option<ObjectSample> {
            (handle == self.handle).then(|| ObjectSample {
                position: self.position,
                ..Default::default()
            })
        }

        fn apply(&mut self, _handle: ObjectHandle, state: &ObjectSample) {
            self.position = state.position;
            self.applied += 1;
        }
    }

    fn dot() -> Dot {
        Dot {
            handle: HandleAllocator::new().allocate(),
            position: Vec2::ZERO,
            applied: 0,
        }
    }

    const HOLD: ControlInput = ControlInput {
        rewind_held: true,
        speed_up_held: false,
        speed_down_held: false,
    };
    const IDLE: ControlInput = ControlInput {
        rewind_held: false,
        speed_up_held: false,
        speed_down_held: false,
    };

    #[test]
    fn zero_period_is_rejected() {
        let err = Rewinder::new(RewindConfig { keyframe_period: 0 }).unwrap_err();
        assert!(matches!(err, RewindError::InvalidKeyframePeriod { period: 0 }));
    }

    #[test]
    fn scrubbing_before_any_record_waits() {
        let mut d = dot();
        let mut r = Rewinder::new(RewindConfig::default()).unwrap();
        r.request_tracking(d.handle);
        assert_eq!(r.tick(&HOLD, &mut d), TickPhase::Waiting);
        assert!(matches!(r.scrub(&mut d), Err(RewindError::NothingRecorded)));
        assert_eq!(d.applied, 0);
    }

    #[test]
    fn phases_follow_the_rewind_button() {
        let mut d = dot();
        let mut r = Rewinder::new(RewindConfig::default()).unwrap();
        r.request_tracking(d.handle);

        for i in 0..5 {
            assert_eq!(r.tick(&IDLE, &mut d), TickPhase::Recorded { tick: i + 1 });
            d.position.x += 1.0;
        }
        assert_eq!(r.tick(&HOLD, &mut d), TickPhase::Scrubbed { seek_tick: 4 });
        assert_eq!(d.position.x, 3.0);
        assert_eq!(r.tick(&HOLD, &mut d), TickPhase::Scrubbed { seek_tick: 3 });
        assert_eq!(
            r.tick(&IDLE, &mut d),
            TickPhase::Released { head: 3, tick: 4 }
        );
        assert_eq!(r.clock().max_tick(), 4);
    }

    #[test]
    fn recording_while_scrubbing_is_rejected() {
        let mut d = dot();
        let mut r = Rewinder::new(RewindConfig::default()).unwrap();
        r.request_tracking(d.handle);
        for _ in 0..10 {
            r.tick(&IDLE, &mut d);
            d.position.x += 1.0;
        }
        for _ in 0..3 {
            r.tick(&HOLD, &mut d);
        }
        assert_eq!(r.clock().seek_tick(), 7);

        assert!(matches!(r.record(&d), Err(RewindError::Scrubbing)));
        assert!(r.is_scrubbing());
        assert_eq!(r.clock().max_tick(), 10);
        assert_eq!(r.clock().seek_tick(), 7);

        // Scrubbing and releasing still line up with the untouched timeline.
        assert_eq!(r.tick(&HOLD, &mut d), TickPhase::Scrubbed { seek_tick: 6 });
        assert_eq!(d.position.x, 5.0);
        assert_eq!(
            r.tick(&IDLE, &mut d),
            TickPhase::Released { head: 6, tick: 7 }
        );
        assert_eq!(r.record(&d).unwrap(), 8);
    }

    #[test]
    fn state_at_clamps_tick_zero_to_the_first_sample() {
        let mut d = dot();
        let mut r = Rewinder::new(RewindConfig { keyframe_period: 1 }).unwrap();
        r.request_tracking(d.handle);
        for _ in 0..3 {
            d.position.x += 1.0;
            r.tick(&IDLE, &mut d);
        }
        assert_eq!(r.state_at(d.handle, 0).map(|s| s.position.x), Some(1.0));
        assert_eq!(r.state_at(d.handle, 2).map(|s| s.position.x), Some(2.0));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut d = dot();
        let mut r = Rewinder::new(RewindConfig { keyframe_period: 7 }).unwrap();
        r.request_tracking(d.handle);
        r.tick(&IDLE, &mut d);
        r.tick(&HOLD, &mut d);
        r.reset();
        assert_eq!(r.clock().max_tick(), 0);
        assert!(!r.is_scrubbing());
        assert!(r.arena().is_empty());
        assert_eq!(r.keyframe_period(), 7);
    }

    #[test]
    fn telemetry_counts_bytes() {
        let mut d = dot();
        let mut r = Rewinder::new(RewindConfig::default()).unwrap();
        r.request_tracking(d.handle);
        r.tick(&IDLE, &mut d);
        d.position.x = 1.0;
        r.tick(&IDLE, &mut d);
        let t = r.telemetry();
        // x: base + tween, y: base, masks: 2 ticks.
        assert_eq!(t.footprint_bytes, 4 * 2 + 4 + 2);
        assert_eq!(t.max_tick, 2);
        assert_eq!(t.seek_tick, 2);
        assert_eq!(t.tracked_objects, 1);
        assert_eq!(t.status, PlayStatus::Playing);
    }
}
