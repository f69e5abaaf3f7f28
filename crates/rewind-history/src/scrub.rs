//! The scrub pass: seek through recorded history, and truncate on release.
//!
//! While scrubbing, each simulation tick runs `max(1, |speed|)` inner steps.
//! Every step moves the seek tick by one in the speed's direction and keeps
//! each channel's tween cursor in sync with it. Only the last step resolves
//! channel values and writes them to the live object, so fast scrubbing does
//! not pay for presenting intermediate ticks.
//!
//! # Resolving a channel at tick `s`
//!
//! Let `w` be the keyframe tick of the window containing `s`.
//!
//! 1. If `s != w` and some tick in `(w, s]` stored a tween sample, the value is
//!    the tween sample under the cursor.
//! 2. Otherwise the value is the window's keyframe value: the base sample
//!    stored at `w` if its bit is set, else the reference `base_frames[0]`.
//!
//! # Release
//!
//! When the rewind button is released the seek tick becomes the new timeline
//! head and everything recorded after it is dropped from every buffer.

use tracing::{debug, warn};

use crate::arena::HistoryArena;
use crate::channel::{DeltaChannel, ValueSource};
use crate::clock::PlaybackClock;
use crate::history::TrackedHistory;
use crate::mask::{is_keyframe_tick, keyframe_index, keyframe_tick, ChangeBits, ChangeMaskLog};
use crate::value::{AnimationState, ChannelValue, ObjectSample, Vec2};
use crate::{RewindError, RewindTarget};

/// How tween samples are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Trust the channel cursor; only valid at the current seek tick.
    Cursor,
    /// Count stored samples in the mask log; valid at any tick.
    Counted,
}

/// Where a channel reads its value at local tick `tick`.
fn value_source(
    masks: &ChangeMaskLog,
    bit: ChangeBits,
    tick: u32,
    period: u32,
    lookup: Lookup,
) -> ValueSource {
    let window = keyframe_tick(keyframe_index(tick, period), period);
    if tick != window && masks.tween_stored_in(bit, window, tick) {
        return match lookup {
            Lookup::Cursor => ValueSource::Tween,
            Lookup::Counted => {
                let slot = masks.tween_samples_through(bit, tick, period);
                ValueSource::TweenSlot(slot.saturating_sub(1))
            }
        };
    }
    if masks.changed(window, bit) {
        // Base samples are only stored for keyframes that differed from the
        // reference, so the slot is the count of such keyframes so far.
        let slot = masks.base_samples_through(bit, window, period);
        ValueSource::Keyframe(slot.saturating_sub(1))
    } else {
        ValueSource::Reference
    }
}

fn resolve_channel<T: ChannelValue>(
    channel: &DeltaChannel<T>,
    masks: &ChangeMaskLog,
    bit: ChangeBits,
    tick: u32,
    period: u32,
    lookup: Lookup,
) -> Option<T> {
    channel.resolve(value_source(masks, bit, tick, period, lookup))
}

/// Keep `channel`'s cursor in step with a one-tick seek move.
fn step_channel<T: ChannelValue>(
    channel: &mut DeltaChannel<T>,
    masks: &ChangeMaskLog,
    bit: ChangeBits,
    from: u32,
    to: u32,
    period: u32,
) {
    if to < from {
        // Leaving `from`: its tween sample is no longer at or before the seek.
        if !is_keyframe_tick(from, period) && masks.changed(from, bit) {
            channel.step_back();
        }
    } else if to > from && !is_keyframe_tick(to, period) && masks.changed(to, bit) {
        channel.step_forward();
    }
}

fn truncate_channel<T: ChannelValue>(
    channel: &mut DeltaChannel<T>,
    masks: &ChangeMaskLog,
    bit: ChangeBits,
    keep: u32,
    period: u32,
) {
    let head = resolve_channel(channel, masks, bit, keep, period, Lookup::Cursor);
    let keep_base = masks.base_samples_through(bit, keep, period);
    let keep_tween = masks.tween_samples_through(bit, keep, period);
    debug_assert_eq!(
        channel.tween_cursor() + 1,
        keep_tween as isize,
        "tween cursor out of step with the seek tick"
    );
    channel.truncate(keep_base, keep_tween, head);
}

impl TrackedHistory {
    /// Follow one global seek step from `from` to `to`.
    pub(crate) fn step(&mut self, from: u32, to: u32, period: u32) {
        let (Some(from), Some(to)) = (self.local_tick(from), self.local_tick(to)) else {
            return;
        };
        if from == to {
            return;
        }
        let masks = &self.masks;
        step_channel(&mut self.x, masks, ChangeBits::X_POSITION, from, to, period);
        step_channel(&mut self.y, masks, ChangeBits::Y_POSITION, from, to, period);
        if let Some(a) = self.animation.as_mut() {
            step_channel(&mut a.frame, masks, ChangeBits::ANIMATION_FRAME, from, to, period);
            step_channel(&mut a.timer, masks, ChangeBits::ANIMATION_TIMER, from, to, period);
        }
        if let Some(v) = self.velocity.as_mut() {
            step_channel(v, masks, ChangeBits::VELOCITY, from, to, period);
        }
    }

    /// The object's recorded state at global tick `tick`.
    ///
    /// Random access: works at any tick, independent of the scrub position.
    /// Ticks before the object's origin resolve to its first recorded state.
    /// `None` if nothing has been recorded.
    pub(crate) fn state_at(&self, tick: u32, period: u32) -> Option<ObjectSample> {
        self.resolve(tick, period, Lookup::Counted)
    }

    /// State at the seek tick the cursors are currently in step with.
    pub(crate) fn state_at_cursor(&self, tick: u32, period: u32) -> Option<ObjectSample> {
        self.resolve(tick, period, Lookup::Cursor)
    }

    fn resolve(&self, tick: u32, period: u32, lookup: Lookup) -> Option<ObjectSample> {
        let local = self.local_tick(tick)?;
        let source = |bit| value_source(&self.masks, bit, local, period, lookup);
        let x = self.x.resolve(source(ChangeBits::X_POSITION))?;
        let y = self.y.resolve(source(ChangeBits::Y_POSITION))?;
        let velocity = match &self.velocity {
            Some(v) => Some(v.resolve(source(ChangeBits::VELOCITY))?),
            None => None,
        };
        let animation = match &self.animation {
            Some(a) => Some(AnimationState {
                frame: a.frame.resolve(source(ChangeBits::ANIMATION_FRAME))?,
                timer: a.timer.resolve(source(ChangeBits::ANIMATION_TIMER))?,
            }),
            None => None,
        };
        Some(ObjectSample {
            position: Vec2::new(x, y),
            velocity,
            animation,
        })
    }

    /// Drop everything recorded after global tick `tick`.
    pub(crate) fn truncate_after(&mut self, tick: u32, period: u32) {
        let Some(origin) = self.origin else {
            return;
        };
        if tick < origin {
            self.reset();
            return;
        }
        let keep = (tick - origin + 1).min(self.recorded_ticks());
        let masks = &self.masks;
        truncate_channel(&mut self.x, masks, ChangeBits::X_POSITION, keep, period);
        truncate_channel(&mut self.y, masks, ChangeBits::Y_POSITION, keep, period);
        if let Some(a) = self.animation.as_mut() {
            truncate_channel(&mut a.frame, masks, ChangeBits::ANIMATION_FRAME, keep, period);
            truncate_channel(&mut a.timer, masks, ChangeBits::ANIMATION_TIMER, keep, period);
        }
        if let Some(v) = self.velocity.as_mut() {
            truncate_channel(v, masks, ChangeBits::VELOCITY, keep, period);
        }
        self.masks.truncate(keep as usize);
    }
}

/// Run one tick of scrubbing.
///
/// Steps the clock `max(1, |speed|)` times, keeping every history's cursors in
/// step, then writes the state at the final seek tick to the live objects.
/// Returns the new seek tick.
///
/// # Errors
///
/// [`RewindError::NothingRecorded`] if no tick has been recorded yet.
pub(crate) fn scrub_pass<W: RewindTarget + ?Sized>(
    clock: &mut PlaybackClock,
    arena: &mut HistoryArena,
    target: &mut W,
    period: u32,
) -> Result<u32, RewindError> {
    if clock.max_tick() == 0 {
        return Err(RewindError::NothingRecorded);
    }
    for _ in 0..clock.speed().steps() {
        let (from, to) = clock.step_seek();
        if from == to {
            continue;
        }
        for (_, history) in arena.iter_mut() {
            history.step(from, to, period);
        }
    }

    let seek = clock.seek_tick();
    for (handle, history) in arena.iter_mut() {
        match history.state_at_cursor(seek, period) {
            Some(state) => target.apply(handle, &state),
            None => {
                if history.origin().is_some() {
                    warn!(%handle, seek, "history could not resolve seek tick");
                }
            }
        }
    }
    Ok(seek)
}

/// Make the seek tick the new timeline head, dropping the recorded future.
///
/// Resets the speed to the default reverse rate. Returns the new head; the
/// next record pass writes the tick after it.
pub(crate) fn release(clock: &mut PlaybackClock, arena: &mut HistoryArena, period: u32) -> u32 {
    let dropped = clock.max_tick().saturating_sub(clock.seek_tick());
    clock.truncate_to_seek();
    let head = clock.max_tick();
    for (_, history) in arena.iter_mut() {
        history.truncate_after(head, period);
    }
    debug!(head, dropped, "timeline truncated at release");
    head
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
