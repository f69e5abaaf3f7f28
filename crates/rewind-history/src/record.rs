//! The record pass: append one tick of live state to every history.
//!
//! Runs once per simulation tick while the clock is not scrubbing. For each
//! tracked object it samples the live attributes, delta-encodes each channel
//! and appends the tick's change mask. Channels whose value did not change
//! store nothing; keyframe ticks store a base sample only when the value
//! differs from the channel's reference sample.

use tracing::trace;

use crate::arena::HistoryArena;
use crate::channel::DeltaChannel;
use crate::clock::PlaybackClock;
use crate::history::{AnimationChannels, TrackedHistory};
use crate::mask::{is_keyframe_tick, ChangeBits};
use crate::value::{ChannelValue, ObjectSample};
use crate::{RewindError, RewindTarget};

fn record_into<T: ChannelValue>(
    channel: &mut DeltaChannel<T>,
    value: T,
    keyframe: bool,
    bit: ChangeBits,
    bits: &mut ChangeBits,
) {
    if channel.record(value, keyframe) {
        bits.insert(bit);
    }
}

impl TrackedHistory {
    /// Append global tick `tick` to this history.
    ///
    /// `sample == None` (the object vanished without being untracked) records
    /// an empty mask so local ticks stay aligned with the timeline. Returns the
    /// tick's change mask.
    pub(crate) fn record_tick(
        &mut self,
        tick: u32,
        sample: Option<&ObjectSample>,
        period: u32,
    ) -> ChangeBits {
        let mut bits = ChangeBits::empty();
        let Some(sample) = sample else {
            if self.origin.is_some() {
                self.masks.push(bits);
            }
            return bits;
        };

        if self.origin.is_none() {
            self.origin = Some(tick);
            self.velocity = sample.velocity.map(|_| DeltaChannel::new());
            self.animation = sample.animation.map(|_| AnimationChannels::default());
        }

        let local = self.recorded_ticks() + 1;
        let keyframe = is_keyframe_tick(local, period);

        let position = sample.position;
        record_into(&mut self.x, position.x, keyframe, ChangeBits::X_POSITION, &mut bits);
        record_into(&mut self.y, position.y, keyframe, ChangeBits::Y_POSITION, &mut bits);

        if let (Some(channel), Some(value)) = (self.animation.as_mut(), sample.animation) {
            record_into(
                &mut channel.frame,
                value.frame,
                keyframe,
                ChangeBits::ANIMATION_FRAME,
                &mut bits,
            );
            record_into(
                &mut channel.timer,
                value.timer,
                keyframe,
                ChangeBits::ANIMATION_TIMER,
                &mut bits,
            );
        }
        if let (Some(channel), Some(value)) = (self.velocity.as_mut(), sample.velocity) {
            record_into(channel, value, keyframe, ChangeBits::VELOCITY, &mut bits);
        }

        self.masks.push(bits);
        bits
    }
}

/// Record one tick of every tracked object and advance the clock head.
///
/// Returns the tick that was recorded.
///
/// # Errors
///
/// [`RewindError::Scrubbing`] while the clock is scrubbing; nothing is
/// recorded.
pub(crate) fn record_pass<W: RewindTarget + ?Sized>(
    clock: &mut PlaybackClock,
    arena: &mut HistoryArena,
    target: &W,
    period: u32,
) -> Result<u32, RewindError> {
    if clock.is_scrubbing() {
        return Err(RewindError::Scrubbing);
    }
    let tick = clock.next_record_tick();
    for (handle, history) in arena.iter_mut() {
        let sample = target.sample(handle);
        let bits = history.record_tick(tick, sample.as_ref(), period);
        trace!(%handle, tick, bits = bits.bits(), "recorded");
    }
    clock.advance_head();
    Ok(tick)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
