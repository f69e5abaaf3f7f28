//! Rewind History -- keyframe + delta recording of simulation state with
//! bidirectional, variable-speed scrubbing.
//!
//! Every tracked object owns a set of [`DeltaChannel`](channel::DeltaChannel)s
//! (one per rewindable attribute) and a [`ChangeMaskLog`](mask::ChangeMaskLog)
//! saying which channels stored a sample on each tick. Most ticks store
//! nothing for most channels: a sample is written only when a value changes,
//! plus periodic keyframes that anchor random access.
//!
//! A single [`PlaybackClock`](clock::PlaybackClock) drives everything. While
//! the rewind control is released the [`record`] pass appends one tick per
//! simulation tick; while it is held the [`scrub`] pass walks the seek tick
//! backward or forward at the selected speed and writes historical state back
//! to the live objects. Releasing the control truncates the recorded future,
//! and recording resumes from the scrubbed-to tick.
//!
//! # Quick Start
//!
//! ```
//! use rewind_history::prelude::*;
//!
//! struct Crate { handle: ObjectHandle, state: ObjectSample }
//!
//! impl RewindTarget for Crate {
//!     fn sample(&self, _handle: ObjectHandle) -> Option<ObjectSample> {
//!         Some(self.state)
//!     }
//!     fn apply(&mut self, _handle: ObjectHandle, state: &ObjectSample) {
//!         self.state = *state;
//!     }
//! }
//!
//! let handle = HandleAllocator::new().allocate();
//! let mut obj = Crate { handle, state: ObjectSample::at(0.0, 10.0) };
//! let mut rewinder = Rewinder::new(RewindConfig::default()).unwrap();
//! rewinder.request_tracking(obj.handle);
//!
//! // Fall for 30 ticks.
//! for _ in 0..30 {
//!     rewinder.tick(&ControlInput::default(), &mut obj);
//!     obj.state.position.y -= 0.25;
//! }
//!
//! // The recorded state at tick 5 is what the object looked like then.
//! let past = rewinder.state_at(handle, 5).unwrap();
//! assert_eq!(past.position.y, 9.0);
//! ```

#![deny(unsafe_code)]

pub mod arena;
pub mod channel;
pub mod clock;
pub mod handle;
pub mod history;
pub mod mask;
pub mod record;
pub mod rewinder;
pub mod scrub;
pub mod telemetry;
pub mod value;

/// Ticks between keyframes unless configured otherwise.
pub const DEFAULT_KEYFRAME_PERIOD: u32 = 120;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the rewind history.
///
/// Seek and cursor boundaries are clamped, never reported; these variants
/// cover precondition violations only.
#[derive(Debug, thiserror::Error)]
pub enum RewindError {
    /// Scrubbing was requested before any tick was recorded.
    #[error("nothing has been recorded yet; record at least one tick before scrubbing")]
    NothingRecorded,

    /// Recording was requested while the timeline is being scrubbed.
    #[error("cannot record while scrubbing; release the rewind control first")]
    Scrubbing,

    /// The handle is not tracked (never tracked, untracked, or recycled).
    #[error("object {handle} is not tracked (stale or never tracked)")]
    StaleHandle {
        /// The offending handle.
        handle: handle::ObjectHandle,
    },

    /// The keyframe period must be positive.
    #[error("keyframe period must be positive, got {period}")]
    InvalidKeyframePeriod {
        /// The rejected period.
        period: u32,
    },
}

// ---------------------------------------------------------------------------
// RewindTarget
// ---------------------------------------------------------------------------

/// The live world as seen by the passes.
///
/// The record pass reads live attributes through [`sample`](Self::sample);
/// the scrub pass writes resolved history through [`apply`](Self::apply).
pub trait RewindTarget {
    /// Current rewindable attributes of `handle`, or `None` if it no longer
    /// exists.
    fn sample(&self, handle: handle::ObjectHandle) -> Option<value::ObjectSample>;

    /// Overwrite the rewindable attributes of `handle`.
    ///
    /// Attributes the object does not have are `None` in `state`.
    fn apply(&mut self, handle: handle::ObjectHandle, state: &value::ObjectSample);
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::arena::HistoryArena;
    pub use crate::channel::DeltaChannel;
    pub use crate::clock::{ClockTransition, ControlInput, PlaybackClock, PlaybackSpeed};
    pub use crate::handle::{HandleAllocator, ObjectHandle};
    pub use crate::history::TrackedHistory;
    pub use crate::mask::{ChangeBits, ChangeMaskLog};
    pub use crate::rewinder::{RewindConfig, Rewinder, TickPhase};
    pub use crate::telemetry::{HistoryTelemetry, PlayStatus};
    pub use crate::value::{AnimationState, ChannelValue, ObjectSample, Vec2};
    pub use crate::{RewindError, RewindTarget, DEFAULT_KEYFRAME_PERIOD};
}
