//! The full recorded history of one tracked object.
//!
//! A [`TrackedHistory`] owns one [`ChangeMaskLog`] and one
//! [`DeltaChannel`] per monitored attribute. Position channels always exist;
//! velocity and animation channels exist only if the object had those
//! attributes when its first sample was recorded.
//!
//! Histories keep their own *local* tick numbering. The first tick an object
//! records is its local tick 1 and is always a keyframe, so an object tracked
//! mid-session gets a well-formed keyframe schedule of its own. Objects
//! tracked from the start have `origin == 1` and local ticks equal global
//! ticks.

use crate::channel::DeltaChannel;
use crate::mask::ChangeMaskLog;
use crate::value::Vec2;

/// Optional channels of an animated object.
#[derive(Debug, Clone, Default)]
pub struct AnimationChannels {
    /// Displayed frame index.
    pub frame: DeltaChannel<u32>,
    /// Seconds toward the next frame.
    pub timer: DeltaChannel<f32>,
}

/// Every channel plus the change mask log of one object.
#[derive(Debug, Clone, Default)]
pub struct TrackedHistory {
    /// Global tick of the first recorded sample; `None` until then.
    pub(crate) origin: Option<u32>,
    pub(crate) masks: ChangeMaskLog,
    pub(crate) x: DeltaChannel<f32>,
    pub(crate) y: DeltaChannel<f32>,
    pub(crate) velocity: Option<DeltaChannel<Vec2>>,
    pub(crate) animation: Option<AnimationChannels>,
}

impl TrackedHistory {
    /// An empty history; channels are shaped by the first recorded sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Global tick of the first recorded sample.
    pub fn origin(&self) -> Option<u32> {
        self.origin
    }

    /// Number of ticks recorded for this object.
    pub fn recorded_ticks(&self) -> u32 {
        self.masks.len() as u32
    }

    /// Map a global tick to this object's local tick.
    ///
    /// Ticks before the origin map to local tick 1 and ticks past the newest
    /// recorded tick map to the newest. `None` if nothing is recorded.
    pub fn local_tick(&self, global: u32) -> Option<u32> {
        let origin = self.origin?;
        let recorded = self.recorded_ticks();
        if recorded == 0 {
            return None;
        }
        let local = i64::from(global) - i64::from(origin) + 1;
        Some(local.clamp(1, i64::from(recorded)) as u32)
    }

    /// The change mask log.
    pub fn masks(&self) -> &ChangeMaskLog {
        &self.masks
    }

    /// Horizontal position channel.
    pub fn x(&self) -> &DeltaChannel<f32> {
        &self.x
    }

    /// Vertical position channel.
    pub fn y(&self) -> &DeltaChannel<f32> {
        &self.y
    }

    /// Velocity channel, if the object has one.
    pub fn velocity(&self) -> Option<&DeltaChannel<Vec2>> {
        self.velocity.as_ref()
    }

    /// Animation channels, if the object is animated.
    pub fn animation(&self) -> Option<&AnimationChannels> {
        self.animation.as_ref()
    }

    /// Bytes held by all channels and the mask log.
    pub fn footprint_bytes(&self) -> usize {
        let mut bytes = self.masks.footprint_bytes()
            + self.x.footprint_bytes()
            + self.y.footprint_bytes();
        if let Some(v) = &self.velocity {
            bytes += v.footprint_bytes();
        }
        if let Some(a) = &self.animation {
            bytes += a.frame.footprint_bytes() + a.timer.footprint_bytes();
        }
        bytes
    }

    /// Drop everything. The next record starts a fresh history.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}
