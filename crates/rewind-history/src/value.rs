//! Channel value types and the per-object sample exchanged with the live world.
//!
//! A channel stores one attribute of one tracked object. The set of value types
//! a channel can hold is closed: 4-byte scalars ([`f32`], [`u32`]) and the
//! 2-component [`Vec2`]. All of them go through the same generic
//! [`DeltaChannel`](crate::channel::DeltaChannel) implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

mod sealed {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for u32 {}
    impl Sealed for super::Vec2 {}
}

// ---------------------------------------------------------------------------
// ChannelValue
// ---------------------------------------------------------------------------

/// A value type that can be recorded into a delta channel.
///
/// Sealed: only [`f32`], [`u32`] and [`Vec2`] implement it.
pub trait ChannelValue: sealed::Sealed + Copy + PartialEq + fmt::Debug + 'static {
    /// Bytes one stored sample accounts for in the history footprint.
    const SAMPLE_BYTES: usize = std::mem::size_of::<Self>();

    /// Bitwise identity. `0.0` and `-0.0` differ; a NaN equals itself.
    fn identical(&self, other: &Self) -> bool;
}

impl ChannelValue for f32 {
    #[inline]
    fn identical(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl ChannelValue for u32 {
    #[inline]
    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

impl ChannelValue for Vec2 {
    #[inline]
    fn identical(&self, other: &Self) -> bool {
        self.x.identical(&other.x) && self.y.identical(&other.y)
    }
}

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2-component vector (positions, velocities).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a vector from its components.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

// ---------------------------------------------------------------------------
// ObjectSample
// ---------------------------------------------------------------------------

/// Sprite animation state of an object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationState {
    /// Index of the displayed animation frame.
    pub frame: u32,
    /// Seconds accumulated toward the next frame.
    pub timer: f32,
}

/// The rewindable attributes of one object at one tick.
///
/// Position is always present. Velocity and animation are optional: an object
/// that has neither never gets those channels. Which optional channels exist is
/// decided by the first sample recorded for the object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectSample {
    /// World position.
    pub position: Vec2,
    /// Linear velocity, if the object has one.
    pub velocity: Option<Vec2>,
    /// Animation state, if the object is animated.
    pub animation: Option<AnimationState>,
}

impl ObjectSample {
    /// A sample with only a position.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::default()
        }
    }

    /// Builder-style: attach a velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Builder-style: attach an animation state.
    pub fn with_animation(mut self, frame: u32, timer: f32) -> Self {
        self.animation = Some(AnimationState { frame, timer });
        self
    }
}
