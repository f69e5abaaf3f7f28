//! The body store: every simulated object and its components.
//!
//! Bodies are addressed by generational [`ObjectHandle`]s from the same
//! allocator scheme the history arena uses, so a body and its history share
//! one identity. Slots are iterated in index order, which keeps every system
//! deterministic.
//!
//! A body exposes its rewindable attributes (position, velocity, animation
//! state) to the rewinder through [`RewindTarget`]. The remaining components
//! (movement properties, ground probe, the `rewindable` marker) are static
//! configuration and never rewound.

use serde::{Deserialize, Serialize};
use tracing::debug;

use rewind_history::handle::{HandleAllocator, ObjectHandle};
use rewind_history::value::{AnimationState, ObjectSample, Vec2};
use rewind_history::RewindTarget;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Player movement tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoverProps {
    /// Horizontal acceleration while airborne, units/s².
    pub acceleration: f32,
    /// Horizontal speed cap, units/s.
    pub max_speed: f32,
    /// Vertical velocity set by a grounded jump, units/s.
    pub jump_force: f32,
}

impl Default for MoverProps {
    fn default() -> Self {
        Self {
            acceleration: 20.0,
            max_speed: 5.0,
            jump_force: 12.0,
        }
    }
}

/// A looping sprite animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animator {
    /// Current frame and timer (rewound).
    pub state: AnimationState,
    /// Frames in the loop.
    pub frame_count: u32,
    /// Seconds each frame is shown.
    pub frame_seconds: f32,
}

impl Animator {
    /// A loop of `frame_count` frames starting at frame 0.
    pub fn new(frame_count: u32, frame_seconds: f32) -> Self {
        Self {
            state: AnimationState::default(),
            frame_count,
            frame_seconds,
        }
    }
}

/// One simulated object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    /// World position.
    pub position: Vec2,
    /// Linear velocity; bodies without one never move on their own.
    pub velocity: Option<Vec2>,
    /// Sprite animation.
    pub animator: Option<Animator>,
    /// Player-controlled movement.
    pub mover: Option<MoverProps>,
    /// Distance from the body's origin down to its feet. Bodies with a ground
    /// probe fall under gravity and land on the ground.
    pub ground_distance: Option<f32>,
    /// Whether the body's history is recorded.
    pub rewindable: bool,
}

impl Body {
    /// A static body at `(x, y)`.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::default()
        }
    }

    /// A rewindable, animated, player-controlled body standing at `(x, y)`.
    pub fn player(x: f32, y: f32) -> Self {
        Self::at(x, y)
            .with_velocity(Vec2::ZERO)
            .with_animator(Animator::new(8, 0.1))
            .with_mover(MoverProps::default())
            .with_ground_distance(0.5)
            .rewindable()
    }

    /// Builder-style: attach a velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Builder-style: attach an animation.
    pub fn with_animator(mut self, animator: Animator) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Builder-style: make the body player-controlled.
    pub fn with_mover(mut self, props: MoverProps) -> Self {
        self.mover = Some(props);
        self
    }

    /// Builder-style: attach a ground probe.
    pub fn with_ground_distance(mut self, distance: f32) -> Self {
        self.ground_distance = Some(distance);
        self
    }

    /// Builder-style: mark the body for history recording.
    pub fn rewindable(mut self) -> Self {
        self.rewindable = true;
        self
    }

    /// The rewindable attributes of this body.
    pub fn sample(&self) -> ObjectSample {
        ObjectSample {
            position: self.position,
            velocity: self.velocity,
            animation: self.animator.map(|a| a.state),
        }
    }

    /// Overwrite the rewindable attributes from `state`.
    ///
    /// Attributes the body does not have are left alone.
    pub fn apply(&mut self, state: &ObjectSample) {
        self.position = state.position;
        if let (Some(v), Some(recorded)) = (self.velocity.as_mut(), state.velocity) {
            *v = recorded;
        }
        if let (Some(a), Some(recorded)) = (self.animator.as_mut(), state.animation) {
            a.state = recorded;
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Every body in the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    handles: HandleAllocator,
    slots: Vec<Option<(ObjectHandle, Body)>>,
}

impl World {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body. Returns its handle.
    pub fn spawn(&mut self, body: Body) -> ObjectHandle {
        let handle = self.handles.allocate();
        let idx = handle.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some((handle, body));
        debug!(%handle, rewindable = body.rewindable, "spawned body");
        handle
    }

    /// Remove a body. Returns it, or `None` if the handle is stale.
    pub fn despawn(&mut self, handle: ObjectHandle) -> Option<Body> {
        if !self.handles.release(handle) {
            return None;
        }
        let (_, body) = self.slots.get_mut(handle.index() as usize)?.take()?;
        debug!(%handle, "despawned body");
        Some(body)
    }

    /// Whether `handle` refers to a live body.
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// The body behind `handle`.
    pub fn get(&self, handle: ObjectHandle) -> Option<&Body> {
        match self.slots.get(handle.index() as usize) {
            Some(Some((h, body))) if *h == handle => Some(body),
            _ => None,
        }
    }

    /// The body behind `handle`, mutably.
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut Body> {
        match self.slots.get_mut(handle.index() as usize) {
            Some(Some((h, body))) if *h == handle => Some(body),
            _ => None,
        }
    }

    /// Number of live bodies.
    pub fn len(&self) -> usize {
        self.handles.alive_count()
    }

    /// Whether the world has no bodies.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bodies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &Body)> {
        self.slots.iter().flatten().map(|(h, body)| (*h, body))
    }

    /// Bodies in slot order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectHandle, &mut Body)> {
        self.slots
            .iter_mut()
            .flatten()
            .map(|(h, body)| (*h, body))
    }
}

impl RewindTarget for World {
    fn sample(&self, handle: ObjectHandle) -> Option<ObjectSample> {
        self.get(handle).map(Body::sample)
    }

    fn apply(&mut self, handle: ObjectHandle, state: &ObjectSample) {
        if let Some(body) = self.get_mut(handle) {
            body.apply(state);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
