//! Platformer movement systems.
//!
//! Three systems, run in this order on every live tick:
//!
//! - [`gravity_system`]: bodies with a ground probe accelerate downward, move
//!   by their velocity and land on the ground plane;
//! - [`player_control_system`]: grounded players set their horizontal speed
//!   directly from the axis and can jump; airborne players accelerate toward
//!   the axis, capped at their max speed;
//! - [`animation_system`]: moving bodies advance their animation loop; still
//!   bodies rest on frame 0.
//!
//! Integration is explicit Euler against a flat ground plane at
//! [`MovementConfig::ground_level`].

use serde::{Deserialize, Serialize};

use crate::tick::SystemContext;
use crate::world::World;
use crate::EngineError;

/// Registered name of [`gravity_system`].
pub const GRAVITY_SYSTEM: &str = "gravity";
/// Registered name of [`player_control_system`].
pub const PLAYER_CONTROL_SYSTEM: &str = "player_control";
/// Registered name of [`animation_system`].
pub const ANIMATION_SYSTEM: &str = "animation";

// ---------------------------------------------------------------------------
// MovementConfig
// ---------------------------------------------------------------------------

/// World-wide movement tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Downward acceleration, units/s².
    pub gravity: f32,
    /// Terminal falling speed, units/s.
    pub max_fall_speed: f32,
    /// Height of the ground plane.
    pub ground_level: f32,
    /// Extra probe length when checking whether a player stands on ground.
    pub ground_probe_margin: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            max_fall_speed: 20.0,
            ground_level: 0.0,
            ground_probe_margin: 0.1,
        }
    }
}

impl MovementConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`] for a negative or non-finite gravity or
    /// probe margin, a non-positive fall speed, or a non-finite ground level.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |field, reason: &str, value: f32| EngineError::InvalidConfig {
            field,
            reason: format!("{reason}, got {value}"),
        };
        if !(self.gravity >= 0.0 && self.gravity.is_finite()) {
            return Err(invalid(
                "movement.gravity",
                "must be non-negative and finite",
                self.gravity,
            ));
        }
        if !(self.max_fall_speed > 0.0 && self.max_fall_speed.is_finite()) {
            return Err(invalid(
                "movement.max_fall_speed",
                "must be positive and finite",
                self.max_fall_speed,
            ));
        }
        if !self.ground_level.is_finite() {
            return Err(invalid("movement.ground_level", "must be finite", self.ground_level));
        }
        if !(self.ground_probe_margin >= 0.0 && self.ground_probe_margin.is_finite()) {
            return Err(invalid(
                "movement.ground_probe_margin",
                "must be non-negative and finite",
                self.ground_probe_margin,
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Fall, move, land.
///
/// Applies to bodies with both a velocity and a ground probe.
pub fn gravity_system(world: &mut World, ctx: &SystemContext<'_>) {
    let cfg = ctx.movement;
    for (_, body) in world.iter_mut() {
        let (Some(velocity), Some(ground_distance)) = (body.velocity.as_mut(), body.ground_distance)
        else {
            continue;
        };
        velocity.y = (velocity.y - cfg.gravity * ctx.dt).max(-cfg.max_fall_speed);
        body.position = body.position + *velocity * ctx.dt;

        if body.position.y - ground_distance <= cfg.ground_level {
            velocity.y = 0.0;
            body.position.y = cfg.ground_level + ground_distance;
        }
    }
}

/// Horizontal control and jumping.
///
/// Applies to bodies with a velocity, a ground probe and mover properties.
pub fn player_control_system(world: &mut World, ctx: &SystemContext<'_>) {
    let cfg = ctx.movement;
    let axis = ctx.input.horizontal();
    let jump = ctx.input.jump_pressed();
    for (_, body) in world.iter_mut() {
        let (Some(velocity), Some(ground_distance), Some(props)) =
            (body.velocity.as_mut(), body.ground_distance, body.mover)
        else {
            continue;
        };
        let probe = ground_distance + cfg.ground_probe_margin;
        let grounded = body.position.y - probe <= cfg.ground_level;

        if grounded {
            if jump {
                velocity.y = props.jump_force;
            }
            velocity.x = axis * props.max_speed;
        } else {
            velocity.x += axis * props.acceleration * ctx.dt;
            velocity.x = velocity.x.clamp(-props.max_speed, props.max_speed);
        }
    }
}

/// Advance the animation loop of moving bodies.
///
/// A body is moving when its horizontal velocity is non-zero. Still bodies
/// snap back to frame 0.
pub fn animation_system(world: &mut World, ctx: &SystemContext<'_>) {
    for (_, body) in world.iter_mut() {
        let (Some(animator), Some(velocity)) = (body.animator.as_mut(), body.velocity) else {
            continue;
        };
        if velocity.x == 0.0 {
            animator.state.frame = 0;
            animator.state.timer = 0.0;
            continue;
        }
        animator.state.timer += ctx.dt;
        if animator.frame_seconds > 0.0 && animator.state.timer >= animator.frame_seconds {
            animator.state.timer -= animator.frame_seconds;
            animator.state.frame = (animator.state.frame + 1) % animator.frame_count.max(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
