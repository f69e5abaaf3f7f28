//! Per-tick input frames and edge detection.
//!
//! An [`InputFrame`] is the raw hold state of every control for one tick. It
//! is plain data so it can be scripted and serialized. [`InputState`] keeps
//! the previous frame's jump hold to turn the jump button into a press edge;
//! the rewind controls get their edges inside the playback clock.

use serde::{Deserialize, Serialize};

use rewind_history::clock::{ControlInput, EdgeLatch};

/// Hold state of every control for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    /// Horizontal axis in `[-1, 1]`; out-of-range values are clamped.
    pub horizontal: f32,
    /// Jump button held.
    pub jump: bool,
    /// Rewind button held.
    pub rewind: bool,
    /// Speed-increase button held.
    pub speed_up: bool,
    /// Speed-decrease button held.
    pub speed_down: bool,
}

impl InputFrame {
    /// The horizontal axis, clamped to `[-1, 1]`. Non-finite values read as 0.
    pub fn axis(&self) -> f32 {
        if self.horizontal.is_finite() {
            self.horizontal.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// The rewind controls of this frame.
    pub fn controls(&self) -> ControlInput {
        ControlInput {
            rewind_held: self.rewind,
            speed_up_held: self.speed_up,
            speed_down_held: self.speed_down,
        }
    }
}

/// The current frame plus the latch that detects jump presses.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    frame: InputFrame,
    jump: EdgeLatch,
}

impl InputState {
    /// A state with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `frame` the current frame.
    pub fn advance(&mut self, frame: InputFrame) {
        self.frame = frame;
        self.jump.update(frame.jump);
    }

    /// The current frame.
    pub fn frame(&self) -> &InputFrame {
        &self.frame
    }

    /// Clamped horizontal axis of the current frame.
    pub fn horizontal(&self) -> f32 {
        self.frame.axis()
    }

    /// Jump went from released to held on this frame.
    pub fn jump_pressed(&self) -> bool {
        self.jump.pressed()
    }
}
