//! Scripted input: a timeline of input frames for headless runs.
//!
//! An [`InputScript`] is an ordered list of segments, each holding one
//! [`InputFrame`] for a number of ticks. Scripts serialize to JSON so they can
//! be checked in as fixtures, and can be generated from a seed for soak runs.
//!
//! ```
//! use rewind_engine::prelude::*;
//!
//! let script = InputScript::new()
//!     .then(30, InputFrame { horizontal: 1.0, ..Default::default() })
//!     .then(10, InputFrame { rewind: true, ..Default::default() });
//! assert_eq!(script.total_ticks(), 40);
//! assert!(script.frames().nth(35).unwrap().rewind);
//! ```

use std::fs;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::input::InputFrame;
use crate::EngineError;

/// One input frame held for `ticks` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    /// Number of ticks the frame is held.
    pub ticks: u32,
    /// The held frame.
    pub frame: InputFrame,
}

/// An ordered list of input segments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputScript {
    /// Segments, played in order.
    pub segments: Vec<ScriptSegment>,
}

impl InputScript {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: append `frame` held for `ticks` ticks.
    pub fn then(mut self, ticks: u32, frame: InputFrame) -> Self {
        self.push(ticks, frame);
        self
    }

    /// Append `frame` held for `ticks` ticks. Zero-tick segments are dropped.
    pub fn push(&mut self, ticks: u32, frame: InputFrame) {
        if ticks > 0 {
            self.segments.push(ScriptSegment { ticks, frame });
        }
    }

    /// Total number of ticks the script covers.
    pub fn total_ticks(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.ticks)).sum()
    }

    /// One frame per tick, in order.
    pub fn frames(&self) -> impl Iterator<Item = InputFrame> + '_ {
        self.segments
            .iter()
            .flat_map(|s| std::iter::repeat(s.frame).take(s.ticks as usize))
    }

    /// A reproducible random play session of `segments` segments.
    ///
    /// Sessions alternate between live play (running, jumping) and rewind
    /// holds with occasional speed presses, so every phase of the timeline is
    /// exercised. Same seed, same script.
    pub fn random(seed: u64, segments: usize) -> Self {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut script = Self::new();
        for _ in 0..segments {
            let axis = [-1.0, 0.0, 1.0][rng.gen_range(0..3)];
            if rng.gen_bool(0.3) {
                // Rewind hold, optionally tapping a speed button on entry.
                let speed_up = rng.gen_bool(0.25);
                let speed_down = !speed_up && rng.gen_bool(0.25);
                let hold = InputFrame {
                    rewind: true,
                    ..Default::default()
                };
                script.push(
                    1,
                    InputFrame {
                        speed_up,
                        speed_down,
                        ..hold
                    },
                );
                script.push(rng.gen_range(5..60), hold);
            } else {
                let jump = rng.gen_bool(0.3);
                script.push(
                    rng.gen_range(1..4),
                    InputFrame {
                        horizontal: axis,
                        jump,
                        ..Default::default()
                    },
                );
                script.push(
                    rng.gen_range(10..90),
                    InputFrame {
                        horizontal: axis,
                        ..Default::default()
                    },
                );
            }
        }
        script
    }

    /// Parse a JSON script.
    ///
    /// # Errors
    ///
    /// [`EngineError::Json`] for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON script file.
    ///
    /// # Errors
    ///
    /// [`EngineError::Io`] if the file cannot be read, [`EngineError::Json`]
    /// if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// [`EngineError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}
