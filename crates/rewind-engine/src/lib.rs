//! Rewind Engine -- fixed-step platformer simulation with time scrubbing.
//!
//! This crate builds on [`rewind_history`] to provide the simulation around
//! it: a [`World`](world::World) of bodies, platformer movement systems, a
//! fixed-timestep [`TickLoop`](tick::TickLoop) that runs those systems while
//! live and hands every tick to the [`Rewinder`](rewind_history::rewinder::Rewinder),
//! per-tick [`InputFrame`](input::InputFrame)s, scripted input, JSON
//! configuration and a BLAKE3 state hash for determinism checks.
//!
//! # Quick Start
//!
//! ```
//! use rewind_engine::prelude::*;
//!
//! let config = EngineConfig::default();
//! let mut tick_loop = TickLoop::with_default_systems(World::new(), &config).unwrap();
//! let hero = tick_loop.spawn(Body::player(0.0, 0.5));
//!
//! // Run right for a second.
//! tick_loop.set_input(InputFrame { horizontal: 1.0, ..Default::default() });
//! tick_loop.run_ticks(60);
//! let moved = tick_loop.world().get(hero).unwrap().position.x;
//! assert!(moved > 0.0);
//!
//! // Hold rewind: the hero walks back toward where it came from.
//! tick_loop.set_input(InputFrame { rewind: true, ..Default::default() });
//! tick_loop.run_ticks(30);
//! assert!(tick_loop.world().get(hero).unwrap().position.x < moved);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod input;
pub mod movement;
pub mod script;
pub mod snapshot;
pub mod tick;
pub mod world;

use std::path::PathBuf;

use rewind_history::RewindError;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the history crate for convenience.
pub use rewind_history;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the engine shell.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A configuration or script file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON could not be parsed or produced.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("invalid config: {field} {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The rewind history rejected an operation.
    #[error(transparent)]
    Rewind(#[from] RewindError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the history prelude.
    pub use rewind_history::prelude::*;

    pub use crate::config::EngineConfig;
    pub use crate::input::{InputFrame, InputState};
    pub use crate::movement::{
        animation_system, gravity_system, player_control_system, MovementConfig,
        ANIMATION_SYSTEM, GRAVITY_SYSTEM, PLAYER_CONTROL_SYSTEM,
    };
    pub use crate::script::{InputScript, ScriptSegment};
    pub use crate::snapshot::EngineSnapshot;
    pub use crate::tick::{SystemContext, SystemFn, TickConfig, TickDiagnostics, TickLoop};
    pub use crate::world::{Animator, Body, MoverProps, World};
    pub use crate::EngineError;
}
