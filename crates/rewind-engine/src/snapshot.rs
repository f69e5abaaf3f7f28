//! Engine snapshot and restore with BLAKE3 hashing.
//!
//! [`EngineSnapshot`] is a serializable copy of the simulation state (world,
//! tick counter, fixed dt, input frame) with a BLAKE3 content hash for
//! integrity checks and determinism testing.
//!
//! # Usage
//!
//! ```
//! use rewind_engine::prelude::*;
//!
//! let config = EngineConfig::default();
//! let mut tick_loop = TickLoop::with_default_systems(World::new(), &config).unwrap();
//! tick_loop.spawn(Body::player(0.0, 0.5));
//! tick_loop.run_ticks(10);
//!
//! let snapshot = tick_loop.capture_snapshot();
//! assert_eq!(snapshot.tick_counter, 10);
//! assert_eq!(snapshot.hash.len(), 64); // BLAKE3 hex digest
//!
//! tick_loop.run_ticks(10);
//! tick_loop.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert_eq!(tick_loop.state_hash(), snapshot.hash);
//! ```
//!
//! # Branching
//!
//! [`TickLoop::fork_snapshot`] captures a branch point. Same state, same
//! systems and same inputs give the same hash:
//!
//! ```
//! use rewind_engine::prelude::*;
//!
//! let config = EngineConfig::default();
//! let mut tick_loop = TickLoop::with_default_systems(World::new(), &config).unwrap();
//! tick_loop.spawn(Body::player(0.0, 3.0));
//! tick_loop.run_ticks(50);
//! let fork = tick_loop.fork_snapshot();
//!
//! tick_loop.run_ticks(50);
//! let hash_a = tick_loop.state_hash();
//!
//! tick_loop.restore_from_snapshot(&fork).unwrap();
//! tick_loop.run_ticks(50);
//! assert_eq!(tick_loop.state_hash(), hash_a);
//! ```
//!
//! # What Is NOT Serialized
//!
//! - **Systems**: retained when restoring on the same `TickLoop`.
//! - **History**: restore starts a fresh timeline at the restored state;
//!   rewinding cannot go back past it.
//! - **Diagnostics**: per-tick timing is transient.

use serde::{Deserialize, Serialize};

use crate::input::InputFrame;
use crate::tick::TickLoop;
use crate::world::World;

// ---------------------------------------------------------------------------
// EngineSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of the engine simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Every body and the handle allocator.
    pub world: World,
    /// Number of ticks executed at the time of capture.
    pub tick_counter: u64,
    /// Fixed time step in seconds per tick.
    pub fixed_dt: f64,
    /// Input frame at the time of capture.
    pub current_input: InputFrame,
    /// BLAKE3 hex digest (64 lowercase hex chars) of the fields above.
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest of the canonical JSON encoding of `value`.
fn hash_json<T: Serialize>(value: &T) -> String {
    let json_bytes =
        serde_json::to_vec(value).expect("engine state should always be JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}

/// Digest of everything that affects simulation determinism. The hash field
/// itself is derived and not included.
fn compute_hash(world: &World, tick_counter: u64, fixed_dt: f64, input: &InputFrame) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        world: &'a World,
        tick_counter: u64,
        fixed_dt: f64,
        current_input: &'a InputFrame,
    }

    hash_json(&HashableState {
        world,
        tick_counter,
        fixed_dt,
        current_input: input,
    })
}

// ---------------------------------------------------------------------------
// TickLoop snapshot/restore methods
// ---------------------------------------------------------------------------

impl TickLoop {
    /// Capture the simulation state and its hash.
    pub fn capture_snapshot(&self) -> EngineSnapshot {
        let world = self.world().clone();
        let tick_counter = self.tick_count();
        let fixed_dt = self.fixed_dt();
        let current_input = *self.current_input();
        let hash = compute_hash(&world, tick_counter, fixed_dt, &current_input);
        EngineSnapshot {
            world,
            tick_counter,
            fixed_dt,
            current_input,
            hash,
        }
    }

    /// Restore the simulation state from a snapshot.
    ///
    /// The snapshot's hash is verified first; on mismatch nothing is
    /// modified. Restoring replaces the world, tick counter and fixed dt,
    /// clears the history and starts tracking the restored rewindable
    /// bodies from the next tick. The captured input frame stays current, so
    /// a button held at capture does not fire a fresh press.
    ///
    /// # Errors
    ///
    /// Returns an error if `fixed_dt` is invalid or the hash does not match
    /// the snapshot's contents.
    pub fn restore_from_snapshot(
        &mut self,
        snapshot: &EngineSnapshot,
    ) -> Result<(), anyhow::Error> {
        if !(snapshot.fixed_dt > 0.0 && snapshot.fixed_dt.is_finite()) {
            return Err(anyhow::anyhow!(
                "snapshot has invalid fixed_dt: {}. Must be positive and finite.",
                snapshot.fixed_dt
            ));
        }

        let expected_hash = compute_hash(
            &snapshot.world,
            snapshot.tick_counter,
            snapshot.fixed_dt,
            &snapshot.current_input,
        );
        if expected_hash != snapshot.hash {
            return Err(anyhow::anyhow!(
                "snapshot hash mismatch: recorded {} but recomputed {}",
                snapshot.hash,
                expected_hash
            ));
        }

        self.reset_to(
            snapshot.world.clone(),
            snapshot.tick_counter,
            snapshot.fixed_dt,
            snapshot.current_input,
        );
        tracing::debug!(tick = snapshot.tick_counter, "restored snapshot");
        Ok(())
    }

    /// The hash [`capture_snapshot`](Self::capture_snapshot) would produce.
    pub fn state_hash(&self) -> String {
        compute_hash(
            self.world(),
            self.tick_count(),
            self.fixed_dt(),
            self.current_input(),
        )
    }

    /// Hash of the world alone.
    ///
    /// Unlike [`state_hash`](Self::state_hash) this ignores the tick counter
    /// and input, so a world scrubbed back to timeline tick `t` hashes the
    /// same as it did when tick `t` was recorded.
    pub fn world_hash(&self) -> String {
        hash_json(self.world())
    }

    /// Same as [`capture_snapshot`](Self::capture_snapshot), named for
    /// branching workflows.
    pub fn fork_snapshot(&self) -> EngineSnapshot {
        self.capture_snapshot()
    }
}
