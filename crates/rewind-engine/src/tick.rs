//! Fixed-timestep tick loop with time scrubbing.
//!
//! The [`TickLoop`] drives the simulation forward. Each tick:
//!
//! 1. The pending [`InputFrame`] becomes the current frame.
//! 2. The rewinder drains pending tracking requests and observes the rewind
//!    controls.
//! 3. If the timeline is not being scrubbed, all registered systems run in
//!    registration order, each receiving the [`World`] and a
//!    [`SystemContext`].
//! 4. The rewinder runs its pass: record the tick, or scrub and write history
//!    back into the world, or (on release) truncate and record.
//! 5. The tick counter advances.
//!
//! The tick counter counts simulation ticks executed, scrubbed or not. It is
//! distinct from the rewinder's timeline ticks, which move backward while
//! scrubbing.
//!
//! # Example
//!
//! ```
//! use rewind_engine::prelude::*;
//!
//! let config = EngineConfig::default();
//! let mut tick_loop = TickLoop::new(World::new(), &config).unwrap();
//!
//! // Register systems.
//! tick_loop.add_system("drift", |world, ctx| {
//!     for (_, body) in world.iter_mut() {
//!         body.position.x += ctx.dt;
//!     }
//! });
//!
//! let h = tick_loop.spawn(Body::at(0.0, 0.0).rewindable());
//! tick_loop.run_ticks(10);
//!
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert_eq!(tick_loop.rewinder().clock().max_tick(), 10);
//! assert!(tick_loop.world().get(h).unwrap().position.x > 0.0);
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use rewind_history::handle::ObjectHandle;
use rewind_history::rewinder::{Rewinder, TickPhase};
use rewind_history::telemetry::HistoryTelemetry;

use crate::config::EngineConfig;
use crate::input::{InputFrame, InputState};
use crate::movement::{
    animation_system, gravity_system, player_control_system, MovementConfig, ANIMATION_SYSTEM,
    GRAVITY_SYSTEM, PLAYER_CONTROL_SYSTEM,
};
use crate::script::InputScript;
use crate::world::{Body, World};
use crate::EngineError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
///
/// The `fixed_dt` is the duration in seconds of each simulation tick. A value
/// of `1.0 / 60.0` gives 60 ticks per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick).
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl TickConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`] if `fixed_dt` is not positive and finite.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(EngineError::InvalidConfig {
                field: "tick.fixed_dt",
                reason: format!("must be positive and finite, got {}", self.fixed_dt),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system (in order of execution). Empty on scrub
    /// ticks, when no system runs.
    pub system_times: Vec<(String, Duration)>,
    /// Time spent in the rewinder pass.
    pub rewind_time: Duration,
    /// Total time for the tick.
    pub total_time: Duration,
    /// What the rewinder did.
    pub phase: Option<TickPhase>,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Read-only per-tick context handed to every system.
#[derive(Debug, Clone, Copy)]
pub struct SystemContext<'a> {
    /// Fixed time step in seconds.
    pub dt: f32,
    /// Current input, with edge detection.
    pub input: &'a InputState,
    /// Movement tuning.
    pub movement: &'a MovementConfig,
}

/// A system function that advances the world by one tick.
pub type SystemFn = fn(&mut World, &SystemContext<'_>);

/// A named system in the registry.
#[derive(Debug)]
struct RegisteredSystem {
    /// Human-readable name for this system (e.g., `"gravity"`).
    name: String,
    /// The system function to invoke each tick.
    func: SystemFn,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The fixed-timestep tick loop.
///
/// Owns the [`World`] and the [`Rewinder`] recording it. Bodies spawned
/// through [`spawn`](Self::spawn) with the `rewindable` marker are tracked
/// from the next tick on; [`despawn`](Self::despawn) drops their history.
#[derive(Debug)]
pub struct TickLoop {
    /// Every simulated body.
    world: World,
    /// History of every rewindable body.
    rewinder: Rewinder,
    /// Ordered list of systems to run each live tick.
    systems: Vec<RegisteredSystem>,
    /// Number of ticks executed so far.
    tick_counter: u64,
    /// Fixed time step in seconds per tick.
    fixed_dt: f64,
    /// Movement tuning handed to systems.
    movement: MovementConfig,
    /// Current input and edge latches.
    input: InputState,
    /// Frame that becomes current on the next tick.
    next_input: InputFrame,
    /// Diagnostics from the last tick.
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a tick loop over `world` with no systems registered.
    ///
    /// Bodies already in `world` that are marked rewindable are tracked from
    /// the first tick.
    ///
    /// # Errors
    ///
    /// Returns the validation error of an invalid `config`.
    pub fn new(world: World, config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let mut rewinder = Rewinder::new(config.rewind.clone())?;
        for (handle, body) in world.iter() {
            if body.rewindable {
                rewinder.request_tracking(handle);
            }
        }
        Ok(Self {
            world,
            rewinder,
            systems: Vec::new(),
            tick_counter: 0,
            fixed_dt: config.tick.fixed_dt,
            movement: config.movement.clone(),
            input: InputState::new(),
            next_input: InputFrame::default(),
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Create a tick loop with the platformer systems registered:
    /// gravity, then player control, then animation.
    ///
    /// # Errors
    ///
    /// Returns the validation error of an invalid `config`.
    pub fn with_default_systems(world: World, config: &EngineConfig) -> Result<Self, EngineError> {
        let mut tick_loop = Self::new(world, config)?;
        tick_loop.add_system(GRAVITY_SYSTEM, gravity_system);
        tick_loop.add_system(PLAYER_CONTROL_SYSTEM, player_control_system);
        tick_loop.add_system(ANIMATION_SYSTEM, animation_system);
        Ok(tick_loop)
    }

    /// Register a system to be run each live tick.
    ///
    /// Systems are executed in the order they are registered.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
        });
    }

    /// Add a body to the world, tracking it from the next tick if it is
    /// rewindable.
    pub fn spawn(&mut self, body: Body) -> ObjectHandle {
        let handle = self.world.spawn(body);
        if body.rewindable {
            self.rewinder.request_tracking(handle);
        }
        handle
    }

    /// Remove a body from the world and drop its history.
    pub fn despawn(&mut self, handle: ObjectHandle) -> Option<Body> {
        let body = self.world.despawn(handle)?;
        if body.rewindable {
            if let Err(err) = self.rewinder.untrack(handle) {
                debug!(%handle, %err, "despawned body had no history");
            }
        }
        Some(body)
    }

    /// Execute one simulation tick. Returns what the rewinder did.
    pub fn tick(&mut self) -> TickPhase {
        let tick_start = Instant::now();

        // Phase 1: Latch input and feed the rewind controls.
        self.input.advance(self.next_input);
        let transition = self.rewinder.begin_tick(&self.input.frame().controls());

        // Phase 2: Run all systems in registered order with timing.
        let mut system_times = Vec::new();
        if !self.rewinder.is_scrubbing() {
            let ctx = SystemContext {
                dt: self.fixed_dt as f32,
                input: &self.input,
                movement: &self.movement,
            };
            system_times.reserve(self.systems.len());
            for system in &self.systems {
                let sys_start = Instant::now();
                (system.func)(&mut self.world, &ctx);
                system_times.push((system.name.clone(), sys_start.elapsed()));
            }
        }

        // Phase 3: Record or scrub.
        let rewind_start = Instant::now();
        let phase = self.rewinder.run_pass(transition, &mut self.world);
        let rewind_time = rewind_start.elapsed();

        // Phase 4: Advance tick counter.
        self.tick_counter += 1;
        trace!(tick = self.tick_counter, ?phase, "tick complete");

        self.last_diagnostics = TickDiagnostics {
            system_times,
            rewind_time,
            total_time: tick_start.elapsed(),
            phase: Some(phase),
        };
        phase
    }

    /// Run multiple ticks in sequence with the current input.
    ///
    /// Returns the number of ticks in which the simulation advanced (that
    /// is, ticks that were not spent scrubbing).
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        let mut live = 0u64;
        for _ in 0..count {
            if !matches!(self.tick(), TickPhase::Scrubbed { .. } | TickPhase::Waiting) {
                live += 1;
            }
        }
        live
    }

    /// Play an input script from start to end, one frame per tick.
    ///
    /// Returns the phase of every tick.
    pub fn run_script(&mut self, script: &InputScript) -> Vec<TickPhase> {
        let mut phases = Vec::with_capacity(script.total_ticks() as usize);
        for frame in script.frames() {
            self.set_input(frame);
            phases.push(self.tick());
        }
        phases
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid floating-point drift from
    /// repeated addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Read-only access to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world.
    ///
    /// Bodies spawned here bypass tracking; use [`spawn`](Self::spawn) for
    /// rewindable bodies.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The rewinder recording the world.
    pub fn rewinder(&self) -> &Rewinder {
        &self.rewinder
    }

    /// Whether the timeline is being scrubbed.
    pub fn is_scrubbing(&self) -> bool {
        self.rewinder.is_scrubbing()
    }

    /// Counters for an external display.
    pub fn telemetry(&self) -> HistoryTelemetry {
        self.rewinder.telemetry()
    }

    /// Movement tuning handed to systems.
    pub fn movement(&self) -> &MovementConfig {
        &self.movement
    }

    /// The number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Diagnostics from the last tick (timing per system).
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Set the input frame for the next tick.
    pub fn set_input(&mut self, input: InputFrame) {
        self.next_input = input;
    }

    /// The input frame of the last tick.
    pub fn current_input(&self) -> &InputFrame {
        self.input.frame()
    }

    // -- restore helpers (used by snapshot.rs) -----------------------------

    /// Replace the world and start a fresh history for it.
    ///
    /// `input` becomes both the current and the pending frame, with its
    /// buttons counted as already held.
    pub(crate) fn reset_to(
        &mut self,
        world: World,
        tick_counter: u64,
        fixed_dt: f64,
        input: InputFrame,
    ) {
        self.rewinder.reset();
        for (handle, body) in world.iter() {
            if body.rewindable {
                self.rewinder.request_tracking(handle);
            }
        }
        self.world = world;
        self.tick_counter = tick_counter;
        self.fixed_dt = fixed_dt;
        self.input = InputState::new();
        self.input.advance(input);
        self.next_input = input;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
