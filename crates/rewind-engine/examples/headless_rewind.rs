//! Headless rewind session.
//!
//! Runs a player through a scripted session (run, jump, hold rewind at
//! different speeds, release and run again) and prints the history
//! telemetry as JSON after each phase.
//!
//! Run with: `cargo run -p rewind-engine --example headless_rewind [config.json] [script.json]`
//!
//! Without arguments the default config and a built-in script are used.
//! Set `RUST_LOG=rewind_history=debug` to watch the playback clock.

use anyhow::Context;
use rewind_engine::prelude::*;
use tracing_subscriber::EnvFilter;

fn builtin_script() -> InputScript {
    let run = InputFrame {
        horizontal: 1.0,
        ..Default::default()
    };
    let hold = InputFrame {
        rewind: true,
        ..Default::default()
    };
    InputScript::new()
        .then(90, run)
        .then(1, InputFrame { jump: true, ..run })
        .then(60, run)
        .then(45, hold)
        .then(1, InputFrame { speed_down: true, ..hold })
        .then(20, hold)
        .then(30, InputFrame::default())
        .then(1, InputFrame { speed_up: true, ..hold })
        .then(40, hold)
        .then(60, run)
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => EngineConfig::default(),
    };
    let script = match args.next() {
        Some(path) => InputScript::load(&path).with_context(|| format!("loading script {path}"))?,
        None => builtin_script(),
    };

    let mut tick_loop = TickLoop::with_default_systems(World::new(), &config)?;
    let hero = tick_loop.spawn(Body::player(0.0, 0.5));
    // A crate dropped from above, rewound along with the hero.
    tick_loop.spawn(
        Body::at(4.0, 6.0)
            .with_velocity(Vec2::ZERO)
            .with_ground_distance(0.25)
            .rewindable(),
    );

    let mut last_scrubbing = false;
    for frame in script.frames() {
        tick_loop.set_input(frame);
        let phase = tick_loop.tick();
        let scrubbing = tick_loop.is_scrubbing();
        if scrubbing != last_scrubbing || matches!(phase, TickPhase::Released { .. }) {
            let position = tick_loop
                .world()
                .get(hero)
                .map(|b| b.position)
                .context("hero despawned")?;
            println!(
                "tick {:>4} {:?}: hero at ({:.2}, {:.2})",
                tick_loop.tick_count(),
                phase,
                position.x,
                position.y
            );
            println!("{}", serde_json::to_string(&tick_loop.telemetry())?);
            last_scrubbing = scrubbing;
        }
    }

    println!(
        "finished after {} ticks, state hash {}",
        tick_loop.tick_count(),
        tick_loop.state_hash()
    );
    Ok(())
}
