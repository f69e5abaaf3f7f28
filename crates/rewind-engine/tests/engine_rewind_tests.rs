//! Engine-level rewind tests: scrubbing the full simulation, replay after
//! release, scripted determinism, config files and snapshots.

use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use rewind_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run_right() -> InputFrame {
    InputFrame {
        horizontal: 1.0,
        ..Default::default()
    }
}

fn hold_rewind() -> InputFrame {
    InputFrame {
        rewind: true,
        ..Default::default()
    }
}

/// A hero on the ground and a box falling from above, both rewindable.
fn scene(config: &EngineConfig) -> (TickLoop, ObjectHandle) {
    let mut tick_loop = TickLoop::with_default_systems(World::new(), config).unwrap();
    let hero = tick_loop.spawn(Body::player(0.0, 0.5));
    tick_loop.spawn(
        Body::at(3.0, 8.0)
            .with_velocity(Vec2::ZERO)
            .with_ground_distance(0.25)
            .rewindable(),
    );
    (tick_loop, hero)
}

/// Play `frames`, returning the world hash after each recorded tick, indexed
/// by timeline tick (index 0 is unused).
fn record_hashes(tick_loop: &mut TickLoop, frames: &[InputFrame]) -> Vec<String> {
    let mut hashes = vec![String::new()];
    for &frame in frames {
        tick_loop.set_input(frame);
        match tick_loop.tick() {
            TickPhase::Recorded { tick } => {
                assert_eq!(tick as usize, hashes.len());
                hashes.push(tick_loop.world_hash());
            }
            other => panic!("expected a live tick, got {other:?}"),
        }
    }
    hashes
}

/// Running right with a jump every 40 ticks.
fn play_frames(ticks: usize) -> Vec<InputFrame> {
    (0..ticks)
        .map(|i| InputFrame {
            jump: i % 40 == 10,
            ..run_right()
        })
        .collect()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rewind-engine-{}-{name}", std::process::id()))
}

// -- 1. Scrubbing ---------------------------------------------------------

#[test]
fn scrubbed_world_matches_recorded_world() {
    let (mut tl, _) = scene(&EngineConfig::default());
    let hashes = record_hashes(&mut tl, &play_frames(300));

    tl.set_input(hold_rewind());
    for expected_seek in (1..300u32).rev() {
        assert_eq!(tl.tick(), TickPhase::Scrubbed { seek_tick: expected_seek });
        assert_eq!(tl.world_hash(), hashes[expected_seek as usize], "seek {expected_seek}");
    }
    // Clamped at the first tick.
    assert_eq!(tl.tick(), TickPhase::Scrubbed { seek_tick: 1 });
    assert_eq!(tl.world_hash(), hashes[1]);
}

#[test]
fn forward_scrub_stops_before_the_head() {
    let (mut tl, _) = scene(&EngineConfig::default());
    let hashes = record_hashes(&mut tl, &play_frames(150));

    tl.set_input(hold_rewind());
    tl.run_ticks(50);
    assert_eq!(tl.rewinder().clock().seek_tick(), 100);

    // Two presses: Reverse1 -> Paused -> Forward1.
    for _ in 0..2 {
        tl.set_input(InputFrame {
            speed_up: true,
            ..hold_rewind()
        });
        tl.tick();
        tl.set_input(hold_rewind());
        tl.tick();
    }
    assert_eq!(tl.telemetry().status, PlayStatus::Forward);
    tl.run_ticks(200);
    assert_eq!(tl.rewinder().clock().seek_tick(), 149);
    assert_eq!(tl.world_hash(), hashes[149]);
}

#[test]
fn paused_scrub_holds_position() {
    let (mut tl, hero) = scene(&EngineConfig::default());
    record_hashes(&mut tl, &play_frames(60));

    tl.set_input(hold_rewind());
    tl.run_ticks(10);
    tl.set_input(InputFrame {
        speed_up: true,
        ..hold_rewind()
    });
    tl.tick();
    let seek = tl.rewinder().clock().seek_tick();
    let position = tl.world().get(hero).unwrap().position;

    tl.set_input(hold_rewind());
    tl.run_ticks(20);
    assert_eq!(tl.telemetry().status, PlayStatus::Paused);
    assert_eq!(tl.rewinder().clock().seek_tick(), seek);
    assert_eq!(tl.world().get(hero).unwrap().position, position);
}

// -- 2. Release and replay ------------------------------------------------

#[test]
fn replay_after_release_reproduces_a_straight_run() {
    let frames = play_frames(240);

    let (mut straight, _) = scene(&EngineConfig::default());
    let straight_hashes = record_hashes(&mut straight, &frames);

    // Detour: 200 ticks, rewind 50, then replay the same inputs.
    let (mut detour, _) = scene(&EngineConfig::default());
    record_hashes(&mut detour, &frames[..200]);
    detour.set_input(hold_rewind());
    detour.run_ticks(50);
    assert_eq!(detour.rewinder().clock().seek_tick(), 150);

    for (i, &frame) in frames[150..].iter().enumerate() {
        detour.set_input(frame);
        let phase = detour.tick();
        let tick = 151 + i as u32;
        if i == 0 {
            assert_eq!(phase, TickPhase::Released { head: 150, tick });
        } else {
            assert_eq!(phase, TickPhase::Recorded { tick });
        }
        assert_eq!(detour.world_hash(), straight_hashes[tick as usize], "tick {tick}");
    }
    assert_eq!(detour.rewinder().clock().max_tick(), 240);
    assert_eq!(detour.telemetry().tracked_objects, straight.telemetry().tracked_objects);
}

#[test]
fn release_discards_the_abandoned_future() {
    let (mut tl, hero) = scene(&EngineConfig::default());
    record_hashes(&mut tl, &play_frames(100));
    let far_x = tl.world().get(hero).unwrap().position.x;

    tl.set_input(hold_rewind());
    tl.run_ticks(60);
    tl.set_input(InputFrame::default());
    tl.run_ticks(5);
    assert_eq!(tl.rewinder().clock().max_tick(), 45);

    // Rewinding again never reaches the discarded positions.
    tl.set_input(hold_rewind());
    for _ in 0..40 {
        tl.tick();
        assert!(tl.world().get(hero).unwrap().position.x < far_x);
    }
}

// -- 3. Random access -----------------------------------------------------

#[test]
fn state_at_matches_live_samples() {
    let config = EngineConfig::from_json_str(r#"{ "rewind": { "keyframe_period": 16 } }"#).unwrap();
    let (mut tl, hero) = scene(&config);
    let mut samples = vec![ObjectSample::default()];
    for frame in play_frames(120) {
        tl.set_input(frame);
        tl.tick();
        samples.push(tl.world().get(hero).unwrap().sample());
    }
    for tick in [1u32, 2, 16, 17, 33, 64, 99, 120] {
        assert_eq!(tl.rewinder().state_at(hero, tick), Some(samples[tick as usize]), "tick {tick}");
    }
    // Past the head resolves to the newest state.
    assert_eq!(tl.rewinder().state_at(hero, 500), Some(samples[120]));
}

// -- 4. Scripts and determinism -------------------------------------------

#[test]
fn scripted_sessions_are_deterministic() {
    let script = InputScript::random(2024, 30);
    let run = || {
        let (mut tl, _) = scene(&EngineConfig::default());
        let phases = tl.run_script(&script);
        (phases, tl.state_hash(), tl.telemetry())
    };
    let (phases_a, hash_a, telemetry_a) = run();
    let (phases_b, hash_b, telemetry_b) = run();
    assert_eq!(phases_a, phases_b);
    assert_eq!(hash_a, hash_b);
    assert_eq!(telemetry_a, telemetry_b);
    assert_eq!(phases_a.len() as u64, script.total_ticks());
    assert!(phases_a.iter().any(|p| matches!(p, TickPhase::Scrubbed { .. })));
}

#[test]
fn script_file_round_trip() {
    let path = temp_path("script.json");
    let script = InputScript::new().then(20, run_right()).then(10, hold_rewind());
    fs::write(&path, script.to_json().unwrap()).unwrap();
    let loaded = InputScript::load(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(loaded, script);

    let (mut tl, _) = scene(&EngineConfig::default());
    let phases = tl.run_script(&loaded);
    assert_eq!(phases.last(), Some(&TickPhase::Scrubbed { seek_tick: 10 }));
}

// -- 5. Config --------------------------------------------------------------

#[test]
fn config_file_drives_the_loop() {
    let path = temp_path("config.json");
    fs::write(
        &path,
        r#"{ "tick": { "fixed_dt": 0.02 }, "movement": { "gravity": 10.0 } }"#,
    )
    .unwrap();
    let config = EngineConfig::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let tl = TickLoop::with_default_systems(World::new(), &config).unwrap();
    assert_eq!(tl.fixed_dt(), 0.02);
    assert_eq!(tl.movement().gravity, 10.0);
    assert_eq!(tl.rewinder().keyframe_period(), DEFAULT_KEYFRAME_PERIOD);
}

#[test]
fn invalid_config_file_is_rejected() {
    let path = temp_path("bad-config.json");
    fs::write(&path, r#"{ "movement": { "max_fall_speed": 0.0 } }"#).unwrap();
    let err = EngineConfig::load(&path).unwrap_err();
    fs::remove_file(&path).unwrap();
    assert!(matches!(
        err,
        EngineError::InvalidConfig { field: "movement.max_fall_speed", .. }
    ));
}

// -- 6. Snapshots -----------------------------------------------------------

#[test]
fn snapshot_restore_then_rewind_stops_at_restore_point() {
    let (mut tl, hero) = scene(&EngineConfig::default());
    record_hashes(&mut tl, &play_frames(80));
    let snapshot = tl.capture_snapshot();
    let restored_x = snapshot.world.get(hero).unwrap().position.x;

    tl.run_ticks(40);
    tl.restore_from_snapshot(&snapshot).unwrap();
    tl.set_input(run_right());
    tl.run_ticks(30);

    tl.set_input(hold_rewind());
    tl.run_ticks(100);
    assert_eq!(tl.rewinder().clock().seek_tick(), 1);
    // Timeline tick 1 after restore is one tick past the restore point.
    assert!(tl.world().get(hero).unwrap().position.x > restored_x);
}

// -- 7. Properties ----------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_script_leaves_a_consistent_timeline(seed in any::<u64>(), segments in 1usize..12) {
        let script = InputScript::random(seed, segments);
        let (mut tl, hero) = scene(&EngineConfig::default());
        let phases = tl.run_script(&script);
        prop_assert_eq!(phases.len() as u64, script.total_ticks());

        let clock = tl.rewinder().clock();
        prop_assert!(clock.seek_tick() <= clock.max_tick());
        if clock.max_tick() > 0 {
            prop_assert!(clock.seek_tick() >= 1);
        }
        // Whatever happened, the hero stays on or above the ground.
        prop_assert!(tl.world().get(hero).unwrap().position.y >= 0.5);
    }
}
