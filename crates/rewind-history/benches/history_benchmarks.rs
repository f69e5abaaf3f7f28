//! Rewind history benchmarks.
//!
//! Measures the per-tick cost of the two passes with many tracked objects:
//!
//! - **record**: one tick of delta encoding, with a share of objects moving;
//! - **scrub**: one tick of seeking at every speed magnitude;
//! - **release**: truncating a long timeline at its midpoint.
//!
//! Run with: `cargo bench --bench history_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use rewind_history::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Objects live at the slot index of their handle.
struct Crowd {
    states: Vec<ObjectSample>,
}

impl RewindTarget for Crowd {
    fn sample(&self, handle: ObjectHandle) -> Option<ObjectSample> {
        self.states.get(handle.index() as usize).copied()
    }

    fn apply(&mut self, handle: ObjectHandle, state: &ObjectSample) {
        if let Some(s) = self.states.get_mut(handle.index() as usize) {
            *s = *state;
        }
    }
}

/// A crowd of `count` animated objects, every one tracked.
fn setup(count: usize) -> (Crowd, Rewinder) {
    let mut allocator = HandleAllocator::new();
    let mut rewinder = Rewinder::new(RewindConfig::default()).unwrap();
    let mut crowd = Crowd {
        states: Vec::with_capacity(count),
    };
    for i in 0..count {
        let handle = allocator.allocate();
        rewinder.request_tracking(handle);
        crowd.states.push(
            ObjectSample::at(i as f32, 0.0)
                .with_velocity(Vec2::ZERO)
                .with_animation(0, 0.0),
        );
    }
    (crowd, rewinder)
}

/// Move roughly `moving_pct` percent of the crowd.
fn simulate(crowd: &mut Crowd, rng: &mut Pcg64Mcg, moving_pct: u32) {
    for state in &mut crowd.states {
        if rng.gen_range(0..100) < moving_pct {
            let v = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            state.position = state.position + v * 0.016;
            state.velocity = Some(v);
            if let Some(anim) = state.animation.as_mut() {
                anim.timer += 0.016;
            }
        }
    }
}

fn recorded_session(count: usize, ticks: u32) -> (Crowd, Rewinder) {
    let (mut crowd, mut rewinder) = setup(count);
    let mut rng = Pcg64Mcg::seed_from_u64(7);
    for _ in 0..ticks {
        rewinder.tick(&ControlInput::default(), &mut crowd);
        simulate(&mut crowd, &mut rng, 30);
    }
    (crowd, rewinder)
}

// ---------------------------------------------------------------------------
// Benchmark 1: record pass
// ---------------------------------------------------------------------------

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_pass");
    for &count in &[100usize, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (mut crowd, mut rewinder) = setup(count);
            let mut rng = Pcg64Mcg::seed_from_u64(42);
            let idle = ControlInput::default();
            b.iter(|| {
                simulate(&mut crowd, &mut rng, 10);
                black_box(rewinder.tick(&idle, &mut crowd));
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 2: scrub pass at each speed magnitude
// ---------------------------------------------------------------------------

fn bench_scrub(c: &mut Criterion) {
    let mut group = c.benchmark_group("scrub_pass");
    let hold = ControlInput {
        rewind_held: true,
        ..Default::default()
    };
    for (steps, slower) in [(1u32, 0usize), (2, 1), (4, 2), (8, 3)] {
        group.bench_function(BenchmarkId::new("reverse", steps), |b| {
            b.iter_batched(
                || {
                    let (crowd, mut rewinder) = recorded_session(500, 600);
                    for _ in 0..slower {
                        rewinder.clock_mut().decrease_speed();
                    }
                    (crowd, rewinder)
                },
                |(mut crowd, mut rewinder)| {
                    for _ in 0..32 {
                        black_box(rewinder.tick(&hold, &mut crowd));
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 3: release
// ---------------------------------------------------------------------------

fn bench_release(c: &mut Criterion) {
    c.bench_function("release_midpoint_500x600", |b| {
        b.iter_batched(
            || {
                let (mut crowd, mut rewinder) = recorded_session(500, 600);
                for _ in 0..4 {
                    rewinder.clock_mut().decrease_speed();
                }
                let hold = ControlInput {
                    rewind_held: true,
                    ..Default::default()
                };
                for _ in 0..38 {
                    rewinder.tick(&hold, &mut crowd);
                }
                rewinder
            },
            |mut rewinder| black_box(rewinder.release()),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_record, bench_scrub, bench_release);
criterion_main!(benches);
