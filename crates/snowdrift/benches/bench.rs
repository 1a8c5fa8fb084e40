use core::hint::black_box;
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use snowdrift::{
    AtomicSnowflakeGenerator, DriftSnowflakeGenerator, GeneratorOptions, LockSnowflakeGenerator,
    MonotonicClock, SnowflakeGenerator, TimeSource,
};

#[derive(Clone, Copy)]
struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// IDs generated per benchmark iteration (per thread for the contended
/// group).
const TOTAL_IDS: usize = 4096;

/// Single-threaded generation; a fresh generator per iteration.
fn bench_generator<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: SnowflakeGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Shared generator across threads.
fn bench_generator_contended<G>(
    c: &mut Criterion,
    group_name: &str,
    generator_factory: impl Fn() -> G,
) where
    G: SnowflakeGenerator + Send + Sync,
{
    let mut group = c.benchmark_group(group_name);

    for thread_count in [1, 2, 4, 8] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(format!("elems/{TOTAL_IDS}/threads/{thread_count}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    let generator = Arc::new(generator_factory());
                    let barrier = Arc::new(Barrier::new(thread_count));
                    scope(|s| {
                        for _ in 0..thread_count {
                            let generator = Arc::clone(&generator);
                            let barrier = Arc::clone(&barrier);
                            s.spawn(move || {
                                barrier.wait();
                                for _ in 0..ids_per_thread {
                                    black_box(generator.next_id().unwrap());
                                }
                            });
                        }
                    });
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// The drift strategy against a pinned clock: every exhaustion borrows a
/// virtual tick, so this measures the pure sequence hot path with no
/// millisecond waits.
fn drift_pinned_clock(c: &mut Criterion) {
    let options = GeneratorOptions::default();
    bench_generator(c, "drift/pinned", move || {
        DriftSnowflakeGenerator::new(&options, FixedMockTime { millis: 42 }).unwrap()
    });
}

fn sequential(c: &mut Criterion) {
    let options = GeneratorOptions::default();

    let clock = MonotonicClock::default();
    bench_generator(c, "drift/mono", {
        let clock = clock.clone();
        let options = options.clone();
        move || DriftSnowflakeGenerator::new(&options, clock.clone()).unwrap()
    });

    let clock = MonotonicClock::default();
    bench_generator(c, "lock/mono", {
        let clock = clock.clone();
        let options = options.clone();
        move || LockSnowflakeGenerator::new(&options, clock.clone()).unwrap()
    });

    let clock = MonotonicClock::default();
    bench_generator(c, "atomic/mono", {
        let clock = clock.clone();
        let options = options.clone();
        move || AtomicSnowflakeGenerator::new(&options, clock.clone()).unwrap()
    });
}

fn contended(c: &mut Criterion) {
    let options = GeneratorOptions::default();

    let clock = MonotonicClock::default();
    bench_generator_contended(c, "drift/contended", {
        let clock = clock.clone();
        let options = options.clone();
        move || DriftSnowflakeGenerator::new(&options, clock.clone()).unwrap()
    });

    let clock = MonotonicClock::default();
    bench_generator_contended(c, "lock/contended", {
        let clock = clock.clone();
        let options = options.clone();
        move || LockSnowflakeGenerator::new(&options, clock.clone()).unwrap()
    });

    let clock = MonotonicClock::default();
    bench_generator_contended(c, "atomic/contended", {
        let clock = clock.clone();
        let options = options.clone();
        move || AtomicSnowflakeGenerator::new(&options, clock.clone()).unwrap()
    });
}

criterion_group!(benches, drift_pinned_clock, sequential, contended);
criterion_main!(benches);
