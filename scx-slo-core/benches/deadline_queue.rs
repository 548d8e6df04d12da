//! Deadline Queue performance benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scx_slo_core::deadline_queue::DeadlineQueue;

/// Benchmark insert into a queue of varying pre-existing size.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("deadline_queue/insert");

    for size in [0usize, 1_000, 10_000, 100_000] {
        let queue = DeadlineQueue::new();
        for tid in 0..size as u32 {
            queue.insert(tid, (tid as u64) * 1_000);
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            let mut next_tid = size as u32;
            b.iter(|| {
                queue.insert(black_box(next_tid), black_box((next_tid as u64) * 1_000));
                next_tid = next_tid.wrapping_add(1);
            })
        });
    }

    group.finish();
}

/// Benchmark pop_min against a freshly populated queue each iteration.
fn bench_pop_min(c: &mut Criterion) {
    let mut group = c.benchmark_group("deadline_queue/pop_min");

    group.bench_function("pop_10_000", |b| {
        b.iter_batched(
            || {
                let queue = DeadlineQueue::new();
                for tid in 0..10_000u32 {
                    queue.insert(tid, (10_000 - tid) as u64);
                }
                queue
            },
            |queue| {
                while queue.pop_min().is_some() {}
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

/// Benchmark re-inserting an already-queued tid (decrease-key via
/// remove+reinsert), the path the scheduler state machine hits on every
/// re-enqueue of a task that is still in the queue.
fn bench_reinsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("deadline_queue/reinsert");

    let queue = DeadlineQueue::new();
    for tid in 0..10_000u32 {
        queue.insert(tid, (tid as u64) * 1_000);
    }

    group.bench_function("reinsert_existing_tid", |b| {
        let mut deadline = 0u64;
        b.iter(|| {
            queue.insert(black_box(5_000), black_box(deadline));
            deadline += 1;
        })
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_pop_min, bench_reinsert);
criterion_main!(benches);
