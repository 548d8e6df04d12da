/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Drives `scx-slo-core` with a [`SystemClock`] under concurrent synthetic
//! load: several OS threads, each standing in for one CPU, repeatedly
//! enqueue / run / stop a rotating set of tasks against a handful of
//! workloads, while a reporter thread prints counters on an interval.
//!
//! This is a manual verification aid — a place to eyeball throughput and
//! rate-limiter behavior under real wall-clock jitter — not a correctness
//! test; see `scx-slo-core`'s own `#[cfg(test)]` suites and
//! `scenario-sim` for that.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::info;

use scx_slo_core::config::{EngineConfig, SloCfg};
use scx_slo_core::host::HostTopology;
use scx_slo_core::scheduler::Engine;
use scx_slo_core::{Clock, SystemClock, TaskId};

#[derive(Parser)]
#[command(about = "Drive scx-slo-core with concurrent synthetic CPUs/workloads/tasks")]
struct Args {
    /// Number of worker threads, one per simulated CPU.
    #[arg(long, default_value_t = 4)]
    cpus: usize,

    /// Number of distinct workloads to configure.
    #[arg(long, default_value_t = 8)]
    workloads: u64,

    /// Number of distinct tasks rotated across workers.
    #[arg(long, default_value_t = 256)]
    tasks: u32,

    /// How long to run before stopping, in seconds.
    #[arg(long, default_value_t = 5)]
    duration_secs: u64,

    /// Interval between counter snapshots printed to stdout, in seconds.
    #[arg(long, default_value_t = 1)]
    report_interval_secs: u64,
}

/// Round-robins `candidate_cpu` back to whatever CPU last ran the task and
/// reports every CPU as idle, so `select_cpu` always registers a local
/// dispatch — enough topology fidelity for a load simulator.
struct RoundRobinTopology;

impl HostTopology for RoundRobinTopology {
    fn candidate_cpu(&self, _tid: TaskId, prev_cpu: u32, _wake_flags: u64) -> u32 {
        prev_cpu
    }

    fn is_idle(&self, _cpu: u32) -> bool {
        true
    }
}

/// Tiny xorshift PRNG so the harness doesn't need a `rand` dependency for
/// picking a pseudo-random workload per iteration.
struct Xorshift(u64);

impl Xorshift {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let engine = Arc::new(Engine::new(
        EngineConfig {
            num_cpus: args.cpus,
            ..EngineConfig::default()
        },
        clock,
        Arc::new(RoundRobinTopology),
    ));

    for wid in 0..args.workloads {
        // Vary budget and importance per workload so the run exercises a
        // mix of miss/no-miss outcomes under real scheduling jitter.
        let cfg = SloCfg {
            budget_ns: 2_000_000 + wid * 1_000_000,
            importance: 10 + ((wid * 17) % 90) as u32,
            flags: 0,
        };
        engine.upsert_config(wid, cfg)?;
    }
    info!(workloads = args.workloads, "configured workloads");

    let next_tid = Arc::new(AtomicU32::new(0));
    let stop_at = Instant::now() + Duration::from_secs(args.duration_secs);

    let mut workers = Vec::new();
    for cpu in 0..args.cpus {
        let engine = Arc::clone(&engine);
        let next_tid = Arc::clone(&next_tid);
        let num_workloads = args.workloads.max(1);
        let num_tasks = args.tasks.max(1);
        workers.push(thread::spawn(move || {
            let mut rng = Xorshift(0x9E3779B97F4A7C15 ^ ((cpu as u64) << 1 | 1));
            while Instant::now() < stop_at {
                let tid = (next_tid.fetch_add(1, Ordering::Relaxed)) % num_tasks;
                let wid = rng.next_u64() % num_workloads;

                let picked_cpu = engine.select_cpu(tid, cpu as u32, 0);
                engine.enqueue(picked_cpu as usize, tid, wid, 0);
                engine.running(tid);

                // Simulate the task actually running for a bit, sometimes
                // overrunning its budget to produce deadline misses.
                let run_ns = 200_000 + (rng.next_u64() % 6_000_000);
                thread::sleep(Duration::from_nanos(run_ns));

                engine.stopping(picked_cpu as usize, tid, wid, false);
            }
        }));
    }

    let reporter = {
        let engine = Arc::clone(&engine);
        let interval = Duration::from_secs(args.report_interval_secs.max(1));
        thread::spawn(move || {
            while Instant::now() < stop_at {
                thread::sleep(interval);
                let snapshot = engine.read_counters();
                info!(
                    local_dispatches = snapshot.local_dispatches,
                    global_enqueues = snapshot.global_enqueues,
                    deadline_misses_total = snapshot.deadline_misses_total,
                    miss_duration_ns_sum = snapshot.miss_duration_ns_sum,
                    rate_limited_drops = snapshot.rate_limited_drops,
                    "counters"
                );
            }
        })
    };

    for worker in workers {
        worker.join().expect("load-sim worker panicked");
    }
    reporter.join().expect("load-sim reporter panicked");

    let events = engine.poll_events(1024, Duration::from_millis(10));
    let final_counters = engine.read_counters();
    println!("final counters: {final_counters:?}");
    println!("drained {} pending miss events from the channel", events.len());

    Ok(())
}
