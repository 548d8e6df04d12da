/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Replays the engine's literal end-to-end scenarios against a
//! [`ManualClock`], printing the resulting events and counters.
//!
//! This is a manual verification aid, not a test harness: `cargo test` in
//! `scx-slo-core` already covers these scenarios as assertions. Running
//! this binary is useful when eyeballing the event/counter shape while
//! wiring up a real host integration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use scx_slo_core::clock::ManualClock;
use scx_slo_core::config::{EngineConfig, SloCfg};
use scx_slo_core::scheduler::Engine;

#[derive(Parser)]
#[command(about = "Replay scx-slo-core's scenarios against a manual clock")]
struct Args {
    /// Which scenario to run (1-6). Defaults to running all of them.
    #[arg(long)]
    scenario: Option<u8>,
}

struct FixedTopology;

impl scx_slo_core::host::HostTopology for FixedTopology {
    fn candidate_cpu(&self, _tid: u32, prev_cpu: u32, _wake_flags: u64) -> u32 {
        prev_cpu
    }

    fn is_idle(&self, _cpu: u32) -> bool {
        false
    }
}

fn new_engine(clock: Arc<ManualClock>) -> Engine {
    Engine::new(
        EngineConfig {
            num_cpus: 1,
            ..EngineConfig::default()
        },
        clock,
        Arc::new(FixedTopology),
    )
}

fn scenario_1_basic_on_time() {
    let clock = Arc::new(ManualClock::new(0));
    let engine = new_engine(clock.clone());
    engine
        .upsert_config(
            12345,
            SloCfg {
                budget_ns: 50_000_000,
                importance: 50,
                flags: 0,
            },
        )
        .unwrap();

    clock.set(1_000_000_000);
    engine.enqueue(0, 1001, 12345, 0);
    clock.set(1_005_000_000);
    engine.running(1001);
    clock.set(1_040_000_000);
    engine.stopping(0, 1001, 12345, false);

    let events = engine.poll_events(10, Duration::from_millis(1));
    println!("scenario 1 (basic on-time): events={events:?} counters={:?}", engine.read_counters());
}

fn scenario_2_miss_by_scheduling_delay() {
    let clock = Arc::new(ManualClock::new(0));
    let engine = new_engine(clock.clone());
    engine
        .upsert_config(
            99999,
            SloCfg {
                budget_ns: 20_000_000,
                importance: 50,
                flags: 0,
            },
        )
        .unwrap();

    clock.set(1_000_000_000);
    engine.enqueue(0, 2001, 99999, 0);
    clock.set(1_015_000_000);
    engine.running(2001);
    clock.set(1_025_000_000);
    engine.stopping(0, 2001, 99999, false);

    let events = engine.poll_events(10, Duration::from_millis(1));
    println!("scenario 2 (miss by scheduling delay): events={events:?}");
}

fn scenario_3_unknown_workload_uses_default() {
    let clock = Arc::new(ManualClock::new(0));
    let engine = new_engine(clock.clone());

    clock.set(1_000_000_000);
    engine.enqueue(0, 3001, 777777, 0);
    clock.set(1_051_000_000);
    engine.stopping(0, 3001, 777777, false);

    let events = engine.poll_events(10, Duration::from_millis(1));
    println!("scenario 3 (unknown workload): events={events:?} (expect empty: now == deadline)");
}

fn scenario_4_rate_limit() {
    let clock = Arc::new(ManualClock::new(0));
    let engine = new_engine(clock.clone());
    engine
        .upsert_config(
            1,
            SloCfg {
                budget_ns: 1_000_000,
                importance: 100,
                flags: 0,
            },
        )
        .unwrap();

    for tid in 1..=1001u32 {
        clock.set(clock.now_ns() + 1);
        engine.enqueue(0, tid, 1, 0);
        clock.set(clock.now_ns() + 500_000);
        engine.stopping(0, tid, 1, false);
    }

    println!("scenario 4 (rate limit): counters={:?}", engine.read_counters());
}

fn scenario_5_config_capacity_exhaustion() {
    let clock = Arc::new(ManualClock::new(0));
    let engine = new_engine(clock);
    for wid in 0..10_000u64 {
        engine
            .upsert_config(
                wid,
                SloCfg {
                    budget_ns: 50_000_000,
                    importance: 50,
                    flags: 0,
                },
            )
            .unwrap();
    }
    let result = engine.upsert_config(
        10_000,
        SloCfg {
            budget_ns: 50_000_000,
            importance: 50,
            flags: 0,
        },
    );
    println!("scenario 5 (config capacity): 10_001st upsert -> {result:?}");
}

fn scenario_6_edf_ordering() {
    let clock = Arc::new(ManualClock::new(0));
    let engine = new_engine(clock.clone());
    const BUDGET: u64 = scx_slo_core::constants::MIN_BUDGET_NS;
    engine
        .upsert_config(
            1,
            SloCfg {
                budget_ns: BUDGET,
                importance: 100,
                flags: 0,
            },
        )
        .unwrap();

    for (tid, deadline_ms) in [(1001u32, 1_100u64), (1002, 1_050), (1003, 1_200), (1004, 1_075)] {
        clock.set(deadline_ms * 1_000_000 - (BUDGET / 100));
        engine.enqueue(0, tid, 1, 0);
    }

    let mut order = Vec::new();
    while let Some((tid, _)) = engine.pop_min_deadline() {
        order.push(tid);
    }
    println!("scenario 6 (EDF ordering): pop order={order:?} (expect [1002, 1004, 1001, 1003])");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let scenarios: [(u8, fn()); 6] = [
        (1, scenario_1_basic_on_time),
        (2, scenario_2_miss_by_scheduling_delay),
        (3, scenario_3_unknown_workload_uses_default),
        (4, scenario_4_rate_limit),
        (5, scenario_5_config_capacity_exhaustion),
        (6, scenario_6_edf_ordering),
    ];

    for (n, run) in scenarios {
        if args.scenario.is_none() || args.scenario == Some(n) {
            run();
        }
    }

    Ok(())
}
