/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduler State Machine (component C6): the engine's four host-facing
//! entry points — `select_cpu`, `enqueue`, `running`, `stopping` — and the
//! [`Engine`] that ties every other component together.
//!
//! `Engine` owns nothing the host doesn't hand it a seam for: CPU topology
//! comes from a [`HostTopology`], time from a [`Clock`]. Everything else
//! (config, task contexts, the deadline queue, rate limiting, events,
//! counters) is private engine state, matching §5's "Config Store and Task
//! Context Store are engine-private" rule.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::clock::Clock;
use crate::config::{clamp_importance, ConfigStore, EngineConfig};
use crate::counters::{CounterSnapshot, Counters};
use crate::deadline_queue::DeadlineQueue;
use crate::error::ConfigError;
use crate::events::{DeadlineEvent, EventEmitter};
use crate::host::HostTopology;
use crate::rate_limiter::RateLimiter;
use crate::task::{TaskCtx, TaskId, WorkloadId};
use crate::task_store::TaskContextStore;

/// Default importance substituted when a workload has no config on file
/// (§4.6 step 4 — distinct from [`crate::config::DEFAULT_IMPORTANCE`] only
/// in name; both encode the same "don't care" weighting).
const FALLBACK_IMPORTANCE: u32 = 50;

/// The SLO-based EDF scheduling engine.
///
/// One instance owns one set of bounded stores, one deadline queue, one
/// rate limiter, one event channel, and one counter bank. Tests and
/// harnesses construct a fresh `Engine` per run; there is no process-wide
/// singleton (§9).
pub struct Engine {
    clock: Arc<dyn Clock>,
    host: Arc<dyn HostTopology>,
    config_store: ConfigStore,
    task_store: TaskContextStore,
    deadline_queue: DeadlineQueue,
    rate_limiter: RateLimiter,
    events: EventEmitter,
    counters: Counters,
}

impl Engine {
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>, host: Arc<dyn HostTopology>) -> Self {
        Self {
            clock,
            host,
            config_store: ConfigStore::new(config.max_workloads),
            task_store: TaskContextStore::new(config.max_tasks),
            deadline_queue: DeadlineQueue::new(),
            rate_limiter: RateLimiter::with_window(
                config.num_cpus,
                config.max_events_per_window,
                config.window_ns,
            ),
            events: EventEmitter::new(crate::events::EVENT_CHANNEL_CAPACITY),
            counters: Counters::new(config.num_cpus),
        }
    }

    // ── Config Source interface (§6.1) ──────────────────────────────────

    pub fn upsert_config(
        &self,
        wid: WorkloadId,
        cfg: crate::config::SloCfg,
    ) -> Result<(), ConfigError> {
        self.config_store.upsert(wid, cfg)
    }

    pub fn remove_config(&self, wid: WorkloadId) -> bool {
        self.config_store.remove(wid)
    }

    // ── Host scheduling callbacks (§4.6 / §6.4) ─────────────────────────

    /// Consults the host for a candidate CPU for `tid`. If the host reports
    /// that CPU idle, counts a local dispatch; the actual placement
    /// decision belongs to the host (§9 open question: select_cpu is
    /// observational plus counter increment here).
    pub fn select_cpu(&self, tid: TaskId, prev_cpu: u32, wake_flags: u64) -> u32 {
        let candidate = self.host.candidate_cpu(tid, prev_cpu, wake_flags);
        if self.host.is_idle(candidate) {
            self.counters.inc_local_dispatch(candidate as usize);
        }
        candidate
    }

    /// Admits `tid` as runnable under workload `wid_at_enqueue`, computing
    /// its importance-weighted absolute deadline and inserting it into the
    /// Deadline Queue.
    ///
    /// `cpu` identifies the CPU executing this callback, used to shard the
    /// "global enqueue" counter (§5: per-CPU counters are only ever written
    /// by their owning CPU). `enq_flags` is accepted for interface
    /// completeness but the engine does not interpret it.
    pub fn enqueue(&self, cpu: usize, tid: TaskId, wid_at_enqueue: WorkloadId, _enq_flags: u64) {
        self.counters.inc_global_enqueue(cpu);

        let now = self.clock.now_ns();
        let budget = self.config_store.safe_budget(wid_at_enqueue);
        let imp = clamp_importance(
            self.config_store
                .get(wid_at_enqueue)
                .map(|cfg| cfg.importance)
                .unwrap_or(FALLBACK_IMPORTANCE),
        );

        // eff = budget * (101 - imp) / 100, integer division truncates —
        // preserved exactly for reproducibility (see design notes).
        let eff = budget * (101 - imp as u64) / 100;
        let deadline = now.saturating_add(eff);

        let default_ctx = TaskCtx::new(deadline, 0, budget);
        match self.task_store.get_or_create(tid, default_ctx) {
            Some(mut ctx) => {
                ctx.deadline = deadline;
                ctx.budget_ns = budget;
                ctx.start_time = 0;
                ctx.valid = true;
                drop(ctx);
                self.deadline_queue.insert(tid, deadline);
            }
            None => {
                // Fallback enqueue: no per-task context available, but the
                // task is still dispatched via the host's global queue —
                // it is never silently dropped.
                debug!(tid, wid_at_enqueue, "task context store full, fallback enqueue");
            }
        }
    }

    /// Records that `tid` has entered the Running state.
    pub fn running(&self, tid: TaskId) {
        if let Some(mut ctx) = self.task_store.get(tid) {
            if ctx.valid {
                ctx.start_time = self.clock.now_ns();
            }
        }
    }

    /// Handles `tid` leaving the Running state: detects a deadline miss
    /// against the absolute deadline recorded at the last enqueue, and
    /// either cleans up the task's context (`runnable == false`) or leaves
    /// it for the next enqueue to reinitialize.
    ///
    /// `cpu` shards the rate limiter and the miss/drop counters, for the
    /// same reason `enqueue` takes one.
    pub fn stopping(&self, cpu: usize, tid: TaskId, wid_at_stop: WorkloadId, runnable: bool) {
        let (deadline, valid) = match self.task_store.get(tid) {
            Some(ctx) => (ctx.deadline, ctx.valid),
            None => return,
        };
        if !valid {
            return;
        }

        let now = self.clock.now_ns();

        // Strict miss detection: now == deadline is on-time (§4.6 boundary
        // policy), so this must stay a `>` comparison.
        if now > deadline {
            let miss_ns = now - deadline;
            if self.rate_limiter.allow(now, cpu) {
                let event = DeadlineEvent {
                    workload_id: wid_at_stop,
                    miss_ns,
                    timestamp: now,
                };
                if self.events.try_push(event) {
                    self.counters.inc_deadline_miss(cpu, miss_ns);
                } else {
                    self.counters.inc_rate_limited_drop(cpu);
                }
            } else {
                self.counters.inc_rate_limited_drop(cpu);
            }
        }

        if !runnable {
            self.deadline_queue.remove(tid);
            self.task_store.remove(tid);
            trace!(tid, "task context removed on stop");
        }
    }

    // ── Event Consumer interface (§6.2) ─────────────────────────────────

    pub fn poll_events(
        &self,
        max_events: usize,
        timeout: std::time::Duration,
    ) -> Vec<DeadlineEvent> {
        self.events.poll(max_events, timeout)
    }

    // ── Counter Consumer interface (§6.3) ───────────────────────────────

    pub fn read_counters(&self) -> CounterSnapshot {
        self.counters.read_counters()
    }

    // ── Deadline Queue introspection (used by harnesses/tests) ─────────

    pub fn pop_min_deadline(&self) -> Option<(TaskId, u64)> {
        self.deadline_queue.pop_min()
    }

    pub fn deadline_queue_len(&self) -> usize {
        self.deadline_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::SloCfg;
    use crate::host::test_support::FixedTopology;

    fn engine_with_clock(clock: Arc<ManualClock>) -> Engine {
        let host = Arc::new(FixedTopology::new(0, false));
        Engine::new(EngineConfig { num_cpus: 1, ..EngineConfig::default() }, clock, host)
    }

    #[test]
    fn scenario_1_basic_on_time() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = engine_with_clock(clock.clone());
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
        assert!(events.is_empty(), "no miss expected");
        assert_eq!(engine.read_counters().global_enqueues, 1);
    }

    #[test]
    fn scenario_2_miss_by_scheduling_delay() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = engine_with_clock(clock.clone());
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
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].miss_ns, 14_800_000);
        assert_eq!(events[0].workload_id, 99999);
    }

    #[test]
    fn scenario_3_unknown_workload_uses_default() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = engine_with_clock(clock.clone());

        clock.set(1_000_000_000);
        engine.enqueue(0, 3001, 777777, 0);

        // deadline = 1_000_000_000 + 100_000_000*51/100 = 1_051_000_000
        clock.set(1_051_000_000);
        engine.stopping(0, 3001, 777777, false);
        let events = engine.poll_events(10, Duration::from_millis(1));
        assert!(events.is_empty(), "now == deadline must not be a miss");
    }

    #[test]
    fn scenario_4_rate_limit() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = engine_with_clock(clock.clone());
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

        let mut tid = 1u32;
        for _ in 0..1001 {
            clock.set(clock.now_ns() + 1);
            engine.enqueue(0, tid, 1, 0);
            // Force a miss (deadline is ~now + 10_000ns) while keeping the
            // whole run inside one WINDOW_NS (1s) rate-limiter window.
            clock.set(clock.now_ns() + 500_000);
            engine.stopping(0, tid, 1, false);
            tid += 1;
        }

        let snapshot = engine.read_counters();
        assert_eq!(snapshot.deadline_misses_total, 1_000);
        assert_eq!(snapshot.rate_limited_drops, 1);
    }

    #[test]
    fn scenario_5_config_capacity_exhaustion() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = engine_with_clock(clock);
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
        assert!(matches!(result, Err(ConfigError::CapacityExhausted { .. })));
    }

    #[test]
    fn scenario_6_edf_ordering() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = engine_with_clock(clock.clone());
        // Use importance=100, budget such that eff=0, so deadline == now;
        // drive "now" per enqueue to land exactly on the target ms values.
        engine
            .upsert_config(
                1,
                SloCfg {
                    budget_ns: MIN_BUDGET_FOR_TEST,
                    importance: 100,
                    flags: 0,
                },
            )
            .unwrap();

        for (tid, deadline_ms) in [(1001u32, 1_100u64), (1002, 1_050), (1003, 1_200), (1004, 1_075)] {
            clock.set(deadline_ms * 1_000_000 - (MIN_BUDGET_FOR_TEST / 100));
            engine.enqueue(0, tid, 1, 0);
        }

        let mut order = Vec::new();
        while let Some((tid, _)) = engine.pop_min_deadline() {
            order.push(tid);
        }
        assert_eq!(order, vec![1002, 1004, 1001, 1003]);
    }

    const MIN_BUDGET_FOR_TEST: u64 = crate::config::MIN_BUDGET_NS;

    #[test]
    fn select_cpu_counts_local_dispatch_only_when_idle() {
        let clock = Arc::new(ManualClock::new(0));
        let host = Arc::new(FixedTopology::new(3, true));
        let engine = Engine::new(
            EngineConfig { num_cpus: 4, ..EngineConfig::default() },
            clock,
            host.clone(),
        );
        let cpu = engine.select_cpu(1, 0, 0);
        assert_eq!(cpu, 3);
        assert_eq!(engine.read_counters().local_dispatches, 1);

        host.set_idle(false);
        engine.select_cpu(1, 0, 0);
        assert_eq!(engine.read_counters().local_dispatches, 1, "no increment when not idle");
    }

    #[test]
    fn stopping_leaves_context_when_runnable() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = engine_with_clock(clock.clone());
        clock.set(1_000);
        engine.enqueue(0, 1, 777, 0);
        clock.set(2_000);
        engine.stopping(0, 1, 777, true);
        // context must still be present for a later stopping(runnable=false)
        clock.set(3_000);
        engine.stopping(0, 1, 777, false);
        // second stopping removed it; a third call is a no-op, not a panic
        engine.stopping(0, 1, 777, false);
    }

    #[test]
    fn fallback_enqueue_when_task_store_exhausted() {
        let clock = Arc::new(ManualClock::new(0));
        let host = Arc::new(FixedTopology::new(0, false));
        let engine = Engine::new(
            EngineConfig { num_cpus: 1, max_tasks: 1, ..EngineConfig::default() },
            clock,
            host,
        );
        engine.enqueue(0, 1, 1, 0);
        // tid 2 cannot get a context; must not panic, and must not appear
        // in the deadline queue.
        engine.enqueue(0, 2, 1, 0);
        assert_eq!(engine.deadline_queue_len(), 1);
    }
}
