/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-workload configuration: the Validator (C2) and the Config Store (C3).
//!
//! `SloCfg` is the only value a Config Source may write into the engine; it
//! always passes through [`validate`] first, the same way the teacher's
//! admission path never stores a `Task` without checking it against
//! `NodeConfig` first.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::ConfigError;
use crate::task::WorkloadId;

/// Latency budget in ns below which a candidate config is rejected.
pub const MIN_BUDGET_NS: u64 = 1_000_000;
/// Latency budget in ns above which a candidate config is rejected.
pub const MAX_BUDGET_NS: u64 = 10_000_000_000;
/// Budget substituted by [`ConfigStore::safe_budget`] when no valid config
/// is on file for a workload.
pub const DEFAULT_BUDGET_NS: u64 = 100_000_000;
/// Lower bound (inclusive) of `SloCfg::importance`.
pub const MIN_IMPORTANCE: u32 = 1;
/// Upper bound (inclusive) of `SloCfg::importance`.
pub const MAX_IMPORTANCE: u32 = 100;
/// `importance` substituted when a workload has no config on file.
pub const DEFAULT_IMPORTANCE: u32 = 50;
/// Hard capacity of the Config Store.
pub const MAX_WORKLOADS: usize = 10_000;

/// Per-workload service-level configuration.
///
/// Every instance that escapes [`validate`] satisfies
/// `MIN_BUDGET_NS <= budget_ns <= MAX_BUDGET_NS`,
/// `MIN_IMPORTANCE <= importance <= MAX_IMPORTANCE`, and `flags == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SloCfg {
    /// Latency budget in nanoseconds.
    pub budget_ns: u64,
    /// Relative priority in `[1, 100]`; higher means an earlier deadline.
    pub importance: u32,
    /// Reserved for future use. Must be `0`.
    pub flags: u32,
}

/// Bound-checks a candidate [`SloCfg`] without touching any store.
///
/// Pure and total: the same input always produces the same
/// `Ok`/[`ConfigError`] result, and the function never panics.
pub fn validate(cfg: &SloCfg) -> Result<(), ConfigError> {
    if cfg.budget_ns < MIN_BUDGET_NS {
        return Err(ConfigError::ZeroOrBelowMin {
            budget_ns: cfg.budget_ns,
            min_budget_ns: MIN_BUDGET_NS,
        });
    }
    if cfg.budget_ns > MAX_BUDGET_NS {
        return Err(ConfigError::AboveMax {
            budget_ns: cfg.budget_ns,
            max_budget_ns: MAX_BUDGET_NS,
        });
    }
    if cfg.importance < MIN_IMPORTANCE || cfg.importance > MAX_IMPORTANCE {
        return Err(ConfigError::ImportanceOutOfRange {
            importance: cfg.importance,
            min: MIN_IMPORTANCE,
            max: MAX_IMPORTANCE,
        });
    }
    if cfg.flags != 0 {
        return Err(ConfigError::ReservedFlags { flags: cfg.flags });
    }
    Ok(())
}

/// Clamp an importance value into `[MIN_IMPORTANCE, MAX_IMPORTANCE]`.
///
/// Used on the hot path (§4.6 step 4) where a stored config's `importance`
/// is trusted to already be in range, but defense-in-depth costs nothing
/// here since the value only ever feeds integer arithmetic.
pub fn clamp_importance(imp: u32) -> u32 {
    imp.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE)
}

/// Bounded mapping from workload id to validated [`SloCfg`] (component C3).
///
/// Backed by [`DashMap`] for per-key-sharded concurrent access: a `get`
/// racing an `upsert` on a *different* key never blocks on it, and a `get`
/// on the *same* key observes either the pre- or post-update value, never a
/// torn mix.
pub struct ConfigStore {
    entries: DashMap<WorkloadId, SloCfg>,
    max_workloads: usize,
    len: AtomicUsize,
}

impl ConfigStore {
    pub fn new(max_workloads: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_workloads,
            len: AtomicUsize::new(0),
        }
    }

    /// Reserves one slot against `max_workloads` with a single
    /// compare-and-swap, so two concurrent `upsert`s for two different new
    /// `wid`s can never both observe a free slot and both proceed — one
    /// must lose the race and see `CapacityExhausted` (P6).
    fn try_reserve_slot(&self) -> bool {
        loop {
            let current = self.len.load(Ordering::Acquire);
            if current >= self.max_workloads {
                return false;
            }
            if self
                .len
                .compare_exchange_weak(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Validate `cfg` and, on success, store or atomically replace the
    /// entry for `wid`.
    ///
    /// Returns [`ConfigError::CapacityExhausted`] if the store is full and
    /// `wid` does not already have an entry to replace. The vacant/occupied
    /// check and the capacity reservation happen under the single shard
    /// lock `DashMap::entry` holds for `wid`, combined with a
    /// compare-and-swap on the shared slot counter, so no two callers can
    /// both admit a new `wid` past `max_workloads`.
    pub fn upsert(&self, wid: WorkloadId, cfg: SloCfg) -> Result<(), ConfigError> {
        validate(&cfg)?;

        match self.entries.entry(wid) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(cfg);
            }
            Entry::Vacant(vacant) => {
                if !self.try_reserve_slot() {
                    warn!(wid, max_workloads = self.max_workloads, "config store full");
                    return Err(ConfigError::CapacityExhausted {
                        max_workloads: self.max_workloads,
                    });
                }
                vacant.insert(cfg);
            }
        }
        debug!(wid, budget_ns = cfg.budget_ns, importance = cfg.importance, "config upserted");
        Ok(())
    }

    /// Removes the entry for `wid`. Returns `true` iff one existed.
    pub fn remove(&self, wid: WorkloadId) -> bool {
        let removed = self.entries.remove(&wid).is_some();
        if removed {
            self.len.fetch_sub(1, Ordering::AcqRel);
            trace!(wid, "config removed");
        }
        removed
    }

    /// Returns a copy of the validated config for `wid`, if present.
    ///
    /// `SloCfg` is `Copy`, so this returns an owned value rather than a
    /// `DashMap` guard — callers never hold a lock across other store
    /// operations, which would risk deadlocking against `upsert`/`remove`
    /// on the same shard.
    pub fn get(&self, wid: WorkloadId) -> Option<SloCfg> {
        self.entries.get(&wid).map(|entry| *entry.value())
    }

    /// Returns the workload's validated `budget_ns` if present, otherwise
    /// [`DEFAULT_BUDGET_NS`].
    ///
    /// Fails closed: every value handed back here has already passed
    /// [`validate`] (it could not have been stored otherwise), so there is
    /// no separate re-validation step — the Config Store never holds an
    /// entry that doesn't validate.
    pub fn safe_budget(&self, wid: WorkloadId) -> u64 {
        self.get(wid).map(|cfg| cfg.budget_ns).unwrap_or(DEFAULT_BUDGET_NS)
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Construction-time tuning for an [`crate::scheduler::Engine`] instance.
///
/// Every field defaults to the authoritative constant from §6.5; harnesses
/// and tests override individual fields (usually `num_cpus`, to keep a
/// single-threaded test deterministic) via struct-update syntax.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub max_workloads: usize,
    pub max_tasks: usize,
    pub max_events_per_window: u64,
    pub window_ns: u64,
    pub num_cpus: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workloads: MAX_WORKLOADS,
            max_tasks: crate::task_store::MAX_TASKS,
            max_events_per_window: crate::rate_limiter::MAX_EVENTS_PER_WINDOW,
            window_ns: crate::rate_limiter::WINDOW_NS,
            num_cpus: num_cpus::get(),
        }
    }
}
