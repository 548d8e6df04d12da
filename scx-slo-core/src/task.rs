/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task identity and per-task scheduling state.
//!
//! The Task Context Store (component C4) keys on [`TaskId`] and holds one
//! [`TaskCtx`] per task it has seen; this module only defines the value
//! types, not the store itself (see [`crate::task_store`]).

/// Kernel-assigned thread identifier. Opaque to the engine beyond equality
/// and use as a map key.
pub type TaskId = u32;

/// Identifier of the workload (cgroup, pod, or similar logical grouping) a
/// task belongs to. Keys the Config Store.
pub type WorkloadId = u64;

/// Per-task scheduling state, derived from the owning workload's
/// [`SloCfg`](crate::config::SloCfg) the first time the task is seen.
///
/// `deadline` and `start_time` share the engine's monotonic nanosecond
/// timeline (see [`crate::clock::Clock`]). A `TaskCtx` is only ever produced
/// by [`crate::scheduler::Engine::enqueue`]; nothing else constructs one
/// outside of tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCtx {
    /// Absolute deadline on the engine's nanosecond timeline.
    pub deadline: u64,
    /// Absolute time the task was last enqueued.
    pub start_time: u64,
    /// Effective budget used to derive `deadline`, carried for diagnostics
    /// and so a re-enqueue can recompute without a Config Store lookup.
    pub budget_ns: u64,
    /// `false` if this context was produced under a fallback path (for
    /// example the Task Context Store was at capacity) and should not be
    /// trusted for deadline-miss accounting.
    pub valid: bool,
}

impl TaskCtx {
    pub fn new(deadline: u64, start_time: u64, budget_ns: u64) -> Self {
        Self {
            deadline,
            start_time,
            budget_ns,
            valid: true,
        }
    }

    /// A context marked invalid — used when the engine must hand back
    /// *something* for a task it could not admit into the store.
    pub fn invalid(deadline: u64, start_time: u64, budget_ns: u64) -> Self {
        Self {
            deadline,
            start_time,
            budget_ns,
            valid: false,
        }
    }
}
