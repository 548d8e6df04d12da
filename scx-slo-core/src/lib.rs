/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! SLO-based EDF CPU scheduling engine — core.
//!
//! Orders runnable tasks by an Earliest-Deadline-First discipline in which
//! each task's deadline is derived from its workload's latency budget and
//! an importance weight. This crate is the engine only: it consumes a
//! [`Clock`](clock::Clock) and a [`HostTopology`](host::HostTopology), and
//! exposes the four host scheduling callbacks plus the Config Source,
//! Event Consumer and Counter Consumer interfaces through
//! [`scheduler::Engine`]. Everything that actually runs tasks — config
//! file parsing, workload discovery, BPF/kernel wiring, the CLI, the
//! health/metrics surface — lives outside this crate.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── clock.rs          – C1: monotonic nanosecond time source
//! ├── error.rs          – ConfigError
//! ├── task.rs           – TaskId, WorkloadId, TaskCtx
//! ├── config.rs         – C2 Validator + C3 Config Store + EngineConfig
//! ├── task_store.rs     – C4: Task Context Store
//! ├── deadline_queue.rs – C5: Deadline Queue
//! ├── rate_limiter.rs   – C7: Rate Limiter
//! ├── events.rs         – C8: Event Emitter + wire format
//! ├── counters.rs       – C9: Counters
//! ├── host.rs           – HostTopology (CPU topology seam)
//! └── scheduler/        – C6: Scheduler State Machine (Engine)
//! ```

pub mod clock;
pub mod config;
pub mod counters;
pub mod deadline_queue;
pub mod error;
pub mod events;
pub mod host;
pub mod rate_limiter;
pub mod scheduler;
pub mod task;
pub mod task_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, SloCfg};
pub use counters::CounterSnapshot;
pub use error::ConfigError;
pub use events::DeadlineEvent;
pub use host::HostTopology;
pub use scheduler::Engine;
pub use task::{TaskCtx, TaskId, WorkloadId};

/// Authoritative constants (§6.5).
pub mod constants {
    pub use crate::config::{
        DEFAULT_BUDGET_NS, MAX_BUDGET_NS, MAX_IMPORTANCE, MAX_WORKLOADS, MIN_BUDGET_NS,
        MIN_IMPORTANCE,
    };
    pub use crate::rate_limiter::{MAX_EVENTS_PER_WINDOW, WINDOW_NS};
    pub use crate::task_store::MAX_TASKS;
}
