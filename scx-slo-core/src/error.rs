/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the SLO scheduling engine.
//!
//! [`ConfigError`] is the only error a caller ever sees — it is returned
//! from [`ConfigStore::upsert`](crate::config::ConfigStore::upsert) when a
//! candidate [`SloCfg`](crate::config::SloCfg) fails validation or the store
//! is full. Every variant carries the value that caused the rejection so the
//! caller can log a precise message without re-deriving it.
//!
//! Hot-path failures (task-store exhaustion, rate-limiter suppression) are
//! never surfaced as errors — they degrade to the fallback paths documented
//! on [`crate::scheduler::Engine`] and are only observable through counters.

use thiserror::Error;

/// Why a candidate [`SloCfg`](crate::config::SloCfg) was rejected by
/// [`ConfigStore::upsert`](crate::config::ConfigStore::upsert).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `budget_ns` was `0` or below `MIN_BUDGET_NS`.
    #[error("budget_ns {budget_ns} is below the minimum of {min_budget_ns}ns")]
    ZeroOrBelowMin { budget_ns: u64, min_budget_ns: u64 },

    /// `budget_ns` exceeded `MAX_BUDGET_NS`.
    #[error("budget_ns {budget_ns} exceeds the maximum of {max_budget_ns}ns")]
    AboveMax { budget_ns: u64, max_budget_ns: u64 },

    /// `importance` was outside `[MIN_IMPORTANCE, MAX_IMPORTANCE]`.
    #[error("importance {importance} is outside the valid range [{min}, {max}]")]
    ImportanceOutOfRange { importance: u32, min: u32, max: u32 },

    /// `flags` was non-zero (the field is reserved and must be `0`).
    #[error("flags {flags:#x} must be 0 (reserved)")]
    ReservedFlags { flags: u32 },

    /// The Config Store already holds `MAX_WORKLOADS` entries and `wid` is
    /// not one of them — there is no slot for a new workload.
    #[error("config store is full ({max_workloads} workloads); cannot admit a new one")]
    CapacityExhausted { max_workloads: usize },
}
