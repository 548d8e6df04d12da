/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task Context Store (component C4): bounded TID → [`TaskCtx`] mapping.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use tracing::trace;

use crate::task::{TaskCtx, TaskId};

/// Hard capacity of the Task Context Store.
pub const MAX_TASKS: usize = 100_000;

/// Bounded mapping from task id to per-task scheduling state.
///
/// Entries are created on first enqueue and destroyed on the stop
/// transition with `runnable=false` (§4.6). Backed by [`DashMap`] for the
/// same per-key-sharded concurrency reasons as [`crate::config::ConfigStore`].
pub struct TaskContextStore {
    entries: DashMap<TaskId, TaskCtx>,
    max_tasks: usize,
    len: AtomicUsize,
}

impl TaskContextStore {
    pub fn new(max_tasks: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_tasks,
            len: AtomicUsize::new(0),
        }
    }

    /// Reserves one slot against `max_tasks` with a single compare-and-swap
    /// (the same technique `ConfigStore` uses for `max_workloads`) — a bare
    /// `len() >= max_tasks` check followed by a separate insert is not safe
    /// under concurrent `enqueue` calls for distinct new TIDs (P6).
    fn try_reserve_slot(&self) -> bool {
        loop {
            let current = self.len.load(Ordering::Acquire);
            if current >= self.max_tasks {
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

    /// Returns the existing context for `tid`, or inserts and returns a
    /// fresh one built from `default` if none existed.
    ///
    /// Returns `None` only when `tid` is new and the store is already at
    /// `max_tasks` — the caller (the enqueue transition) then takes the
    /// fallback-enqueue path rather than treating this as an error. The
    /// vacant/occupied check, the capacity reservation, and the insert all
    /// happen while `DashMap::entry` holds `tid`'s shard lock combined with
    /// a CAS on the shared slot counter, so two callers admitting distinct
    /// new TIDs can never both push the store past `max_tasks`.
    pub fn get_or_create(
        &self,
        tid: TaskId,
        default: TaskCtx,
    ) -> Option<RefMut<'_, TaskId, TaskCtx>> {
        match self.entries.entry(tid) {
            Entry::Occupied(occupied) => Some(occupied.into_ref()),
            Entry::Vacant(vacant) => {
                if !self.try_reserve_slot() {
                    trace!(tid, max_tasks = self.max_tasks, "task context store full");
                    return None;
                }
                Some(vacant.insert(default))
            }
        }
    }

    /// Returns the context for `tid` without creating one.
    pub fn get(&self, tid: TaskId) -> Option<RefMut<'_, TaskId, TaskCtx>> {
        self.entries.get_mut(&tid)
    }

    /// Removes the context for `tid`. Idempotent: no error if absent.
    pub fn remove(&self, tid: TaskId) {
        if self.entries.remove(&tid).is_some() {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TaskCtx {
        TaskCtx::new(1_000, 0, 100)
    }

    #[test]
    fn get_or_create_creates_then_reuses() {
        let store = TaskContextStore::new(MAX_TASKS);
        {
            let c = store.get_or_create(1, ctx()).unwrap();
            assert_eq!(c.deadline, 1_000);
        }
        assert_eq!(store.len(), 1);
        {
            let mut c = store.get_or_create(1, TaskCtx::new(2_000, 0, 200)).unwrap();
            c.deadline = 9_999;
        }
        let c = store.get(1).unwrap();
        assert_eq!(c.deadline, 9_999, "second get_or_create must not overwrite existing entry");
    }

    #[test]
    fn get_does_not_create() {
        let store = TaskContextStore::new(MAX_TASKS);
        assert!(store.get(42).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = TaskContextStore::new(MAX_TASKS);
        store.get_or_create(1, ctx());
        store.remove(1);
        store.remove(1);
        assert!(store.get(1).is_none());
    }

    #[test]
    fn capacity_exhaustion_rejects_new_tid_but_not_existing() {
        let store = TaskContextStore::new(1);
        assert!(store.get_or_create(1, ctx()).is_some());
        assert!(store.get_or_create(2, ctx()).is_none());
        assert!(store.get_or_create(1, ctx()).is_some());
    }

    #[test]
    fn concurrent_get_or_create_never_exceeds_capacity() {
        // Two threads race to admit distinct new TIDs with exactly one
        // free slot; the capacity reservation must let exactly one through
        // regardless of thread interleaving (P6).
        use std::sync::{Arc, Barrier};
        use std::thread;

        let store = Arc::new(TaskContextStore::new(1));
        let barrier = Arc::new(Barrier::new(2));

        let mut handles = Vec::new();
        for tid in [1u32, 2u32] {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                store.get_or_create(tid, ctx()).is_some()
            }));
        }

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(admitted, 1, "exactly one of the two new tids must be admitted");
        assert_eq!(store.len(), 1, "store must never exceed its capacity of 1");
    }
}
