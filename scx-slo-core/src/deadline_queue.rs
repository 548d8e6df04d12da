/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Deadline Queue (component C5): a min-priority queue of runnable tasks
//! ordered by `(deadline ascending, tid ascending)`.
//!
//! [`std::collections::BinaryHeap`] has no decrease-key operation, so a
//! re-[`insert`](DeadlineQueue::insert) of an already-queued TID is handled
//! by lazy deletion: `index` always holds the *authoritative* deadline for
//! every live TID, and a heap entry is only trusted by
//! [`pop_min`](DeadlineQueue::pop_min) if it still matches `index` — a
//! superseded entry is popped and silently discarded.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::task::TaskId;

/// Min-priority queue of `(deadline, tid)` pairs.
///
/// The heap holds `Reverse<(deadline, tid)>` so that `BinaryHeap`'s
/// max-heap behavior yields min-deadline-first, with ties broken by the
/// smaller TID — exactly the tuple ordering §4.4 requires.
pub struct DeadlineQueue {
    heap: Mutex<BinaryHeap<Reverse<(u64, TaskId)>>>,
    index: DashMap<TaskId, u64>,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            index: DashMap::new(),
        }
    }

    /// Inserts `tid` with `deadline`. If `tid` is already queued, its key is
    /// effectively updated: the old heap entry becomes stale and is
    /// discarded the next time it would be popped.
    pub fn insert(&self, tid: TaskId, deadline: u64) {
        self.index.insert(tid, deadline);
        self.heap.lock().push(Reverse((deadline, tid)));
    }

    /// Pops and returns the entry with the smallest `(deadline, tid)`, or
    /// `None` if the queue is empty.
    pub fn pop_min(&self) -> Option<(TaskId, u64)> {
        let mut heap = self.heap.lock();
        while let Some(Reverse((deadline, tid))) = heap.pop() {
            // Only trust this entry if it is still the authoritative one —
            // a later insert() for the same tid may have pushed a fresher
            // entry and left this one stale.
            let is_current = match self.index.get(&tid) {
                Some(current) => *current == deadline,
                None => false,
            };
            if is_current {
                self.index.remove(&tid);
                return Some((tid, deadline));
            }
        }
        None
    }

    /// Removes `tid` from the queue if present. Returns `true` iff it was.
    ///
    /// Same lazy-deletion discipline as `insert`: this only drops `tid`
    /// from the index; any stale heap entry is discarded on a later pop.
    pub fn remove(&self, tid: TaskId) -> bool {
        self.index.remove(&tid).is_some()
    }

    /// Number of currently-queued (live) TIDs. Not the raw heap size, which
    /// may also contain stale entries awaiting lazy cleanup.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Default for DeadlineQueue {
    fn default() -> Self {
        Self::new()
    }
}
