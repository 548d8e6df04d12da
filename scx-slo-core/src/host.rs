/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Host CPU topology, as consulted by [`select_cpu`](crate::scheduler::Engine::select_cpu).
//!
//! The actual topology and idle-tracking live in the OS-integration layer,
//! which is out of scope for this crate (see `spec.md` §1). `HostTopology`
//! is the seam the scheduler core uses to ask that layer for a candidate CPU
//! and whether it is currently idle, the same way `GlobalScheduler` in the
//! teacher consults an injected `Arc<NodeConfigManager>` for node facts it
//! does not own.

use crate::task::TaskId;

/// External source of CPU topology and idle-state truth.
pub trait HostTopology: Send + Sync {
    /// Pick a candidate CPU for `tid`, given the CPU it last ran on and the
    /// host's wake flags. The core does not interpret `wake_flags`; it is
    /// forwarded verbatim from the host callback.
    fn candidate_cpu(&self, tid: TaskId, prev_cpu: u32, wake_flags: u64) -> u32;

    /// Returns `true` if `cpu` is currently idle.
    fn is_idle(&self, cpu: u32) -> bool;
}
