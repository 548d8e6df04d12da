/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Rate Limiter (component C7): a per-CPU fixed-window counter guarding
//! miss-event emission.
//!
//! Each CPU owns one window; `allow` never contends across CPUs. The shard
//! array is padded with [`CachePadded`] so two CPUs updating adjacent
//! shards never bounce the same cache line, the same concern that drives
//! the per-CPU counter layout in [`crate::counters`].

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

/// Maximum miss events permitted per CPU per [`WINDOW_NS`] window.
pub const MAX_EVENTS_PER_WINDOW: u64 = 1_000;
/// Width of the fixed rate-limiting window, in nanoseconds.
pub const WINDOW_NS: u64 = 1_000_000_000;

#[derive(Default)]
struct Window {
    window_start_ns: u64,
    count: u64,
}

/// Per-CPU fixed-window rate limiter.
pub struct RateLimiter {
    shards: Vec<CachePadded<Mutex<Window>>>,
    max_events_per_window: u64,
    window_ns: u64,
}

impl RateLimiter {
    /// Builds a limiter using the authoritative [`MAX_EVENTS_PER_WINDOW`]
    /// and [`WINDOW_NS`] constants.
    pub fn new(num_cpus: usize) -> Self {
        Self::with_window(num_cpus, MAX_EVENTS_PER_WINDOW, WINDOW_NS)
    }

    /// Builds a limiter with a caller-supplied window, for harnesses that
    /// want to exercise the contract on a shorter timeline than 1 real
    /// second of wall-clock nanoseconds.
    pub fn with_window(num_cpus: usize, max_events_per_window: u64, window_ns: u64) -> Self {
        let shards = (0..num_cpus.max(1))
            .map(|_| CachePadded::new(Mutex::new(Window::default())))
            .collect();
        Self {
            shards,
            max_events_per_window,
            window_ns,
        }
    }

    /// Applies the fixed-window contract (§4.5) for `cpu` at time `now`.
    ///
    /// Fails closed: an out-of-range `cpu` (an implementation error on the
    /// caller's part — `cpu` should always be `< num_cpus`) suppresses the
    /// event rather than permitting it.
    pub fn allow(&self, now: u64, cpu: usize) -> bool {
        let Some(shard) = self.shards.get(cpu) else {
            return false;
        };
        let mut window = shard.lock();
        if now.saturating_sub(window.window_start_ns) > self.window_ns {
            window.window_start_ns = now;
            window.count = 0;
        }
        if window.count >= self.max_events_per_window {
            return false;
        }
        window.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_denies() {
        let limiter = RateLimiter::new(1);
        for _ in 0..MAX_EVENTS_PER_WINDOW {
            assert!(limiter.allow(0, 0));
        }
        assert!(!limiter.allow(0, 0), "the 1001st event in the window must be denied");
    }

    #[test]
    fn scenario_rate_limit_from_spec() {
        // Fire 1001 misses within 1 second on a single CPU: exactly 1000
        // allowed, the 1001st denied.
        let limiter = RateLimiter::new(1);
        let mut allowed = 0u64;
        let mut denied = 0u64;
        for i in 0..1001u64 {
            if limiter.allow(i * 900_000, 0) {
                allowed += 1;
            } else {
                denied += 1;
            }
        }
        assert_eq!(allowed, 1_000);
        assert_eq!(denied, 1);
    }

    #[test]
    fn new_window_resets_after_window_elapses() {
        let limiter = RateLimiter::new(1);
        for _ in 0..MAX_EVENTS_PER_WINDOW {
            assert!(limiter.allow(0, 0));
        }
        assert!(!limiter.allow(WINDOW_NS, 0), "now - window_start == WINDOW_NS must not yet reset");
        assert!(limiter.allow(WINDOW_NS + 1, 0), "strictly exceeding WINDOW_NS resets the window");
    }

    #[test]
    fn cpus_are_independent() {
        let limiter = RateLimiter::new(2);
        for _ in 0..MAX_EVENTS_PER_WINDOW {
            assert!(limiter.allow(0, 0));
        }
        assert!(!limiter.allow(0, 0));
        assert!(limiter.allow(0, 1), "a separate CPU's window must be unaffected");
    }

    #[test]
    fn out_of_range_cpu_fails_closed() {
        let limiter = RateLimiter::new(1);
        assert!(!limiter.allow(0, 5));
    }
}
