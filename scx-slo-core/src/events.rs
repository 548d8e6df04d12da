/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Event Emitter (component C8): a bounded MPSC queue of [`DeadlineEvent`]
//! records delivered to an external consumer via [`EventEmitter::poll`].
//!
//! The producer side (`try_push`, called from `stopping`) is wait-free: a
//! single bounded `try_send` against [`crossbeam_channel`]'s lock-free ring,
//! never blocking the hot path. The consumer side may block, via
//! `recv_timeout`, since it runs off the scheduling hot path entirely.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Serialized size of a [`DeadlineEvent`]: three `u64` fields, declaration
/// order, little-endian.
pub const DEADLINE_EVENT_WIRE_SIZE: usize = 24;

/// Channel capacity in records, sized to hold at least 64 KiB of encoded
/// events (§4.7).
pub const EVENT_CHANNEL_CAPACITY: usize = (64 * 1024) / DEADLINE_EVENT_WIRE_SIZE;

/// A single deadline-miss observation, as delivered to the external event
/// consumer (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineEvent {
    pub workload_id: u64,
    pub miss_ns: u64,
    pub timestamp: u64,
}

/// Failure to decode a [`DeadlineEvent`] from a wire buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventDecodeError {
    /// The buffer was shorter than [`DEADLINE_EVENT_WIRE_SIZE`].
    #[error("buffer of {len} bytes is shorter than the {expected}-byte record")]
    Undersized { len: usize, expected: usize },
}

impl DeadlineEvent {
    /// Encodes this event as 24 little-endian bytes, fields in declaration
    /// order.
    pub fn to_bytes(&self) -> [u8; DEADLINE_EVENT_WIRE_SIZE] {
        let mut buf = [0u8; DEADLINE_EVENT_WIRE_SIZE];
        buf[0..8].copy_from_slice(&self.workload_id.to_le_bytes());
        buf[8..16].copy_from_slice(&self.miss_ns.to_le_bytes());
        buf[16..24].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    /// Decodes an event from `buf`.
    ///
    /// Forward-compatible: if `buf` is *longer* than
    /// [`DEADLINE_EVENT_WIRE_SIZE`] (a newer producer appending fields this
    /// reader doesn't know about), only the known prefix is read and the
    /// suffix is discarded. A `buf` *shorter* than the known size is
    /// rejected — there is no safe way to reconstruct a missing field.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, EventDecodeError> {
        if buf.len() < DEADLINE_EVENT_WIRE_SIZE {
            return Err(EventDecodeError::Undersized {
                len: buf.len(),
                expected: DEADLINE_EVENT_WIRE_SIZE,
            });
        }
        let workload_id = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        let miss_ns = u64::from_le_bytes(buf[8..16].try_into().unwrap());
        let timestamp = u64::from_le_bytes(buf[16..24].try_into().unwrap());
        Ok(Self {
            workload_id,
            miss_ns,
            timestamp,
        })
    }
}

/// Bounded MPSC channel of [`DeadlineEvent`] records.
pub struct EventEmitter {
    tx: Sender<DeadlineEvent>,
    rx: Receiver<DeadlineEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Attempts to enqueue `event` without blocking.
    ///
    /// Returns `true` if enqueued, `false` if the channel was full — the
    /// caller is responsible for counting the drop (§4.7: "drops the newest
    /// event", i.e. `event` itself is the one discarded).
    pub fn try_push(&self, event: DeadlineEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!("event channel full, dropping newest event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Drains up to `max_events` records, waiting up to `timeout` for the
    /// first one if the channel is currently empty.
    pub fn poll(&self, max_events: usize, timeout: Duration) -> Vec<DeadlineEvent> {
        let mut out = Vec::with_capacity(max_events.min(EVENT_CHANNEL_CAPACITY));
        if max_events == 0 {
            return out;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(event) => out.push(event),
            Err(_) => return out,
        }
        while out.len() < max_events {
            match self.rx.try_recv() {
                Ok(event) => out.push(event),
                Err(_) => break,
            }
        }
        out
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
