//! Forwarding counters.
//!
//! The forwarder runs on a single logical thread, but the counters are
//! atomics so a monitoring task can read them through an `Arc` while the
//! forwarder keeps running.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/* ---------------------------------------------------------------- *
 * Simple Counter
 * ---------------------------------------------------------------- */

#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

/* ---------------------------------------------------------------- *
 * Forwarder counters
 * ---------------------------------------------------------------- */

/// Monotonic packet counters maintained by the forwarding pipeline.
#[derive(Debug, Default)]
pub struct ForwarderCounters {
    pub in_interests: Counter,
    pub out_interests: Counter,
    pub in_data: Counter,
    pub out_data: Counter,

    pub cs_hits: Counter,
    pub cs_misses: Counter,
    /// Interests dropped as duplicates (PIT nonce or Dead Nonce List)
    pub interest_loops: Counter,
    pub unsolicited_data: Counter,
}

impl ForwarderCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            in_interests: self.in_interests.value(),
            out_interests: self.out_interests.value(),
            in_data: self.in_data.value(),
            out_data: self.out_data.value(),
            cs_hits: self.cs_hits.value(),
            cs_misses: self.cs_misses.value(),
            interest_loops: self.interest_loops.value(),
            unsolicited_data: self.unsolicited_data.value(),
        }
    }
}

/// Plain-value view of [`ForwarderCounters`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub in_interests: u64,
    pub out_interests: u64,
    pub in_data: u64,
    pub out_data: u64,
    pub cs_hits: u64,
    pub cs_misses: u64,
    pub interest_loops: u64,
    pub unsolicited_data: u64,
}
