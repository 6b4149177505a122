//! Dead Nonce List.
//!
//! Remembers (name, nonce) pairs of Interests that left this node after
//! their PIT entry is gone, so a looping copy arriving later is still
//! recognised. Entries are kept for [`DeadNonceList::lifetime`] and the
//! list never grows past its capacity.

use log::debug;
use ndnfw_common::Name;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Default retention of an entry.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(6);

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone)]
pub struct DeadNonceList {
    lifetime: Duration,
    capacity: usize,
    /// insertion order, oldest first; refreshed pairs leave stale elements
    /// behind until they reach the front or the queue is compacted
    queue: VecDeque<(Instant, Name, u32)>,
    /// latest insertion time per pair, keyed by name so lookups borrow
    index: HashMap<Name, HashMap<u32, Instant>>,
    len: usize,
}

impl DeadNonceList {
    pub fn new(lifetime: Duration, capacity: usize) -> Self {
        Self {
            lifetime,
            capacity,
            queue: VecDeque::new(),
            index: HashMap::new(),
            len: 0,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn added_at(&self, name: &Name, nonce: u32) -> Option<Instant> {
        self.index.get(name.components())?.get(&nonce).copied()
    }

    /// Whether (`name`, `nonce`) was added less than one lifetime before `now`.
    pub fn has(&self, name: &Name, nonce: u32, now: Instant) -> bool {
        self.added_at(name, nonce)
            .map_or(false, |added| now.saturating_duration_since(added) < self.lifetime)
    }

    pub fn add(&mut self, name: &Name, nonce: u32, now: Instant) {
        self.purge(now);
        if self.capacity == 0 {
            return;
        }

        debug!("DNL add {} nonce={:#010x}", name, nonce);
        let previous = match self.index.get_mut(name.components()) {
            Some(nonces) => nonces.insert(nonce, now),
            None => {
                self.index.insert(name.clone(), HashMap::from([(nonce, now)]));
                None
            }
        };
        match previous {
            // already queued at this instant
            Some(added) if added == now => return,
            Some(_) => {}
            None => self.len += 1,
        }
        self.queue.push_back((now, name.clone(), nonce));

        if self.queue.len() > self.capacity.saturating_mul(2) {
            self.compact();
        }
        while self.len > self.capacity {
            if !self.pop_oldest() {
                break;
            }
        }
    }

    fn purge(&mut self, now: Instant) {
        while let Some((added, _, _)) = self.queue.front() {
            if now.saturating_duration_since(*added) < self.lifetime {
                break;
            }
            self.pop_oldest();
        }
    }

    // Drops queue elements superseded by a later add of the same pair.
    fn compact(&mut self) {
        let index = &self.index;
        self.queue.retain(|(added, name, nonce)| {
            index
                .get(name.components())
                .and_then(|nonces| nonces.get(nonce))
                == Some(added)
        });
    }

    // Drops the front of the queue; the index entry goes only if it was not
    // refreshed by a later add.
    fn pop_oldest(&mut self) -> bool {
        let Some((added, name, nonce)) = self.queue.pop_front() else {
            return false;
        };
        if let Some(nonces) = self.index.get_mut(name.components()) {
            if nonces.get(&nonce) == Some(&added) {
                nonces.remove(&nonce);
                self.len -= 1;
                if nonces.is_empty() {
                    self.index.remove(name.components());
                }
            }
        }
        true
    }
}

impl Default for DeadNonceList {
    fn default() -> Self {
        Self::new(DEFAULT_LIFETIME, DEFAULT_CAPACITY)
    }
}
