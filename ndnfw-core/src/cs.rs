//! Content Store.
//!
//! Cached Data is kept in name order so that a CanBePrefix lookup is a
//! range scan starting at the Interest name. Replacement is LRU, except
//! that unsolicited Data is always evicted before anything that was asked
//! for.

use log::debug;
use ndnfw_common::{Data, Interest, Name};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::time::Instant;

/// Default number of cached packets.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
struct CsEntry {
    data: Data,
    stale_at: Option<Instant>,
    unsolicited: bool,
    seq: u64,
}

impl CsEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.stale_at.map_or(true, |stale_at| now < stale_at)
    }
}

/// Name-keyed Data cache
#[derive(Debug, Clone)]
pub struct ContentStore {
    entries: BTreeMap<Name, CsEntry>,
    /// solicited entries, least recently used first
    lru: BTreeMap<u64, Name>,
    /// unsolicited entries, oldest first
    unsolicited: BTreeMap<u64, Name>,
    capacity: usize,
    next_seq: u64,
}

impl ContentStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            lru: BTreeMap::new(),
            unsolicited: BTreeMap::new(),
            capacity,
            next_seq: 0,
        }
    }

    /// Looks up Data satisfying `interest`.
    ///
    /// Without CanBePrefix only the exact name matches; with it the smallest
    /// name under the Interest name wins. MustBeFresh skips stale entries. A
    /// hit counts as a use for replacement purposes.
    pub fn find(&mut self, interest: &Interest, now: Instant) -> Option<Data> {
        let usable = |entry: &CsEntry| !interest.must_be_fresh || entry.is_fresh(now);

        let found = if interest.can_be_prefix {
            self.entries
                .range::<Name, _>((Bound::Included(&interest.name), Bound::Unbounded))
                .take_while(|(name, _)| interest.name.is_prefix_of(name))
                .find(|(_, entry)| usable(entry))
                .map(|(name, _)| name.clone())
        } else {
            self.entries
                .get(&interest.name)
                .filter(|entry| usable(entry))
                .map(|_| interest.name.clone())
        };

        let Some(name) = found else {
            debug!("CS miss for {}", interest.name);
            return None;
        };
        debug!("CS hit for {}: {}", interest.name, name);
        self.touch(&name);
        self.entries.get(&name).map(|entry| entry.data.clone())
    }

    /// Caches a copy of `data`, replacing any entry of the same name.
    /// Storing solicited Data over an unsolicited entry clears the mark.
    pub fn insert(&mut self, data: Data, unsolicited: bool, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        let old = self.entries.get(&data.name).map(|old| (old.seq, old.unsolicited));
        let unsolicited = match old {
            Some((old_seq, old_unsolicited)) => {
                self.dequeue(old_seq, old_unsolicited);
                old_unsolicited && unsolicited
            }
            None => unsolicited,
        };

        let seq = self.next_seq();
        let stale_at = data.freshness_period.map(|freshness| now + freshness);
        self.enqueue(seq, unsolicited, data.name.clone());
        debug!("CS insert {} (unsolicited={})", data.name, unsolicited);
        self.entries.insert(
            data.name.clone(),
            CsEntry {
                data,
                stale_at,
                unsolicited,
                seq,
            },
        );

        self.evict_to(self.capacity);
    }

    /// Removes the entry for `name`, returning whether there was one.
    pub fn erase(&mut self, name: &Name) -> bool {
        match self.entries.remove(name) {
            Some(entry) => {
                self.dequeue(entry.seq, entry.unsolicited);
                true
            }
            None => false,
        }
    }

    /// Exact-name presence, without refreshing the entry's LRU position.
    pub fn contains(&self, name: &Name) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the limit, evicting immediately if the store is over it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict_to(capacity);
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn enqueue(&mut self, seq: u64, unsolicited: bool, name: Name) {
        if unsolicited {
            self.unsolicited.insert(seq, name);
        } else {
            self.lru.insert(seq, name);
        }
    }

    fn dequeue(&mut self, seq: u64, unsolicited: bool) {
        if unsolicited {
            self.unsolicited.remove(&seq);
        } else {
            self.lru.remove(&seq);
        }
    }

    fn touch(&mut self, name: &Name) {
        let seq = self.next_seq();
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        let (old_seq, unsolicited) = (entry.seq, entry.unsolicited);
        entry.seq = seq;
        self.dequeue(old_seq, unsolicited);
        self.enqueue(seq, unsolicited, name.clone());
    }

    fn evict_to(&mut self, limit: usize) {
        while self.entries.len() > limit {
            let victim = self
                .unsolicited
                .pop_first()
                .or_else(|| self.lru.pop_first())
                .map(|(_, name)| name);
            let Some(name) = victim else {
                break;
            };
            debug!("CS evict {}", name);
            self.entries.remove(&name);
        }
    }
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
