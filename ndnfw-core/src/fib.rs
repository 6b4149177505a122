//! FIB (Forwarding Information Base).
//!
//! Maps name prefixes to the faces Interests under them may be forwarded
//! to. A root entry (the empty prefix) always exists, so a lookup can never
//! fail: a name without a route resolves to an entry whose next-hop list is
//! empty.

use log::{debug, info};
use ndnfw_common::{FaceId, Name};

use crate::name_tree::NameIndex;

/// A next hop of a FIB entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    /// Face to forward to
    pub face: FaceId,
    /// Routing cost; lower is preferred
    pub cost: u64,
}

/// FIB entry containing next hop information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibEntry {
    prefix: Name,
    next_hops: Vec<NextHop>,
}

impl FibEntry {
    fn new(prefix: Name) -> Self {
        Self {
            prefix,
            next_hops: Vec::new(),
        }
    }

    /// Name prefix this entry covers
    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    /// Next hops ordered by ascending cost.
    pub fn next_hops(&self) -> &[NextHop] {
        &self.next_hops
    }

    pub fn has_next_hops(&self) -> bool {
        !self.next_hops.is_empty()
    }

    pub fn has_next_hop(&self, face: FaceId) -> bool {
        self.next_hops.iter().any(|nh| nh.face == face)
    }

    fn add_or_update_next_hop(&mut self, face: FaceId, cost: u64) {
        match self.next_hops.iter_mut().find(|nh| nh.face == face) {
            Some(nh) => nh.cost = cost,
            None => self.next_hops.push(NextHop { face, cost }),
        }
        // stable: equal costs keep registration order
        self.next_hops.sort_by_key(|nh| nh.cost);
    }

    fn remove_next_hop(&mut self, face: FaceId) -> bool {
        let before = self.next_hops.len();
        self.next_hops.retain(|nh| nh.face != face);
        self.next_hops.len() != before
    }
}

/// Forwarding Information Base
#[derive(Debug, Clone)]
pub struct Fib {
    root: FibEntry,
    entries: NameIndex<FibEntry>,
}

impl Fib {
    /// Create a new FIB holding only the empty root entry.
    pub fn new() -> Self {
        Self {
            root: FibEntry::new(Name::new()),
            entries: NameIndex::new(),
        }
    }

    /// Adds `face` as a next hop of `prefix`, creating the entry if needed.
    /// An existing next hop for the same face has its cost replaced.
    pub fn add_or_update_next_hop(&mut self, prefix: &Name, face: FaceId, cost: u64) {
        if prefix.is_empty() {
            self.root.add_or_update_next_hop(face, cost);
        } else if let Some(entry) = self.entries.get_mut(prefix.components()) {
            entry.add_or_update_next_hop(face, cost);
        } else {
            let mut entry = FibEntry::new(prefix.clone());
            entry.add_or_update_next_hop(face, cost);
            self.entries.insert(prefix.clone(), entry);
            info!("Added FIB entry for prefix: {}", prefix);
        }
        debug!("FIB {} += {} cost={}", prefix, face, cost);
    }

    /// Removes `face` from `prefix`. An entry left without next hops is
    /// removed, except the root entry. Returns true if a next hop was removed.
    pub fn remove_next_hop(&mut self, prefix: &Name, face: FaceId) -> bool {
        if prefix.is_empty() {
            return self.root.remove_next_hop(face);
        }
        let Some(entry) = self.entries.get_mut(prefix.components()) else {
            return false;
        };
        let removed = entry.remove_next_hop(face);
        if !entry.has_next_hops() {
            self.entries.remove(prefix.components());
            info!("Removed FIB entry for prefix: {}", prefix);
        }
        removed
    }

    /// Removes `face` from every entry, as done when a face goes away.
    pub fn remove_face(&mut self, face: FaceId) {
        self.root.remove_next_hop(face);
        self.entries.retain(|_, entry| {
            entry.remove_next_hop(face);
            entry.has_next_hops()
        });
    }

    /// Walks from the full name down to the root and returns the first
    /// registered entry.
    pub fn find_longest_prefix_match(&self, name: &Name) -> &FibEntry {
        let entry = self
            .entries
            .longest_prefix_match(name)
            .map_or(&self.root, |(_, entry)| entry);
        debug!(
            "FIB lookup for {}: matched {} with {} next hops",
            name,
            entry.prefix,
            entry.next_hops.len()
        );
        entry
    }

    pub fn find_exact(&self, prefix: &Name) -> Option<&FibEntry> {
        if prefix.is_empty() {
            Some(&self.root)
        } else {
            self.entries.get(prefix.components())
        }
    }

    /// Number of entries, including the root.
    pub fn len(&self) -> usize {
        self.entries.len() + 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &FibEntry> {
        std::iter::once(&self.root).chain(self.entries.iter().map(|(_, entry)| entry))
    }
}

impl Default for Fib {
    fn default() -> Self {
        Self::new()
    }
}
