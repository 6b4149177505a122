//! PIT (Pending Interest Table).
//!
//! Entries live in a generational arena. Everything outside the table
//! (timers, strategies, the forwarding pipeline) refers to an entry by
//! [`PitHandle`]; once the entry is erased its handle stops resolving, and a
//! later entry reusing the slot gets a different generation.

use log::debug;
use ndnfw_common::ndn::DEFAULT_INTEREST_LIFETIME;
use ndnfw_common::{Data, FaceId, Interest, Name};
use std::time::{Duration, Instant};

use crate::face::Face;
use crate::name_tree::NameIndex;
use crate::scheduler::TimerId;
use crate::scope;

/// Weak reference to a PIT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PitHandle {
    index: u32,
    generation: u32,
}

/// Where a nonce was already seen on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateNonce {
    /// Not seen
    None,

    /// Seen only in records of the face asking
    SameFace,

    /// Seen in a record of some other face
    OtherFace,
}

/// Downstream side of a PIT entry: one per face that asked.
#[derive(Debug, Clone)]
pub struct InRecord {
    face: FaceId,
    is_local: bool,
    last_nonce: u32,
    last_renewed: Instant,
    expiry: Instant,
    interest: Interest,
}

impl InRecord {
    pub fn face(&self) -> FaceId {
        self.face
    }

    /// Whether the downstream face was local when the record was refreshed.
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn last_nonce(&self) -> u32 {
        self.last_nonce
    }

    pub fn last_renewed(&self) -> Instant {
        self.last_renewed
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    /// The Interest as last received from this face.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }
}

/// Upstream side of a PIT entry: one per face the Interest went out on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutRecord {
    face: FaceId,
    last_nonce: u32,
    last_renewed: Instant,
    expiry: Instant,
}

impl OutRecord {
    pub fn face(&self) -> FaceId {
        self.face
    }

    pub fn last_nonce(&self) -> u32 {
        self.last_nonce
    }

    pub fn last_renewed(&self) -> Instant {
        self.last_renewed
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }
}

/// A pending Interest and everything the forwarder knows about it.
#[derive(Debug, Clone)]
pub struct PitEntry {
    interest: Interest,
    in_records: Vec<InRecord>,
    out_records: Vec<OutRecord>,
    pub(crate) unsatisfy_timer: Option<TimerId>,
    pub(crate) straggler_timer: Option<TimerId>,
    default_lifetime: Duration,
    seq: u64,
}

impl PitEntry {
    fn new(interest: Interest, default_lifetime: Duration, seq: u64) -> Self {
        Self {
            interest,
            in_records: Vec::new(),
            out_records: Vec::new(),
            unsatisfy_timer: None,
            straggler_timer: None,
            default_lifetime,
            seq,
        }
    }

    fn lifetime_of(&self, interest: &Interest) -> Duration {
        interest.lifetime.unwrap_or(self.default_lifetime)
    }

    /// The Interest that created this entry.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn name(&self) -> &Name {
        &self.interest.name
    }

    pub fn in_records(&self) -> &[InRecord] {
        &self.in_records
    }

    pub fn out_records(&self) -> &[OutRecord] {
        &self.out_records
    }

    pub fn has_in_records(&self) -> bool {
        !self.in_records.is_empty()
    }

    pub fn in_record(&self, face: FaceId) -> Option<&InRecord> {
        self.in_records.iter().find(|r| r.face == face)
    }

    pub fn out_record(&self, face: FaceId) -> Option<&OutRecord> {
        self.out_records.iter().find(|r| r.face == face)
    }

    pub fn unsatisfy_timer(&self) -> Option<TimerId> {
        self.unsatisfy_timer
    }

    pub fn straggler_timer(&self) -> Option<TimerId> {
        self.straggler_timer
    }

    /// Looks for `nonce` in every in- and out-record.
    pub fn find_nonce(&self, nonce: u32, face: FaceId) -> DuplicateNonce {
        let seen = self
            .in_records
            .iter()
            .map(|r| (r.face, r.last_nonce))
            .chain(self.out_records.iter().map(|r| (r.face, r.last_nonce)))
            .filter(|&(_, n)| n == nonce);

        let mut result = DuplicateNonce::None;
        for (record_face, _) in seen {
            if record_face != face {
                return DuplicateNonce::OtherFace;
            }
            result = DuplicateNonce::SameFace;
        }
        result
    }

    /// Adds or refreshes the in-record for `face`.
    pub fn insert_or_update_in_record(&mut self, face: &dyn Face, interest: &Interest, now: Instant) {
        let expiry = now + self.lifetime_of(interest);
        match self.in_records.iter_mut().find(|r| r.face == face.id()) {
            Some(record) => {
                record.is_local = face.is_local();
                record.last_nonce = interest.nonce;
                record.last_renewed = now;
                record.expiry = expiry;
                record.interest = interest.clone();
            }
            None => self.in_records.push(InRecord {
                face: face.id(),
                is_local: face.is_local(),
                last_nonce: interest.nonce,
                last_renewed: now,
                expiry,
                interest: interest.clone(),
            }),
        }
    }

    /// Adds or refreshes the out-record for `face` with the nonce of the
    /// Interest actually sent.
    pub fn insert_or_update_out_record(&mut self, face: FaceId, interest: &Interest, now: Instant) {
        let expiry = now + self.lifetime_of(interest);
        match self.out_records.iter_mut().find(|r| r.face == face) {
            Some(record) => {
                record.last_nonce = interest.nonce;
                record.last_renewed = now;
                record.expiry = expiry;
            }
            None => self.out_records.push(OutRecord {
                face,
                last_nonce: interest.nonce,
                last_renewed: now,
                expiry,
            }),
        }
    }

    pub fn delete_in_records(&mut self) {
        self.in_records.clear();
    }

    pub fn delete_out_record(&mut self, face: FaceId) {
        self.out_records.retain(|r| r.face != face);
    }

    pub fn has_unexpired_out_records(&self, now: Instant) -> bool {
        self.out_records.iter().any(|r| r.expiry > now)
    }

    /// Latest expiry among the in-records.
    pub fn max_in_record_expiry(&self) -> Option<Instant> {
        self.in_records.iter().map(|r| r.expiry).max()
    }

    /// Whether sending this entry's Interest to `out_face` would cross a
    /// locality boundary.
    pub fn violates_scope(&self, out_face: &dyn Face) -> bool {
        if out_face.is_local() {
            return false;
        }
        if scope::is_localhost(self.name()) {
            return true;
        }
        // /localhop may leave the node, but only when it came from a local app
        scope::is_localhop(self.name()) && self.in_records.iter().any(|r| !r.is_local)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<PitEntry>,
}

/// Pending Interest Table
#[derive(Debug, Clone)]
pub struct Pit {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_name: NameIndex<PitHandle>,
    next_seq: u64,
    default_lifetime: Duration,
}

impl Pit {
    pub fn new() -> Self {
        Self::with_default_lifetime(DEFAULT_INTEREST_LIFETIME)
    }

    /// Records of Interests without a lifetime expire after `lifetime`.
    pub fn with_default_lifetime(lifetime: Duration) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_name: NameIndex::new(),
            next_seq: 0,
            default_lifetime: lifetime,
        }
    }

    /// Finds the entry for the Interest's exact name, creating it if absent.
    /// Returns the handle and whether the entry is new.
    pub fn insert(&mut self, interest: &Interest) -> (PitHandle, bool) {
        if let Some(&handle) = self.by_name.get(interest.name.components()) {
            return (handle, false);
        }

        let entry = PitEntry::new(interest.clone(), self.default_lifetime, self.next_seq);
        self.next_seq += 1;

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                PitHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                PitHandle { index, generation: 0 }
            }
        };

        self.by_name.insert(interest.name.clone(), handle);
        debug!("PIT insert {} -> {:?}", interest.name, handle);
        (handle, true)
    }

    pub fn get(&self, handle: PitHandle) -> Option<&PitEntry> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, handle: PitHandle) -> Option<&mut PitEntry> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    pub fn find_exact(&self, name: &Name) -> Option<PitHandle> {
        self.by_name.get(name.components()).copied()
    }

    /// Every entry `data` satisfies: the entry for its exact name, plus
    /// entries for shorter prefixes whose Interest allows prefix matching.
    /// Returned in insertion order.
    pub fn find_all_data_matches(&self, data: &Data) -> Vec<PitHandle> {
        let mut matches: Vec<(u64, PitHandle)> = self
            .by_name
            .prefix_matches(&data.name)
            .filter_map(|(name, &handle)| {
                let entry = self.get(handle)?;
                let exact = name.len() == data.name.len();
                (exact || entry.interest.can_be_prefix).then_some((entry.seq, handle))
            })
            .collect();
        matches.sort_unstable_by_key(|&(seq, _)| seq);
        matches.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Removes the entry and invalidates `handle`. Erasing through a stale
    /// handle does nothing.
    pub fn erase(&mut self, handle: PitHandle) -> Option<PitEntry> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let entry = slot.entry.take()?;
        debug_assert!(
            entry.unsatisfy_timer.is_none() && entry.straggler_timer.is_none(),
            "PIT entry {} erased with a live timer",
            entry.name()
        );

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.by_name.remove(entry.name().components());
        debug!("PIT erase {}", entry.name());
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for Pit {
    fn default() -> Self {
        Self::new()
    }
}
