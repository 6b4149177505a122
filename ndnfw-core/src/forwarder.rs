//! The forwarding pipeline.
//!
//! [`Forwarder`] owns every table and drives them packet by packet. Each
//! public entry point runs to completion before the next one starts, so no
//! table ever needs a lock. Strategies are called synchronously from inside
//! the pipeline and call back into it to forward or reject.

use log::{debug, error, info, warn};
use ndnfw_common::metrics::ForwarderCounters;
use ndnfw_common::{Data, FaceId, Incoming, Interest, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ForwarderConfig;
use crate::cs::ContentStore;
use crate::dead_nonce_list::DeadNonceList;
use crate::face::{Face, FaceTable};
use crate::fib::Fib;
use crate::pit::{DuplicateNonce, Pit, PitHandle};
use crate::scheduler::{Scheduler, TimerEvent, TimerId, TimerQueue};
use crate::scope;
use crate::strategy::{ForwarderObserver, Strategy};

/// NDN forwarder state machine.
pub struct Forwarder {
    faces: FaceTable,
    fib: Fib,
    pit: Pit,
    cs: ContentStore,
    dead_nonce_list: DeadNonceList,
    scheduler: Box<dyn Scheduler>,
    straggler_time: Duration,

    /// `None` only while a strategy callback is running
    strategy: Option<Box<dyn Strategy>>,
    observers: Vec<Box<dyn ForwarderObserver>>,

    rng: Box<dyn RngCore + Send>,
    counters: Arc<ForwarderCounters>,
}

impl Forwarder {
    /// Creates a forwarder with default settings.
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        let config = ForwarderConfig::default();
        Self::build(&config, strategy)
    }

    /// Creates a forwarder from `config`, installing its static routes.
    pub fn from_config(config: &ForwarderConfig, strategy: Box<dyn Strategy>) -> Result<Self> {
        config.validate()?;
        let mut fw = Self::build(config, strategy);
        let routes = config.parsed_routes()?;
        for (prefix, face, cost) in &routes {
            fw.fib.add_or_update_next_hop(prefix, *face, *cost);
        }
        info!("Forwarder configured with {} static routes", routes.len());
        Ok(fw)
    }

    fn build(config: &ForwarderConfig, strategy: Box<dyn Strategy>) -> Self {
        Self {
            faces: FaceTable::new(),
            fib: Fib::new(),
            pit: Pit::with_default_lifetime(config.default_interest_lifetime()),
            cs: ContentStore::new(config.cs_capacity),
            dead_nonce_list: DeadNonceList::new(config.dead_nonce_lifetime(), config.dead_nonce_capacity),
            scheduler: Box::new(TimerQueue::new()),
            straggler_time: config.straggler_time(),
            strategy: Some(strategy),
            observers: Vec::new(),
            rng: Box::new(StdRng::from_entropy()),
            counters: Arc::new(ForwarderCounters::new()),
        }
    }

    /// Replaces the nonce generator.
    pub fn with_rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = rng;
        self
    }

    /// Replaces the scheduler. Must be done before any packet is processed.
    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn ForwarderObserver>) {
        self.observers.push(observer);
    }

    /* ---------------------------------------------------------------- *
     * Accessors
     * ---------------------------------------------------------------- */

    pub fn fib(&self) -> &Fib {
        &self.fib
    }

    pub fn fib_mut(&mut self) -> &mut Fib {
        &mut self.fib
    }

    pub fn pit(&self) -> &Pit {
        &self.pit
    }

    pub fn cs(&self) -> &ContentStore {
        &self.cs
    }

    pub fn cs_mut(&mut self) -> &mut ContentStore {
        &mut self.cs
    }

    pub fn dead_nonce_list(&self) -> &DeadNonceList {
        &self.dead_nonce_list
    }

    pub fn faces(&self) -> &FaceTable {
        &self.faces
    }

    pub fn counters(&self) -> &Arc<ForwarderCounters> {
        &self.counters
    }

    pub fn straggler_time(&self) -> Duration {
        self.straggler_time
    }

    /// Current time of the forwarder's scheduler.
    pub fn now(&self) -> Instant {
        self.scheduler.now()
    }

    /* ---------------------------------------------------------------- *
     * Faces
     * ---------------------------------------------------------------- */

    pub fn add_face(&mut self, face: Box<dyn Face>) -> FaceId {
        self.faces.add(face)
    }

    pub fn add_reserved_face(&mut self, id: FaceId, face: Box<dyn Face>) -> Result<()> {
        self.faces.add_reserved(id, face)
    }

    /// Unregisters a face and withdraws it from every FIB entry.
    pub fn remove_face(&mut self, id: FaceId) -> Option<Box<dyn Face>> {
        let face = self.faces.remove(id)?;
        self.fib.remove_face(id);
        Some(face)
    }

    /* ---------------------------------------------------------------- *
     * Timers
     * ---------------------------------------------------------------- */

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Fires every timer due at or before `now`, in deadline order, with the
    /// clock set to each timer's deadline as it fires.
    pub fn poll_timers(&mut self, now: Instant) {
        while let Some(deadline) = self.scheduler.next_deadline() {
            if deadline > now {
                break;
            }
            self.scheduler.advance_to(deadline);
            while let Some((id, event)) = self.scheduler.pop_expired() {
                self.handle_timer(id, event);
            }
        }
        self.scheduler.advance_to(now);
    }

    /// Dispatches a fired timer. Events for erased entries, or for timers
    /// the entry no longer holds, are ignored.
    pub fn handle_timer(&mut self, id: TimerId, event: TimerEvent) {
        match event {
            TimerEvent::Unsatisfy(handle) => {
                let Some(entry) = self.pit.get_mut(handle) else {
                    return;
                };
                if entry.unsatisfy_timer != Some(id) {
                    return;
                }
                entry.unsatisfy_timer = None;
                self.on_interest_unsatisfied(handle);
            }
            TimerEvent::Straggler {
                entry: handle,
                satisfied,
                freshness,
            } => {
                let Some(entry) = self.pit.get_mut(handle) else {
                    return;
                };
                if entry.straggler_timer != Some(id) {
                    return;
                }
                entry.straggler_timer = None;
                self.on_interest_finalize(handle, satisfied, freshness);
            }
        }
    }

    /* ---------------------------------------------------------------- *
     * Incoming Interest
     * ---------------------------------------------------------------- */

    pub fn on_incoming_interest(&mut self, in_face: FaceId, mut interest: Interest) {
        self.counters.in_interests.increment();

        let Some(face) = self.faces.get(in_face) else {
            warn!("onIncomingInterest: unknown face {} for {}", in_face, interest.name);
            return;
        };
        let is_local = face.is_local();
        if interest.validation {
            interest.path.push(in_face);
        }
        let interest = Incoming::new(in_face, interest);
        debug!(
            "onIncomingInterest face={} interest={} nonce={:#010x}",
            in_face, interest.name, interest.nonce
        );

        if interest.location_registration {
            self.on_location_registration(&interest);
            return;
        }

        // /localhost Interests never come from outside
        if !is_local && scope::is_localhost(&interest.name) {
            debug!(
                "onIncomingInterest face={} interest={} violates /localhost",
                in_face, interest.name
            );
            return;
        }

        let (handle, is_new) = self.pit.insert(&interest);
        let now = self.scheduler.now();

        let Some(entry) = self.pit.get(handle) else {
            return;
        };
        let is_loop = entry.find_nonce(interest.nonce, in_face) != DuplicateNonce::None
            || self.dead_nonce_list.has(&interest.name, interest.nonce, now);
        if is_loop {
            self.on_interest_loop(&interest, handle, is_new);
            return;
        }

        self.cancel_timers(handle);

        let is_pending = self.pit.get(handle).map_or(false, |entry| entry.has_in_records());
        if is_pending && !interest.validation {
            self.on_content_store_miss(&interest, handle);
            return;
        }

        match self.cs.find(&interest, now) {
            Some(data) => {
                self.counters.cs_hits.increment();
                self.on_content_store_hit(&interest, handle, data);
            }
            None => {
                self.counters.cs_misses.increment();
                self.on_content_store_miss(&interest, handle);
            }
        }
    }

    fn on_interest_loop(&mut self, interest: &Incoming<Interest>, handle: PitHandle, is_new: bool) {
        debug!(
            "onInterestLoop face={} interest={} nonce={:#010x}",
            interest.incoming_face, interest.name, interest.nonce
        );
        self.counters.interest_loops.increment();

        // nothing else refers to an entry this Interest just created
        if is_new {
            self.pit.erase(handle);
        }
    }

    fn on_content_store_hit(&mut self, interest: &Incoming<Interest>, handle: PitHandle, data: Data) {
        debug!("onContentStoreHit interest={}", interest.name);
        let data = Incoming::new(FaceId::CONTENT_STORE, data);
        self.before_satisfy(handle, &data);

        let still_pending = self.pit.get(handle).map_or(false, |entry| entry.has_in_records());
        if still_pending {
            // only the requester was served; the other downstreams still wait
            self.set_unsatisfy_timer(handle);
        } else {
            self.set_straggler_timer(handle, true, data.freshness_period);
        }

        self.on_outgoing_data(&data, interest.incoming_face);
    }

    /// Registrations never aggregate and are never answered from the cache:
    /// they go straight to the cheapest next hop other than the one they came
    /// from, leaving no PIT state behind.
    fn on_location_registration(&mut self, interest: &Incoming<Interest>) {
        debug!("onLocationRegistration interest={}", interest.name);
        if !self.faces.get(interest.incoming_face).map_or(false, |face| face.is_local())
            && scope::is_localhost(&interest.name)
        {
            debug!("onLocationRegistration interest={} violates /localhost", interest.name);
            return;
        }

        let Some(out_face) = self
            .fib
            .find_longest_prefix_match(&interest.name)
            .next_hops()
            .iter()
            .map(|next_hop| next_hop.face)
            .find(|&face| face != interest.incoming_face)
        else {
            debug!("onLocationRegistration interest={} has no next hop", interest.name);
            return;
        };
        let Some(face) = self.faces.get(out_face) else {
            warn!("onLocationRegistration face={} unknown, interest={}", out_face, interest.name);
            return;
        };
        if !face.is_local() && scope::is_localhost(&interest.name) {
            debug!("onOutgoingInterest face={} interest={} violates scope", out_face, interest.name);
            return;
        }

        debug!(
            "onOutgoingInterest face={} interest={} nonce={:#010x}",
            out_face, interest.name, interest.nonce
        );
        face.send_interest(interest);
        self.counters.out_interests.increment();
    }

    fn on_content_store_miss(&mut self, interest: &Incoming<Interest>, handle: PitHandle) {
        debug!("onContentStoreMiss interest={}", interest.name);

        let now = self.scheduler.now();
        let (Some(entry), Some(face)) = (self.pit.get_mut(handle), self.faces.get(interest.incoming_face)) else {
            return;
        };
        entry.insert_or_update_in_record(face, interest, now);
        self.set_unsatisfy_timer(handle);

        let fib_entry = self.fib.find_longest_prefix_match(&interest.name).clone();
        self.dispatch_to_strategy(|strategy, fw| {
            strategy.after_receive_interest(fw, interest, &fib_entry, handle);
        });
    }

    /* ---------------------------------------------------------------- *
     * Strategy actions
     * ---------------------------------------------------------------- */

    /// Forwards the entry's Interest to `out_face`.
    ///
    /// The copy sent is the in-record Interest from a face other than
    /// `out_face`, most recently renewed first; if only `out_face` itself
    /// asked, its own Interest is used. With `want_new_nonce` the copy gets
    /// a fresh random nonce.
    pub fn send_interest(&mut self, handle: PitHandle, out_face: FaceId, want_new_nonce: bool) {
        let Some(entry) = self.pit.get(handle) else {
            warn!("onOutgoingInterest: PIT entry {:?} is gone", handle);
            return;
        };
        if !out_face.is_valid() {
            warn!("onOutgoingInterest face=invalid interest={}", entry.name());
            return;
        }
        let Some(face) = self.faces.get(out_face) else {
            warn!("onOutgoingInterest face={} unknown, interest={}", out_face, entry.name());
            return;
        };
        if entry.violates_scope(face) {
            debug!("onOutgoingInterest face={} interest={} violates scope", out_face, entry.name());
            return;
        }

        let Some(in_record) = entry
            .in_records()
            .iter()
            .max_by_key(|record| (record.face() != out_face, record.last_renewed()))
        else {
            warn!("onOutgoingInterest face={} interest={} has no in-record", out_face, entry.name());
            return;
        };

        let mut interest = in_record.interest().clone();
        if want_new_nonce {
            interest.nonce = self.rng.next_u32();
        }

        let now = self.scheduler.now();
        if let Some(entry) = self.pit.get_mut(handle) {
            entry.insert_or_update_out_record(out_face, &interest, now);
        }

        debug!(
            "onOutgoingInterest face={} interest={} nonce={:#010x}",
            out_face, interest.name, interest.nonce
        );
        face.send_interest(&interest);
        self.counters.out_interests.increment();
    }

    /// Gives up on the entry. Refused while an upstream may still answer.
    pub fn reject_interest(&mut self, handle: PitHandle) {
        let now = self.scheduler.now();
        let Some(entry) = self.pit.get(handle) else {
            warn!("onInterestReject: PIT entry {:?} is gone", handle);
            return;
        };
        if entry.has_unexpired_out_records(now) {
            error!(
                "onInterestReject interest={} cannot reject forwarded Interest",
                entry.name()
            );
            return;
        }
        debug!("onInterestReject interest={}", entry.name());

        self.cancel_timers(handle);
        self.set_straggler_timer(handle, false, None);
    }

    /* ---------------------------------------------------------------- *
     * Expiry and finalization
     * ---------------------------------------------------------------- */

    fn on_interest_unsatisfied(&mut self, handle: PitHandle) {
        let Some(entry) = self.pit.get(handle) else {
            return;
        };
        debug!("onInterestUnsatisfied interest={}", entry.name());

        for observer in self.observers.iter_mut() {
            observer.before_expire_pending_interest(entry);
        }
        self.dispatch_to_strategy(|strategy, fw| {
            strategy.before_expire_pending_interest(fw, handle);
        });

        self.on_interest_finalize(handle, false, None);
    }

    fn on_interest_finalize(&mut self, handle: PitHandle, satisfied: bool, freshness: Option<Duration>) {
        let Some(entry) = self.pit.get(handle) else {
            return;
        };
        debug!(
            "onInterestFinalize interest={} {}",
            entry.name(),
            if satisfied { "satisfied" } else { "unsatisfied" }
        );

        self.insert_dead_nonce_list(handle, satisfied, freshness, None);
        self.cancel_timers(handle);
        self.pit.erase(handle);
    }

    /// Records the entry's outgoing nonces once they could loop back after
    /// the entry is gone. Only the nonce sent to `upstream` is recorded when
    /// one is given.
    fn insert_dead_nonce_list(
        &mut self,
        handle: PitHandle,
        satisfied: bool,
        freshness: Option<Duration>,
        upstream: Option<FaceId>,
    ) {
        let Some(entry) = self.pit.get(handle) else {
            return;
        };

        // Data without a freshness period never turns stale, so it cannot be
        // re-requested with MustBeFresh
        let needed = !satisfied
            || (entry.interest().must_be_fresh
                && freshness.map_or(false, |freshness| freshness < self.dead_nonce_list.lifetime()));
        if !needed {
            return;
        }

        let now = self.scheduler.now();
        for record in entry.out_records() {
            if upstream.map_or(true, |face| face == record.face()) {
                self.dead_nonce_list.add(entry.name(), record.last_nonce(), now);
            }
        }
    }

    /* ---------------------------------------------------------------- *
     * Incoming Data
     * ---------------------------------------------------------------- */

    pub fn on_incoming_data(&mut self, in_face: FaceId, data: Data) {
        self.counters.in_data.increment();

        let Some(face) = self.faces.get(in_face) else {
            warn!("onIncomingData: unknown face {} for {}", in_face, data.name);
            return;
        };
        let is_local = face.is_local();
        let data = Incoming::new(in_face, data);
        debug!("onIncomingData face={} data={}", in_face, data.name);

        if data.validation && data.publishment {
            self.on_data_publishment(data);
            return;
        }

        if !is_local && scope::is_localhost(&data.name) {
            debug!("onIncomingData face={} data={} violates /localhost", in_face, data.name);
            return;
        }

        let matches = self.pit.find_all_data_matches(&data);
        if matches.is_empty() {
            self.on_data_unsolicited(&data, is_local);
            return;
        }

        let now = self.scheduler.now();
        if data.validation && data.eligibility {
            self.on_data_eligible(&data, now);
        } else if !data.validation {
            self.cs.insert(data.packet.clone(), false, now);
        }

        let mut pending_downstreams = BTreeSet::new();
        for handle in matches {
            self.cancel_timers(handle);

            if let Some(entry) = self.pit.get(handle) {
                debug!("onIncomingData matching={}", entry.name());
                pending_downstreams.extend(
                    entry
                        .in_records()
                        .iter()
                        .filter(|record| record.expiry() > now)
                        .map(|record| record.face()),
                );
            }

            self.before_satisfy(handle, &data);
            self.insert_dead_nonce_list(handle, true, data.freshness_period, Some(in_face));

            if let Some(entry) = self.pit.get_mut(handle) {
                entry.delete_in_records();
                entry.delete_out_record(in_face);
            }

            self.set_straggler_timer(handle, true, data.freshness_period);
        }

        for downstream in pending_downstreams {
            if downstream == in_face {
                continue;
            }
            self.on_outgoing_data(&data, downstream);
        }
    }

    /// Pushed Data retraces the recorded request path one face per hop,
    /// without consulting the PIT. Each hop caches it, or with `expiration`
    /// evicts the name instead.
    fn on_data_publishment(&mut self, mut data: Incoming<Data>) {
        match data.packet.path_back.pop() {
            Some(out_face) => self.on_outgoing_data(&data, out_face),
            None => debug!("onDataPublishment data={} reached the end of its path", data.name),
        }

        data.packet.publishment = false;
        if data.expiration {
            debug!("onDataPublishment data={} expired", data.name);
            self.cs.erase(&data.name);
        } else {
            let now = self.scheduler.now();
            self.cs.insert(data.into_inner(), false, now);
        }
    }

    // First copy of eligible content here: announce this node upstream.
    fn on_data_eligible(&mut self, data: &Incoming<Data>, now: Instant) {
        if !self.cs.contains(&data.name) {
            let registration = Interest::new(data.name.clone())
                .with_nonce(self.rng.next_u32())
                .with_validation(true)
                .with_location_registration(true);
            if let Some(face) = self.faces.get(data.incoming_face) {
                debug!(
                    "onDataEligible face={} data={} registering location",
                    data.incoming_face, data.name
                );
                face.send_interest(&registration);
                self.counters.out_interests.increment();
            }
        }
        self.cs.insert(data.packet.clone(), false, now);
    }

    fn on_data_unsolicited(&mut self, data: &Incoming<Data>, is_local: bool) {
        self.counters.unsolicited_data.increment();

        // only Data pushed by a local application is worth keeping
        if is_local {
            let now = self.scheduler.now();
            self.cs.insert(data.packet.clone(), true, now);
        }
        debug!(
            "onDataUnsolicited face={} data={} decision={}",
            data.incoming_face,
            data.name,
            if is_local { "cache" } else { "drop" }
        );
    }

    fn on_outgoing_data(&mut self, data: &Incoming<Data>, out_face: FaceId) {
        if !out_face.is_valid() {
            warn!("onOutgoingData face=invalid data={}", data.name);
            return;
        }
        let Some(face) = self.faces.get(out_face) else {
            warn!("onOutgoingData face={} unknown, data={}", out_face, data.name);
            return;
        };

        if !face.is_local() && scope::is_localhost(&data.name) {
            debug!("onOutgoingData face={} data={} violates /localhost", out_face, data.name);
            return;
        }

        debug!("onOutgoingData face={} data={}", out_face, data.name);
        face.send_data(&data.packet);
        self.counters.out_data.increment();
    }

    /* ---------------------------------------------------------------- *
     * Helpers
     * ---------------------------------------------------------------- */

    fn before_satisfy(&mut self, handle: PitHandle, data: &Incoming<Data>) {
        let Some(entry) = self.pit.get(handle) else {
            return;
        };
        for observer in self.observers.iter_mut() {
            observer.before_satisfy_interest(entry, data);
        }
        self.dispatch_to_strategy(|strategy, fw| {
            strategy.before_satisfy_interest(fw, handle, data);
        });
    }

    fn dispatch_to_strategy(&mut self, call: impl FnOnce(&mut dyn Strategy, &mut Forwarder)) {
        let Some(mut strategy) = self.strategy.take() else {
            error!("strategy re-entered the pipeline through a hook");
            return;
        };
        call(strategy.as_mut(), self);
        self.strategy = Some(strategy);
    }

    fn cancel_timers(&mut self, handle: PitHandle) {
        let Some(entry) = self.pit.get_mut(handle) else {
            return;
        };
        for id in [entry.unsatisfy_timer.take(), entry.straggler_timer.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(id);
        }
    }

    fn set_unsatisfy_timer(&mut self, handle: PitHandle) {
        let now = self.scheduler.now();
        let Some(entry) = self.pit.get_mut(handle) else {
            return;
        };
        let Some(expiry) = entry.max_in_record_expiry() else {
            return;
        };
        if let Some(old) = entry.unsatisfy_timer.take() {
            self.scheduler.cancel(old);
        }
        let delay = expiry.saturating_duration_since(now);
        entry.unsatisfy_timer = Some(self.scheduler.schedule(delay, TimerEvent::Unsatisfy(handle)));
    }

    fn set_straggler_timer(&mut self, handle: PitHandle, satisfied: bool, freshness: Option<Duration>) {
        let Some(entry) = self.pit.get_mut(handle) else {
            return;
        };
        if let Some(old) = entry.straggler_timer.take() {
            self.scheduler.cancel(old);
        }
        let event = TimerEvent::Straggler {
            entry: handle,
            satisfied,
            freshness,
        };
        entry.straggler_timer = Some(self.scheduler.schedule(self.straggler_time, event));
    }
}
