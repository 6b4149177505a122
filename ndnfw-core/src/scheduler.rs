//! One-shot timers for the forwarding pipeline.
//!
//! A timer carries a [`TimerEvent`] instead of a callback. The forwarder
//! drains expired events and dispatches them itself, so nothing scheduled
//! ever holds a reference into the tables.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use crate::pit::PitHandle;

/// Identifies a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What to do when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// No Data arrived before the last in-record expired.
    Unsatisfy(PitHandle),

    /// Grace period after satisfaction or rejection has elapsed.
    Straggler {
        entry: PitHandle,
        satisfied: bool,
        freshness: Option<Duration>,
    },
}

/// Cancellable one-shot timers against a clock the caller advances.
pub trait Scheduler: Send {
    /// Current time as seen by the scheduler.
    fn now(&self) -> Instant;

    /// Schedules `event` to fire `delay` after [`Scheduler::now`].
    fn schedule(&mut self, delay: Duration, event: TimerEvent) -> TimerId;

    /// Cancels a timer. Cancelling a fired or unknown timer does nothing.
    fn cancel(&mut self, id: TimerId);

    /// Deadline of the earliest live timer.
    fn next_deadline(&self) -> Option<Instant>;

    /// Moves the clock forward. The clock never goes backwards.
    fn advance_to(&mut self, now: Instant);

    /// Removes and returns one timer whose deadline has passed, earliest
    /// first, and in scheduling order among equal deadlines.
    fn pop_expired(&mut self) -> Option<(TimerId, TimerEvent)>;
}

/// Binary-heap backed [`Scheduler`].
#[derive(Debug)]
pub struct TimerQueue {
    now: Instant,
    next_id: u64,
    heap: BinaryHeap<Reverse<(Instant, TimerId)>>,
    live: HashMap<TimerId, TimerEvent>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a queue whose clock starts at `now`.
    pub fn starting_at(now: Instant) -> Self {
        Self {
            now,
            next_id: 0,
            heap: BinaryHeap::new(),
            live: HashMap::new(),
        }
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.live.contains_key(&id)
    }

    // keeps the heap top live so next_deadline can peek
    fn prune(&mut self) {
        while let Some(Reverse((_, id))) = self.heap.peek() {
            if self.live.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Instant {
        self.now
    }

    fn schedule(&mut self, delay: Duration, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse((self.now + delay, id)));
        self.live.insert(id, event);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if self.live.remove(&id).is_some() {
            self.prune();
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    fn advance_to(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    fn pop_expired(&mut self) -> Option<(TimerId, TimerEvent)> {
        let &Reverse((deadline, id)) = self.heap.peek()?;
        if deadline > self.now {
            return None;
        }
        self.heap.pop();
        let event = self.live.remove(&id);
        self.prune();
        event.map(|event| (id, event))
    }
}
