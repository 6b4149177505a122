//! Extension points of the forwarding pipeline.

use log::debug;
use ndnfw_common::{Data, Incoming, Interest};

use crate::fib::FibEntry;
use crate::forwarder::Forwarder;
use crate::pit::{PitEntry, PitHandle};

/// Forwarding decision logic.
///
/// The pipeline calls a strategy but never forwards on its behalf: an
/// Interest only leaves the node when `after_receive_interest` calls
/// [`Forwarder::send_interest`], and a strategy that gives up calls
/// [`Forwarder::reject_interest`].
pub trait Strategy: Send {
    /// A new or aggregated Interest missed the content store.
    fn after_receive_interest(
        &mut self,
        fw: &mut Forwarder,
        interest: &Incoming<Interest>,
        fib_entry: &FibEntry,
        pit: PitHandle,
    );

    /// The entry is about to be satisfied by `data`.
    fn before_satisfy_interest(&mut self, _fw: &Forwarder, _pit: PitHandle, _data: &Incoming<Data>) {}

    /// The entry's unsatisfy timer fired.
    fn before_expire_pending_interest(&mut self, _fw: &Forwarder, _pit: PitHandle) {}
}

/// Passive listener on the pipeline, for tracing and measurement.
pub trait ForwarderObserver: Send {
    fn before_satisfy_interest(&mut self, _entry: &PitEntry, _data: &Incoming<Data>) {}

    fn before_expire_pending_interest(&mut self, _entry: &PitEntry) {}
}

/// Sends each Interest to the cheapest next hop that is neither the face
/// it came from nor out of scope, and rejects it when there is none.
#[derive(Debug, Default, Clone, Copy)]
pub struct BestRoute;

impl Strategy for BestRoute {
    fn after_receive_interest(
        &mut self,
        fw: &mut Forwarder,
        interest: &Incoming<Interest>,
        fib_entry: &FibEntry,
        pit: PitHandle,
    ) {
        let Some(entry) = fw.pit().get(pit) else {
            return;
        };

        let chosen = fib_entry.next_hops().iter().find(|nh| {
            nh.face != interest.incoming_face
                && fw
                    .faces()
                    .get(nh.face)
                    .map_or(false, |face| !entry.violates_scope(face))
        });

        match chosen {
            Some(nh) => {
                let face = nh.face;
                fw.send_interest(pit, face, false);
            }
            None => {
                debug!("BestRoute: no usable next hop for {}", interest.name);
                fw.reject_interest(pit);
            }
        }
    }
}
