//! Async driver for the forwarder.
//!
//! Face tasks push [`FaceEvent`]s into an unbounded channel; one tokio task
//! owns the [`Forwarder`], applies events in arrival order and sleeps until
//! the next timer deadline in between.

use log::{debug, info};
use ndnfw_common::metrics::ForwarderCounters;
use ndnfw_common::{Data, FaceId, Interest};
use std::future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::forwarder::Forwarder;

/// Events reported by faces
#[derive(Debug, Clone)]
pub enum FaceEvent {
    /// An Interest arrived on the face
    InterestReceived(FaceId, Interest),

    /// A Data packet arrived on the face
    DataReceived(FaceId, Data),

    /// The face went away
    Closed(FaceId),
}

/// Owns a forwarder and feeds it from a channel.
pub struct ForwarderService {
    forwarder: Forwarder,
    events: mpsc::UnboundedReceiver<FaceEvent>,
}

impl ForwarderService {
    /// Wraps `forwarder`; events sent on the returned sender reach it once
    /// [`ForwarderService::run`] is polled.
    pub fn new(forwarder: Forwarder) -> (Self, mpsc::UnboundedSender<FaceEvent>) {
        let (tx, events) = mpsc::unbounded_channel();
        (Self { forwarder, events }, tx)
    }

    /// For registering faces and routes before the service starts.
    pub fn forwarder_mut(&mut self) -> &mut Forwarder {
        &mut self.forwarder
    }

    pub fn counters(&self) -> Arc<ForwarderCounters> {
        Arc::clone(self.forwarder.counters())
    }

    /// Runs until every event sender is dropped, then hands the forwarder
    /// back.
    pub async fn run(mut self) -> Forwarder {
        info!("Forwarder service started");

        loop {
            let deadline = self.forwarder.next_deadline();
            let wake = async move {
                match deadline {
                    Some(deadline) => time::sleep_until(Instant::from_std(deadline)).await,
                    None => future::pending::<()>().await,
                }
            };

            tokio::select! {
                event = self.events.recv() => {
                    // the clock must be current before the event is applied
                    self.forwarder.poll_timers(Instant::now().into_std());
                    match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }
                _ = wake => {
                    self.forwarder.poll_timers(Instant::now().into_std());
                }
            }
        }

        let counters = self.forwarder.counters().snapshot();
        info!(
            "Forwarder service stopped: {} Interests in, {} Data out",
            counters.in_interests, counters.out_data
        );
        self.forwarder
    }

    fn handle_event(&mut self, event: FaceEvent) {
        match event {
            FaceEvent::InterestReceived(face, interest) => {
                self.forwarder.on_incoming_interest(face, interest);
            }
            FaceEvent::DataReceived(face, data) => {
                self.forwarder.on_incoming_data(face, data);
            }
            FaceEvent::Closed(face) => {
                debug!("Face {} closed", face);
                self.forwarder.remove_face(face);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForwarderConfig;
    use crate::face::ChannelFace;
    use crate::strategy::BestRoute;
    use ndnfw_common::{Name, NdnPacket};
    use std::time::Duration;

    fn service() -> (ForwarderService, mpsc::UnboundedSender<FaceEvent>) {
        let config = ForwarderConfig {
            straggler_time_ms: 10,
            ..ForwarderConfig::default()
        };
        let fw = Forwarder::from_config(&config, Box::new(BestRoute)).unwrap();
        ForwarderService::new(fw)
    }

    #[tokio::test]
    async fn test_interest_data_exchange() {
        let (mut service, tx) = service();
        let (producer, mut producer_rx) = ChannelFace::new(false);
        let (consumer, mut consumer_rx) = ChannelFace::new(true);
        let producer = service.forwarder_mut().add_face(Box::new(producer));
        let consumer = service.forwarder_mut().add_face(Box::new(consumer));
        service
            .forwarder_mut()
            .fib_mut()
            .add_or_update_next_hop(&Name::from_string("/svc"), producer, 1);
        let counters = service.counters();
        let task = tokio::spawn(service.run());

        let name = Name::from_string("/svc/item");
        tx.send(FaceEvent::InterestReceived(consumer, Interest::new(name.clone()).with_nonce(1)))
            .unwrap();
        match producer_rx.recv().await.unwrap() {
            NdnPacket::Interest(interest) => assert_eq!(interest.name, name),
            other => panic!("expected Interest, got {:?}", other),
        }

        tx.send(FaceEvent::DataReceived(producer, Data::new(name.clone(), "hello")))
            .unwrap();
        match consumer_rx.recv().await.unwrap() {
            NdnPacket::Data(data) => assert_eq!(data.content.as_ref(), b"hello"),
            other => panic!("expected Data, got {:?}", other),
        }

        // give the straggler timer time to fire
        time::sleep(Duration::from_millis(50)).await;
        drop(tx);
        let fw = task.await.unwrap();

        assert!(fw.pit().is_empty());
        assert_eq!(fw.cs().len(), 1);
        assert_eq!(counters.in_interests.value(), 1);
        assert_eq!(counters.out_data.value(), 1);
    }

    #[tokio::test]
    async fn test_closed_face_is_removed() {
        let (mut service, tx) = service();
        let (face, _rx) = ChannelFace::new(false);
        let face = service.forwarder_mut().add_face(Box::new(face));
        service
            .forwarder_mut()
            .fib_mut()
            .add_or_update_next_hop(&Name::from_string("/c"), face, 1);
        let task = tokio::spawn(service.run());

        tx.send(FaceEvent::Closed(face)).unwrap();
        drop(tx);
        let fw = task.await.unwrap();

        assert!(fw.faces().is_empty());
        assert!(fw.fib().find_exact(&Name::from_string("/c")).is_none());
    }

    #[tokio::test]
    async fn test_stops_when_senders_dropped() {
        let (service, tx) = service();
        drop(tx);
        let fw = tokio::time::timeout(Duration::from_secs(1), service.run())
            .await
            .expect("service did not stop");
        assert!(fw.pit().is_empty());
    }
}
