//! Benchmarking command: a consumer and a producer face around an
//! in-process forwarder service.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use ndnfw_common::{Data, Interest, Name, NdnPacket};
use ndnfw_core::{BestRoute, ChannelFace, FaceEvent, Forwarder, ForwarderConfig, ForwarderService};
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::utils::{format_duration, print_header, RttStats};

/// Run the benchmark with the specified parameters
pub async fn run_benchmark(config: &ForwarderConfig, count: usize, prefix: String) -> Result<()> {
    info!("Running benchmark: count={}, prefix={}", count, prefix);
    let prefix = Name::from_uri(&prefix).with_context(|| format!("Invalid prefix: {}", prefix))?;

    let forwarder = Forwarder::from_config(config, Box::new(BestRoute))?;
    let (mut service, events) = ForwarderService::new(forwarder);
    let (consumer, mut consumer_rx) = ChannelFace::new(true);
    let (producer, mut producer_rx) = ChannelFace::new(false);
    let consumer = service.forwarder_mut().add_face(Box::new(consumer));
    let producer = service.forwarder_mut().add_face(Box::new(producer));
    service
        .forwarder_mut()
        .fib_mut()
        .add_or_update_next_hop(&prefix, producer, 0);
    let forwarder_task = tokio::spawn(service.run());

    // The producer answers every Interest it is sent
    let producer_events = events.clone();
    let producer_task = tokio::spawn(async move {
        while let Some(packet) = producer_rx.recv().await {
            if let NdnPacket::Interest(interest) = packet {
                let data = Data::new(interest.name, "benchmark");
                if producer_events.send(FaceEvent::DataReceived(producer, data)).is_err() {
                    break;
                }
            }
        }
    });

    let wait = Duration::from_millis(config.default_interest_lifetime_ms);
    let started = Instant::now();
    let mut rtts = Vec::with_capacity(count);
    let mut timeouts = 0usize;

    for i in 0..count {
        let interest = Interest::new(prefix.append(i.to_string())).with_nonce(i as u32);
        let request_start = Instant::now();
        events
            .send(FaceEvent::InterestReceived(consumer, interest))
            .context("Forwarder service stopped")?;

        match timeout(wait, consumer_rx.recv()).await {
            Ok(Some(packet)) => {
                debug!("Received {} {}", packet.packet_type(), packet.name());
                rtts.push(request_start.elapsed());
            }
            Ok(None) => bail!("Consumer face closed"),
            Err(_) => timeouts += 1,
        }
    }
    let total = started.elapsed();
    info!("Benchmark finished in {}", format_duration(total));

    // The producer holds a sender; the service only stops once all are gone
    producer_task.abort();
    drop(events);
    let forwarder = forwarder_task.await.context("Forwarder task failed")?;
    let counters = forwarder.counters().snapshot();

    let stats = RttStats::new(rtts);
    print_header("Benchmark Results");
    println!("Interests sent: {}", count);
    println!("Data received: {}", stats.count());
    println!("Timeouts: {}", timeouts);
    println!("Total time: {}", format_duration(total));
    if let (Some(min), Some(mean), Some(p99), Some(max)) =
        (stats.min(), stats.mean(), stats.percentile(99), stats.max())
    {
        println!(
            "RTT min/avg/p99/max: {} / {} / {} / {}",
            format_duration(min),
            format_duration(mean),
            format_duration(p99),
            format_duration(max)
        );
        println!(
            "Throughput: {:.2} exchanges/second",
            stats.count() as f64 / total.as_secs_f64()
        );
    }

    print_header("Forwarder Counters");
    println!("{}", serde_json::to_string_pretty(&counters)?);
    println!("Pending PIT entries: {}", forwarder.pit().len());

    Ok(())
}
