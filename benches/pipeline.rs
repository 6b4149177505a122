use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndnfw_common::{Data, FaceId, Interest, Name};
use ndnfw_core::{BestRoute, ChannelFace, Forwarder};

fn setup() -> (Forwarder, FaceId, FaceId) {
    let mut fw = Forwarder::new(Box::new(BestRoute));
    // receivers are dropped; sends to a closed channel are logged and ignored
    let (consumer, _) = ChannelFace::new(true);
    let (producer, _) = ChannelFace::new(false);
    let consumer = fw.add_face(Box::new(consumer));
    let producer = fw.add_face(Box::new(producer));
    fw.fib_mut()
        .add_or_update_next_hop(&Name::from_string("/bench"), producer, 0);
    (fw, consumer, producer)
}

fn bench_interest_data_round_trip(c: &mut Criterion) {
    let (mut fw, consumer, producer) = setup();
    let prefix = Name::from_string("/bench");
    let mut seq: u32 = 0;

    c.bench_function("interest_data_round_trip", |b| {
        b.iter(|| {
            seq = seq.wrapping_add(1);
            let name = prefix.append(seq.to_string());
            fw.on_incoming_interest(consumer, Interest::new(name.clone()).with_nonce(seq));
            fw.on_incoming_data(producer, Data::new(name, "payload"));
            fw.poll_timers(fw.now() + fw.straggler_time());
            black_box(fw.pit().len());
        })
    });
}

fn bench_content_store_hit(c: &mut Criterion) {
    let (mut fw, consumer, producer) = setup();
    let name = Name::from_string("/bench/cached");
    fw.on_incoming_interest(consumer, Interest::new(name.clone()).with_nonce(1));
    fw.on_incoming_data(producer, Data::new(name.clone(), "payload"));
    let mut nonce: u32 = 1;

    c.bench_function("content_store_hit", |b| {
        b.iter(|| {
            nonce = nonce.wrapping_add(1);
            fw.on_incoming_interest(consumer, Interest::new(name.clone()).with_nonce(nonce));
            fw.poll_timers(fw.now() + fw.straggler_time());
        })
    });
}

fn bench_longest_prefix_match(c: &mut Criterion) {
    let (mut fw, _, producer) = setup();
    for i in 0..1000 {
        fw.fib_mut()
            .add_or_update_next_hop(&Name::from_string(&format!("/bench/{}/x", i)), producer, 1);
    }
    let name = Name::from_string("/bench/500/x/y/z");

    c.bench_function("fib_longest_prefix_match", |b| {
        b.iter(|| black_box(fw.fib().find_longest_prefix_match(black_box(&name))))
    });
}

criterion_group!(
    benches,
    bench_interest_data_round_trip,
    bench_content_store_hit,
    bench_longest_prefix_match
);
criterion_main!(benches);
