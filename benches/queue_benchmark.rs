use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use fanmq::config::CONFIG;
use fanmq::core::message::new_message;
use fanmq::{BroadcastQueue, SubscriberId};

fn publish_consume_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    group.throughput(Throughput::Elements(1));

    group.bench_function("publish_consume_single_subscriber", |b| {
        let q = BroadcastQueue::new(CONFIG.queue.capacity).unwrap();
        let id = SubscriberId::from("bench");
        q.subscribe(id.clone()).unwrap();
        b.iter(|| {
            q.publish(new_message("payload")).unwrap();
            q.consume(&id).unwrap()
        });
    });

    group.bench_function("publish_fanout_eight_subscribers", |b| {
        let q = BroadcastQueue::new(CONFIG.queue.capacity).unwrap();
        let ids: Vec<SubscriberId> = (0..8)
            .map(|n| SubscriberId::from(format!("bench-{n}")))
            .collect();
        for id in &ids {
            q.subscribe(id.clone()).unwrap();
        }
        b.iter(|| {
            q.publish(new_message("payload")).unwrap();
            for id in &ids {
                q.consume(id).unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, publish_consume_roundtrip);
criterion_main!(benches);
