#[path = "common.rs"]
mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fanmq::core::message::new_message;
use fanmq::{BroadcastQueue, QueueError, SubscriberId};

#[test]
fn close_wakes_a_blocked_consumer() {
    common::init_logging();

    let q = Arc::new(BroadcastQueue::new(4).unwrap());
    let id = SubscriberId::from("parked");
    q.subscribe(id.clone()).unwrap();

    let consumer = {
        let q = Arc::clone(&q);
        let id = id.clone();
        thread::spawn(move || q.consume(&id))
    };

    thread::sleep(Duration::from_millis(50));
    q.close();

    assert_eq!(consumer.join().unwrap().unwrap_err(), QueueError::QueueClosed);
}

#[test]
fn close_wakes_a_blocked_publisher() {
    common::init_logging();

    let q = Arc::new(BroadcastQueue::new(1).unwrap());
    let id = SubscriberId::from("reader");
    q.subscribe(id.clone()).unwrap();
    q.publish(new_message("blocker")).unwrap();

    let publisher = {
        let q = Arc::clone(&q);
        thread::spawn(move || q.publish(new_message("parked")))
    };

    thread::sleep(Duration::from_millis(50));
    q.close();

    assert_eq!(publisher.join().unwrap().unwrap_err(), QueueError::QueueClosed);
}

#[test]
fn every_operation_fails_after_close() {
    common::init_logging();

    let q = BroadcastQueue::new(4).unwrap();
    let id = SubscriberId::from("reader");
    q.subscribe(id.clone()).unwrap();
    q.publish(new_message("m")).unwrap();

    q.close();
    assert!(q.is_closed());
    assert_eq!(q.len(), 0);
    assert_eq!(q.subscriber_count(), 0);

    assert_eq!(q.publish(new_message("x")).unwrap_err(), QueueError::QueueClosed);
    assert_eq!(q.consume(&id).unwrap_err(), QueueError::QueueClosed);
    assert_eq!(q.try_consume(&id).unwrap_err(), QueueError::QueueClosed);
    assert_eq!(q.subscribe(id.clone()).unwrap_err(), QueueError::QueueClosed);
    assert_eq!(q.set_capacity(8).unwrap_err(), QueueError::QueueClosed);
    assert!(!q.remove(1));

    // idempotent
    q.close();
    assert!(q.is_closed());
}
