use std::time::Duration;

use fanmq::config::load_config;
use fanmq::{BroadcastQueue, Config};

#[test]
fn load_config_matches_toml() {
    let cfg: Config = load_config("fanmq.toml").expect("failed to load config");

    assert_eq!(cfg.queue.capacity, 64);
    assert_eq!(cfg.timeouts.consume_ms, 5000);
    assert_eq!(cfg.timeouts.publish_ms, 5000);
    assert_eq!(cfg.consume_timeout(), Duration::from_millis(5000));
    assert_eq!(cfg.publish_timeout(), Duration::from_millis(5000));
}

#[test]
fn queue_is_sized_from_config() {
    let cfg = Config::default();
    let q = BroadcastQueue::from_config(&cfg).unwrap();
    assert_eq!(q.capacity(), cfg.queue.capacity);
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_config("does-not-exist.toml").is_err());
}
