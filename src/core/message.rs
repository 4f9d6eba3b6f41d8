use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};

/// A published payload together with its queue-assigned identity.
///
/// The payload is opaque bytes; the queue never inspects it. Consumers
/// receive the message behind an `Arc`, so the allocation is shared by every
/// subscriber entitled to read it and freed exactly once, when the last
/// reference drops.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub payload: Bytes,
    pub timestamp: u64,
}

pub fn new_message(payload: impl Into<Bytes>) -> Message {
    Message {
        id: generate_id(),
        payload: payload.into(),
        timestamp: current_timestamp(),
    }
}

pub fn with_custom_message(id: u64, payload: impl Into<Bytes>, timestamp: u64) -> Message {
    Message {
        id,
        payload: payload.into(),
        timestamp,
    }
}

pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generates a monotonically increasing u64 ID (fast, lock-free).
static NEXT_ID: AtomicU64 = AtomicU64::new(1);
fn generate_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
