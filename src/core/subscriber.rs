use std::fmt;
use std::ops::Deref;

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub String);

impl SubscriberId {
    /// Generates a fresh random identifier (UUID v4).
    pub fn random() -> Self {
        SubscriberId(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriberId {
    fn from(s: &str) -> Self {
        SubscriberId(s.to_owned())
    }
}

impl From<String> for SubscriberId {
    fn from(s: String) -> Self {
        SubscriberId(s)
    }
}

impl From<SubscriberId> for String {
    fn from(id: SubscriberId) -> Self {
        id.0
    }
}

impl AsRef<str> for SubscriberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for SubscriberId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Per-subscriber registration state, owned by the queue and only touched
/// under the monitor lock.
///
/// `cursor` is the sequence number of the last message this subscriber has
/// consumed. It starts at the tail sequence current at subscribe time, so a
/// subscriber never observes messages published before it joined, and it
/// only ever moves forward.
#[derive(Debug)]
pub struct SubscriberState {
    pub(crate) cursor: u64,
}

impl SubscriberState {
    pub(crate) fn new(cursor: u64) -> Self {
        Self { cursor }
    }
}
