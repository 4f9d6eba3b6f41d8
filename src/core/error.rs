use std::fmt;

/// Errors returned by [`BroadcastQueue`](crate::core::queue::BroadcastQueue)
/// operations.
///
/// Two misuse cases are caller contracts rather than runtime-checked
/// variants: issuing more than one concurrent `consume` for the same
/// subscriber id, and racing queue teardown against in-flight calls. Both
/// stay memory-safe here; the outcome is merely an unspecified interleaving.
#[derive(Debug, PartialEq, Eq)]
pub enum QueueError {
    /// Queue created or resized with a capacity of zero.
    InvalidCapacity,
    /// Internal storage reservation failed; the caller may retry.
    AllocationFailure,
    /// The given subscriber id is not registered. Also returned to a blocked
    /// consumer whose registration was removed by a concurrent unsubscribe.
    NotSubscribed,
    /// The queue has been closed; no further operations will succeed.
    QueueClosed,
    /// A timed wait expired before the operation could complete.
    Timeout,
}

impl std::error::Error for QueueError {}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::InvalidCapacity => write!(f, "Capacity must be greater than zero"),
            QueueError::AllocationFailure => write!(f, "Failed to allocate queue storage"),
            QueueError::NotSubscribed => write!(f, "Subscriber is not registered"),
            QueueError::QueueClosed => write!(f, "Queue is closed"),
            QueueError::Timeout => write!(f, "Operation timed out"),
        }
    }
}
