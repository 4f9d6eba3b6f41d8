//! fanmq queue module.
//!
//! One shared FIFO store, fanned out to every registered subscriber. All
//! state lives behind a single monitor lock with two wait conditions:
//! `space_available` for publishers blocked on a full store and
//! `data_available` for subscribers blocked on an empty backlog.

use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::core::error::QueueError;
use crate::core::message::Message;
use crate::core::subscriber::{SubscriberId, SubscriberState};

/// Outcome of a successful [`BroadcastQueue::publish`].
///
/// Publishing with an empty subscriber set is not an error: the message is
/// dropped, and the caller is told so it can decide whether to retain the
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Message stored; it will be delivered to this many subscribers.
    Delivered { subscribers: usize },
    /// No subscriber was registered; the message was dropped, not stored.
    NoSubscribers,
}

/// One live message in the store.
///
/// `seq` is the message's FIFO position, strictly increasing and never
/// reused, so subscriber cursors (which are sequence numbers) stay valid
/// across removals. `pending` counts subscribers that were entitled to this
/// message at publish time and have not yet consumed it or unsubscribed;
/// the slot is spliced out exactly when it reaches zero.
#[derive(Debug)]
struct Slot {
    seq: u64,
    pending: usize,
    msg: Arc<Message>,
}

#[derive(Debug)]
struct Shared {
    slots: VecDeque<Slot>,
    subscribers: HashMap<SubscriberId, SubscriberState>,
    capacity: usize,
    next_seq: u64,
    closed: bool,
}

impl Shared {
    /// Sequence number of the most recently published message, or the
    /// sentinel 0 before anything was published. A subscriber whose cursor
    /// equals this value has nothing left to read.
    fn tail_seq(&self) -> u64 {
        self.next_seq - 1
    }

    fn first_unread(&self, cursor: u64) -> usize {
        self.slots.partition_point(|s| s.seq <= cursor)
    }
}

/// A bounded broadcast queue.
///
/// Every public operation acquires the monitor lock for its full critical
/// section; blocking operations release it while parked on a condition and
/// reacquire it on wake. Callers must not issue concurrent `consume` calls
/// for the same subscriber id; the two calls would race on one cursor.
#[derive(Debug)]
pub struct BroadcastQueue {
    shared: Mutex<Shared>,
    space_available: Condvar,
    data_available: Condvar,
}

impl BroadcastQueue {
    /// Creates an empty queue holding at most `capacity` live messages.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity);
        }
        let mut slots = VecDeque::new();
        slots
            .try_reserve(capacity)
            .map_err(|_| QueueError::AllocationFailure)?;
        Ok(Self {
            shared: Mutex::new(Shared {
                slots,
                subscribers: HashMap::new(),
                capacity,
                next_seq: 1,
                closed: false,
            }),
            space_available: Condvar::new(),
            data_available: Condvar::new(),
        })
    }

    /// Creates a queue sized from a [`Config`].
    pub fn from_config(cfg: &Config) -> Result<Self, QueueError> {
        Self::new(cfg.queue.capacity)
    }

    /// Registers `id`. Idempotent: re-subscribing an existing id is a no-op
    /// and does not move its cursor.
    ///
    /// The cursor starts at the current tail, so the subscriber only sees
    /// messages published after it joined.
    pub fn subscribe(&self, id: SubscriberId) -> Result<(), QueueError> {
        let mut shared = self.shared.lock();
        if shared.closed {
            return Err(QueueError::QueueClosed);
        }
        let tail = shared.tail_seq();
        shared.subscribers.entry(id).or_insert_with(|| {
            SubscriberState::new(tail)
        });
        Ok(())
    }

    /// Removes `id`, virtually consuming its entire unread backlog: every
    /// message past its cursor has its pending count decremented, and
    /// fully-drained messages are garbage-collected (freeing capacity for
    /// blocked publishers). No-op if `id` is not registered.
    ///
    /// Always broadcast-wakes `data_available` so a consumer parked under
    /// this very id observes its own removal and fails with
    /// [`QueueError::NotSubscribed`] instead of sleeping forever.
    pub fn unsubscribe(&self, id: &SubscriberId) {
        let mut shared = self.shared.lock();
        let state = match shared.subscribers.remove(id) {
            Some(state) => state,
            None => return,
        };
        let mut idx = shared.first_unread(state.cursor);
        let mut collected = 0usize;
        while idx < shared.slots.len() {
            shared.slots[idx].pending -= 1;
            if shared.slots[idx].pending == 0 {
                let _ = shared.slots.remove(idx);
                collected += 1;
                self.space_available.notify_one();
            } else {
                idx += 1;
            }
        }
        debug!(
            target: "fanmq::queue",
            subscriber_id = %id,
            collected,
            "unsubscribed"
        );
        self.data_available.notify_all();
    }

    /// Appends a message to the tail and entitles every currently registered
    /// subscriber to one delivery of it. Blocks while the store is full.
    pub fn publish(&self, msg: Message) -> Result<PublishOutcome, QueueError> {
        self.publish_inner(msg, None)
    }

    /// Like [`publish`](Self::publish), but gives up with
    /// [`QueueError::Timeout`] if no capacity frees up within `timeout`.
    pub fn publish_timeout(
        &self,
        msg: Message,
        timeout: Duration,
    ) -> Result<PublishOutcome, QueueError> {
        self.publish_inner(msg, Some(Instant::now() + timeout))
    }

    fn publish_inner(
        &self,
        msg: Message,
        deadline: Option<Instant>,
    ) -> Result<PublishOutcome, QueueError> {
        let msg = Arc::new(msg);
        let mut shared = self.shared.lock();
        let mut timed_out = false;
        loop {
            if shared.closed {
                return Err(QueueError::QueueClosed);
            }
            if shared.subscribers.is_empty() {
                debug!(target: "fanmq::queue", id = msg.id, "no subscribers; dropping message");
                return Ok(PublishOutcome::NoSubscribers);
            }
            if shared.slots.len() < shared.capacity {
                let seq = shared.next_seq;
                shared.next_seq += 1;
                let fanout = shared.subscribers.len();
                shared.slots.push_back(Slot {
                    seq,
                    pending: fanout,
                    msg: Arc::clone(&msg),
                });
                trace!(target: "fanmq::queue", id = msg.id, seq, fanout, "published");
                self.data_available.notify_all();
                return Ok(PublishOutcome::Delivered { subscribers: fanout });
            }
            if timed_out {
                return Err(QueueError::Timeout);
            }
            match deadline {
                Some(at) => {
                    timed_out = self.space_available.wait_until(&mut shared, at).timed_out();
                }
                None => self.space_available.wait(&mut shared),
            }
        }
    }

    /// Takes the next unread message for `id`, blocking while none exists.
    ///
    /// Fails immediately with [`QueueError::NotSubscribed`] for an unknown
    /// id. A parked call is released by a publish, by `close`, or by a
    /// concurrent unsubscribe of this id (failing `NotSubscribed`).
    pub fn consume(&self, id: &SubscriberId) -> Result<Arc<Message>, QueueError> {
        self.consume_inner(id, None)
    }

    /// Like [`consume`](Self::consume), but gives up with
    /// [`QueueError::Timeout`] if nothing arrives within `timeout`.
    pub fn consume_timeout(
        &self,
        id: &SubscriberId,
        timeout: Duration,
    ) -> Result<Arc<Message>, QueueError> {
        self.consume_inner(id, Some(Instant::now() + timeout))
    }

    /// Non-blocking probe: the next unread message for `id`, or `Ok(None)`
    /// when the backlog is empty.
    pub fn try_consume(&self, id: &SubscriberId) -> Result<Option<Arc<Message>>, QueueError> {
        let mut shared = self.shared.lock();
        if shared.closed {
            return Err(QueueError::QueueClosed);
        }
        let cursor = match shared.subscribers.get(id) {
            Some(state) => state.cursor,
            None => return Err(QueueError::NotSubscribed),
        };
        let idx = shared.first_unread(cursor);
        if idx >= shared.slots.len() {
            return Ok(None);
        }
        Ok(Some(self.deliver_locked(&mut shared, id, idx)))
    }

    fn consume_inner(
        &self,
        id: &SubscriberId,
        deadline: Option<Instant>,
    ) -> Result<Arc<Message>, QueueError> {
        let mut shared = self.shared.lock();
        let mut timed_out = false;
        loop {
            if shared.closed {
                return Err(QueueError::QueueClosed);
            }
            // Re-fetched every wake: a concurrent unsubscribe may have
            // removed this registration while we were parked.
            let cursor = match shared.subscribers.get(id) {
                Some(state) => state.cursor,
                None => return Err(QueueError::NotSubscribed),
            };
            let idx = shared.first_unread(cursor);
            if idx < shared.slots.len() {
                return Ok(self.deliver_locked(&mut shared, id, idx));
            }
            if timed_out {
                return Err(QueueError::Timeout);
            }
            match deadline {
                Some(at) => {
                    timed_out = self.data_available.wait_until(&mut shared, at).timed_out();
                }
                None => self.data_available.wait(&mut shared),
            }
        }
    }

    /// Delivers `slots[idx]` to `id`: advances the cursor and decrements the
    /// pending count in one critical section, splicing the slot out if this
    /// was the last entitled subscriber.
    fn deliver_locked(&self, shared: &mut Shared, id: &SubscriberId, idx: usize) -> Arc<Message> {
        let slot = &mut shared.slots[idx];
        slot.pending -= 1;
        let seq = slot.seq;
        let drained = slot.pending == 0;
        let msg = Arc::clone(&slot.msg);
        if let Some(state) = shared.subscribers.get_mut(id) {
            state.cursor = seq;
        }
        if drained {
            self.remove_locked(shared, seq);
        }
        msg
    }

    /// Number of unread messages for `id`; 0 when not subscribed.
    /// Non-blocking, O(log live messages).
    pub fn available(&self, id: &SubscriberId) -> usize {
        let shared = self.shared.lock();
        match shared.subscribers.get(id) {
            Some(state) => shared.slots.len() - shared.first_unread(state.cursor),
            None => 0,
        }
    }

    /// Force-removes the message with the given id regardless of who has
    /// read it, freeing its capacity slot. Returns `false` when it is not
    /// (or no longer) in the store.
    ///
    /// Subscribers that had not read it simply skip it; sequence-numbered
    /// cursors stay valid without repair.
    pub fn remove(&self, message_id: u64) -> bool {
        let mut shared = self.shared.lock();
        if shared.closed {
            return false;
        }
        let seq = match shared.slots.iter().find(|s| s.msg.id == message_id) {
            Some(slot) => slot.seq,
            None => return false,
        };
        self.remove_locked(&mut shared, seq)
    }

    /// Splices the slot with sequence `seq` out of the store and signals one
    /// blocked publisher. Takes the locked state by `&mut`, so it cannot be
    /// called without holding the monitor lock.
    fn remove_locked(&self, shared: &mut Shared, seq: u64) -> bool {
        let idx = match shared.slots.binary_search_by(|s| s.seq.cmp(&seq)) {
            Ok(idx) => idx,
            Err(_) => return false,
        };
        let _ = shared.slots.remove(idx);
        self.space_available.notify_one();
        true
    }

    /// Changes the capacity limit. Raising it wakes blocked publishers.
    ///
    /// Lowering it below the current occupancy evicts the oldest messages
    /// unconditionally, even ones subscribers have not read yet; the
    /// eviction count is returned so callers can account for the data loss.
    pub fn set_capacity(&self, capacity: usize) -> Result<usize, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity);
        }
        let mut shared = self.shared.lock();
        if shared.closed {
            return Err(QueueError::QueueClosed);
        }
        let mut evicted = 0usize;
        while shared.slots.len() > capacity {
            if let Some(slot) = shared.slots.pop_front() {
                warn!(
                    target: "fanmq::queue",
                    id = slot.msg.id,
                    pending = slot.pending,
                    "evicting unread message on capacity shrink"
                );
                evicted += 1;
            }
        }
        shared.capacity = capacity;
        self.space_available.notify_all();
        Ok(evicted)
    }

    /// Shuts the queue down: drops every live message and registration and
    /// wakes all parked publishers and consumers, which fail with
    /// [`QueueError::QueueClosed`], as does every later call. Idempotent.
    pub fn close(&self) {
        let mut shared = self.shared.lock();
        if shared.closed {
            return;
        }
        shared.closed = true;
        let dropped = shared.slots.len();
        shared.slots.clear();
        shared.subscribers.clear();
        debug!(target: "fanmq::queue", dropped, "queue closed");
        self.space_available.notify_all();
        self.data_available.notify_all();
    }

    /// Current number of live messages.
    pub fn len(&self) -> usize {
        self.shared.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().slots.is_empty()
    }

    /// Current capacity limit.
    pub fn capacity(&self) -> usize {
        self.shared.lock().capacity
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::new_message;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            BroadcastQueue::new(0).err(),
            Some(QueueError::InvalidCapacity)
        );
    }

    #[test]
    fn publish_without_subscribers_drops() {
        let q = BroadcastQueue::new(4).unwrap();
        let outcome = q.publish(new_message("m")).unwrap();
        assert_eq!(outcome, PublishOutcome::NoSubscribers);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn resubscribe_keeps_cursor() {
        let q = BroadcastQueue::new(4).unwrap();
        let id = SubscriberId::from("s");
        q.subscribe(id.clone()).unwrap();
        q.publish(new_message("a")).unwrap();
        // second subscribe must not reset the cursor to the new tail
        q.subscribe(id.clone()).unwrap();
        assert_eq!(q.available(&id), 1);
    }

    #[test]
    fn late_subscriber_sees_nothing_old() {
        let q = BroadcastQueue::new(4).unwrap();
        let early = SubscriberId::from("early");
        q.subscribe(early.clone()).unwrap();
        q.publish(new_message("a")).unwrap();
        let late = SubscriberId::from("late");
        q.subscribe(late.clone()).unwrap();
        assert_eq!(q.available(&early), 1);
        assert_eq!(q.available(&late), 0);
    }

    #[test]
    fn remove_unknown_message_is_noop() {
        let q = BroadcastQueue::new(4).unwrap();
        assert!(!q.remove(12345));
    }

    #[test]
    fn try_consume_reports_empty_backlog() {
        let q = BroadcastQueue::new(4).unwrap();
        let id = SubscriberId::from("s");
        q.subscribe(id.clone()).unwrap();
        assert!(q.try_consume(&id).unwrap().is_none());
    }

    #[test]
    fn available_for_unknown_id_is_zero() {
        let q = BroadcastQueue::new(4).unwrap();
        assert_eq!(q.available(&SubscriberId::from("ghost")), 0);
    }
}
