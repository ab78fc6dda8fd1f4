//! The timed message queue at the heart of the runtime.
//!
//! Pending deliveries are ordered by `(timestamp, insertion sequence)`, so
//! messages with equal timestamps fire in the order they were scheduled.
//! Cancellation is by handle with lazy tombstones, and host-thread input
//! arrives through a single-producer ring buffer that the audio thread
//! drains at block entry.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::debug;

use crate::message::{Message, Symbol};
use crate::object::Target;

const INBOX_CAPACITY: usize = 1024;

/// Handle to a scheduled message, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(u64);

/// A pending delivery.
#[derive(Debug)]
pub struct ScheduledMessage {
    pub target: Target,
    pub message: Message,
    seq: u64,
}

impl ScheduledMessage {
    fn time(&self) -> f64 {
        self.message.timestamp()
    }
}

impl PartialEq for ScheduledMessage {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for ScheduledMessage {}

impl PartialOrd for ScheduledMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time()
            .total_cmp(&other.time())
            .then(self.seq.cmp(&other.seq))
    }
}

/// A message handed in from the host thread, addressed to a receiver name.
#[derive(Debug)]
pub struct ExternalMessage {
    pub receiver: Symbol,
    pub message: Message,
}

/// Host-thread half of the external message queue.
pub struct ExternalSender {
    producer: HeapProd<ExternalMessage>,
}

impl ExternalSender {
    /// Queue a message for the named receiver. Returns `false` when the
    /// inbox is full; the message is then dropped.
    pub fn send(&mut self, receiver: Symbol, message: Message) -> bool {
        self.producer
            .try_push(ExternalMessage { receiver, message })
            .is_ok()
    }
}

/// Priority queue of pending deliveries plus the logical clock.
pub struct Scheduler {
    queue: BinaryHeap<Reverse<ScheduledMessage>>,
    canceled: HashSet<u64>,
    next_seq: u64,
    now_ms: f64,
    inbox: HeapCons<ExternalMessage>,
    sender: Option<HeapProd<ExternalMessage>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (producer, consumer) = HeapRb::<ExternalMessage>::new(INBOX_CAPACITY).split();
        Scheduler {
            queue: BinaryHeap::new(),
            canceled: HashSet::new(),
            next_seq: 0,
            now_ms: 0.0,
            inbox: consumer,
            sender: Some(producer),
        }
    }

    /// Current logical time in milliseconds. Monotonic non-decreasing.
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub(crate) fn set_now(&mut self, now_ms: f64) {
        debug_assert!(now_ms >= self.now_ms, "logical time went backwards");
        self.now_ms = now_ms;
    }

    /// Queue a delivery. The timestamp is taken from the message.
    pub fn schedule(&mut self, target: Target, message: Message) -> MessageHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScheduledMessage {
            target,
            message,
            seq,
        }));
        MessageHandle(seq)
    }

    /// Cancel a previously scheduled message. Unknown or already-delivered
    /// handles are ignored.
    pub fn cancel(&mut self, handle: MessageHandle) {
        self.canceled.insert(handle.0);
    }

    /// Drop every pending delivery addressed to a destroyed object.
    pub fn purge_target(&mut self, graph: usize, object: usize) {
        let doomed: Vec<u64> = self
            .queue
            .iter()
            .filter(|Reverse(entry)| {
                entry.target.graph == graph && entry.target.object == object
            })
            .map(|Reverse(entry)| entry.seq)
            .collect();
        if !doomed.is_empty() {
            debug!(graph, object, count = doomed.len(), "purging scheduled messages");
        }
        self.canceled.extend(doomed);
    }

    /// Timestamp of the next live entry, if any.
    pub fn peek_time(&mut self) -> Option<f64> {
        self.discard_canceled();
        self.queue.peek().map(|Reverse(entry)| entry.time())
    }

    /// Pop the head entry if its timestamp is strictly before `limit`.
    pub fn pop_before(&mut self, limit: f64) -> Option<ScheduledMessage> {
        self.discard_canceled();
        if self.queue.peek().map(|Reverse(e)| e.time())? < limit {
            self.queue.pop().map(|Reverse(entry)| entry)
        } else {
            None
        }
    }

    fn discard_canceled(&mut self) {
        while let Some(Reverse(entry)) = self.queue.peek() {
            if self.canceled.remove(&entry.seq) {
                self.queue.pop();
            } else {
                break;
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len() - self.canceled.len().min(self.queue.len())
    }

    // --- external input ---------------------------------------------------

    /// Detach the producer half for a host thread. Available once.
    pub fn take_sender(&mut self) -> Option<ExternalSender> {
        self.sender.take().map(|producer| ExternalSender { producer })
    }

    /// Push an external message from the owning thread. Fails once the
    /// sender has been detached or the inbox is full.
    pub fn push_external(&mut self, receiver: Symbol, message: Message) -> bool {
        match self.sender.as_mut() {
            Some(producer) => producer
                .try_push(ExternalMessage { receiver, message })
                .is_ok(),
            None => false,
        }
    }

    /// Drain the host inbox; called once per block before the loop runs.
    pub fn drain_external(&mut self) -> Vec<ExternalMessage> {
        let mut drained = Vec::new();
        while let Some(external) = self.inbox.try_pop() {
            drained.push(external);
        }
        drained
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}
