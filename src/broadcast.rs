//! Reading fan-out to subscribers.
//!
//! Every subscriber owns a bounded queue. Publishing never blocks: when a
//! subscriber's queue is full the message is dropped for that subscriber
//! only and counted, so a slow viewer cannot stall device I/O. Dropping a
//! [`Subscription`] unsubscribes; its slot is pruned on the next publish.
//!
//! ```text
//!                     ┌──────────────┐
//!                 ┌──▶│ queue (16)   │──▶ Subscription (websocket)
//!  ControlService │   └──────────────┘
//!  ──emit──▶ Broadcaster
//!                 │   ┌──────────────┐
//!                 └──▶│ queue (16)   │──▶ Subscription (log)
//!                     └──────────────┘
//! ```

use core::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use crate::app::events::BroadcastMessage;
use crate::app::ports::EventSink;

/// Messages buffered per subscriber.
pub const SUBSCRIBER_DEPTH: usize = 16;

type Queue = Channel<CriticalSectionRawMutex, BroadcastMessage, SUBSCRIBER_DEPTH>;

struct Shared {
    id: u64,
    queue: Queue,
    dropped: AtomicU64,
}

/// Fan-out hub. Share it behind an `Arc`.
pub struct Broadcaster {
    subscribers: Mutex<CriticalSectionRawMutex, RefCell<Vec<Arc<Shared>>>>,
    next_id: AtomicU64,
}

/// Receiving end of one subscription.
pub struct Subscription {
    shared: Arc<Shared>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(RefCell::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new subscriber. Messages published before this call are
    /// not delivered to it.
    pub fn subscribe(&self) -> Subscription {
        let shared = Arc::new(Shared {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            queue: Channel::new(),
            dropped: AtomicU64::new(0),
        });
        self.subscribers
            .lock(|subs| subs.borrow_mut().push(Arc::clone(&shared)));
        debug!("subscriber {} connected", shared.id);
        Subscription { shared }
    }

    /// Deliver `msg` to every live subscriber without blocking.
    /// Returns how many subscribers accepted it.
    pub fn publish(&self, msg: &BroadcastMessage) -> usize {
        self.subscribers.lock(|subs| {
            let mut subs = subs.borrow_mut();
            subs.retain(|s| {
                let live = Arc::strong_count(s) > 1;
                if !live {
                    debug!("subscriber {} disconnected", s.id);
                }
                live
            });
            let mut delivered = 0;
            for s in subs.iter() {
                if s.queue.try_send(msg.clone()).is_ok() {
                    delivered += 1;
                } else {
                    let n = s.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!("subscriber {} queue full, message dropped ({} total)", s.id, n);
                }
            }
            delivered
        })
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock(|subs| {
            subs.borrow()
                .iter()
                .filter(|s| Arc::strong_count(s) > 1)
                .count()
        })
    }
}

impl EventSink for Arc<Broadcaster> {
    fn emit(&mut self, msg: &BroadcastMessage) {
        self.publish(msg);
    }
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Next message if one is queued.
    pub fn try_recv(&self) -> Option<BroadcastMessage> {
        self.shared.queue.try_receive().ok()
    }

    /// Block the calling thread until a message arrives.
    pub fn recv(&self) -> BroadcastMessage {
        futures_lite::future::block_on(self.shared.queue.receive())
    }

    /// Messages dropped for this subscriber because its queue was full.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}
