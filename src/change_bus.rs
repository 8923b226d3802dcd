//! Process-wide "collection changed" signal.
//!
//! Listeners are called synchronously, in the order they subscribed, from
//! inside [`ChangeBus::publish`]. A listener that panics is logged and
//! skipped; the remaining listeners still run. Nothing is buffered: a
//! listener subscribed after a publish never sees it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde_json::Value as JsonValue;

pub const VACATION_BALANCES_CHANGED: &str = "vacation_balances_changed";
pub const REQUESTS_CHANGED: &str = "requests_changed";

pub type Listener = Arc<dyn Fn(&str, &JsonValue) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    topic: String,
    listener: Listener,
}

#[derive(Default)]
pub struct ChangeBus {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&str, &JsonValue) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let subscription = Subscription {
            id,
            topic: topic.to_string(),
            listener: Arc::new(listener),
        };
        match self.subscriptions.lock() {
            Ok(mut subs) => subs.push(subscription),
            Err(poisoned) => poisoned.into_inner().push(subscription),
        }
        debug!("Subscribed {:?} to '{}'", id, topic);
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = match self.subscriptions.lock() {
            Ok(subs) => subs,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        match self.subscriptions.lock() {
            Ok(subs) => subs.iter().filter(|s| s.topic == topic).count(),
            Err(poisoned) => poisoned.into_inner().iter().filter(|s| s.topic == topic).count(),
        }
    }

    /// Delivers `payload` to every listener of `topic`; returns how many
    /// returned normally.
    pub fn publish(&self, topic: &str, payload: &JsonValue) -> usize {
        // Snapshot so listeners may subscribe or unsubscribe while being called.
        let listeners: Vec<(SubscriptionId, Listener)> = {
            let subs = match self.subscriptions.lock() {
                Ok(subs) => subs,
                Err(poisoned) => poisoned.into_inner(),
            };
            subs.iter()
                .filter(|s| s.topic == topic)
                .map(|s| (s.id, Arc::clone(&s.listener)))
                .collect()
        };

        let mut delivered = 0;
        for (id, listener) in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(topic, payload)));
            match outcome {
                Ok(()) => delivered += 1,
                Err(_) => warn!("Listener {:?} on '{}' panicked; continuing", id, topic),
            }
        }
        debug!("Published '{}' to {} listeners", topic, delivered);
        delivered
    }
}
