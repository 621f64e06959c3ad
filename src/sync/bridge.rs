use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

pub const BOOKING_CREATED: &str = "booking:created";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCreated {
    pub datetime: DateTime<Utc>,
    pub id: String,
    #[serde(default)]
    pub meta: Value,
}

impl BookingCreated {
    pub fn new(datetime: DateTime<Utc>, id: impl Into<String>, meta: Value) -> Self {
        Self { datetime, id: id.into(), meta }
    }

    pub fn name(&self) -> &'static str {
        BOOKING_CREATED
    }
}

#[derive(Debug, Default)]
struct Subscribers {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<BookingCreated>>,
}

type Shared = Arc<Mutex<Subscribers>>;

fn lock(inner: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process publish/subscribe channel shared by every mounted calendar
/// view. Views that are not subscribed at publish time miss the event and
/// must re-fetch on mount.
#[derive(Debug, Clone, Default)]
pub struct SyncBridge {
    inner: Shared,
}

impl SyncBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut subscribers = lock(&self.inner);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.senders.insert(id, sender);
        tracing::debug!("Sync bridge subscription {} opened", id);

        Subscription {
            id,
            receiver,
            bridge: Arc::downgrade(&self.inner),
        }
    }

    pub fn publish(&self, event: BookingCreated) -> usize {
        let mut subscribers = lock(&self.inner);
        subscribers
            .senders
            .retain(|_, sender| sender.send(event.clone()).is_ok());
        let delivered = subscribers.senders.len();
        tracing::info!("Published {} for appointment {} to {} view(s)", BOOKING_CREATED, event.id, delivered);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).senders.len()
    }
}

#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<BookingCreated>,
    bridge: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    pub fn try_recv(&mut self) -> Option<BookingCreated> {
        self.receiver.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<BookingCreated> {
        self.receiver.recv().await
    }

    pub fn drain(&mut self) -> Vec<BookingCreated> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bridge.upgrade() {
            lock(&inner).senders.remove(&self.id);
            tracing::debug!("Sync bridge subscription {} closed", self.id);
        }
    }
}
