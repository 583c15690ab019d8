//! services/client/src/notifications.rs
//!
//! The notification sink: a queue of transient messages with per-item expiry.
//!
//! Producers call `add` (or `success` / `error` / `info`) and never wait on the UI.
//! Consumers either poll `items()` or `subscribe()` to a broadcast of queue changes.

use astrometric_core::domain::{Notification, NotificationId, NotificationKind};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DEFAULT_NOTIFICATION_DURATION;

const EVENT_CAPACITY: usize = 64;

/// A change to the queue, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Added(Notification),
    Removed(NotificationId),
}

struct Queued {
    notification: Notification,
    /// Cancelled on dismissal so the pending timer task exits early.
    expiry: CancellationToken,
}

struct Inner {
    items: Mutex<Vec<Queued>>,
    events: broadcast::Sender<NotificationEvent>,
}

/// A cheaply clonable handle to the shared notification queue.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(Vec::new()),
                events,
            }),
        }
    }

    /// Queues a message and schedules its removal after `duration`.
    ///
    /// The returned id can be passed to `remove` to dismiss it early; callers that
    /// don't care may ignore it.
    pub fn add(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
    ) -> NotificationId {
        let notification = Notification {
            id: NotificationId::new(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
        };
        let id = notification.id;
        let expiry = CancellationToken::new();

        self.inner.items.lock().push(Queued {
            notification: notification.clone(),
            expiry: expiry.clone(),
        });
        debug!(%id, %kind, message = %notification.message, "Notification queued");
        // No subscribers is fine.
        let _ = self.inner.events.send(NotificationEvent::Added(notification));

        self.schedule_expiry(id, duration, expiry);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.add(message, NotificationKind::Success, DEFAULT_NOTIFICATION_DURATION)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.add(message, NotificationKind::Error, DEFAULT_NOTIFICATION_DURATION)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.add(message, NotificationKind::Info, DEFAULT_NOTIFICATION_DURATION)
    }

    /// Dismisses an item. Unknown or already expired ids are ignored.
    pub fn remove(&self, id: NotificationId) {
        Self::remove_from(&self.inner, id);
    }

    /// The currently queued items, oldest first.
    pub fn items(&self) -> Vec<Notification> {
        self.inner
            .items
            .lock()
            .iter()
            .map(|q| q.notification.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.events.subscribe()
    }

    fn remove_from(inner: &Inner, id: NotificationId) {
        let removed = {
            let mut items = inner.items.lock();
            items
                .iter()
                .position(|q| q.notification.id == id)
                .map(|index| items.remove(index))
        };
        if let Some(queued) = removed {
            queued.expiry.cancel();
            debug!(%id, "Notification removed");
            let _ = inner.events.send(NotificationEvent::Removed(id));
        }
    }

    fn schedule_expiry(&self, id: NotificationId, duration: Duration, expiry: CancellationToken) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(%id, "No async runtime available; notification will stay until dismissed");
            return;
        };
        // The timer must not keep a dropped center alive.
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::select! {
                _ = expiry.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    if let Some(inner) = inner.upgrade() {
                        Self::remove_from(&inner, id);
                    }
                }
            }
        });
    }
}
