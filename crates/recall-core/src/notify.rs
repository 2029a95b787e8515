//! Notification sink.
//!
//! Producers publish through [`NotificationSink::publish`]; the presentation
//! layer either subscribes to the live feed or takes snapshots of the list and
//! removes entries once they have been shown.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warn => write!(f, "warn"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// A toast waiting to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Append-only notification list with a broadcast feed.
pub struct NotificationSink {
    next_id: AtomicU64,
    entries: Mutex<Vec<Notification>>,
    feed: broadcast::Sender<Notification>,
}

impl NotificationSink {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
            feed,
        }
    }

    /// Record a notification. Every call produces a visible entry.
    pub fn publish(&self, level: Level, message: impl Into<String>) {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            level,
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        match level {
            Level::Error => tracing::warn!(id = notification.id, "{}", notification.message),
            _ => tracing::debug!(id = notification.id, %level, "{}", notification.message),
        }

        self.lock().push(notification.clone());
        // No subscribers is fine: the list still holds the entry.
        let _ = self.feed.send(notification);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Level::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.publish(Level::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Level::Error, message);
    }

    /// Live feed of notifications published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.feed.subscribe()
    }

    /// Current list, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Remove one entry. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// Take every pending entry, leaving the list empty.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        // A poisoned list is still a valid list.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NotificationSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSink")
            .field("pending", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_order_is_insertion_order() {
        let sink = NotificationSink::new();
        sink.info("first");
        sink.error("second");
        sink.warn("third");

        let list = sink.snapshot();
        let ids: Vec<u64> = list.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(list[1].level, Level::Error);
        assert_eq!(list[2].message, "third");
    }

    #[test]
    fn duplicates_are_not_collapsed() {
        let sink = NotificationSink::new();
        sink.error("same");
        sink.error("same");
        assert_eq!(sink.snapshot().len(), 2);
    }

    #[test]
    fn dismiss_and_drain() {
        let sink = NotificationSink::new();
        sink.info("a");
        sink.info("b");
        assert!(sink.dismiss(1));
        assert!(!sink.dismiss(1));
        let rest = sink.drain();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].message, "b");
        assert!(sink.snapshot().is_empty());

        sink.info("c");
        assert_eq!(sink.snapshot()[0].id, 3);
    }

    #[tokio::test]
    async fn subscribers_receive_published_entries() {
        let sink = NotificationSink::new();
        let mut rx = sink.subscribe();
        sink.error("boom");
        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "boom");
        assert_eq!(received.level, Level::Error);
        assert!(received.timestamp > 0);
    }
}
