//! Auto-expiring user notifications (toasts)
//!
//! A `NotificationCenter` is created once at startup and cloned into every
//! component that reports outcomes. Each enqueued notification owns exactly
//! one removal timer; the timer is aborted when the notification is dismissed
//! or evicted, and a timer that loses the race to a dismiss finds nothing to
//! remove.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a notification stays visible unless dismissed
pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_millis(2000);

/// Unique identifier for a notification within one center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    #[default]
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A message currently shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
}

struct Entry {
    notification: Notification,
    timer: JoinHandle<()>,
}

struct Inner {
    entries: Mutex<VecDeque<Entry>>,
    next_id: AtomicU64,
    display_duration: Duration,
    max_live: Option<usize>,
    live: watch::Sender<Vec<Notification>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, entries: &VecDeque<Entry>) {
        self.live
            .send_replace(entries.iter().map(|e| e.notification.clone()).collect());
    }

    /// Remove `id` if present, returning the entry
    fn remove(&self, id: NotificationId) -> Option<Entry> {
        let mut entries = self.lock();
        let position = entries.iter().position(|e| e.notification.id == id)?;
        let entry = entries.remove(position);
        self.publish(&entries);
        entry
    }

    fn expire(&self, id: NotificationId) {
        if self.remove(id).is_some() {
            tracing::debug!("Notification {} expired", id);
        }
    }
}

/// Handle to the set of live notifications. Clones share the same set.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("display_duration", &self.inner.display_duration)
            .field("max_live", &self.inner.max_live)
            .field("live", &self.inner.lock().len())
            .finish()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    /// Unbounded center with the default display duration
    pub fn new() -> Self {
        Self::with_options(DEFAULT_DISPLAY_DURATION, None)
    }

    /// `max_live` caps the number of live notifications; on overflow the
    /// oldest one is dropped. `None` (or zero) leaves the set unbounded.
    pub fn with_options(display_duration: Duration, max_live: Option<usize>) -> Self {
        let (live, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
                display_duration,
                max_live: max_live.filter(|max| *max > 0),
                live,
            }),
        }
    }

    pub fn display_duration(&self) -> Duration {
        self.inner.display_duration
    }

    /// Show `message` and schedule its removal.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        let id = NotificationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let notification = Notification {
            id,
            message: message.into(),
            severity,
        };
        tracing::debug!("Notification {} ({}): {}", id, severity, notification.message);

        // Hold the lock while spawning so the timer cannot look for the entry
        // before it has been inserted.
        let mut entries = self.inner.lock();
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let duration = self.inner.display_duration;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(id);
            }
        });
        entries.push_back(Entry {
            notification,
            timer,
        });

        if let Some(max) = self.inner.max_live {
            while entries.len() > max {
                if let Some(evicted) = entries.pop_front() {
                    evicted.timer.abort();
                    tracing::debug!("Notification {} evicted", evicted.notification.id);
                }
            }
        }

        self.inner.publish(&entries);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.enqueue(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.enqueue(message, Severity::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.enqueue(message, Severity::Info)
    }

    /// Remove a notification now. Returns false if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        match self.inner.remove(id) {
            Some(entry) => {
                entry.timer.abort();
                tracing::debug!("Notification {} dismissed", id);
                true
            }
            None => false,
        }
    }

    /// Live notifications, oldest first
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .iter()
            .map(|e| e.notification.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removal timers that are still scheduled
    pub fn pending_timers(&self) -> usize {
        self.inner
            .lock()
            .iter()
            .filter(|e| !e.timer.is_finished())
            .count()
    }

    /// Receiver that observes the live list after every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.live.subscribe()
    }
}
