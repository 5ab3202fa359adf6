//! Local notification cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use soundcart_core::NotificationId;
use uuid::Uuid;

/// Maximum number of notifications retained in the cache. Oldest entries
/// beyond the cap are silently dropped.
pub const RETENTION_CAP: usize = 100;

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub link: Option<String>,
    pub user_image: Option<String>,
    /// Server-side notification category (order update, follow, ...).
    pub kind: Option<String>,
}

/// Inbound push payload.
///
/// Every field the server may omit is optional; [`NotificationStore::add`]
/// fills the gaps (random id, current time) when normalizing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotification {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "content")]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default)]
struct NotificationsState {
    items: Vec<Notification>,
    unread_count: usize,
}

/// Local notification cache and unread counter.
///
/// Cheaply cloneable handle; all clones share the same state. The list is
/// kept most-recent-first by insertion order and never exceeds
/// [`RETENTION_CAP`] entries.
#[derive(Clone, Default)]
pub struct NotificationStore {
    inner: Arc<Mutex<NotificationsState>>,
}

impl NotificationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, NotificationsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count_unread(items: &[Notification]) -> usize {
        items.iter().filter(|n| !n.is_read).count()
    }

    /// Normalize a push payload and prepend it to the cache.
    ///
    /// Missing ids get a random UUID (server ids win when present), missing
    /// timestamps get the current time. The list is truncated to
    /// [`RETENTION_CAP`] and the unread count recomputed from the result.
    /// Returns the stored notification.
    pub fn add(&self, push: PushNotification) -> Notification {
        let notification = Notification {
            id: push
                .id
                .map_or_else(|| NotificationId::new(Uuid::new_v4().to_string()), NotificationId::new),
            title: push.title.unwrap_or_default(),
            message: push.message.unwrap_or_default(),
            timestamp: push.timestamp.unwrap_or_else(Utc::now),
            is_read: push.is_read.unwrap_or(false),
            link: push.link,
            user_image: push.user_image,
            kind: push.kind,
        };

        let mut state = self.state();
        state.items.insert(0, notification.clone());
        state.items.truncate(RETENTION_CAP);
        state.unread_count = Self::count_unread(&state.items);

        notification
    }

    /// Replace the whole cache with an authoritative batch (last-fetch-wins).
    ///
    /// The batch is stored in the given order (callers pass
    /// most-recent-first), truncated to the cap, and the unread count is
    /// recomputed.
    pub fn replace_all(&self, notifications: Vec<Notification>) {
        let mut state = self.state();
        state.items = notifications;
        state.items.truncate(RETENTION_CAP);
        state.unread_count = Self::count_unread(&state.items);
    }

    /// Mark one notification read. No-op if absent.
    pub fn mark_as_read(&self, id: &NotificationId) {
        let mut state = self.state();
        if let Some(notification) = state.items.iter_mut().find(|n| n.id == *id) {
            notification.is_read = true;
        }
        state.unread_count = Self::count_unread(&state.items);
    }

    /// Mark every notification read and zero the unread count.
    pub fn mark_all_as_read(&self) {
        let mut state = self.state();
        for notification in &mut state.items {
            notification.is_read = true;
        }
        state.unread_count = 0;
    }

    /// Overwrite the unread counter with a server-reported value.
    ///
    /// The override stands until the next list mutation recomputes the
    /// counter (most-recent-signal-wins).
    pub fn set_unread_count(&self, count: usize) {
        self.state().unread_count = count;
    }

    /// Remove one notification from the cache. No-op if absent.
    ///
    /// This is a pure client-side view filter: the backend is not told, so
    /// the notification may reappear after the next full fetch.
    pub fn remove(&self, id: &NotificationId) {
        let mut state = self.state();
        state.items.retain(|n| n.id != *id);
        state.unread_count = Self::count_unread(&state.items);
    }

    /// Drop every cached notification. Client-side only, like [`Self::remove`].
    pub fn clear(&self) {
        let mut state = self.state();
        state.items.clear();
        state.unread_count = 0;
    }

    /// Snapshot of the cache, most-recent-first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().items.clone()
    }

    /// Current unread count (derived, unless overridden by
    /// [`Self::set_unread_count`]).
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state().unread_count
    }

    /// Number of cached notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().items.is_empty()
    }

    /// Snapshot of unread notifications, most-recent-first.
    #[must_use]
    pub fn unread(&self) -> Vec<Notification> {
        self.state()
            .items
            .iter()
            .filter(|n| !n.is_read)
            .cloned()
            .collect()
    }

    /// Snapshot of notifications with the given kind tag.
    #[must_use]
    pub fn by_kind(&self, kind: &str) -> Vec<Notification> {
        self.state()
            .items
            .iter()
            .filter(|n| n.kind.as_deref() == Some(kind))
            .cloned()
            .collect()
    }
}
