//! Push/pull reconciliation for the notification cache.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use soundcart_core::NotificationId;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::RealtimeConfig;
use crate::realtime::{HubClient, HubEvent};

use super::store::{Notification, NotificationStore, PushNotification};

/// Capacity of the stored-notification fan-out channel (toasts and the like).
const NOTIFY_CHANNEL_CAPACITY: usize = 64;

/// Notification synchronization engine.
///
/// Routes hub events into the store, pulls authoritative snapshots from the
/// backend, and applies read actions optimistically before acknowledging
/// them. Cheaply cloneable.
#[derive(Clone)]
pub struct NotificationSync {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    store: NotificationStore,
    api: ApiClient,
    hub: HubClient,
    notification_event: String,
    count_event: String,
    notify_tx: broadcast::Sender<Notification>,
    router: StdMutex<Option<JoinHandle<()>>>,
}

impl NotificationSync {
    /// Create a new sync engine over the given store, API client, and hub.
    #[must_use]
    pub fn new(
        store: NotificationStore,
        api: ApiClient,
        hub: HubClient,
        config: &RealtimeConfig,
    ) -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFY_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(SyncInner {
                store,
                api,
                hub,
                notification_event: config.notification_event.clone(),
                count_event: config.count_event.clone(),
                notify_tx,
                router: StdMutex::new(None),
            }),
        }
    }

    /// The underlying notification store.
    #[must_use]
    pub fn store(&self) -> &NotificationStore {
        &self.inner.store
    }

    /// Subscribe to notifications as they are stored from push events.
    ///
    /// This is the feed for transient UI surfaces (toasts); the store itself
    /// backs the notification list and badge.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notify_tx.subscribe()
    }

    /// Start routing hub events into the store.
    ///
    /// Idempotent: a second call while the routing task is alive is a no-op.
    /// The task ends when the hub client is dropped; it survives reconnects.
    pub fn start(&self) {
        let mut router = self.router_slot();
        if let Some(handle) = router.as_ref()
            && !handle.is_finished()
        {
            debug!("notification router already running");
            return;
        }

        let mut events = self.inner.hub.subscribe();
        let this = self.clone();
        *router = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => this.route(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "notification router lagged behind hub events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("notification router stopped");
        }));
    }

    /// Apply one hub event to the store.
    ///
    /// Malformed payloads are logged and dropped; the cache is never left
    /// partially updated.
    fn route(&self, event: HubEvent) {
        if event.name == self.inner.notification_event {
            match serde_json::from_value::<PushNotification>(event.payload) {
                Ok(push) => {
                    let stored = self.inner.store.add(push);
                    if self.inner.notify_tx.send(stored).is_err() {
                        debug!("no toast subscribers for stored notification");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "dropping malformed notification payload");
                }
            }
        } else if event.name == self.inner.count_event {
            match serde_json::from_value::<usize>(event.payload) {
                Ok(count) => self.inner.store.set_unread_count(count),
                Err(e) => {
                    warn!(error = %e, "dropping malformed unread-count payload");
                }
            }
        } else {
            debug!(event = %event.name, "ignoring unhandled hub event");
        }
    }

    /// Pull the authoritative notification list and replace the cache
    /// (last-fetch-wins).
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the cache is left untouched.
    pub async fn refresh(&self, only_unread: bool) -> Result<Vec<Notification>, ApiError> {
        let batch = self.inner.api.fetch_notifications(only_unread).await?;
        let notifications: Vec<Notification> =
            batch.into_iter().map(Notification::from).collect();
        self.inner.store.replace_all(notifications.clone());
        Ok(notifications)
    }

    /// Pull the authoritative unread count into the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the counter is left untouched.
    pub async fn refresh_unread_count(&self) -> Result<usize, ApiError> {
        let count = self.inner.api.fetch_unread_count().await?;
        self.inner.store.set_unread_count(count);
        Ok(count)
    }

    /// Mark one notification read: optimistic local flip, then backend
    /// acknowledgement.
    ///
    /// The local flip (and unread recount) happens regardless of the
    /// acknowledgement outcome; an ack failure is returned to the caller but
    /// not rolled back, and heals on the next [`Self::refresh`].
    ///
    /// # Errors
    ///
    /// Returns the acknowledgement error, with local state already updated.
    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        self.inner.store.mark_as_read(id);

        if let Err(e) = self.inner.api.mark_notification_read(id).await {
            warn!(id = %id, error = %e, "read acknowledgement failed; keeping local state until next refresh");
            return Err(e);
        }
        Ok(())
    }

    /// Mark every notification read, optimistically, then acknowledge.
    ///
    /// # Errors
    ///
    /// Returns the acknowledgement error, with local state already updated.
    pub async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        self.inner.store.mark_all_as_read();

        if let Err(e) = self.inner.api.mark_all_notifications_read().await {
            warn!(error = %e, "read-all acknowledgement failed; keeping local state until next refresh");
            return Err(e);
        }
        Ok(())
    }

    fn router_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .router
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;
    use serde_json::json;

    fn test_sync() -> NotificationSync {
        let realtime = RealtimeConfig::default();
        let config = StorefrontConfig {
            api_base_url: "http://localhost:9/api".to_string(),
            auth_token: None,
            realtime: realtime.clone(),
            sentry_dsn: None,
        };

        NotificationSync::new(
            NotificationStore::new(),
            ApiClient::new(&config),
            HubClient::new(&realtime),
            &realtime,
        )
    }

    fn event(name: &str, payload: serde_json::Value) -> HubEvent {
        HubEvent {
            name: name.to_string(),
            payload,
        }
    }

    #[test]
    fn test_route_stores_notification_and_fans_out() {
        let sync = test_sync();
        let mut toasts = sync.subscribe();

        sync.route(event(
            "ReceiveNotification",
            json!({"id": "n-1", "title": "Order shipped"}),
        ));

        assert_eq!(sync.store().len(), 1);
        assert_eq!(sync.store().unread_count(), 1);

        let toast = toasts.try_recv().expect("toast delivered");
        assert_eq!(toast.title, "Order shipped");
    }

    #[test]
    fn test_route_drops_malformed_notification_payload() {
        let sync = test_sync();

        // An array is not a notification object; the cache must be untouched.
        sync.route(event("ReceiveNotification", json!([1, 2, 3])));

        assert!(sync.store().is_empty());
        assert_eq!(sync.store().unread_count(), 0);
    }

    #[test]
    fn test_route_applies_count_update() {
        let sync = test_sync();

        sync.route(event("NotificationCountUpdated", json!(12)));

        assert_eq!(sync.store().unread_count(), 12);
    }

    #[test]
    fn test_route_drops_malformed_count_payload() {
        let sync = test_sync();
        sync.store().set_unread_count(3);

        sync.route(event("NotificationCountUpdated", json!("not a number")));

        assert_eq!(sync.store().unread_count(), 3);
    }

    #[test]
    fn test_route_ignores_unknown_events() {
        let sync = test_sync();

        sync.route(event("SomethingElse", json!({"id": "n-1"})));

        assert!(sync.store().is_empty());
    }
}
