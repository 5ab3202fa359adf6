//! Notification reconciliation against the mock backend.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use soundcart_core::NotificationId;
use soundcart_integration_tests::{MockBackend, test_config};
use soundcart_storefront::AppState;

fn app_against(backend: &MockBackend) -> AppState {
    AppState::new(test_config(
        &backend.api_base_url(),
        "ws://localhost:9/hubs/notifications",
        None,
        false,
    ))
}

fn seed(backend: &MockBackend) {
    backend.state.seed_notifications(vec![
        json!({
            "id": "n-2",
            "title": "Second",
            "message": "m2",
            "isRead": false,
            "timestamp": "2026-08-01T10:00:00Z",
        }),
        json!({
            "id": "n-1",
            "title": "First",
            "content": "m1",
            "isRead": true,
            "timestamp": "2026-08-01T09:00:00Z",
        }),
    ]);
}

#[tokio::test]
async fn refresh_replaces_the_local_cache() {
    let backend = MockBackend::spawn().await;
    seed(&backend);
    let app = app_against(&backend);

    // Pre-existing local state that the fetch must overwrite.
    app.notifications().store().set_unread_count(42);

    let batch = app.notifications().refresh(false).await.unwrap();
    assert_eq!(batch.len(), 2);

    let store = app.notifications().store();
    assert_eq!(store.len(), 2);
    assert_eq!(store.unread_count(), 1);
    assert_eq!(store.notifications()[0].id, NotificationId::new("n-2"));
    // `content` is accepted as an alias for `message`.
    assert_eq!(store.notifications()[1].message, "m1");
}

#[tokio::test]
async fn refresh_only_unread_requests_the_filtered_view() {
    let backend = MockBackend::spawn().await;
    seed(&backend);
    let app = app_against(&backend);

    let batch = app.notifications().refresh(true).await.unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, NotificationId::new("n-2"));
    assert_eq!(app.notifications().store().len(), 1);
}

#[tokio::test]
async fn mark_as_read_flips_locally_and_acknowledges() {
    let backend = MockBackend::spawn().await;
    seed(&backend);
    let app = app_against(&backend);
    app.notifications().refresh(false).await.unwrap();

    let id = NotificationId::new("n-2");
    app.notifications().mark_as_read(&id).await.unwrap();

    assert_eq!(app.notifications().store().unread_count(), 0);
    assert_eq!(backend.state.read_ids(), vec!["n-2".to_string()]);
}

#[tokio::test]
async fn failed_acknowledgement_keeps_the_optimistic_flip() {
    let backend = MockBackend::spawn().await;
    seed(&backend);
    let app = app_against(&backend);
    app.notifications().refresh(false).await.unwrap();

    backend.state.set_fail_acks(true);
    let id = NotificationId::new("n-2");
    let result = app.notifications().mark_as_read(&id).await;

    // The ack failed, but the local flip stands (no rollback)...
    assert!(result.is_err());
    assert_eq!(app.notifications().store().unread_count(), 0);
    assert!(backend.state.read_ids().is_empty());

    // ...and the divergence heals on the next authoritative fetch.
    backend.state.set_fail_acks(false);
    app.notifications().refresh(false).await.unwrap();
    assert_eq!(app.notifications().store().unread_count(), 1);
}

#[tokio::test]
async fn mark_all_as_read_zeroes_the_badge() {
    let backend = MockBackend::spawn().await;
    seed(&backend);
    let app = app_against(&backend);
    app.notifications().refresh(false).await.unwrap();

    app.notifications().mark_all_as_read().await.unwrap();

    assert_eq!(app.notifications().store().unread_count(), 0);
    assert!(
        app.notifications()
            .store()
            .notifications()
            .iter()
            .all(|n| n.is_read)
    );
    assert_eq!(backend.state.read_all_calls(), 1);
}

#[tokio::test]
async fn refresh_unread_count_pulls_the_server_value() {
    let backend = MockBackend::spawn().await;
    backend.state.set_unread_count(5);
    let app = app_against(&backend);

    let count = app.notifications().refresh_unread_count().await.unwrap();

    assert_eq!(count, 5);
    assert_eq!(app.notifications().store().unread_count(), 5);
}
