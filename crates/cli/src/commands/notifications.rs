//! Notification commands.

use soundcart_core::NotificationId;
use soundcart_storefront::AppState;
use soundcart_storefront::error::Result;

/// List notifications from the backend.
pub async fn list(app: &AppState, only_unread: bool) -> Result<()> {
    let notifications = app.notifications().refresh(only_unread).await?;

    if notifications.is_empty() {
        tracing::info!("No notifications");
        return Ok(());
    }

    for notification in &notifications {
        let marker = if notification.is_read { ' ' } else { '*' };
        tracing::info!(
            "{} [{}] {} - {}",
            marker,
            notification.timestamp.format("%Y-%m-%d %H:%M"),
            notification.id,
            notification.title,
        );
    }
    tracing::info!(
        "Unread: {}",
        app.notifications().store().unread_count()
    );

    Ok(())
}

/// Acknowledge one notification.
pub async fn mark_read(app: &AppState, id: &str) -> Result<()> {
    let id = NotificationId::new(id);
    app.notifications().mark_as_read(&id).await?;
    tracing::info!("Marked {id} as read");
    Ok(())
}

/// Acknowledge every notification.
pub async fn mark_all_read(app: &AppState) -> Result<()> {
    app.notifications().mark_all_as_read().await?;
    tracing::info!("Marked all notifications as read");
    Ok(())
}
