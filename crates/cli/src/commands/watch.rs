//! Live notification tail.

use soundcart_storefront::AppState;
use soundcart_storefront::error::Result;
use tokio::sync::broadcast::error::RecvError;

/// Connect the hub and report notifications until Ctrl+C.
///
/// Performs an initial pull so the unread badge starts from the
/// authoritative count, then tails push deliveries and connection state
/// changes.
pub async fn run(app: &AppState) -> Result<()> {
    match app.notifications().refresh(false).await {
        Ok(batch) => tracing::info!("Loaded {} notifications", batch.len()),
        Err(e) => tracing::warn!("Initial notification fetch failed: {e}"),
    }

    app.start_realtime().await?;
    tracing::info!("Watching for notifications (Ctrl+C to stop)");

    let mut toasts = app.notifications().subscribe();
    let mut state = app.hub().watch_state();

    loop {
        tokio::select! {
            toast = toasts.recv() => match toast {
                Ok(notification) => {
                    tracing::info!(
                        id = %notification.id,
                        unread = app.notifications().store().unread_count(),
                        "{}: {}",
                        notification.title,
                        notification.message,
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Display fell behind; skipped {skipped} notifications");
                }
                Err(RecvError::Closed) => break,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                tracing::info!("Hub connection: {current}");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                app.hub().disconnect();
                break;
            }
        }
    }

    Ok(())
}
