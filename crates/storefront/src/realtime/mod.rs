//! Live hub channel with automatic reconnection.
//!
//! [`HubClient`] owns at most one WebSocket channel to the notification hub.
//! `connect` is idempotent and single-flight; once established, a background
//! task pumps inbound frames into a broadcast channel and reconnects on
//! transport loss with exponential backoff (immediately, then 2s doubling up
//! to 30s) until [`HubClient::disconnect`] is called.
//!
//! Consumers observe the channel through [`HubClient::subscribe`] (events)
//! and [`HubClient::watch_state`] (connection state); they never touch the
//! socket itself.

mod protocol;
mod retry;

pub use protocol::HubEvent;
pub use retry::RetryPolicy;

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast, watch};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RealtimeConfig;

use protocol::HubFrame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the event fan-out channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// After this many consecutive failed reconnect attempts the client logs a
/// prolonged-outage warning (retries continue regardless).
const FAILURE_NOTICE_ATTEMPTS: u32 = 5;

/// Connection lifecycle states for the hub channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed(String),
}

impl ConnectionState {
    /// Whether the channel is currently established.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Reconnecting => f.write_str("reconnecting"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Errors establishing the hub channel.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No credential was supplied; no handshake is attempted. Not retried
    /// until a new `connect` call provides a credential.
    #[error("no credential available for hub connection")]
    MissingCredential,

    /// The WebSocket handshake failed.
    #[error("hub handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Client for the notification hub channel.
///
/// Cheaply cloneable; all clones share the single underlying channel.
#[derive(Clone)]
pub struct HubClient {
    inner: Arc<HubClientInner>,
}

struct HubClientInner {
    hub_url: String,
    retry: RetryPolicy,
    state_tx: watch::Sender<ConnectionState>,
    last_error: StdMutex<Option<String>>,
    event_tx: broadcast::Sender<HubEvent>,
    // Serializes connection attempts: a concurrent `connect` awaits the
    // in-flight one instead of opening a second channel.
    connect_gate: Mutex<()>,
    shutdown: StdMutex<Option<CancellationToken>>,
}

impl HubClient {
    /// Create a new hub client. No connection is opened until
    /// [`Self::connect`] is called.
    #[must_use]
    pub fn new(config: &RealtimeConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(HubClientInner {
                hub_url: config.hub_url.clone(),
                retry: RetryPolicy::default(),
                state_tx,
                last_error: StdMutex::new(None),
                event_tx,
                connect_gate: Mutex::new(()),
                shutdown: StdMutex::new(None),
            }),
        }
    }

    /// Current connection state snapshot.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Whether the channel is currently established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Watch connection state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Most recent connection error, if any.
    #[must_use]
    pub fn last_connection_error(&self) -> Option<String> {
        self.last_error_slot().clone()
    }

    /// Subscribe to hub events.
    ///
    /// Every subscriber receives every event; dropping the receiver
    /// unsubscribes. Consumers filter on [`HubEvent::name`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Open the hub channel.
    ///
    /// Idempotent: if the channel is already established, or an attempt is
    /// in flight (including the reconnect loop), this returns without
    /// opening a second one. An empty credential fails immediately with no
    /// handshake attempted.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::MissingCredential`] for an empty credential;
    /// [`ConnectionError::Handshake`] if the initial handshake fails (later
    /// drops are retried internally instead of surfacing here).
    pub async fn connect(&self, credential: &SecretString) -> Result<(), ConnectionError> {
        if credential.expose_secret().is_empty() {
            self.set_last_error(Some("credential missing".to_string()));
            warn!("hub connect rejected: no credential");
            return Err(ConnectionError::MissingCredential);
        }

        let _gate = self.inner.connect_gate.lock().await;
        match self.state() {
            ConnectionState::Connected
            | ConnectionState::Connecting
            | ConnectionState::Reconnecting => {
                debug!("hub connect skipped: channel already live or in flight");
                return Ok(());
            }
            ConnectionState::Disconnected | ConnectionState::Failed(_) => {}
        }

        self.inner.state_tx.send_replace(ConnectionState::Connecting);
        let channel = match self.open_channel(credential).await {
            Ok(channel) => channel,
            Err(e) => {
                let reason = e.to_string();
                self.set_last_error(Some(reason.clone()));
                self.inner
                    .state_tx
                    .send_replace(ConnectionState::Failed(reason));
                return Err(e);
            }
        };

        self.set_last_error(None);
        self.inner.state_tx.send_replace(ConnectionState::Connected);

        let token = CancellationToken::new();
        if let Some(old) = self.shutdown_slot().replace(token.clone()) {
            old.cancel();
        }

        let client = self.clone();
        let credential = credential.clone();
        tokio::spawn(async move {
            client.run(channel, credential, token).await;
        });

        Ok(())
    }

    /// Tear down the channel and stop the reconnect loop.
    ///
    /// Safe to call when already disconnected.
    pub fn disconnect(&self) {
        if let Some(token) = self.shutdown_slot().take() {
            token.cancel();
            info!("hub disconnect requested");
        }
        self.inner
            .state_tx
            .send_replace(ConnectionState::Disconnected);
    }

    /// Supervision loop: pump the live channel, reconnect on loss.
    async fn run(&self, first: WsStream, credential: SecretString, shutdown: CancellationToken) {
        let mut channel = Some(first);
        let mut attempt: u32 = 0;

        loop {
            if let Some(ws) = channel.take() {
                tokio::select! {
                    () = self.pump(ws) => {
                        self.inner
                            .state_tx
                            .send_replace(ConnectionState::Reconnecting);
                        attempt = 0;
                    }
                    () = shutdown.cancelled() => break,
                }
            }

            let delay = self.inner.retry.delay_for(attempt);
            debug!(attempt, ?delay, "waiting before hub reconnect");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = shutdown.cancelled() => break,
            }

            let result = tokio::select! {
                result = self.open_channel(&credential) => result,
                () = shutdown.cancelled() => break,
            };

            match result {
                Ok(_) if shutdown.is_cancelled() => break,
                Ok(ws) => {
                    attempt = 0;
                    self.set_last_error(None);
                    self.inner.state_tx.send_replace(ConnectionState::Connected);
                    info!("hub channel reestablished");
                    channel = Some(ws);
                }
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    self.set_last_error(Some(e.to_string()));
                    if attempt == FAILURE_NOTICE_ATTEMPTS {
                        warn!(attempt, error = %e, "hub still unreachable after repeated attempts");
                    } else {
                        debug!(attempt, error = %e, "hub reconnect attempt failed");
                    }
                }
            }
        }

        debug!("hub loop stopped");
    }

    /// Read frames from a live channel until it closes or errors.
    ///
    /// Each frame is decoded and fanned out atomically; malformed frames are
    /// logged and dropped without touching any state.
    async fn pump(&self, channel: WsStream) {
        let (mut write, mut read) = channel.split();

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<HubFrame>(&text) {
                    Ok(frame) => {
                        let event = HubEvent::from(frame);
                        debug!(event = %event.name, "hub event received");
                        if self.inner.event_tx.send(event).is_err() {
                            debug!("no subscribers for hub event");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "dropping malformed hub frame");
                    }
                },
                Ok(Message::Ping(data)) => {
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        warn!(error = %e, "failed to answer hub ping");
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("hub closed the connection");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "hub transport error");
                    self.set_last_error(Some(e.to_string()));
                    break;
                }
                _ => {}
            }
        }
    }

    /// Perform the WebSocket handshake.
    async fn open_channel(&self, credential: &SecretString) -> Result<WsStream, ConnectionError> {
        let url = format!(
            "{}?access_token={}",
            self.inner.hub_url,
            credential.expose_secret()
        );
        debug!(hub = %self.inner.hub_url, "opening hub channel");

        let (channel, _response) = connect_async(&url).await?;
        info!(hub = %self.inner.hub_url, "hub channel established");
        Ok(channel)
    }

    fn last_error_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_last_error(&self, error: Option<String>) {
        *self.last_error_slot() = error;
    }

    fn shutdown_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.inner
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HubClient {
        HubClient::new(&RealtimeConfig {
            enabled: true,
            hub_url: "ws://localhost:9".to_string(),
            notification_event: "ReceiveNotification".to_string(),
            count_event: "NotificationCountUpdated".to_string(),
        })
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let client = test_client();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
        assert!(client.last_connection_error().is_none());
    }

    #[tokio::test]
    async fn test_connect_without_credential_attempts_no_handshake() {
        let client = test_client();

        let result = client.connect(&SecretString::from(String::new())).await;

        assert!(matches!(result, Err(ConnectionError::MissingCredential)));
        // No attempt was made: state never left Disconnected.
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(
            client.last_connection_error().as_deref(),
            Some("credential missing")
        );
    }

    #[test]
    fn test_disconnect_when_never_connected_is_noop() {
        let client = test_client();
        client.disconnect();
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionState::Reconnecting.to_string(), "reconnecting");
        assert_eq!(
            ConnectionState::Failed("timed out".to_string()).to_string(),
            "failed: timed out"
        );
    }

    #[test]
    fn test_only_connected_counts_as_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Reconnecting.is_connected());
        assert!(!ConnectionState::Failed(String::new()).is_connected());
    }
}
