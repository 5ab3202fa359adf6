//! Application state shared across the storefront.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::info;

use crate::api::{ApiClient, ApiError, Order, OrderItemInput};
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::notifications::{NotificationStore, NotificationSync};
use crate::realtime::{ConnectionError, HubClient};

/// Application state wiring the stores, the hub, and the API client.
///
/// One instance per application; cheaply cloneable via `Arc`. Nothing here
/// is a process-wide global - construct as many independent instances as you
/// need (tests do).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    cart: CartStore,
    hub: HubClient,
    notifications: NotificationSync,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let api = ApiClient::new(&config);
        let hub = HubClient::new(&config.realtime);
        let notifications = NotificationSync::new(
            NotificationStore::new(),
            api.clone(),
            hub.clone(),
            &config.realtime,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                cart: CartStore::new(),
                hub,
                notifications,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the shopping cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the hub client.
    #[must_use]
    pub fn hub(&self) -> &HubClient {
        &self.inner.hub
    }

    /// Get a reference to the notification sync engine.
    #[must_use]
    pub fn notifications(&self) -> &NotificationSync {
        &self.inner.notifications
    }

    /// Connect the push channel and start routing its events.
    ///
    /// No-op when realtime is disabled by configuration.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::MissingCredential`] when no auth token is
    /// configured; handshake errors from the initial connect.
    pub async fn start_realtime(&self) -> Result<(), ConnectionError> {
        if !self.inner.config.realtime.enabled {
            info!("realtime disabled by configuration");
            return Ok(());
        }

        let Some(token) = self.inner.config.auth_token.clone() else {
            return Err(ConnectionError::MissingCredential);
        };

        self.inner.notifications.start();
        self.inner.hub.connect(&token).await
    }

    /// Renegotiate the hub channel with a new credential.
    ///
    /// # Errors
    ///
    /// Same as [`Self::start_realtime`].
    pub async fn refresh_credential(
        &self,
        credential: &SecretString,
    ) -> Result<(), ConnectionError> {
        self.inner.hub.disconnect();
        self.inner.notifications.start();
        self.inner.hub.connect(credential).await
    }

    /// Submit the cart as an order.
    ///
    /// The cart is cleared only after the backend confirms the order; on
    /// failure it is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the submission error with the cart intact.
    pub async fn checkout(&self) -> Result<Order, ApiError> {
        let items: Vec<OrderItemInput> = self
            .inner
            .cart
            .lines()
            .iter()
            .map(OrderItemInput::from)
            .collect();

        let order = self.inner.api.create_order(items).await?;
        self.inner.cart.clear();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RealtimeConfig;

    fn test_state(realtime_enabled: bool) -> AppState {
        AppState::new(StorefrontConfig {
            api_base_url: "http://localhost:9/api".to_string(),
            auth_token: None,
            realtime: RealtimeConfig {
                enabled: realtime_enabled,
                ..RealtimeConfig::default()
            },
            sentry_dsn: None,
        })
    }

    #[tokio::test]
    async fn test_start_realtime_disabled_is_noop() {
        let app = test_state(false);
        assert!(app.start_realtime().await.is_ok());
        assert!(!app.hub().is_connected());
    }

    #[tokio::test]
    async fn test_start_realtime_without_token_fails_locally() {
        let app = test_state(true);
        let result = app.start_realtime().await;
        assert!(matches!(result, Err(ConnectionError::MissingCredential)));
        assert!(!app.hub().is_connected());
    }

    #[test]
    fn test_clones_share_state() {
        let app = test_state(false);
        let clone = app.clone();

        app.cart().add_item(&crate::cart::ProductSummary {
            id: soundcart_core::ProductId::new("p-1"),
            name: "LP".to_string(),
            price: rust_decimal::Decimal::ONE,
            image: None,
            merchant_id: None,
        });

        assert_eq!(clone.cart().item_count(), 1);
    }
}
