//! Soundcart backend REST client.
//!
//! Thin typed wrapper over the backend HTTP API: notification fetch and
//! acknowledgement, order submission, and the product/category/store
//! pass-through used by the merchant and admin screens. Read-mostly catalog
//! listings are cached with `moka` (5-minute TTL) and invalidated by the
//! corresponding mutations; notifications and orders are never cached.

mod cache;
pub mod types;

pub use types::{
    Category, CreateOrderRequest, NewCategory, NewProduct, NotificationDto, Order, OrderItemInput,
    Product, StoreMenu,
};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use soundcart_core::{CategoryId, MerchantId, NotificationId, ProductId, StoreId};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::StorefrontConfig;

use cache::CacheValue;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (transport-level).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Backend returned an unexpected status code.
    #[error("Backend returned status {0}")]
    Status(u16),
}

/// Client for the Soundcart backend REST API.
///
/// Cheaply cloneable; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<SecretString>,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.trim_end_matches('/').to_string(),
                auth_token: config.auth_token.clone(),
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path)
    }

    /// Build a request with the bearer credential applied when present.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.inner.client.request(method, self.endpoint(path));
        match &self.inner.auth_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Map non-success statuses to the error taxonomy.
    async fn check_status(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(context.to_string()));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                context,
                body = %body.chars().take(500).collect::<String>(),
                "backend returned non-success status"
            );
            return Err(ApiError::Status(status.as_u16()));
        }

        Ok(response)
    }

    /// Check status, then parse the body as JSON.
    ///
    /// The body is read as text first so parse failures can be logged with
    /// the offending payload.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, ApiError> {
        let response = Self::check_status(response, context).await?;
        let text = response.text().await?;

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    context,
                    body = %text.chars().take(500).collect::<String>(),
                    "failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Notification Methods (not cached - mutable state)
    // =========================================================================

    /// Fetch the user's notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn fetch_notifications(
        &self,
        only_unread: bool,
    ) -> Result<Vec<NotificationDto>, ApiError> {
        let response = self
            .request(
                Method::GET,
                &format!("notifications?onlyUnread={only_unread}"),
            )
            .send()
            .await?;
        Self::decode(response, "notifications").await
    }

    /// Fetch the authoritative unread count.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn fetch_unread_count(&self) -> Result<usize, ApiError> {
        let response = self
            .request(Method::GET, "notifications/unread-count")
            .send()
            .await?;
        Self::decode(response, "unread count").await
    }

    /// Acknowledge one notification as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the acknowledgement fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn mark_notification_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let response = self
            .request(Method::PUT, &format!("notifications/{id}/read"))
            .send()
            .await?;
        Self::check_status(response, "mark notification read").await?;
        Ok(())
    }

    /// Acknowledge every notification as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the acknowledgement fails.
    #[instrument(skip(self))]
    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        let response = self
            .request(Method::PUT, "notifications/read-all")
            .send()
            .await?;
        Self::check_status(response, "mark all notifications read").await?;
        Ok(())
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the submission fails; the caller decides what to
    /// do with the cart in that case.
    #[instrument(skip(self, items))]
    pub async fn create_order(&self, items: Vec<OrderItemInput>) -> Result<Order, ApiError> {
        let response = self
            .request(Method::POST, "orders")
            .json(&CreateOrderRequest { items })
            .send()
            .await?;
        Self::decode(response, "create order").await
    }

    // =========================================================================
    // Catalog Methods (cached reads, invalidating mutations)
    // =========================================================================

    /// Get a store's menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not found or the request fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn store_menu(&self, store_id: &StoreId) -> Result<StoreMenu, ApiError> {
        let cache_key = format!("menu:{store_id}");

        if let Some(CacheValue::Menu(menu)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for store menu");
            return Ok(*menu);
        }

        let response = self
            .request(Method::GET, &format!("stores/{store_id}/menu"))
            .send()
            .await?;
        let menu: StoreMenu = Self::decode(response, "store menu").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Menu(Box::new(menu.clone())))
            .await;

        Ok(menu)
    }

    /// Get a merchant's own menu (their store header plus products).
    ///
    /// # Errors
    ///
    /// Returns an error if the merchant is not found or the request fails.
    #[instrument(skip(self), fields(merchant_id = %merchant_id))]
    pub async fn merchant_menu(&self, merchant_id: &MerchantId) -> Result<StoreMenu, ApiError> {
        let cache_key = format!("merchant-menu:{merchant_id}");

        if let Some(CacheValue::Menu(menu)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for merchant menu");
            return Ok(*menu);
        }

        let response = self
            .request(Method::GET, &format!("stores/merchant/{merchant_id}/menu"))
            .send()
            .await?;
        let menu: StoreMenu = Self::decode(response, "merchant menu").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Menu(Box::new(menu.clone())))
            .await;

        Ok(menu)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for categories");
            return Ok(categories);
        }

        let response = self.request(Method::GET, "categories").send().await?;
        let categories: Vec<Category> = Self::decode(response, "categories").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the creation fails.
    #[instrument(skip(self, product))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let response = self
            .request(Method::POST, "products")
            .json(product)
            .send()
            .await?;
        let created = Self::decode(response, "create product").await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn update_product(&self, product: &Product) -> Result<Product, ApiError> {
        let response = self
            .request(Method::PUT, &format!("products/{}", product.id))
            .json(product)
            .send()
            .await?;
        let updated = Self::decode(response, "update product").await?;
        self.invalidate_catalog().await;
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("products/{id}"))
            .send()
            .await?;
        Self::check_status(response, "delete product").await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the creation fails.
    #[instrument(skip(self, category))]
    pub async fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError> {
        let response = self
            .request(Method::POST, "categories")
            .json(category)
            .send()
            .await?;
        let created = Self::decode(response, "create category").await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    #[instrument(skip(self, category), fields(id = %category.id))]
    pub async fn update_category(&self, category: &Category) -> Result<Category, ApiError> {
        let response = self
            .request(Method::PUT, &format!("categories/{}", category.id))
            .json(category)
            .send()
            .await?;
        let updated = Self::decode(response, "update category").await?;
        self.invalidate_catalog().await;
        Ok(updated)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("categories/{id}"))
            .send()
            .await?;
        Self::check_status(response, "delete category").await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    /// Drop all cached catalog data.
    pub async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RealtimeConfig;

    fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(&StorefrontConfig {
            api_base_url: base_url.to_string(),
            auth_token: None,
            realtime: RealtimeConfig::default(),
            sentry_dsn: None,
        })
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = client_for("http://localhost:5034/api");
        assert_eq!(
            client.endpoint("notifications/unread-count"),
            "http://localhost:5034/api/notifications/unread-count"
        );
    }

    #[test]
    fn test_endpoint_normalizes_trailing_slash() {
        let client = client_for("http://localhost:5034/api/");
        assert_eq!(
            client.endpoint("orders"),
            "http://localhost:5034/api/orders"
        );
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::NotFound("store menu".to_string()).to_string(),
            "Not found: store menu"
        );
        assert_eq!(
            ApiError::RateLimited(60).to_string(),
            "Rate limited, retry after 60 seconds"
        );
        assert_eq!(ApiError::Status(502).to_string(), "Backend returned status 502");
    }
}
