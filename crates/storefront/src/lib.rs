//! Soundcart Storefront - client-side storefront engine.
//!
//! This crate is the state and synchronization core behind the Soundcart
//! storefront UI. It owns no rendering; it maintains the shopping cart, the
//! notification cache, and the live hub channel, and talks to the Soundcart
//! backend REST API.
//!
//! # Architecture
//!
//! - [`cart`] - in-memory shopping cart with derived totals
//! - [`notifications`] - notification cache and push/pull sync engine
//! - [`realtime`] - hub WebSocket channel with automatic reconnection
//! - [`api`] - backend REST client (notifications, orders, products, categories)
//! - [`state`] - application state wiring the pieces together
//!
//! All stores are cheaply cloneable handles; mutations serialize through each
//! store's internal lock, so interleaved UI events and push deliveries apply
//! atomically.
//!
//! # Example
//!
//! ```rust,ignore
//! use soundcart_storefront::{AppState, StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let app = AppState::new(config);
//!
//! app.cart().add_item(&product);
//! app.start_realtime().await?;
//! let order = app.checkout().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod notifications;
pub mod realtime;
pub mod state;

pub use api::{ApiClient, ApiError};
pub use cart::{CartLine, CartStore, ProductSummary};
pub use config::{ConfigError, RealtimeConfig, StorefrontConfig};
pub use error::AppError;
pub use notifications::{Notification, NotificationStore, NotificationSync, PushNotification};
pub use realtime::{ConnectionError, ConnectionState, HubClient, HubEvent, RetryPolicy};
pub use state::AppState;
