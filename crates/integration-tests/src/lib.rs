//! Integration test harness for Soundcart.
//!
//! Provides two in-process mock servers so the storefront engine can be
//! driven end-to-end without any external services:
//!
//! - [`MockBackend`] - an axum server implementing the backend REST
//!   contracts the engine consumes (notifications, orders, store menus)
//! - [`MockHub`] - a bare WebSocket server standing in for the notification
//!   hub, with a handshake counter and push/drop controls
//!
//! Both bind an ephemeral port on localhost; tests build a
//! [`StorefrontConfig`] pointing at them via [`test_config`].

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::{Value, json};
use soundcart_storefront::{RealtimeConfig, StorefrontConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tokio_util::sync::CancellationToken;

/// Build a configuration pointing at the mock servers.
#[must_use]
pub fn test_config(
    api_base_url: &str,
    hub_url: &str,
    auth_token: Option<&str>,
    realtime_enabled: bool,
) -> StorefrontConfig {
    StorefrontConfig {
        api_base_url: api_base_url.to_string(),
        auth_token: auth_token.map(|token| SecretString::from(token.to_string())),
        realtime: RealtimeConfig {
            enabled: realtime_enabled,
            hub_url: hub_url.to_string(),
            ..RealtimeConfig::default()
        },
        sentry_dsn: None,
    }
}

/// Poll `cond` until it holds or `timeout` elapses (then panic).
pub async fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

// =============================================================================
// Mock backend (REST)
// =============================================================================

/// Shared, inspectable state behind the mock backend routes.
#[derive(Clone, Default)]
pub struct BackendState {
    notifications: Arc<Mutex<Vec<Value>>>,
    unread_count: Arc<Mutex<usize>>,
    read_ids: Arc<Mutex<Vec<String>>>,
    read_all_calls: Arc<AtomicUsize>,
    orders: Arc<Mutex<Vec<Value>>>,
    menu_requests: Arc<AtomicUsize>,
    category_requests: Arc<AtomicUsize>,
    fail_acks: Arc<AtomicBool>,
    fail_orders: Arc<AtomicBool>,
}

impl BackendState {
    /// Seed the notification list served by `GET /notifications`.
    pub fn seed_notifications(&self, notifications: Vec<Value>) {
        let unread = notifications
            .iter()
            .filter(|n| !n["isRead"].as_bool().unwrap_or(false))
            .count();
        *self.notifications.lock().unwrap() = notifications;
        *self.unread_count.lock().unwrap() = unread;
    }

    /// Set the value served by `GET /notifications/unread-count`.
    pub fn set_unread_count(&self, count: usize) {
        *self.unread_count.lock().unwrap() = count;
    }

    /// Ids acknowledged through `PUT /notifications/{id}/read`.
    #[must_use]
    pub fn read_ids(&self) -> Vec<String> {
        self.read_ids.lock().unwrap().clone()
    }

    /// Number of `PUT /notifications/read-all` calls.
    #[must_use]
    pub fn read_all_calls(&self) -> usize {
        self.read_all_calls.load(Ordering::SeqCst)
    }

    /// Bodies received by `POST /orders`.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.orders.lock().unwrap().clone()
    }

    /// Number of `GET /stores/{id}/menu` hits.
    #[must_use]
    pub fn menu_requests(&self) -> usize {
        self.menu_requests.load(Ordering::SeqCst)
    }

    /// Number of `GET /categories` hits.
    #[must_use]
    pub fn category_requests(&self) -> usize {
        self.category_requests.load(Ordering::SeqCst)
    }

    /// Make acknowledgement endpoints return 503.
    pub fn set_fail_acks(&self, fail: bool) {
        self.fail_acks.store(fail, Ordering::SeqCst);
    }

    /// Make `POST /orders` return 500.
    pub fn set_fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }
}

/// In-process mock of the Soundcart backend REST API.
pub struct MockBackend {
    pub state: BackendState,
    addr: SocketAddr,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    pub async fn spawn() -> Self {
        let state = BackendState::default();

        let app = Router::new()
            .route("/api/notifications", get(list_notifications))
            .route("/api/notifications/unread-count", get(unread_count))
            .route("/api/notifications/{id}/read", put(mark_read))
            .route("/api/notifications/read-all", put(mark_all_read))
            .route("/api/orders", post(create_order))
            .route("/api/stores/{id}/menu", get(store_menu))
            .route("/api/categories", get(list_categories).post(create_category))
            .route("/api/products", post(create_product))
            .route(
                "/api/products/{id}",
                put(update_product).delete(delete_product),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, addr }
    }

    /// Base URL to hand to the storefront configuration.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

async fn list_notifications(
    State(state): State<BackendState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let only_unread = params.get("onlyUnread").is_some_and(|v| v == "true");

    let items = state.notifications.lock().unwrap().clone();
    let items: Vec<Value> = if only_unread {
        items
            .into_iter()
            .filter(|n| !n["isRead"].as_bool().unwrap_or(false))
            .collect()
    } else {
        items
    };

    Json(Value::Array(items))
}

async fn unread_count(State(state): State<BackendState>) -> Json<usize> {
    let count = *state.unread_count.lock().unwrap();
    Json(count)
}

async fn mark_read(State(state): State<BackendState>, Path(id): Path<String>) -> StatusCode {
    if state.fail_acks.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    state.read_ids.lock().unwrap().push(id);
    StatusCode::NO_CONTENT
}

async fn mark_all_read(State(state): State<BackendState>) -> StatusCode {
    if state.fail_acks.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    state.read_all_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn create_order(
    State(state): State<BackendState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if state.fail_orders.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "order rejected"})),
        );
    }

    state.orders.lock().unwrap().push(body);
    (
        StatusCode::CREATED,
        Json(json!({"id": "ord-1", "status": "Created"})),
    )
}

async fn store_menu(State(state): State<BackendState>, Path(id): Path<String>) -> Json<Value> {
    state.menu_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "id": id,
        "name": "Mock Records",
        "products": [
            {"id": "prod-1", "name": "Blue Vinyl", "price": "19.99"},
            {"id": "prod-2", "name": "Tape Deck", "price": 45.00},
        ],
    }))
}

async fn list_categories(State(state): State<BackendState>) -> Json<Value> {
    state.category_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"id": "cat-1", "name": "Vinyl"},
        {"id": "cat-2", "name": "Cassettes"},
    ]))
}

async fn create_category(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({"id": "cat-new", "name": body["name"]})),
    )
}

async fn create_product(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut created = body;
    created["id"] = json!("prod-new");
    (StatusCode::CREATED, Json(created))
}

async fn update_product(Path(_id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn delete_product(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

// =============================================================================
// Mock hub (WebSocket)
// =============================================================================

/// In-process mock of the notification hub.
///
/// Counts TCP-level handshakes, pushes frames to every live connection, and
/// can drop all connections to exercise the client's reconnect loop.
pub struct MockHub {
    addr: SocketAddr,
    handshakes: Arc<AtomicUsize>,
    connections: Arc<Mutex<Vec<CancellationToken>>>,
    outbound: broadcast::Sender<String>,
}

impl MockHub {
    /// Bind an ephemeral port and start accepting connections.
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handshakes = Arc::new(AtomicUsize::new(0));
        let connections: Arc<Mutex<Vec<CancellationToken>>> = Arc::new(Mutex::new(Vec::new()));
        let (outbound, _) = broadcast::channel::<String>(64);

        {
            let handshakes = Arc::clone(&handshakes);
            let connections = Arc::clone(&connections);
            let outbound = outbound.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    handshakes.fetch_add(1, Ordering::SeqCst);

                    let Ok(ws) = accept_async(stream).await else {
                        continue;
                    };

                    // Subscribe before the connection becomes observable so a
                    // frame pushed right after `connection_count` ticks up is
                    // never lost.
                    let frames = outbound.subscribe();
                    let token = CancellationToken::new();
                    connections.lock().unwrap().push(token.clone());
                    tokio::spawn(serve_connection(ws, frames, token));
                }
            });
        }

        Self {
            addr,
            handshakes,
            connections,
            outbound,
        }
    }

    /// Hub URL to hand to the storefront configuration.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}/hubs/notifications", self.addr)
    }

    /// Number of WebSocket handshakes the server has accepted.
    #[must_use]
    pub fn handshake_count(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    /// Number of connections ever established.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Push a hub frame to every live connection.
    pub fn push(&self, target: &str, payload: Value) {
        let frame = json!({"target": target, "arguments": [payload]}).to_string();
        let _ = self.outbound.send(frame);
    }

    /// Push a raw (possibly malformed) text frame.
    pub fn push_raw(&self, text: &str) {
        let _ = self.outbound.send(text.to_string());
    }

    /// Close every live connection, as a transport loss would.
    pub fn drop_connections(&self) {
        let mut connections = self.connections.lock().unwrap();
        for token in connections.drain(..) {
            token.cancel();
        }
    }
}

async fn serve_connection(
    ws: WebSocketStream<TcpStream>,
    mut outbound: broadcast::Receiver<String>,
    token: CancellationToken,
) {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Ok(text) => {
                    if write.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            incoming = read.next() => match incoming {
                Some(Ok(_)) => {}
                _ => break,
            },
            () = token.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
